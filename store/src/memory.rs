//! In-memory store implementation.
//!
//! Backs both store traits with plain vectors behind a `tokio` lock. Suitable
//! for tests and single-process demos; nothing survives a restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::errors::StoreError;
use crate::models::{
    Amount, CategoryTotal, DateRange, NewUser, Transaction, TransactionDraft, TransactionFilter,
    TransactionId, TransactionKind, TransactionStats, User, UserId,
};
use crate::{CredentialStore, TransactionStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    users: Vec<User>,
    transactions: Vec<Transaction>,
    last_user_id: UserId,
    last_transaction_id: TransactionId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users, active or not.
    pub async fn user_count(&self) -> usize {
        self.inner.read().await.users.len()
    }
}

fn owned_in_range<'a>(
    transactions: &'a [Transaction],
    user_id: UserId,
    range: DateRange,
) -> impl Iterator<Item = &'a Transaction> {
    transactions
        .iter()
        .filter(move |t| t.user_id == user_id && range.contains(t.transaction_date))
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_active_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .find(|u| u.username == username && u.is_active)
            .cloned())
    }

    async fn is_user_active(&self, user_id: UserId) -> Result<bool, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().any(|u| u.id == user_id && u.is_active))
    }

    async fn update_last_login(&self, user_id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(user) = inner.users.iter_mut().find(|u| u.id == user_id) {
            user.last_login = Some(at);
        }
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserId, StoreError> {
        let mut inner = self.inner.write().await;
        if inner
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(StoreError::Conflict);
        }

        inner.last_user_id += 1;
        let id = inner.last_user_id;
        inner.users.push(User {
            id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            password_hash: user.password_hash,
            role: user.role,
            is_active: user.is_active,
            last_login: None,
        });
        Ok(id)
    }

    async fn username_or_email_exists(
        &self,
        username: &str,
        email: &str,
    ) -> Result<bool, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .any(|u| u.username == username || u.email == email))
    }

    async fn set_user_active(&self, username: &str, active: bool) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.users.iter_mut().find(|u| u.username == username) {
            Some(user) => {
                user.is_active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn list_transactions(
        &self,
        user_id: UserId,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, StoreError> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Transaction> = owned_in_range(&inner.transactions, user_id, filter.range)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.transaction_date
                .cmp(&a.transaction_date)
                .then(b.created_at.cmp(&a.created_at))
                .then(b.id.cmp(&a.id))
        });

        let rows = rows.into_iter().skip(filter.offset as usize);
        Ok(match filter.limit {
            Some(limit) => rows.take(limit as usize).collect(),
            None => rows.collect(),
        })
    }

    async fn get_transaction(
        &self,
        id: TransactionId,
        user_id: UserId,
    ) -> Result<Option<Transaction>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .transactions
            .iter()
            .find(|t| t.id == id && t.user_id == user_id)
            .cloned())
    }

    async fn insert_transaction(
        &self,
        user_id: UserId,
        draft: &TransactionDraft,
        created_at: DateTime<Utc>,
    ) -> Result<TransactionId, StoreError> {
        let mut inner = self.inner.write().await;
        inner.last_transaction_id += 1;
        let id = inner.last_transaction_id;
        inner.transactions.push(Transaction {
            id,
            user_id,
            amount: draft.amount,
            kind: draft.kind,
            category: draft.category.clone(),
            description: draft.description.clone(),
            transaction_date: draft.transaction_date,
            created_at,
        });
        Ok(id)
    }

    async fn update_transaction(
        &self,
        id: TransactionId,
        user_id: UserId,
        draft: &TransactionDraft,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(row) = inner
            .transactions
            .iter_mut()
            .find(|t| t.id == id && t.user_id == user_id)
        else {
            return Ok(false);
        };
        row.amount = draft.amount;
        row.kind = draft.kind;
        row.category = draft.category.clone();
        row.description = draft.description.clone();
        row.transaction_date = draft.transaction_date;
        Ok(true)
    }

    async fn delete_transaction(
        &self,
        id: TransactionId,
        user_id: UserId,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.transactions.len();
        inner
            .transactions
            .retain(|t| !(t.id == id && t.user_id == user_id));
        Ok(inner.transactions.len() < before)
    }

    async fn transaction_stats(
        &self,
        user_id: UserId,
        range: DateRange,
    ) -> Result<TransactionStats, StoreError> {
        let inner = self.inner.read().await;
        let (income, expense) = owned_in_range(&inner.transactions, user_id, range).try_fold(
            (Amount::ZERO, Amount::ZERO),
            |(income, expense), t| match t.kind {
                TransactionKind::Income => income
                    .checked_add(t.amount)
                    .map(|income| (income, expense))
                    .ok_or(StoreError::Overflow("income")),
                TransactionKind::Expense => expense
                    .checked_add(t.amount)
                    .map(|expense| (income, expense))
                    .ok_or(StoreError::Overflow("expense")),
            },
        )?;
        Ok(TransactionStats::new(income, expense))
    }

    async fn category_totals(
        &self,
        user_id: UserId,
        kind: TransactionKind,
        range: DateRange,
    ) -> Result<Vec<CategoryTotal>, StoreError> {
        let inner = self.inner.read().await;
        let mut totals: HashMap<&str, Amount> = HashMap::new();
        for t in owned_in_range(&inner.transactions, user_id, range).filter(|t| t.kind == kind) {
            let total = totals.entry(t.category.as_str()).or_default();
            *total = total
                .checked_add(t.amount)
                .ok_or(StoreError::Overflow("category"))?;
        }

        let mut totals: Vec<CategoryTotal> = totals
            .into_iter()
            .map(|(category, total)| CategoryTotal {
                category: category.to_string(),
                total,
            })
            .collect();
        totals.sort_by(|a, b| b.total.cmp(&a.total).then(a.category.cmp(&b.category)));
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::Role;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            full_name: "Test User".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Student,
            is_active: true,
        }
    }

    fn draft(amount: &str, kind: TransactionKind, category: &str, date: (i32, u32, u32)) -> TransactionDraft {
        TransactionDraft {
            amount: amount.parse().unwrap(),
            kind,
            category: category.to_string(),
            description: String::new(),
            transaction_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        }
    }

    #[tokio::test]
    async fn duplicate_username_or_email_conflicts() {
        let store = MemoryStore::new();
        store.insert_user(new_user("alice", "a@example.com")).await.unwrap();

        let err = store
            .insert_user(new_user("alice", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));

        let err = store
            .insert_user(new_user("bob", "a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn inactive_users_are_invisible_to_lookup() {
        let store = MemoryStore::new();
        let id = store.insert_user(new_user("carol", "c@example.com")).await.unwrap();
        assert!(store.find_active_user_by_username("carol").await.unwrap().is_some());

        assert!(store.set_user_active("carol", false).await.unwrap());
        assert!(store.find_active_user_by_username("carol").await.unwrap().is_none());
        assert!(!store.is_user_active(id).await.unwrap());
        assert!(!store.set_user_active("nobody", false).await.unwrap());
    }

    #[tokio::test]
    async fn transactions_are_scoped_to_their_owner() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let id = store
            .insert_transaction(1, &draft("10", TransactionKind::Expense, "Food", (2024, 1, 5)), now)
            .await
            .unwrap();

        assert!(store.get_transaction(id, 2).await.unwrap().is_none());
        assert!(!store.delete_transaction(id, 2).await.unwrap());
        assert!(store.delete_transaction(id, 1).await.unwrap());
        assert!(store.get_transaction(id, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn oversized_totals_report_overflow() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for _ in 0..2 {
            store
                .insert_transaction(
                    1,
                    &draft("92233720368547758.07", TransactionKind::Income, "Salary", (2024, 1, 5)),
                    now,
                )
                .await
                .unwrap();
        }

        let err = store.transaction_stats(1, DateRange::all()).await.unwrap_err();
        assert!(matches!(err, StoreError::Overflow("income")));
        let err = store
            .category_totals(1, TransactionKind::Income, DateRange::all())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Overflow("category")));
    }

    #[tokio::test]
    async fn stats_and_category_totals_respect_range() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for d in [
            draft("5000", TransactionKind::Income, "Salary", (2024, 3, 1)),
            draft("350", TransactionKind::Expense, "Food", (2024, 3, 2)),
            draft("80", TransactionKind::Expense, "Transport", (2024, 3, 3)),
            draft("20", TransactionKind::Expense, "Food", (2024, 4, 1)),
        ] {
            store.insert_transaction(7, &d, now).await.unwrap();
        }

        let march = DateRange::month(2024, 3).unwrap();
        let stats = store.transaction_stats(7, march).await.unwrap();
        assert_eq!(stats.total_income.to_string(), "5000.00");
        assert_eq!(stats.total_expense.to_string(), "430.00");
        assert_eq!(stats.balance.to_string(), "4570.00");

        let totals = store
            .category_totals(7, TransactionKind::Expense, DateRange::all())
            .await
            .unwrap();
        assert_eq!(totals[0].category, "Food");
        assert_eq!(totals[0].total.to_string(), "370.00");
        assert_eq!(totals[1].category, "Transport");
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_paginated() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for day in 1..=5 {
            store
                .insert_transaction(1, &draft("1", TransactionKind::Income, "Misc", (2024, 5, day)), now)
                .await
                .unwrap();
        }

        let page = store
            .list_transactions(
                1,
                TransactionFilter {
                    limit: Some(2),
                    offset: 1,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let days: Vec<u32> = page.iter().map(|t| chrono::Datelike::day(&t.transaction_date)).collect();
        assert_eq!(days, vec![4, 3]);
    }
}
