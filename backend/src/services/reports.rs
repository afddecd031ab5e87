//! Aggregation of a user's transactions into dashboard and period reports.
//!
//! Every function reads through the [`TransactionStore`] trait and is scoped
//! to one user. Amounts stay in minor units until serialization.

use chrono::{Datelike, NaiveDate};
use finsight_store::{
    CategoryTotal, DateRange, Transaction, TransactionFilter, TransactionKind, TransactionStats,
    TransactionStore, UserId,
};
use serde::Serialize;

use crate::errors::AppError;

const RECENT_TRANSACTIONS: u32 = 5;

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub all_time: TransactionStats,
    /// `YYYY-MM` of the current month.
    pub month: String,
    pub current_month: TransactionStats,
    pub recent_transactions: Vec<Transaction>,
    pub expense_categories: Vec<CategoryTotal>,
}

#[derive(Debug, Serialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub stats: TransactionStats,
    pub income_categories: Vec<CategoryTotal>,
    pub expense_categories: Vec<CategoryTotal>,
}

#[derive(Debug, Serialize)]
pub struct MonthStats {
    pub month: u32,
    #[serde(flatten)]
    pub stats: TransactionStats,
}

#[derive(Debug, Serialize)]
pub struct YearlyReport {
    pub year: i32,
    pub stats: TransactionStats,
    pub months: Vec<MonthStats>,
    pub income_categories: Vec<CategoryTotal>,
    pub expense_categories: Vec<CategoryTotal>,
}

pub async fn dashboard(
    store: &dyn TransactionStore,
    user_id: UserId,
    today: NaiveDate,
) -> Result<Dashboard, AppError> {
    let this_month = DateRange::month_of(today);
    let recent = TransactionFilter {
        limit: Some(RECENT_TRANSACTIONS),
        ..Default::default()
    };

    Ok(Dashboard {
        all_time: store.transaction_stats(user_id, DateRange::all()).await?,
        month: today.format("%Y-%m").to_string(),
        current_month: store.transaction_stats(user_id, this_month).await?,
        recent_transactions: store.list_transactions(user_id, recent).await?,
        expense_categories: store
            .category_totals(user_id, TransactionKind::Expense, this_month)
            .await?,
    })
}

pub async fn monthly(
    store: &dyn TransactionStore,
    user_id: UserId,
    year: i32,
    month: u32,
) -> Result<MonthlyReport, AppError> {
    let range = DateRange::month(year, month)
        .ok_or_else(|| AppError::validation("Month must be between 1 and 12"))?;

    Ok(MonthlyReport {
        year,
        month,
        stats: store.transaction_stats(user_id, range).await?,
        income_categories: store
            .category_totals(user_id, TransactionKind::Income, range)
            .await?,
        expense_categories: store
            .category_totals(user_id, TransactionKind::Expense, range)
            .await?,
    })
}

pub async fn yearly(
    store: &dyn TransactionStore,
    user_id: UserId,
    year: i32,
) -> Result<YearlyReport, AppError> {
    let range = DateRange::year(year).ok_or_else(|| AppError::validation("Invalid year"))?;

    let mut months = Vec::with_capacity(12);
    for month in 1..=12 {
        if let Some(month_range) = DateRange::month(year, month) {
            months.push(MonthStats {
                month,
                stats: store.transaction_stats(user_id, month_range).await?,
            });
        }
    }

    Ok(YearlyReport {
        year,
        stats: store.transaction_stats(user_id, range).await?,
        months,
        income_categories: store
            .category_totals(user_id, TransactionKind::Income, range)
            .await?,
        expense_categories: store
            .category_totals(user_id, TransactionKind::Expense, range)
            .await?,
    })
}

/// Quote a CSV field if it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// All of the user's transactions in `range` as CSV, oldest first.
pub async fn export_csv(
    store: &dyn TransactionStore,
    user_id: UserId,
    range: DateRange,
) -> Result<String, AppError> {
    let filter = TransactionFilter {
        range,
        limit: None,
        offset: 0,
    };
    let mut rows = store.list_transactions(user_id, filter).await?;
    rows.reverse();

    let mut out = String::from("date,type,category,description,amount\n");
    for t in &rows {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            t.transaction_date,
            t.kind,
            csv_field(&t.category),
            csv_field(&t.description),
            t.amount,
        ));
    }
    tracing::debug!(user_id, rows = rows.len(), "Exported transactions");
    Ok(out)
}

/// Current year and month of `today`.
pub fn year_month(today: NaiveDate) -> (i32, u32) {
    (today.year(), today.month())
}
