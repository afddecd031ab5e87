//! Domain models shared by every store implementation.
//!
//! These types describe users, roles and transactions as the backend sees them.
//! Store implementations map their rows onto these structs, so the rest of the
//! application never touches SQL types directly.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;

pub type UserId = i64;
pub type TransactionId = i64;

/// Coarse permission tier used for access gating.
///
/// Levels are ordinal: `Student < Staff < Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Staff,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Staff, Role::Admin];

    /// Ordinal authorization level of this role.
    pub fn level(self) -> u8 {
        match self {
            Role::Student => 1,
            Role::Staff => 2,
            Role::Admin => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "staff" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            other => Err(StoreError::invalid("role", other)),
        }
    }
}

/// A persisted user account.
///
/// `password_hash` is a PHC string and must never leave the backend.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
}

/// Fields required to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
}

/// Money in minor currency units (cents).
///
/// Serialized as a decimal string with two fractional digits, e.g. `"1250.00"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Largest amount a single transaction may carry: `9999999999999.99`.
    pub const MAX: Amount = Amount(999_999_999_999_999);

    pub fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    pub fn minor(self) -> i64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }
}

impl std::ops::Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0 - rhs.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Amount {
    type Err = StoreError;

    /// Parses `"12"`, `"12.5"` or `"-12.50"`. At most two fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StoreError::invalid("amount", s);
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty()
            || frac.len() > 2
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !frac.bytes().all(|b| b.is_ascii_digit())
            || (digits.contains('.') && frac.is_empty())
        {
            return Err(invalid());
        }

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => frac.parse().map_err(|_| invalid())?,
        };
        let minor = whole
            .checked_mul(100)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(invalid)?;

        Ok(Amount(if negative { -minor } else { minor }))
    }
}

impl TryFrom<String> for Amount {
    type Error = StoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Amount> for String {
    fn from(a: Amount) -> Self {
        a.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(StoreError::invalid("transaction type", other)),
        }
    }
}

/// A recorded income or expense, owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub amount: Amount,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub description: String,
    pub transaction_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Validated, user-editable fields of a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub amount: Amount,
    pub kind: TransactionKind,
    pub category: String,
    pub description: String,
    pub transaction_date: NaiveDate,
}

/// Inclusive date window. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// The calendar month containing `year`/`month`, or `None` for an invalid month.
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(Self::between(first, next.pred_opt()?))
    }

    pub fn year(year: i32) -> Option<Self> {
        Some(Self::between(
            NaiveDate::from_ymd_opt(year, 1, 1)?,
            NaiveDate::from_ymd_opt(year, 12, 31)?,
        ))
    }

    /// Month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        // a date's own year/month is always valid
        Self::month(date.year(), date.month()).unwrap_or_default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

/// Listing options for a user's transactions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionFilter {
    pub range: DateRange,
    /// `None` returns every matching row.
    pub limit: Option<u32>,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransactionStats {
    pub total_income: Amount,
    pub total_expense: Amount,
    pub balance: Amount,
}

impl TransactionStats {
    pub fn new(total_income: Amount, total_expense: Amount) -> Self {
        Self {
            total_income,
            total_expense,
            balance: total_income - total_expense,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_levels_are_ordered() {
        assert!(Role::Student.level() < Role::Staff.level());
        assert!(Role::Staff.level() < Role::Admin.level());
    }

    #[test]
    fn amount_parses_decimal_strings() {
        assert_eq!("12".parse::<Amount>().unwrap().minor(), 1200);
        assert_eq!("12.5".parse::<Amount>().unwrap().minor(), 1250);
        assert_eq!("0.05".parse::<Amount>().unwrap().minor(), 5);
        assert_eq!("-3.10".parse::<Amount>().unwrap().minor(), -310);
    }

    #[test]
    fn amount_rejects_malformed_input() {
        for bad in ["", "abc", "1.234", "1.", ".5", "1,000", "--1", "1e3"] {
            assert!(bad.parse::<Amount>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn amount_displays_two_decimals() {
        assert_eq!(Amount::from_minor(500_000_000).to_string(), "5000000.00");
        assert_eq!(Amount::from_minor(-7).to_string(), "-0.07");
        assert_eq!(serde_json::to_string(&Amount::from_minor(1050)).unwrap(), "\"10.50\"");
    }

    #[test]
    fn month_range_handles_december_and_leap_years() {
        let feb = DateRange::month(2024, 2).unwrap();
        assert_eq!(feb.to, NaiveDate::from_ymd_opt(2024, 2, 29));
        let dec = DateRange::month(2023, 12).unwrap();
        assert_eq!(dec.to, NaiveDate::from_ymd_opt(2023, 12, 31));
        assert!(DateRange::month(2023, 13).is_none());
    }

    #[test]
    fn open_range_contains_everything() {
        let any = NaiveDate::from_ymd_opt(1999, 1, 1).unwrap();
        assert!(DateRange::all().contains(any));
        let range = DateRange {
            from: NaiveDate::from_ymd_opt(2000, 1, 1),
            to: None,
        };
        assert!(!range.contains(any));
    }
}
