//! Validation of transaction forms and listing queries.
//!
//! Turns raw form and query strings into the typed [`TransactionDraft`] and
//! [`TransactionFilter`] the store accepts.

use finsight_store::{Amount, DateRange, TransactionDraft, TransactionFilter, TransactionKind};
use serde::Deserialize;

use crate::errors::AppError;
use crate::utils::{parse_date, validate_not_empty};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 200;
const MAX_CATEGORY_LEN: usize = 50;

/// Body of the add and edit forms.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionForm {
    #[serde(default)]
    pub amount: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub transaction_date: String,
}

impl TransactionForm {
    pub fn validate(&self) -> Result<TransactionDraft, AppError> {
        let amount = self
            .amount
            .trim()
            .parse::<Amount>()
            .ok()
            .filter(|a| a.is_positive())
            .ok_or_else(|| {
                AppError::validation(
                    "Amount must be a positive number with at most two decimal places",
                )
            })?;
        if amount > Amount::MAX {
            return Err(AppError::validation(format!(
                "Amount must not exceed {}",
                Amount::MAX
            )));
        }

        let kind = self
            .kind
            .trim()
            .parse::<TransactionKind>()
            .map_err(|_| AppError::validation("Type must be income or expense"))?;

        let category = self.category.trim();
        if !validate_not_empty(category) {
            return Err(AppError::validation("Category is required"));
        }
        if category.chars().count() > MAX_CATEGORY_LEN {
            return Err(AppError::validation(format!(
                "Category must be at most {MAX_CATEGORY_LEN} characters"
            )));
        }

        let transaction_date = parse_date(&self.transaction_date)
            .ok_or_else(|| AppError::validation("Valid transaction date is required (YYYY-MM-DD)"))?;

        Ok(TransactionDraft {
            amount,
            kind,
            category: category.to_string(),
            description: self.description.trim().to_string(),
            transaction_date,
        })
    }
}

/// Query string of the listing and export endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl ListQuery {
    /// Inclusive date range; empty bounds are open.
    pub fn range(&self) -> Result<DateRange, AppError> {
        let bound = |value: &Option<String>, label: &str| match value.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => parse_date(raw)
                .map(Some)
                .ok_or_else(|| AppError::validation(format!("Invalid {label} date (YYYY-MM-DD)"))),
        };
        let from = bound(&self.from, "start")?;
        let to = bound(&self.to, "end")?;
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(AppError::validation("Start date must not be after end date"));
            }
        }
        Ok(DateRange { from, to })
    }

    /// Listing filter with the page size clamped to `1..=MAX_PAGE_SIZE`.
    pub fn filter(&self) -> Result<TransactionFilter, AppError> {
        Ok(TransactionFilter {
            range: self.range()?,
            limit: Some(
                self.limit
                    .unwrap_or(DEFAULT_PAGE_SIZE)
                    .clamp(1, MAX_PAGE_SIZE),
            ),
            offset: self.offset.unwrap_or(0),
        })
    }
}
