//! Bill model
//!
//! A bill records one expense and how it divides across housemates. A
//! settlement (a direct payment between two housemates) is modeled as a bill
//! with a single exact split, so the balance fold treats both uniformly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BillId, CategoryId, HousemateId};
use super::money::Money;
use super::month::BillingMonth;

/// How a bill's total divides across its participants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SplitMethod {
    /// Everyone pays the same rounded share
    #[default]
    Equal,
    /// Each participant pays a percentage of the total
    Percentage,
    /// Each participant pays proportionally to a share count
    Shares,
    /// Amounts are entered literally per participant
    Exact,
}

impl fmt::Display for SplitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "equal"),
            Self::Percentage => write!(f, "percentage"),
            Self::Shares => write!(f, "shares"),
            Self::Exact => write!(f, "exact"),
        }
    }
}

/// Whether a record is an expense or a direct repayment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BillKind {
    /// A shared expense
    #[default]
    Bill,
    /// A direct payment from the payer to the single split's housemate
    Settlement,
}

/// A participant's computed share of a bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    /// The housemate owing this share (may dangle if they left the roster)
    pub housemate_id: HousemateId,

    /// The computed amount owed
    pub amount: Money,

    /// The raw user input behind the amount: percentage points for the
    /// percentage method, a share count for the shares method, `None` for
    /// equal and exact. Preserved across edits so re-entering siblings is
    /// never required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share: Option<f64>,
}

impl Split {
    /// Create a split with a computed amount only
    pub fn new(housemate_id: HousemateId, amount: Money) -> Self {
        Self {
            housemate_id,
            amount,
            share: None,
        }
    }

    /// Create a split carrying its raw share input
    pub fn with_share(housemate_id: HousemateId, amount: Money, share: f64) -> Self {
        Self {
            housemate_id,
            amount,
            share: Some(share),
        }
    }
}

/// A recorded expense or settlement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    /// Unique identifier
    pub id: BillId,

    /// Short description
    pub title: String,

    /// Total amount (positive)
    pub amount: Money,

    /// Who paid the bill
    pub payer_id: HousemateId,

    /// Date of the expense
    pub date: NaiveDate,

    /// How the total divides across participants
    #[serde(default)]
    pub split_method: SplitMethod,

    /// Per-participant shares, in entry order
    #[serde(default)]
    pub splits: Vec<Split>,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// The year-month bucket this bill is grouped under
    pub billing_month: BillingMonth,

    /// Optional category
    pub category_id: Option<CategoryId>,

    /// Expense or settlement
    #[serde(default)]
    pub kind: BillKind,
}

impl Bill {
    /// Create a new bill; the billing month defaults to the bill date's month
    pub fn new(
        title: impl Into<String>,
        amount: Money,
        payer_id: HousemateId,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: BillId::new(),
            title: title.into(),
            amount,
            payer_id,
            date,
            split_method: SplitMethod::Equal,
            splits: Vec::new(),
            created_at: Utc::now(),
            billing_month: BillingMonth::from_date(date),
            category_id: None,
            kind: BillKind::Bill,
        }
    }

    /// Create a settlement: `payer` paid `recipient` back `amount` directly
    pub fn settlement(
        payer_id: HousemateId,
        recipient_id: HousemateId,
        amount: Money,
        date: NaiveDate,
    ) -> Self {
        let mut bill = Self::new("Settlement", amount, payer_id, date);
        bill.kind = BillKind::Settlement;
        bill.split_method = SplitMethod::Exact;
        bill.splits = vec![Split::new(recipient_id, amount)];
        bill
    }

    /// Check if this is a settlement record
    pub fn is_settlement(&self) -> bool {
        self.kind == BillKind::Settlement
    }

    /// Sum of all split amounts
    ///
    /// When splits were computed correctly this matches [`Bill::amount`]
    /// within rounding (1 cent per participant). The invariant is a tested
    /// property, not a hard-enforced one: percentage inputs that do not sum
    /// to 100 legitimately produce a mismatched total.
    pub fn splits_total(&self) -> Money {
        self.splits.iter().map(|s| s.amount).sum()
    }

    /// Validate structural rules
    pub fn validate(&self) -> Result<(), BillValidationError> {
        if !self.amount.is_positive() {
            return Err(BillValidationError::NonPositiveAmount(self.amount));
        }

        if self.is_settlement() {
            if self.splits.len() != 1 {
                return Err(BillValidationError::SettlementSplitCount(self.splits.len()));
            }
            if self.split_method != SplitMethod::Exact {
                return Err(BillValidationError::SettlementMethod(self.split_method));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Bill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.date.format("%Y-%m-%d"),
            self.title,
            self.amount
        )
    }
}

/// Validation errors for bills
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillValidationError {
    NonPositiveAmount(Money),
    SettlementSplitCount(usize),
    SettlementMethod(SplitMethod),
}

impl fmt::Display for BillValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount(amount) => {
                write!(f, "Bill amount must be positive, got {}", amount)
            }
            Self::SettlementSplitCount(n) => {
                write!(f, "Settlement must have exactly one split, got {}", n)
            }
            Self::SettlementMethod(method) => {
                write!(f, "Settlement must use the exact method, got {}", method)
            }
        }
    }
}

impl std::error::Error for BillValidationError {}
