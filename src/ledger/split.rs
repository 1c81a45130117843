//! Split calculator
//!
//! Turns a bill's total, split method, and raw per-person inputs into exact
//! per-person amounts. All rounding is to the nearest cent with no remainder
//! redistribution; the calculator never validates percentage sums or rescales
//! inputs, it only guards against division by zero.

use crate::models::{Bill, HousemateId, Money, Split, SplitMethod};

/// Input to [`compute_splits`], one variant per split method
#[derive(Debug, Clone)]
pub enum SplitRequest<'a> {
    /// Every participant gets the same rounded share
    Equal { participants: &'a [HousemateId] },
    /// `(housemate, percentage points)` pairs; the caller is responsible for
    /// making them sum to 100
    Percentage { shares: &'a [(HousemateId, f64)] },
    /// `(housemate, share count)` pairs, normalized by their sum
    Shares { shares: &'a [(HousemateId, f64)] },
    /// Literal amounts, passed through unchanged (settlements use this)
    Exact { amounts: &'a [(HousemateId, Money)] },
}

impl SplitRequest<'_> {
    /// The split method this request computes
    pub fn method(&self) -> SplitMethod {
        match self {
            Self::Equal { .. } => SplitMethod::Equal,
            Self::Percentage { .. } => SplitMethod::Percentage,
            Self::Shares { .. } => SplitMethod::Shares,
            Self::Exact { .. } => SplitMethod::Exact,
        }
    }
}

/// Compute per-person splits for a bill total
pub fn compute_splits(total: Money, request: SplitRequest<'_>) -> Vec<Split> {
    match request {
        SplitRequest::Equal { participants } => {
            let share = total.split_even(participants.len());
            participants
                .iter()
                .map(|&id| Split::new(id, share))
                .collect()
        }
        SplitRequest::Percentage { shares } => shares
            .iter()
            .map(|&(id, pct)| Split::with_share(id, total.mul_f64(pct / 100.0), pct))
            .collect(),
        SplitRequest::Shares { shares } => {
            let sum: f64 = shares.iter().map(|&(_, s)| s).sum();
            shares
                .iter()
                .map(|&(id, s)| {
                    // Zero total shares means all-zero amounts, not a division.
                    let amount = if sum == 0.0 {
                        Money::zero()
                    } else {
                        total.mul_f64(s / sum)
                    };
                    Split::with_share(id, amount, s)
                })
                .collect()
        }
        SplitRequest::Exact { amounts } => amounts
            .iter()
            .map(|&(id, amount)| Split::new(id, amount))
            .collect(),
    }
}

/// Recompute a bill's splits in place after its total, roster, or raw shares
/// changed.
///
/// The equal method always re-includes the full current roster. Percentage
/// and shares rebuild from each existing split's stored raw `share`, so a
/// total-amount edit never resets what housemates typed in. Exact amounts are
/// kept as entered.
pub fn recompute_bill_splits(bill: &mut Bill, roster: &[HousemateId]) {
    match bill.split_method {
        SplitMethod::Equal => {
            bill.splits = compute_splits(
                bill.amount,
                SplitRequest::Equal {
                    participants: roster,
                },
            );
        }
        SplitMethod::Percentage => {
            let shares: Vec<(HousemateId, f64)> = bill
                .splits
                .iter()
                .map(|s| (s.housemate_id, s.share.unwrap_or(0.0)))
                .collect();
            bill.splits = compute_splits(bill.amount, SplitRequest::Percentage { shares: &shares });
        }
        SplitMethod::Shares => {
            let shares: Vec<(HousemateId, f64)> = bill
                .splits
                .iter()
                .map(|s| (s.housemate_id, s.share.unwrap_or(0.0)))
                .collect();
            bill.splits = compute_splits(bill.amount, SplitRequest::Shares { shares: &shares });
        }
        SplitMethod::Exact => {
            // Literal amounts are never recomputed.
        }
    }
}
