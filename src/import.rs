//! Spreadsheet row import
//!
//! Parses rows of string cells (one bill or settlement per row) into typed
//! records. Each row is tagged by its first cell and parsed with explicit
//! validation; a malformed cell fails the row with a message naming the
//! field, never a silent best-effort coercion.
//!
//! Row layouts:
//!
//! ```text
//! bill       | date | title | amount | payer-id | method | splits | category-id?
//! settlement | date | payer-id | recipient-id | amount
//! ```
//!
//! The `splits` cell is `;`-separated entries. Equal rows list bare
//! housemate ids; percentage and shares rows use `id=number`; exact rows
//! use `id=amount`.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::split::{compute_splits, SplitRequest};
use crate::models::{Bill, CategoryId, HousemateId, Money, SplitMethod};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw split inputs carried by a bill row
#[derive(Debug, Clone, PartialEq)]
pub enum RowSplits {
    /// Participants for an equal split
    Equal(Vec<HousemateId>),
    /// Raw percentage points or share counts per participant
    Weighted(Vec<(HousemateId, f64)>),
    /// Literal amounts per participant
    Exact(Vec<(HousemateId, Money)>),
}

/// A validated bill row
#[derive(Debug, Clone)]
pub struct ParsedBill {
    pub date: NaiveDate,
    pub title: String,
    pub amount: Money,
    pub payer_id: HousemateId,
    pub method: SplitMethod,
    pub splits: RowSplits,
    pub category_id: Option<CategoryId>,
}

/// A validated settlement row
#[derive(Debug, Clone)]
pub struct ParsedSettlement {
    pub date: NaiveDate,
    pub payer_id: HousemateId,
    pub recipient_id: HousemateId,
    pub amount: Money,
}

/// A row parsed into its tagged variant
#[derive(Debug, Clone)]
pub enum ParsedRow {
    Bill(ParsedBill),
    Settlement(ParsedSettlement),
}

impl ParsedRow {
    /// Turn the parsed row into a ledger [`Bill`], checking every referenced
    /// housemate against the roster
    pub fn into_bill(self, roster: &[HousemateId]) -> LedgerResult<Bill> {
        match self {
            Self::Bill(row) => row.into_bill(roster),
            Self::Settlement(row) => row.into_bill(roster),
        }
    }
}

impl ParsedBill {
    fn into_bill(self, roster: &[HousemateId]) -> LedgerResult<Bill> {
        require_known(roster, self.payer_id)?;

        let mut bill = Bill::new(self.title, self.amount, self.payer_id, self.date);
        bill.split_method = self.method;
        bill.category_id = self.category_id;
        bill.splits = match &self.splits {
            RowSplits::Equal(participants) => {
                for &id in participants {
                    require_known(roster, id)?;
                }
                compute_splits(bill.amount, SplitRequest::Equal { participants })
            }
            RowSplits::Weighted(shares) => {
                for &(id, _) in shares {
                    require_known(roster, id)?;
                }
                let request = match self.method {
                    SplitMethod::Percentage => SplitRequest::Percentage { shares },
                    _ => SplitRequest::Shares { shares },
                };
                compute_splits(bill.amount, request)
            }
            RowSplits::Exact(amounts) => {
                for &(id, _) in amounts {
                    require_known(roster, id)?;
                }
                compute_splits(bill.amount, SplitRequest::Exact { amounts })
            }
        };
        Ok(bill)
    }
}

impl ParsedSettlement {
    fn into_bill(self, roster: &[HousemateId]) -> LedgerResult<Bill> {
        require_known(roster, self.payer_id)?;
        require_known(roster, self.recipient_id)?;
        Ok(Bill::settlement(
            self.payer_id,
            self.recipient_id,
            self.amount,
            self.date,
        ))
    }
}

fn require_known(roster: &[HousemateId], id: HousemateId) -> LedgerResult<()> {
    if roster.contains(&id) {
        Ok(())
    } else {
        Err(LedgerError::housemate_not_found(id.to_string()))
    }
}

/// Parse one row of cells into its tagged variant
pub fn parse_row(cells: &[String]) -> LedgerResult<ParsedRow> {
    let kind = cell(cells, 0, "kind")?;
    match kind {
        "bill" => parse_bill_row(cells).map(ParsedRow::Bill),
        "settlement" => parse_settlement_row(cells).map(ParsedRow::Settlement),
        other => Err(LedgerError::Import(format!(
            "Unknown row kind '{}', expected 'bill' or 'settlement'",
            other
        ))),
    }
}

/// Parse a batch of rows, keeping per-row failures
///
/// One bad row must not sink the rest of the sheet, so each row carries its
/// own result, paired with its 0-based row number.
pub fn parse_rows(rows: &[Vec<String>]) -> Vec<(usize, LedgerResult<ParsedRow>)> {
    let parsed: Vec<(usize, LedgerResult<ParsedRow>)> = rows
        .iter()
        .enumerate()
        .map(|(idx, cells)| (idx, parse_row(cells)))
        .collect();
    let failed = parsed.iter().filter(|(_, r)| r.is_err()).count();
    debug!(rows = rows.len(), failed, "parsed sheet rows");
    parsed
}

fn parse_bill_row(cells: &[String]) -> LedgerResult<ParsedBill> {
    let date = parse_date(cell(cells, 1, "date")?)?;

    let title = cell(cells, 2, "title")?.to_string();
    if title.is_empty() {
        return Err(LedgerError::Import("Bill title must not be empty".into()));
    }

    let amount = parse_amount(cell(cells, 3, "amount")?)?;
    let payer_id = parse_housemate_id(cell(cells, 4, "payer")?)?;
    let method = parse_method(cell(cells, 5, "method")?)?;
    let splits = parse_splits(cell(cells, 6, "splits")?, method)?;

    let category_id = match cells.get(7).map(|s| s.trim()).filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<CategoryId>().map_err(|_| {
            LedgerError::Import(format!("Invalid category id '{}'", raw))
        })?),
        None => None,
    };

    Ok(ParsedBill {
        date,
        title,
        amount,
        payer_id,
        method,
        splits,
        category_id,
    })
}

fn parse_settlement_row(cells: &[String]) -> LedgerResult<ParsedSettlement> {
    let date = parse_date(cell(cells, 1, "date")?)?;
    let payer_id = parse_housemate_id(cell(cells, 2, "payer")?)?;
    let recipient_id = parse_housemate_id(cell(cells, 3, "recipient")?)?;
    let amount = parse_amount(cell(cells, 4, "amount")?)?;

    if payer_id == recipient_id {
        return Err(LedgerError::Import(
            "Settlement payer and recipient must differ".into(),
        ));
    }

    Ok(ParsedSettlement {
        date,
        payer_id,
        recipient_id,
        amount,
    })
}

fn cell<'a>(cells: &'a [String], index: usize, field: &str) -> LedgerResult<&'a str> {
    cells
        .get(index)
        .map(|s| s.trim())
        .ok_or_else(|| LedgerError::Import(format!("Missing {} column", field)))
}

fn parse_date(raw: &str) -> LedgerResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| LedgerError::Import(format!("Invalid date '{}', expected YYYY-MM-DD", raw)))
}

fn parse_amount(raw: &str) -> LedgerResult<Money> {
    let amount = Money::parse(raw)
        .map_err(|_| LedgerError::Import(format!("Invalid amount '{}'", raw)))?;
    if !amount.is_positive() {
        return Err(LedgerError::Import(format!(
            "Amount must be positive, got '{}'",
            raw
        )));
    }
    Ok(amount)
}

fn parse_housemate_id(raw: &str) -> LedgerResult<HousemateId> {
    raw.parse()
        .map_err(|_| LedgerError::Import(format!("Invalid housemate id '{}'", raw)))
}

fn parse_method(raw: &str) -> LedgerResult<SplitMethod> {
    match raw {
        "equal" => Ok(SplitMethod::Equal),
        "percentage" => Ok(SplitMethod::Percentage),
        "shares" => Ok(SplitMethod::Shares),
        "exact" => Ok(SplitMethod::Exact),
        other => Err(LedgerError::Import(format!(
            "Unknown split method '{}'",
            other
        ))),
    }
}

fn parse_splits(raw: &str, method: SplitMethod) -> LedgerResult<RowSplits> {
    let entries: Vec<&str> = raw
        .split(';')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if entries.is_empty() {
        return Err(LedgerError::Import("Splits column is empty".into()));
    }

    match method {
        SplitMethod::Equal => {
            let mut participants = Vec::with_capacity(entries.len());
            for entry in entries {
                if entry.contains('=') {
                    return Err(LedgerError::Import(format!(
                        "Equal split entry '{}' must be a bare housemate id",
                        entry
                    )));
                }
                participants.push(parse_housemate_id(entry)?);
            }
            Ok(RowSplits::Equal(participants))
        }
        SplitMethod::Percentage | SplitMethod::Shares => {
            let mut shares = Vec::with_capacity(entries.len());
            for entry in entries {
                let (id_raw, value_raw) = split_entry(entry)?;
                let value: f64 = value_raw.parse().map_err(|_| {
                    LedgerError::Import(format!("Invalid share value '{}'", value_raw))
                })?;
                if !value.is_finite() || value < 0.0 {
                    return Err(LedgerError::Import(format!(
                        "Share value '{}' must be a non-negative number",
                        value_raw
                    )));
                }
                shares.push((parse_housemate_id(id_raw)?, value));
            }
            Ok(RowSplits::Weighted(shares))
        }
        SplitMethod::Exact => {
            let mut amounts = Vec::with_capacity(entries.len());
            for entry in entries {
                let (id_raw, value_raw) = split_entry(entry)?;
                let amount = Money::parse(value_raw).map_err(|_| {
                    LedgerError::Import(format!("Invalid split amount '{}'", value_raw))
                })?;
                amounts.push((parse_housemate_id(id_raw)?, amount));
            }
            Ok(RowSplits::Exact(amounts))
        }
    }
}

fn split_entry(entry: &str) -> LedgerResult<(&str, &str)> {
    entry
        .split_once('=')
        .map(|(id, value)| (id.trim(), value.trim()))
        .ok_or_else(|| {
            LedgerError::Import(format!("Split entry '{}' must look like 'id=value'", entry))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BillKind;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn roster(n: usize) -> Vec<HousemateId> {
        (0..n).map(|_| HousemateId::new()).collect()
    }

    #[test]
    fn test_parse_equal_bill_row() {
        let ids = roster(2);
        let cells = row(&[
            "bill",
            "2025-08-15",
            "Groceries",
            "84.00",
            &ids[0].as_uuid().to_string(),
            "equal",
            &format!("{};{}", ids[0].as_uuid(), ids[1].as_uuid()),
        ]);

        let parsed = parse_row(&cells).unwrap();
        let bill = parsed.into_bill(&ids).unwrap();

        assert_eq!(bill.amount, Money::from_cents(8400));
        assert_eq!(bill.split_method, SplitMethod::Equal);
        assert_eq!(bill.splits.len(), 2);
        assert_eq!(bill.splits[0].amount, Money::from_cents(4200));
        assert_eq!(bill.kind, BillKind::Bill);
    }

    #[test]
    fn test_parse_percentage_bill_row() {
        let ids = roster(2);
        let cells = row(&[
            "bill",
            "2025-08-15",
            "Internet",
            "60.00",
            &ids[0].as_uuid().to_string(),
            "percentage",
            &format!("{}=70;{}=30", ids[0].as_uuid(), ids[1].as_uuid()),
        ]);

        let bill = parse_row(&cells).unwrap().into_bill(&ids).unwrap();
        assert_eq!(bill.splits[0].amount, Money::from_cents(4200));
        assert_eq!(bill.splits[0].share, Some(70.0));
        assert_eq!(bill.splits[1].amount, Money::from_cents(1800));
    }

    #[test]
    fn test_parse_settlement_row() {
        let ids = roster(2);
        let cells = row(&[
            "settlement",
            "2025-08-20",
            &ids[0].as_uuid().to_string(),
            &ids[1].as_uuid().to_string(),
            "30.00",
        ]);

        let bill = parse_row(&cells).unwrap().into_bill(&ids).unwrap();
        assert!(bill.is_settlement());
        assert_eq!(bill.payer_id, ids[0]);
        assert_eq!(bill.splits[0].housemate_id, ids[1]);
        assert_eq!(bill.splits[0].amount, Money::from_cents(3000));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = parse_row(&row(&["payment", "2025-08-15"])).unwrap_err();
        assert!(matches!(err, LedgerError::Import(_)));
    }

    #[test]
    fn test_bad_date_rejected() {
        let ids = roster(1);
        let cells = row(&[
            "bill",
            "08/15/2025",
            "Rent",
            "10.00",
            &ids[0].as_uuid().to_string(),
            "equal",
            &ids[0].as_uuid().to_string(),
        ]);
        assert!(matches!(
            parse_row(&cells),
            Err(LedgerError::Import(_))
        ));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let ids = roster(1);
        let cells = row(&[
            "bill",
            "2025-08-15",
            "Rent",
            "0.00",
            &ids[0].as_uuid().to_string(),
            "equal",
            &ids[0].as_uuid().to_string(),
        ]);
        assert!(parse_row(&cells).is_err());
    }

    #[test]
    fn test_missing_column_rejected() {
        assert!(parse_row(&row(&["bill", "2025-08-15", "Rent"])).is_err());
    }

    #[test]
    fn test_self_settlement_rejected() {
        let ids = roster(1);
        let id = ids[0].as_uuid().to_string();
        let cells = row(&["settlement", "2025-08-20", &id, &id, "30.00"]);
        assert!(parse_row(&cells).is_err());
    }

    #[test]
    fn test_unknown_housemate_rejected_against_roster() {
        let ids = roster(1);
        let stranger = HousemateId::new();
        let cells = row(&[
            "bill",
            "2025-08-15",
            "Rent",
            "10.00",
            &stranger.as_uuid().to_string(),
            "equal",
            &stranger.as_uuid().to_string(),
        ]);

        let parsed = parse_row(&cells).unwrap();
        let err = parsed.into_bill(&ids).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_batch_keeps_per_row_failures() {
        let ids = roster(1);
        let good = row(&[
            "bill",
            "2025-08-15",
            "Rent",
            "10.00",
            &ids[0].as_uuid().to_string(),
            "equal",
            &ids[0].as_uuid().to_string(),
        ]);
        let bad = row(&["bill", "soon", "Rent", "10.00"]);

        let results = parse_rows(&[good, bad]);
        assert_eq!(results.len(), 2);
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
        assert_eq!(results[1].0, 1);
    }
}
