//! In-memory ledger model and business logic
//!
//! The [`Ledger`] owns the housemate roster, the category set, and bills
//! bucketed by calendar year. Balances are a derived cache rebuilt from the
//! full bill fold after every mutation; they are never persisted as a source
//! of truth.

pub mod balance;
pub mod split;

use std::collections::{BTreeMap, HashMap};

pub use balance::{plan_settlement, recompute_balances, Transfer};
pub use split::{compute_splits, recompute_bill_splits, SplitRequest};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    Bill, BillCategory, BillId, BillingMonth, CategoryId, Housemate, HousemateId, Money,
};

/// Roster, category, and ledger metadata persisted under the meta key
///
/// Deliberately excludes balances: a stored balance snapshot would be a
/// second authority competing with the bill fold.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerMeta {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Active housemate roster
    #[serde(default)]
    pub housemates: Vec<Housemate>,

    /// Bill categories
    #[serde(default)]
    pub categories: Vec<BillCategory>,
}

fn default_schema_version() -> u32 {
    1
}

/// The in-memory bill-splitting ledger
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    meta: LedgerMeta,
    /// Bills grouped by calendar year, matching the per-year store records
    bills: BTreeMap<i32, Vec<Bill>>,
    /// Read-through cache over the balance fold
    balances: HashMap<HousemateId, Money>,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted parts
    pub fn from_parts(meta: LedgerMeta, bills: BTreeMap<i32, Vec<Bill>>) -> Self {
        let mut ledger = Self {
            meta,
            bills,
            balances: HashMap::new(),
        };
        ledger.rebuild_balances();
        ledger
    }

    /// The ledger metadata (roster + categories)
    pub fn meta(&self) -> &LedgerMeta {
        &self.meta
    }

    /// Bills grouped by year
    pub fn bills_by_year(&self) -> &BTreeMap<i32, Vec<Bill>> {
        &self.bills
    }

    // --- roster ---

    /// The active housemate roster
    pub fn housemates(&self) -> &[Housemate] {
        &self.meta.housemates
    }

    /// Ids of all active housemates, in roster order
    pub fn roster_ids(&self) -> Vec<HousemateId> {
        self.meta.housemates.iter().map(|h| h.id).collect()
    }

    /// Add a housemate to the roster
    pub fn add_housemate(&mut self, name: impl Into<String>) -> HousemateId {
        let housemate = Housemate::new(name);
        let id = housemate.id;
        self.meta.housemates.push(housemate);
        self.rebuild_balances();
        id
    }

    /// Remove a housemate from the active roster
    ///
    /// Historical bills keep their references; only the roster entry goes.
    pub fn remove_housemate(&mut self, id: HousemateId) -> LedgerResult<()> {
        let before = self.meta.housemates.len();
        self.meta.housemates.retain(|h| h.id != id);
        if self.meta.housemates.len() == before {
            return Err(LedgerError::housemate_not_found(id.to_string()));
        }
        self.rebuild_balances();
        Ok(())
    }

    // --- categories ---

    /// The category set
    pub fn categories(&self) -> &[BillCategory] {
        &self.meta.categories
    }

    /// Add a category
    pub fn add_category(&mut self, name: impl Into<String>) -> CategoryId {
        let category = BillCategory::new(name);
        let id = category.id;
        self.meta.categories.push(category);
        id
    }

    /// Rename a category
    pub fn rename_category(&mut self, id: CategoryId, name: impl Into<String>) -> LedgerResult<()> {
        let category = self
            .meta
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| LedgerError::category_not_found(id.to_string()))?;
        category.name = name.into();
        Ok(())
    }

    /// Mark a category as the default, clearing the flag on all others
    pub fn set_default_category(&mut self, id: CategoryId) -> LedgerResult<()> {
        if !self.meta.categories.iter().any(|c| c.id == id) {
            return Err(LedgerError::category_not_found(id.to_string()));
        }
        for category in &mut self.meta.categories {
            category.is_default = category.id == id;
        }
        Ok(())
    }

    /// Remove a category; bills referencing it keep the dangling id
    pub fn remove_category(&mut self, id: CategoryId) -> LedgerResult<()> {
        let before = self.meta.categories.len();
        self.meta.categories.retain(|c| c.id != id);
        if self.meta.categories.len() == before {
            return Err(LedgerError::category_not_found(id.to_string()));
        }
        Ok(())
    }

    // --- bills ---

    /// Add a bill, validating it and recomputing balances
    pub fn add_bill(&mut self, bill: Bill) -> LedgerResult<BillId> {
        bill.validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;
        let id = bill.id;
        self.bills.entry(bill.date.year()).or_default().push(bill);
        self.rebuild_balances();
        Ok(id)
    }

    /// Replace a bill in place, recomputing its splits against the current
    /// roster and refolding balances
    pub fn update_bill(&mut self, mut bill: Bill) -> LedgerResult<()> {
        let roster = self.roster_ids();
        recompute_bill_splits(&mut bill, &roster);
        bill.validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        let id = bill.id;
        self.remove_bill_entry(id)?;
        self.bills.entry(bill.date.year()).or_default().push(bill);
        self.rebuild_balances();
        Ok(())
    }

    /// Delete a bill; its balance effect is reversed by refolding the rest
    pub fn remove_bill(&mut self, id: BillId) -> LedgerResult<()> {
        self.remove_bill_entry(id)?;
        self.rebuild_balances();
        Ok(())
    }

    fn remove_bill_entry(&mut self, id: BillId) -> LedgerResult<()> {
        for bills in self.bills.values_mut() {
            if let Some(pos) = bills.iter().position(|b| b.id == id) {
                bills.remove(pos);
                return Ok(());
            }
        }
        Err(LedgerError::bill_not_found(id.to_string()))
    }

    /// Look up a bill by id
    pub fn bill(&self, id: BillId) -> Option<&Bill> {
        self.bills.values().flatten().find(|b| b.id == id)
    }

    /// Record a direct payment from `payer` to `recipient`
    pub fn record_settlement(
        &mut self,
        payer: HousemateId,
        recipient: HousemateId,
        amount: Money,
        date: NaiveDate,
    ) -> LedgerResult<BillId> {
        self.add_bill(Bill::settlement(payer, recipient, amount, date))
    }

    /// All bills for one calendar year, in insertion order
    pub fn bills_for_year(&self, year: i32) -> &[Bill] {
        self.bills.get(&year).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All bills in one billing month
    pub fn bills_for_month(&self, month: BillingMonth) -> Vec<&Bill> {
        self.bills_for_year(month.year)
            .iter()
            .filter(|b| b.billing_month == month)
            .collect()
    }

    /// Total number of bills across all years
    pub fn bill_count(&self) -> usize {
        self.bills.values().map(Vec::len).sum()
    }

    // --- balances ---

    /// Current net balances (positive = owed money, negative = owes)
    pub fn balances(&self) -> &HashMap<HousemateId, Money> {
        &self.balances
    }

    /// A settlement plan for the current balances
    pub fn settlement_plan(&self) -> Vec<Transfer> {
        plan_settlement(&self.balances)
    }

    /// Rebuild the balance cache from the full bill fold
    fn rebuild_balances(&mut self) {
        let all_bills: Vec<Bill> = self.bills.values().flatten().cloned().collect();
        self.balances = recompute_balances(&all_bills, &self.roster_ids());
    }
}
