//! Balance engine
//!
//! Folds the full bill list into net balances per housemate and computes a
//! greedy minimum-transaction settlement plan. The fold is the single source
//! of truth: no persisted balance snapshot is ever trusted over replaying
//! the bills.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{Bill, HousemateId, Money};

/// Balances below this magnitude (1 cent) count as settled
const SETTLED_EPSILON: i64 = 1;

/// One planned repayment between two housemates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Who pays
    pub from: HousemateId,
    /// Who receives
    pub to: HousemateId,
    /// How much
    pub amount: Money,
}

/// Fold a bill list into net balances per housemate
///
/// Positive means the housemate is owed money, negative means they owe.
/// Every bill, settlements included, follows the same rule: the payer's
/// balance rises by the full amount and each split's housemate falls by the
/// split amount. The fold is idempotent; calling it twice on the same list
/// yields identical balances regardless of any prior incremental state.
///
/// Housemates no longer on the roster still accumulate entries when bills
/// reference them; known participants with no bills get an explicit zero.
pub fn recompute_balances(
    bills: &[Bill],
    participants: &[HousemateId],
) -> HashMap<HousemateId, Money> {
    let mut balances: HashMap<HousemateId, Money> = participants
        .iter()
        .map(|&id| (id, Money::zero()))
        .collect();

    for bill in bills {
        *balances.entry(bill.payer_id).or_default() += bill.amount;
        for split in &bill.splits {
            *balances.entry(split.housemate_id).or_default() -= split.amount;
        }
    }

    balances
}

/// Compute a greedy minimum-transaction settlement plan
///
/// Largest remaining debtor pays the largest remaining creditor the smaller
/// of their remainders, repeatedly, skipping anyone within a cent of zero.
/// Ties sort by housemate id so the plan is deterministic. The plan length
/// is bounded by debtors + creditors − 1.
pub fn plan_settlement(balances: &HashMap<HousemateId, Money>) -> Vec<Transfer> {
    let mut debtors: Vec<(HousemateId, Money)> = balances
        .iter()
        .filter(|(_, &balance)| balance.cents() < -SETTLED_EPSILON)
        .map(|(&id, &balance)| (id, balance.abs()))
        .collect();
    let mut creditors: Vec<(HousemateId, Money)> = balances
        .iter()
        .filter(|(_, &balance)| balance.cents() > SETTLED_EPSILON)
        .map(|(&id, &balance)| (id, balance))
        .collect();

    // Largest first; equal amounts break ties by id for determinism.
    debtors.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    creditors.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut plan = Vec::new();
    let (mut d, mut c) = (0, 0);

    while d < debtors.len() && c < creditors.len() {
        let amount = debtors[d].1.min(creditors[c].1);
        plan.push(Transfer {
            from: debtors[d].0,
            to: creditors[c].0,
            amount,
        });

        debtors[d].1 -= amount;
        creditors[c].1 -= amount;

        if debtors[d].1.cents() <= SETTLED_EPSILON {
            d += 1;
        }
        if creditors[c].1.cents() <= SETTLED_EPSILON {
            c += 1;
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::split::{compute_splits, SplitRequest};
    use crate::models::Bill;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 15).unwrap()
    }

    fn equal_bill(
        amount: i64,
        payer: HousemateId,
        participants: &[HousemateId],
    ) -> Bill {
        let mut bill = Bill::new("bill", Money::from_cents(amount), payer, date());
        bill.splits = compute_splits(bill.amount, SplitRequest::Equal { participants });
        bill
    }

    #[test]
    fn test_two_way_equal_bill_balances() {
        // $100 equal between Alice and Bob, Alice paid:
        // Alice +50, Bob -50.
        let alice = HousemateId::new();
        let bob = HousemateId::new();
        let bill = equal_bill(10000, alice, &[alice, bob]);

        let balances = recompute_balances(&[bill], &[alice, bob]);
        assert_eq!(balances[&alice].cents(), 5000);
        assert_eq!(balances[&bob].cents(), -5000);
    }

    #[test]
    fn test_balances_zero_sum() {
        let ids: Vec<HousemateId> = (0..4).map(|_| HousemateId::new()).collect();
        let bills = vec![
            equal_bill(12000, ids[0], &ids),
            equal_bill(4400, ids[1], &ids[..2]),
            equal_bill(9999, ids[2], &ids[1..]),
        ];

        let balances = recompute_balances(&bills, &ids);
        let sum: i64 = balances.values().map(|m| m.cents()).sum();
        // Rounding drift from equal splits, at most 1 cent per participant
        // per bill.
        assert!(sum.abs() <= 12, "zero-sum violated: {}", sum);
    }

    #[test]
    fn test_settlement_uses_same_fold_rule() {
        let alice = HousemateId::new();
        let bob = HousemateId::new();

        // Bob owes Alice 50, then settles in full.
        let bill = equal_bill(10000, alice, &[alice, bob]);
        let settlement = Bill::settlement(bob, alice, Money::from_cents(5000), date());

        let balances = recompute_balances(&[bill, settlement], &[alice, bob]);
        assert_eq!(balances[&alice].cents(), 0);
        assert_eq!(balances[&bob].cents(), 0);
    }

    #[test]
    fn test_dangling_housemate_still_counted() {
        let alice = HousemateId::new();
        let departed = HousemateId::new();
        let bill = equal_bill(10000, alice, &[alice, departed]);

        // `departed` is no longer on the roster but still owes their share.
        let balances = recompute_balances(&[bill], &[alice]);
        assert_eq!(balances[&departed].cents(), -5000);
    }

    #[test]
    fn test_known_participant_without_bills_is_zero() {
        let alice = HousemateId::new();
        let idle = HousemateId::new();
        let balances = recompute_balances(&[], &[alice, idle]);
        assert_eq!(balances[&idle], Money::zero());
    }

    #[test]
    fn test_idempotent_recompute() {
        let ids: Vec<HousemateId> = (0..3).map(|_| HousemateId::new()).collect();
        let bills = vec![
            equal_bill(7500, ids[0], &ids),
            equal_bill(3000, ids[1], &ids),
        ];

        let first = recompute_balances(&bills, &ids);
        let second = recompute_balances(&bills, &ids);
        assert_eq!(first, second);
    }

    #[test]
    fn test_single_pair_plan_is_one_transfer() {
        // balances {Alice: +30, Bob: -30} -> [{Bob -> Alice, 30}]
        let alice = HousemateId::new();
        let bob = HousemateId::new();
        let balances = HashMap::from([
            (alice, Money::from_cents(3000)),
            (bob, Money::from_cents(-3000)),
        ]);

        let plan = plan_settlement(&balances);
        assert_eq!(
            plan,
            vec![Transfer {
                from: bob,
                to: alice,
                amount: Money::from_cents(3000),
            }]
        );
    }

    #[test]
    fn test_plan_settles_all_balances() {
        let ids: Vec<HousemateId> = (0..5).map(|_| HousemateId::new()).collect();
        let mut balances = HashMap::from([
            (ids[0], Money::from_cents(7000)),
            (ids[1], Money::from_cents(2500)),
            (ids[2], Money::from_cents(-4000)),
            (ids[3], Money::from_cents(-3500)),
            (ids[4], Money::from_cents(-2000)),
        ]);

        let plan = plan_settlement(&balances);

        // Apply the transfers; every balance must land within a cent of zero.
        for t in &plan {
            *balances.get_mut(&t.from).unwrap() += t.amount;
            *balances.get_mut(&t.to).unwrap() -= t.amount;
        }
        for (id, balance) in &balances {
            assert!(
                balance.abs().cents() <= 1,
                "{} left with {}",
                id,
                balance
            );
        }
    }

    #[test]
    fn test_plan_applied_as_settlement_bills_zeroes_ledger() {
        // Settlement validity through the fold itself, not manual arithmetic.
        let ids: Vec<HousemateId> = (0..3).map(|_| HousemateId::new()).collect();
        let mut bills = vec![
            equal_bill(9000, ids[0], &ids),
            equal_bill(3000, ids[1], &ids),
        ];

        let balances = recompute_balances(&bills, &ids);
        for t in plan_settlement(&balances) {
            bills.push(Bill::settlement(t.from, t.to, t.amount, date()));
        }

        let settled = recompute_balances(&bills, &ids);
        for balance in settled.values() {
            assert!(balance.abs().cents() <= 1);
        }
    }

    #[test]
    fn test_plan_size_bound() {
        let ids: Vec<HousemateId> = (0..6).map(|_| HousemateId::new()).collect();
        let balances = HashMap::from([
            (ids[0], Money::from_cents(5000)),
            (ids[1], Money::from_cents(5000)),
            (ids[2], Money::from_cents(2000)),
            (ids[3], Money::from_cents(-4000)),
            (ids[4], Money::from_cents(-4000)),
            (ids[5], Money::from_cents(-4000)),
        ]);

        let plan = plan_settlement(&balances);
        // 3 debtors + 3 creditors: never more than 5 transactions.
        assert!(plan.len() <= 5);
    }

    #[test]
    fn test_plan_ignores_sub_cent_dust() {
        let alice = HousemateId::new();
        let bob = HousemateId::new();
        let balances = HashMap::from([
            (alice, Money::from_cents(1)),
            (bob, Money::from_cents(-1)),
        ]);

        assert!(plan_settlement(&balances).is_empty());
    }

    #[test]
    fn test_plan_is_deterministic() {
        let ids: Vec<HousemateId> = (0..4).map(|_| HousemateId::new()).collect();
        let balances = HashMap::from([
            (ids[0], Money::from_cents(3000)),
            (ids[1], Money::from_cents(3000)),
            (ids[2], Money::from_cents(-3000)),
            (ids[3], Money::from_cents(-3000)),
        ]);

        let a = plan_settlement(&balances);
        let b = plan_settlement(&balances);
        assert_eq!(a, b);
    }
}
