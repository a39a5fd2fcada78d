//! The ledger: a mapping of calendar months to their records, and the CRUD
//! mutations over it.
//!
//! Every mutation is a total function: a missing month is created on first
//! write, and deleting or updating a missing id is a no-op rather than an
//! error. Reading never materializes a month.

use crate::model::{
    Amount, Expense, ExpensePatch, Income, MonthKey, NewExpense, NewIncome, UtilityReadings,
};
use crate::split::compute_split;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One month's expenses, incomes and utility readings. All fields default to
/// empty; a record absent from the ledger is equivalent to an all-empty one.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MonthRecord {
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub incomes: Vec<Income>,
    #[serde(default)]
    pub utilities: UtilityReadings,
}

impl MonthRecord {
    /// Sum of all expense costs.
    pub fn total_expenses(&self) -> Amount {
        self.expenses.iter().map(|e| e.cost).sum()
    }

    /// Sum of all income amounts.
    pub fn total_income(&self) -> Amount {
        self.incomes.iter().map(|i| i.amount).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty() && self.incomes.is_empty() && self.utilities.is_empty()
    }
}

/// Derived month totals, consumed by dashboards and written to the
/// MONTH SUMMARY section of the workbook. Never persisted as such;
/// recomputed from the record on demand.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MonthSummary {
    pub total_income: Amount,
    pub total_expenses: Amount,
    pub tenant_overage: Amount,
    pub total_outflow: Amount,
    pub net_savings: Amount,
}

/// Computes the derived totals for one month record. The tenant's utility
/// overage counts as an outflow alongside the recorded expenses.
pub fn month_summary(record: &MonthRecord) -> MonthSummary {
    let total_income = record.total_income();
    let total_expenses = record.total_expenses();
    let tenant_overage = compute_split(Some(&record.utilities))
        .map(|s| s.tenant.overage)
        .unwrap_or(Amount::ZERO);
    let total_outflow = total_expenses + tenant_overage;
    let net_savings = Amount::new(
        total_income.value() - total_expenses.value() - tenant_overage.value(),
    );
    MonthSummary {
        total_income,
        total_expenses,
        tenant_overage,
        total_outflow,
        net_savings,
    }
}

/// The full ledger: month records keyed by [`MonthKey`]. Iteration order is
/// chronological because `MonthKey` orders by `(year, month)`.
///
/// This is the document of record. Its JSON serialization (an object keyed by
/// canonical month strings) is the durable-cache snapshot format.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    months: BTreeMap<MonthKey, MonthRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// The number of months that have a materialized record.
    pub fn len(&self) -> usize {
        self.months.len()
    }

    /// The record for `key`, if one has been materialized. Never creates.
    pub fn month(&self, key: MonthKey) -> Option<&MonthRecord> {
        self.months.get(&key)
    }

    /// All months in chronological order.
    pub fn months(&self) -> impl Iterator<Item = (&MonthKey, &MonthRecord)> {
        self.months.iter()
    }

    /// The most recent month with a record, e.g. to navigate to after a
    /// document has been opened.
    pub fn latest_month(&self) -> Option<MonthKey> {
        self.months.keys().next_back().copied()
    }

    /// Inserts a record wholesale. Used by the document decoder.
    pub(crate) fn insert(&mut self, key: MonthKey, record: MonthRecord) {
        self.months.insert(key, record);
    }

    /// The month record for `key`, created empty if missing.
    fn record_mut(&mut self, key: MonthKey) -> &mut MonthRecord {
        self.months.entry(key).or_default()
    }

    /// Appends an expense with a fresh id, creating the month if needed.
    pub fn add_expense(&mut self, key: MonthKey, new: NewExpense) -> &Expense {
        let record = self.record_mut(key);
        record.expenses.push(Expense::create(new));
        record.expenses.last().expect("just pushed")
    }

    /// Removes the expense with the given id. Returns false (and changes
    /// nothing) when no such expense exists.
    pub fn delete_expense(&mut self, key: MonthKey, id: &str) -> bool {
        let Some(record) = self.months.get_mut(&key) else {
            return false;
        };
        let before = record.expenses.len();
        record.expenses.retain(|e| e.id() != id);
        record.expenses.len() != before
    }

    /// Merges the patch into the expense with the given id. Returns false
    /// (and changes nothing) when no such expense exists.
    pub fn update_expense(&mut self, key: MonthKey, id: &str, patch: ExpensePatch) -> bool {
        let Some(record) = self.months.get_mut(&key) else {
            return false;
        };
        match record.expenses.iter_mut().find(|e| e.id() == id) {
            Some(expense) => {
                expense.apply(patch);
                true
            }
            None => false,
        }
    }

    /// Appends an income entry with a fresh id, creating the month if needed.
    pub fn add_income(&mut self, key: MonthKey, new: NewIncome) -> &Income {
        let record = self.record_mut(key);
        record.incomes.push(Income::create(new));
        record.incomes.last().expect("just pushed")
    }

    /// Removes the income entry with the given id. Returns false when no such
    /// entry exists.
    pub fn delete_income(&mut self, key: MonthKey, id: &str) -> bool {
        let Some(record) = self.months.get_mut(&key) else {
            return false;
        };
        let before = record.incomes.len();
        record.incomes.retain(|i| i.id() != id);
        record.incomes.len() != before
    }

    /// Replaces the month's utility readings wholesale (not merged).
    pub fn set_utilities(&mut self, key: MonthKey, readings: UtilityReadings) {
        self.record_mut(key).utilities = readings;
    }

    /// Removes every record. The only deletion short of replacing the whole
    /// ledger from a decoded document.
    pub fn clear(&mut self) {
        self.months.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;

    fn key() -> MonthKey {
        MonthKey::new(2025, 2).unwrap()
    }

    fn expense(description: &str, cost: i64) -> NewExpense {
        NewExpense {
            date: "2025-03-05".to_string(),
            description: description.to_string(),
            category: Category::Grocery,
            cost: Amount::from(cost),
        }
    }

    #[test]
    fn test_add_expense_creates_month() {
        let mut ledger = Ledger::new();
        assert!(ledger.month(key()).is_none());

        ledger.add_expense(key(), expense("Groceries", 50));

        let record = ledger.month(key()).unwrap();
        assert_eq!(record.expenses.len(), 1);
        assert_eq!(record.expenses[0].description, "Groceries");
    }

    #[test]
    fn test_reading_never_materializes() {
        let ledger = Ledger::new();
        assert!(ledger.month(key()).is_none());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_delete_expense() {
        let mut ledger = Ledger::new();
        let id = ledger.add_expense(key(), expense("Groceries", 50)).id().to_string();

        assert!(ledger.delete_expense(key(), &id));
        assert!(ledger.month(key()).unwrap().expenses.is_empty());
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let mut ledger = Ledger::new();
        ledger.add_expense(key(), expense("Groceries", 50));
        let snapshot = ledger.clone();

        assert!(!ledger.delete_expense(key(), "no-such-id"));
        assert!(!ledger.delete_expense(MonthKey::new(2030, 0).unwrap(), "x"));
        assert_eq!(ledger, snapshot);
        // The missing month was not created by the failed delete.
        assert!(ledger.month(MonthKey::new(2030, 0).unwrap()).is_none());
    }

    #[test]
    fn test_update_expense_merges() {
        let mut ledger = Ledger::new();
        let id = ledger.add_expense(key(), expense("Groceries", 50)).id().to_string();

        let updated = ledger.update_expense(
            key(),
            &id,
            ExpensePatch {
                cost: Some(Amount::from(75)),
                ..Default::default()
            },
        );
        assert!(updated);

        let record = ledger.month(key()).unwrap();
        assert_eq!(record.expenses[0].cost, Amount::from(75));
        assert_eq!(record.expenses[0].description, "Groceries");
    }

    #[test]
    fn test_update_missing_is_noop() {
        let mut ledger = Ledger::new();
        assert!(!ledger.update_expense(key(), "nope", ExpensePatch::default()));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_income_add_delete() {
        let mut ledger = Ledger::new();
        let id = ledger
            .add_income(
                key(),
                NewIncome {
                    date: "2025-03-01".to_string(),
                    description: "Salary".to_string(),
                    amount: Amount::from(4000),
                },
            )
            .id()
            .to_string();

        assert_eq!(ledger.month(key()).unwrap().total_income(), Amount::from(4000));
        assert!(ledger.delete_income(key(), &id));
        assert!(!ledger.delete_income(key(), &id));
    }

    #[test]
    fn test_set_utilities_replaces_wholesale() {
        let mut ledger = Ledger::new();
        ledger.set_utilities(
            key(),
            UtilityReadings {
                water: Some(Amount::from(100)),
                gas: Some(Amount::from(50)),
                ..Default::default()
            },
        );
        ledger.set_utilities(
            key(),
            UtilityReadings {
                internet: Some(Amount::from(40)),
                ..Default::default()
            },
        );

        let utilities = &ledger.month(key()).unwrap().utilities;
        assert!(utilities.water.is_none());
        assert_eq!(utilities.internet, Some(Amount::from(40)));
    }

    #[test]
    fn test_latest_month() {
        let mut ledger = Ledger::new();
        assert!(ledger.latest_month().is_none());
        ledger.add_expense(MonthKey::new(2025, 0).unwrap(), expense("a", 1));
        ledger.add_expense(MonthKey::new(2024, 11).unwrap(), expense("b", 1));
        assert_eq!(ledger.latest_month(), Some(MonthKey::new(2025, 0).unwrap()));
    }

    #[test]
    fn test_clear() {
        let mut ledger = Ledger::new();
        ledger.add_expense(key(), expense("Groceries", 50));
        ledger.clear();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_month_summary() {
        let mut ledger = Ledger::new();
        ledger.add_expense(key(), expense("Groceries", 50));
        ledger.add_income(
            key(),
            NewIncome {
                date: "2025-03-01".to_string(),
                description: "Salary".to_string(),
                amount: Amount::from(4000),
            },
        );
        ledger.set_utilities(
            key(),
            UtilityReadings {
                water: Some(Amount::from(100)),
                elec_base: Some(Amount::from(150)),
                elec_main: Some(Amount::from(80)),
                gas: Some(Amount::from(50)),
                internet: Some(Amount::from(40)),
            },
        );

        let summary = month_summary(ledger.month(key()).unwrap());
        assert_eq!(summary.total_income, Amount::from(4000));
        assert_eq!(summary.total_expenses, Amount::from(50));
        assert_eq!(summary.tenant_overage, Amount::from(10));
        assert_eq!(summary.total_outflow, Amount::from(60));
        assert_eq!(summary.net_savings, Amount::from(3940));
    }

    #[test]
    fn test_json_round_trip() {
        let mut ledger = Ledger::new();
        ledger.add_expense(key(), expense("Groceries", 50));
        ledger.set_utilities(
            key(),
            UtilityReadings {
                gas: Some(Amount::from(50)),
                ..Default::default()
            },
        );

        let json = serde_json::to_string(&ledger).unwrap();
        let back: Ledger = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ledger);
    }
}
