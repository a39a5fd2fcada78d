//! The expense and income record types, and the closed category set.

use crate::model::Amount;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// The fixed set of spending categories.
///
/// The canonical names are what appear in workbook cells; unrecognized names
/// decode to [`Category::Miscellaneous`] rather than failing.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub enum Category {
    Grocery,
    #[serde(rename = "Eat Outside")]
    EatOutside,
    #[serde(rename = "Car Related")]
    CarRelated,
    Mobile,
    #[serde(rename = "Presto - Commute")]
    PrestoCommute,
    Utility,
    #[default]
    Miscellaneous,
    Mortgage,
    #[serde(rename = "Remittance to India")]
    RemittanceToIndia,
}

serde_plain::derive_display_from_serialize!(Category);
serde_plain::derive_fromstr_from_deserialize!(Category);

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Grocery,
        Category::EatOutside,
        Category::CarRelated,
        Category::Mobile,
        Category::PrestoCommute,
        Category::Utility,
        Category::Miscellaneous,
        Category::Mortgage,
        Category::RemittanceToIndia,
    ];

    /// Parses a workbook cell value, falling back to `Miscellaneous` for
    /// anything unrecognized.
    pub fn from_cell(value: &str) -> Category {
        Category::from_str(value.trim()).unwrap_or_default()
    }
}

/// Generates a fresh entry id. Ids are session-local identifiers: unique
/// within the record they belong to, immutable, and never written to the
/// workbook format.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// One expense row of a month.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    id: String,
    pub date: String,
    pub description: String,
    pub category: Category,
    pub cost: Amount,
}

impl Expense {
    pub(crate) fn create(new: NewExpense) -> Self {
        Self {
            id: new_id(),
            date: new.date,
            description: new.description,
            category: new.category,
            cost: new.cost,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Merges the `Some` fields of `patch` into this expense.
    pub(crate) fn apply(&mut self, patch: ExpensePatch) {
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(cost) = patch.cost {
            self.cost = cost;
        }
    }
}

/// The caller-supplied fields of a new expense; the id is assigned on insert.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NewExpense {
    pub date: String,
    pub description: String,
    pub category: Category,
    pub cost: Amount,
}

/// A partial update to an existing expense. `None` fields are left unchanged.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct ExpensePatch {
    pub date: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub cost: Option<Amount>,
}

/// One income row of a month.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Income {
    id: String,
    pub date: String,
    pub description: String,
    pub amount: Amount,
}

impl Income {
    pub(crate) fn create(new: NewIncome) -> Self {
        Self {
            id: new_id(),
            date: new.date,
            description: new.description,
            amount: new.amount,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// The caller-supplied fields of a new income entry.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NewIncome {
    pub date: String,
    pub description: String,
    pub amount: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_display() {
        assert_eq!(Category::Grocery.to_string(), "Grocery");
        assert_eq!(Category::EatOutside.to_string(), "Eat Outside");
        assert_eq!(Category::PrestoCommute.to_string(), "Presto - Commute");
        assert_eq!(Category::RemittanceToIndia.to_string(), "Remittance to India");
    }

    #[test]
    fn test_category_round_trip() {
        for category in Category::ALL {
            let parsed = Category::from_str(&category.to_string()).unwrap();
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn test_category_from_cell_unknown_falls_back() {
        assert_eq!(Category::from_cell("Groceries"), Category::Miscellaneous);
        assert_eq!(Category::from_cell(""), Category::Miscellaneous);
        assert_eq!(Category::from_cell(" Utility "), Category::Utility);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_expense_patch() {
        let mut expense = Expense::create(NewExpense {
            date: "2025-03-01".to_string(),
            description: "Groceries".to_string(),
            category: Category::Grocery,
            cost: Amount::from(50),
        });
        let id = expense.id().to_string();

        expense.apply(ExpensePatch {
            cost: Some(Amount::from(60)),
            ..Default::default()
        });

        assert_eq!(expense.cost, Amount::from(60));
        assert_eq!(expense.description, "Groceries");
        assert_eq!(expense.id(), id);
    }
}
