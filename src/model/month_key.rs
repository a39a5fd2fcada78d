//! The `MonthKey` type identifies one calendar month of the ledger.
//!
//! Its canonical string form, e.g. `"Mar 2025"`, doubles as the workbook
//! sheet name, so parsing must be the exact inverse of formatting for every
//! key ever produced.

use anyhow::bail;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Short month names, in month order. Index is the zero-based month.
pub const MONTHS_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Identifies a calendar month as a year plus a zero-based month index.
/// Ordering is by `(year, month0)`, so sorted keys are chronological.
/// Serializes to the canonical `"Mar 2025"` form.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MonthKey {
    year: i32,
    month0: u32,
}

impl MonthKey {
    /// Creates a key for the given year and zero-based month (0 = January).
    pub fn new(year: i32, month0: u32) -> crate::Result<Self> {
        if month0 > 11 {
            bail!("Month index must be 0-11, got {month0}");
        }
        Ok(Self { year, month0 })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// The zero-based month index (0 = January).
    pub fn month0(&self) -> u32 {
        self.month0
    }

    /// The short month name, e.g. `"Mar"`.
    pub fn short_name(&self) -> &'static str {
        MONTHS_SHORT[self.month0 as usize]
    }

    /// The ISO date of the first day of the month, e.g. `"2025-03-01"`.
    /// Used as the default entry date for this month.
    pub fn first_day(&self) -> String {
        format!("{:04}-{:02}-01", self.year, self.month0 + 1)
    }

    /// The current calendar month in local time.
    pub fn current() -> Self {
        use chrono::Datelike;
        let today = chrono::Local::now().date_naive();
        Self {
            year: today.year(),
            month0: today.month0(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.short_name(), self.year)
    }
}

impl FromStr for MonthKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Expected format: "Mar 2025"
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.len() != 2 {
            bail!("A month key must be '<Mon> <year>', got: {s}");
        }

        let Some(month0) = MONTHS_SHORT.iter().position(|m| *m == parts[0]) else {
            bail!("Unrecognized month name '{}' in key: {s}", parts[0]);
        };

        let year = parts[1]
            .parse::<i32>()
            .map_err(|e| anyhow::anyhow!("Invalid year in key '{s}': {e}"))?;

        Ok(MonthKey {
            year,
            month0: month0 as u32,
        })
    }
}

impl Serialize for MonthKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MonthKey::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let key = MonthKey::new(2025, 2).unwrap();
        assert_eq!(key.to_string(), "Mar 2025");

        let key = MonthKey::new(1999, 11).unwrap();
        assert_eq!(key.to_string(), "Dec 1999");
    }

    #[test]
    fn test_from_str() {
        let key: MonthKey = "Mar 2025".parse().unwrap();
        assert_eq!(key, MonthKey::new(2025, 2).unwrap());

        // Extra whitespace is tolerated.
        let key: MonthKey = "  Jan   2024 ".parse().unwrap();
        assert_eq!(key, MonthKey::new(2024, 0).unwrap());
    }

    #[test]
    fn test_from_str_invalid() {
        assert!("Foo 2025".parse::<MonthKey>().is_err()); // Unknown month
        assert!("Mar".parse::<MonthKey>().is_err()); // Missing year
        assert!("Mar 20x5".parse::<MonthKey>().is_err()); // Non-numeric year
        assert!("March 2025".parse::<MonthKey>().is_err()); // Long month name
    }

    #[test]
    fn test_bijection() {
        for year in [1999, 2024, 2025, 2100] {
            for month0 in 0..12 {
                let key = MonthKey::new(year, month0).unwrap();
                let parsed: MonthKey = key.to_string().parse().unwrap();
                assert_eq!(parsed, key);
            }
        }
    }

    #[test]
    fn test_ordering_is_chronological() {
        let a = MonthKey::new(2024, 11).unwrap();
        let b = MonthKey::new(2025, 0).unwrap();
        let c = MonthKey::new(2025, 1).unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_month_out_of_range() {
        assert!(MonthKey::new(2025, 12).is_err());
    }

    #[test]
    fn test_first_day() {
        let key = MonthKey::new(2025, 2).unwrap();
        assert_eq!(key.first_day(), "2025-03-01");
    }

    #[test]
    fn test_serde_as_map_key() {
        use std::collections::BTreeMap;
        let mut map = BTreeMap::new();
        map.insert(MonthKey::new(2025, 2).unwrap(), 1);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"Mar 2025":1}"#);
        let back: BTreeMap<MonthKey, i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
