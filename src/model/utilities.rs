//! Raw monthly utility bill line items for the shared residence.

use crate::model::Amount;
use serde::{Deserialize, Serialize};

/// The five utility bill readings for one month. A `None` field means the
/// bill has not been entered; it is treated as zero wherever a number is
/// needed.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UtilityReadings {
    #[serde(default)]
    pub water: Option<Amount>,
    #[serde(default)]
    pub elec_base: Option<Amount>,
    #[serde(default)]
    pub elec_main: Option<Amount>,
    #[serde(default)]
    pub gas: Option<Amount>,
    #[serde(default)]
    pub internet: Option<Amount>,
}

impl UtilityReadings {
    /// True when no reading has been entered.
    pub fn is_empty(&self) -> bool {
        self.water.is_none()
            && self.elec_base.is_none()
            && self.elec_main.is_none()
            && self.gas.is_none()
            && self.internet.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        assert!(UtilityReadings::default().is_empty());
    }

    #[test]
    fn test_not_empty_with_one_reading() {
        let readings = UtilityReadings {
            gas: Some(Amount::from(10)),
            ..Default::default()
        };
        assert!(!readings.is_empty());
    }

    #[test]
    fn test_serde_round_trip() {
        let readings = UtilityReadings {
            water: Some(Amount::from(100)),
            internet: Some(Amount::from(40)),
            ..Default::default()
        };
        let json = serde_json::to_string(&readings).unwrap();
        let back: UtilityReadings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, readings);
    }
}
