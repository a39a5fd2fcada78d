//! The tenant/landlord utility cost split.
//!
//! The basement tenant pays 40% of water and gas and 100% of the basement
//! electricity meter; the main-unit meter and internet are the landlord's.
//! A fixed cap limits the tenant's liability: they owe only the part of
//! their calculated share that exceeds the cap. The landlord pays every bill
//! up front and is reimbursed the overage.
//!
//! All arithmetic is in `Decimal` with no intermediate rounding; rounding to
//! two decimal places happens only when values are written to cells or
//! displayed.

use crate::model::{Amount, UtilityReadings};
use rust_decimal::Decimal;
use serde::Serialize;

/// The cap on the tenant's monthly utility share, in currency units.
pub const TENANT_CAP: Decimal = Decimal::from_parts(200, 0, 0, false, 0);

/// The tenant's fraction of the water and gas bills (40%).
const TENANT_RATIO: Decimal = Decimal::from_parts(4, 0, 0, false, 1);

/// The tenant's side of the split.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TenantShare {
    /// 40% of the water bill.
    pub water: Amount,
    /// 40% of the gas bill.
    pub gas: Amount,
    /// The basement electricity bill in full.
    pub elec: Amount,
    /// Sum of the shares above, before the cap is applied.
    pub calc: Amount,
    /// What the tenant actually owes: the excess of `calc` over the cap.
    pub overage: Amount,
    /// True when `calc` exceeds the cap.
    pub is_over: bool,
}

/// The landlord's side of the split.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LandlordShare {
    /// The full utility bill, which the landlord pays up front.
    pub total_bill: Amount,
    /// Reimbursed by the tenant; equals the tenant's overage.
    pub tenant_reimbursement: Amount,
    /// Net cost after reimbursement.
    pub net_cost: Amount,
}

/// The derived cost allocation for one month's readings. Never persisted;
/// recomputed from [`UtilityReadings`] on demand.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct UtilitySplit {
    pub total: Amount,
    pub tenant: TenantShare,
    pub landlord: LandlordShare,
}

/// Computes the tenant/landlord split. Returns `None` when there are no
/// readings to split.
pub fn compute_split(readings: Option<&UtilityReadings>) -> Option<UtilitySplit> {
    let readings = readings?;

    let value = |amount: Option<Amount>| amount.map(|a| a.value()).unwrap_or(Decimal::ZERO);
    let water = value(readings.water);
    let elec_base = value(readings.elec_base);
    let elec_main = value(readings.elec_main);
    let gas = value(readings.gas);
    let internet = value(readings.internet);

    let total = water + elec_base + elec_main + gas + internet;

    let tenant_water = water * TENANT_RATIO;
    let tenant_gas = gas * TENANT_RATIO;
    let tenant_elec = elec_base;
    let tenant_calc = tenant_water + tenant_gas + tenant_elec;
    let overage = (tenant_calc - TENANT_CAP).max(Decimal::ZERO);

    Some(UtilitySplit {
        total: Amount::new(total),
        tenant: TenantShare {
            water: Amount::new(tenant_water),
            gas: Amount::new(tenant_gas),
            elec: Amount::new(tenant_elec),
            calc: Amount::new(tenant_calc),
            overage: Amount::new(overage),
            is_over: tenant_calc > TENANT_CAP,
        },
        landlord: LandlordShare {
            total_bill: Amount::new(total),
            tenant_reimbursement: Amount::new(overage),
            net_cost: Amount::new(total - overage),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readings(water: i64, elec_base: i64, elec_main: i64, gas: i64, internet: i64) -> UtilityReadings {
        UtilityReadings {
            water: Some(Amount::from(water)),
            elec_base: Some(Amount::from(elec_base)),
            elec_main: Some(Amount::from(elec_main)),
            gas: Some(Amount::from(gas)),
            internet: Some(Amount::from(internet)),
        }
    }

    #[test]
    fn test_absent_readings() {
        assert!(compute_split(None).is_none());
    }

    #[test]
    fn test_over_cap_scenario() {
        let split = compute_split(Some(&readings(100, 150, 80, 50, 40))).unwrap();

        assert_eq!(split.total, Amount::from(420));
        assert_eq!(split.tenant.water, Amount::from(40));
        assert_eq!(split.tenant.gas, Amount::from(20));
        assert_eq!(split.tenant.elec, Amount::from(150));
        assert_eq!(split.tenant.calc, Amount::from(210));
        assert_eq!(split.tenant.overage, Amount::from(10));
        assert!(split.tenant.is_over);
        assert_eq!(split.landlord.total_bill, Amount::from(420));
        assert_eq!(split.landlord.tenant_reimbursement, Amount::from(10));
        assert_eq!(split.landlord.net_cost, Amount::from(410));
    }

    #[test]
    fn test_under_cap_scenario() {
        let split = compute_split(Some(&readings(100, 10, 80, 50, 40))).unwrap();

        assert_eq!(split.tenant.calc, Amount::from(70));
        assert_eq!(split.tenant.overage, Amount::ZERO);
        assert!(!split.tenant.is_over);
        // Landlord absorbs the full bill when there is no overage.
        assert_eq!(split.landlord.net_cost, split.total);
    }

    #[test]
    fn test_exactly_at_cap_is_not_over() {
        // water 250 -> tenant 100; elec_base 100 -> calc 200 == cap
        let split = compute_split(Some(&readings(250, 100, 0, 0, 0))).unwrap();
        assert_eq!(split.tenant.calc, Amount::from(200));
        assert_eq!(split.tenant.overage, Amount::ZERO);
        assert!(!split.tenant.is_over);
    }

    #[test]
    fn test_missing_fields_are_zero() {
        let partial = UtilityReadings {
            elec_base: Some(Amount::from(150)),
            ..Default::default()
        };
        let split = compute_split(Some(&partial)).unwrap();
        assert_eq!(split.total, Amount::from(150));
        assert_eq!(split.tenant.calc, Amount::from(150));
    }

    #[test]
    fn test_empty_readings_split_is_zero() {
        let split = compute_split(Some(&UtilityReadings::default())).unwrap();
        assert_eq!(split.total, Amount::ZERO);
        assert_eq!(split.tenant.overage, Amount::ZERO);
    }

    #[test]
    fn test_monotonicity_in_each_reading() {
        let base = readings(100, 150, 80, 50, 40);
        let base_split = compute_split(Some(&base)).unwrap();

        for bump in [
            readings(150, 150, 80, 50, 40),
            readings(100, 200, 80, 50, 40),
            readings(100, 150, 130, 50, 40),
            readings(100, 150, 80, 100, 40),
            readings(100, 150, 80, 50, 90),
        ] {
            let split = compute_split(Some(&bump)).unwrap();
            assert!(split.tenant.calc >= base_split.tenant.calc);
            assert!(split.total > base_split.total);
            assert!(split.landlord.net_cost >= base_split.landlord.net_cost);
        }
    }

    #[test]
    fn test_no_internal_rounding() {
        // 40% of 10.05 is 4.02 exactly in decimal; make sure nothing rounds
        // the intermediate shares.
        let readings = UtilityReadings {
            water: Some("10.05".parse().unwrap()),
            gas: Some("0.01".parse().unwrap()),
            ..Default::default()
        };
        let split = compute_split(Some(&readings)).unwrap();
        assert_eq!(split.tenant.water.value().to_string(), "4.020");
        assert_eq!(split.tenant.gas.value().to_string(), "0.004");
        assert_eq!(split.tenant.calc.value().to_string(), "4.024");
    }
}
