//! Utility-cost apportionment.
//!
//! Splits a billing period's expense items across the units of a building in
//! proportion to floor area, then compares each unit's share with the advance
//! payments it made over the year. Pure and idempotent: no I/O besides logging.

use crate::{
    core::format::round2,
    entities::{billing_period, expense_item, expense_item::AllocationKey, unit},
    errors::{Error, Result},
};
use serde::Serialize;
use tracing::warn;

/// Months of advance payments billed per period.
pub const ADVANCE_MONTHS: f64 = 12.0;

/// One expense item's share for one unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostShare {
    /// Expense item the share comes from
    pub item_id: i64,
    /// Item description
    pub description: String,
    /// Unrounded share of the item amount
    pub amount: f64,
}

/// Apportionment result for one unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitStatement {
    /// Unit id
    pub unit_id: i64,
    /// Unit label
    pub unit_label: String,
    /// Floor area used as weight
    pub area_m2: f64,
    /// Sum of all shares, rounded once
    pub allocated_cost: f64,
    /// Monthly advance times twelve
    pub advance_payments_total: f64,
    /// Advance minus cost; positive means credit for the tenant
    pub balance: f64,
    /// Per-item breakdown
    pub shares: Vec<CostShare>,
}

impl UnitStatement {
    /// Whether the tenant owes money for this period.
    #[must_use]
    pub fn is_additional_payment(&self) -> bool {
        self.balance < 0.0
    }
}

/// Apportionment of a whole billing period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Apportionment {
    /// Billing period
    pub period_id: i64,
    /// Building of the period
    pub building_id: i64,
    /// Summed floor area of all units
    pub total_area: f64,
    /// One line per unit, in input order
    pub lines: Vec<UnitStatement>,
    /// Items skipped because their allocation key is not processed
    pub excluded_items: Vec<i64>,
}

impl Apportionment {
    /// Total of all allocated costs.
    #[must_use]
    pub fn total_allocated(&self) -> f64 {
        round2(self.lines.iter().map(|l| l.allocated_cost).sum())
    }

    /// Total of all advance payments.
    #[must_use]
    pub fn total_advances(&self) -> f64 {
        round2(self.lines.iter().map(|l| l.advance_payments_total).sum())
    }
}

fn validate(
    period: &billing_period::Model,
    units: &[unit::Model],
    items: &[expense_item::Model],
) -> Result<f64> {
    if let Some(foreign) = units.iter().find(|u| u.building_id != period.building_id) {
        return Err(Error::validation(format!(
            "Unit {} belongs to building {}, not to building {} of period {}",
            foreign.id, foreign.building_id, period.building_id, period.id
        )));
    }

    if let Some(bad) = units
        .iter()
        .find(|u| !u.area_m2.is_finite() || u.area_m2 < 0.0)
    {
        return Err(Error::validation(format!(
            "Unit {} has invalid floor area {}",
            bad.id, bad.area_m2
        )));
    }

    if let Some(foreign) = items.iter().find(|i| i.period_id != period.id) {
        return Err(Error::validation(format!(
            "Expense item {} belongs to period {}, not {}",
            foreign.id, foreign.period_id, period.id
        )));
    }

    if let Some(bad) = items.iter().find(|i| !i.amount.is_finite()) {
        return Err(Error::InvalidAmount { amount: bad.amount });
    }

    let total_area: f64 = units.iter().map(|u| u.area_m2).sum();
    if total_area <= 0.0 {
        return Err(Error::NoApportionmentBasis {
            building_id: period.building_id,
        });
    }

    Ok(total_area)
}

/// Apportions a period's expense items to units by floor area.
///
/// # Errors
/// * [`Error::Validation`] if a unit or item belongs elsewhere or an area is negative
/// * [`Error::NoApportionmentBasis`] if the summed area is zero
pub fn apportion(
    period: &billing_period::Model,
    units: &[unit::Model],
    items: &[expense_item::Model],
) -> Result<Apportionment> {
    let total_area = validate(period, units, items)?;

    let (area_items, excluded): (Vec<_>, Vec<_>) = items
        .iter()
        .partition(|item| item.allocation_key == AllocationKey::Area);

    for item in &excluded {
        warn!(
            period_id = period.id,
            item_id = item.id,
            key = ?item.allocation_key,
            amount = item.amount,
            "Expense item excluded from apportionment, allocation key not supported"
        );
    }

    let lines = units
        .iter()
        .map(|unit| {
            let shares: Vec<CostShare> = area_items
                .iter()
                .map(|item| CostShare {
                    item_id: item.id,
                    description: item.description.clone(),
                    amount: item.amount * unit.area_m2 / total_area,
                })
                .collect();

            let allocated_cost = round2(shares.iter().map(|s| s.amount).sum());
            let advance_payments_total = round2(unit.target_utility_advance * ADVANCE_MONTHS);

            UnitStatement {
                unit_id: unit.id,
                unit_label: unit.label.clone(),
                area_m2: unit.area_m2,
                allocated_cost,
                advance_payments_total,
                balance: round2(advance_payments_total - allocated_cost),
                shares,
            }
        })
        .collect();

    Ok(Apportionment {
        period_id: period.id,
        building_id: period.building_id,
        total_area,
        lines,
        excluded_items: excluded.iter().map(|item| item.id).collect(),
    })
}
