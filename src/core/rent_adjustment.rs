//! Rent adjustments after reference-rate or index changes.
//!
//! The adjustment is recorded against the lease and a letter context is
//! prepared. The lease's own rent is not rewritten here; the new figures apply
//! from the effective date printed in the letter.

use crate::{
    config::AppConfig,
    core::{
        documents::{DocumentContext, PreparedDocument},
        format::fixed2,
        ids::{BuildingId, LeaseId, TenantId, UnitId},
        ledger, property,
    },
    entities::{RentAdjustment, rent_adjustment},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Input for [`prepare_rent_adjustment`]
#[derive(Debug, Clone)]
pub struct RentAdjustmentInput {
    /// New mortgage reference rate in percent
    pub new_reference_rate: f64,
    /// New consumer price index points
    pub new_index_points: f64,
    /// New monthly net rent
    pub new_net_rent: f64,
    /// New monthly advance; the current one is kept if absent
    pub new_utility_advance: Option<f64>,
    /// Date the new rent applies from
    pub effective_date: NaiveDate,
    /// Free-text justification printed in the letter
    pub rationale: String,
}

/// A stored adjustment together with its letter
#[derive(Debug, Clone)]
pub struct PreparedAdjustment {
    /// Persisted record
    pub adjustment: rent_adjustment::Model,
    /// Letter ready for rendering
    pub letter: PreparedDocument,
}

fn check_non_negative(value: f64, field: &str) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::validation(format!(
            "{field} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

/// Records a rent adjustment and builds the notification letter context.
///
/// # Errors
/// * [`Error::InvalidAmount`] for a negative rent or advance
/// * [`Error::Validation`] for a negative rate or index
/// * [`Error::NotFound`] if the lease does not exist
pub async fn prepare_rent_adjustment(
    db: &DatabaseConnection,
    config: &AppConfig,
    lease_id: LeaseId,
    input: RentAdjustmentInput,
    today: NaiveDate,
) -> Result<PreparedAdjustment> {
    for amount in std::iter::once(input.new_net_rent).chain(input.new_utility_advance) {
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::InvalidAmount { amount });
        }
    }
    check_non_negative(input.new_reference_rate, "Reference rate")?;
    check_non_negative(input.new_index_points, "Index points")?;

    let txn = db.begin().await?;

    let lease = ledger::get_lease(&txn, lease_id).await?;
    let unit = property::get_unit(&txn, UnitId(lease.unit_id)).await?;
    let building = property::get_building(&txn, BuildingId(unit.building_id)).await?;
    let tenant = property::get_tenant(&txn, TenantId(lease.tenant_id)).await?;

    let new_utility_advance = input.new_utility_advance.unwrap_or(lease.utility_advance);
    let rationale = input.rationale.trim().to_string();

    let adjustment = rent_adjustment::ActiveModel {
        lease_id: Set(lease.id),
        new_reference_rate: Set(input.new_reference_rate),
        new_index_points: Set(input.new_index_points),
        new_net_rent: Set(input.new_net_rent),
        new_utility_advance: Set(new_utility_advance),
        effective_date: Set(input.effective_date),
        rationale: Set(rationale.clone()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(
        adjustment_id = adjustment.id,
        lease_id = lease.id,
        old_net_rent = lease.net_rent,
        new_net_rent = adjustment.new_net_rent,
        effective_date = %adjustment.effective_date,
        "Recorded rent adjustment"
    );

    let mut context = DocumentContext::new();
    context
        .text("management_name", &config.management.name)
        .text("tenant_name", tenant.display_name())
        .text("tenant_street", &tenant.street)
        .text("tenant_postal_code", &tenant.postal_code)
        .text("tenant_city", &tenant.city)
        .text("building_street", &building.street)
        .text("building_city", &building.city)
        .text("unit_label", &unit.label)
        .text("old_net_rent", fixed2(lease.net_rent))
        .text("old_utility_advance", fixed2(lease.utility_advance))
        .text("old_reference_rate", fixed2(lease.reference_rate))
        .text("new_net_rent", fixed2(adjustment.new_net_rent))
        .text("new_utility_advance", fixed2(adjustment.new_utility_advance))
        .text("new_reference_rate", fixed2(adjustment.new_reference_rate))
        .text("new_index_points", fixed2(adjustment.new_index_points))
        .date("effective_date", adjustment.effective_date)
        .date("today", today)
        .text("rationale", rationale);

    Ok(PreparedAdjustment {
        letter: PreparedDocument {
            template_id: "rent_adjustment",
            title: format!("Rent adjustment {} {}", unit.label, tenant.display_name()),
            context,
        },
        adjustment,
    })
}

/// Lists a lease's adjustments, most recent effective date first.
pub async fn adjustments_for_lease(
    db: &DatabaseConnection,
    lease_id: LeaseId,
) -> Result<Vec<rent_adjustment::Model>> {
    RentAdjustment::find()
        .filter(rent_adjustment::Column::LeaseId.eq(lease_id.0))
        .order_by_desc(rent_adjustment::Column::EffectiveDate)
        .all(db)
        .await
        .map_err(Into::into)
}
