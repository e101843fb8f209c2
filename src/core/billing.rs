//! Billing periods, expense items and utility-cost statements.

use crate::{
    config::AppConfig,
    core::{
        apportionment::{self, Apportionment, UnitStatement},
        format::round2,
        ids::{BuildingId, PeriodId, TenantId, UnitId},
        ledger, property,
        qr_bill::{Address, QrBill},
    },
    entities::{
        BillingPeriod, ExpenseItem, billing_period, building, expense_item,
        expense_item::AllocationKey,
    },
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;
use tracing::{info, warn};

/// Occupant label for units without an active lease.
pub const VACANT_LABEL: &str = "Vacant / owner";

/// Balances below this (tenant owes more than five Rappen) get a payment slip.
pub const PAYMENT_SLIP_THRESHOLD: f64 = -0.05;

/// Input for [`create_period`]
#[derive(Debug, Clone)]
pub struct NewPeriod {
    /// Billed building
    pub building_id: BuildingId,
    /// Label, e.g. `2024/25`
    pub label: String,
    /// First day
    pub start_date: NaiveDate,
    /// Last day
    pub end_date: NaiveDate,
}

/// Input for [`add_expense_item`]
#[derive(Debug, Clone)]
pub struct NewExpenseItem {
    /// Target period
    pub period_id: PeriodId,
    /// Invoice date
    pub date: NaiveDate,
    /// Description
    pub description: String,
    /// Category, e.g. `heating`
    pub category: String,
    /// Amount; negative for refunds
    pub amount: f64,
    /// How the item is split
    pub allocation_key: AllocationKey,
}

/// Creates a billing period for a building.
pub async fn create_period(
    db: &DatabaseConnection,
    input: NewPeriod,
) -> Result<billing_period::Model> {
    let label = input.label.trim();
    if label.is_empty() {
        return Err(Error::validation("Period label cannot be empty"));
    }
    if input.end_date < input.start_date {
        return Err(Error::validation(format!(
            "Period end {} lies before its start {}",
            input.end_date, input.start_date
        )));
    }
    property::get_building(db, input.building_id).await?;

    let period = billing_period::ActiveModel {
        building_id: Set(input.building_id.0),
        label: Set(label.to_string()),
        start_date: Set(input.start_date),
        end_date: Set(input.end_date),
        closed: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        period_id = period.id,
        building_id = period.building_id,
        label = %period.label,
        "Created billing period"
    );
    Ok(period)
}

/// Finds a billing period by id.
pub async fn get_period<C>(db: &C, period_id: PeriodId) -> Result<billing_period::Model>
where
    C: ConnectionTrait,
{
    BillingPeriod::find_by_id(period_id.0)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "billing period",
            id: period_id.0,
        })
}

/// Closes a period; closing twice is a no-op.
pub async fn close_period(
    db: &DatabaseConnection,
    period_id: PeriodId,
) -> Result<billing_period::Model> {
    let period = get_period(db, period_id).await?;
    if period.closed {
        return Ok(period);
    }

    let mut model: billing_period::ActiveModel = period.into();
    model.closed = Set(true);
    let period = model.update(db).await?;
    info!(period_id = period.id, "Closed billing period");
    Ok(period)
}

/// Adds an expense item to an open period.
///
/// # Errors
/// * [`Error::Validation`] if the period is closed or the description is empty
/// * [`Error::InvalidAmount`] for zero or non-finite amounts
pub async fn add_expense_item(
    db: &DatabaseConnection,
    input: NewExpenseItem,
) -> Result<expense_item::Model> {
    if !input.amount.is_finite() || input.amount == 0.0 {
        return Err(Error::InvalidAmount {
            amount: input.amount,
        });
    }
    let description = input.description.trim();
    if description.is_empty() {
        return Err(Error::validation("Expense description cannot be empty"));
    }

    let period = get_period(db, input.period_id).await?;
    if period.closed {
        return Err(Error::validation(format!(
            "Billing period '{}' is closed",
            period.label
        )));
    }

    let item = expense_item::ActiveModel {
        period_id: Set(period.id),
        date: Set(input.date),
        description: Set(description.to_string()),
        category: Set(input.category.trim().to_lowercase()),
        amount: Set(input.amount),
        allocation_key: Set(input.allocation_key),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        item_id = item.id,
        period_id = item.period_id,
        amount = item.amount,
        key = ?item.allocation_key,
        "Added expense item"
    );
    Ok(item)
}

/// Lists a period's items by date.
pub async fn list_expense_items<C>(db: &C, period_id: PeriodId) -> Result<Vec<expense_item::Model>>
where
    C: ConnectionTrait,
{
    ExpenseItem::find()
        .filter(expense_item::Column::PeriodId.eq(period_id.0))
        .order_by_asc(expense_item::Column::Date)
        .order_by_asc(expense_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Apportions a stored period over all units of its building.
pub async fn apportion_period(db: &DatabaseConnection, period_id: PeriodId) -> Result<Apportionment> {
    let period = get_period(db, period_id).await?;
    let units = property::units_in_building(db, BuildingId(period.building_id)).await?;
    let items = list_expense_items(db, period_id).await?;
    apportionment::apportion(&period, &units, &items)
}

/// One unit of a statement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementLine {
    /// Apportionment result
    pub statement: UnitStatement,
    /// Tenant of the active lease, or [`VACANT_LABEL`]
    pub occupant: String,
    /// Tenant of the active lease
    pub tenant_id: Option<i64>,
    /// QR payload for an additional payment
    pub qr_payload: Option<String>,
}

/// Utility-cost statement for a whole period
#[derive(Debug, Clone, Serialize)]
pub struct Statement {
    /// Billed period
    pub period: billing_period::Model,
    /// Billed building
    pub building: building::Model,
    /// Summed floor area
    pub total_area: f64,
    /// One line per unit
    pub lines: Vec<StatementLine>,
    /// Items skipped by the apportionment
    pub excluded_items: Vec<i64>,
    /// Non-fatal problems, e.g. a payment slip that could not be built
    pub warnings: Vec<String>,
}

impl Statement {
    /// Total cost distributed to units.
    #[must_use]
    pub fn total_allocated(&self) -> f64 {
        round2(self.lines.iter().map(|l| l.statement.allocated_cost).sum())
    }
}

fn payment_slip(
    config: &AppConfig,
    building: &building::Model,
    period: &billing_period::Model,
    line: &UnitStatement,
    occupant: &str,
) -> QrBill {
    QrBill {
        account: building.iban.clone(),
        creditor: Address::swiss(
            &config.management.name,
            &building.street,
            &building.postal_code,
            &building.city,
        ),
        debtor: Some(Address::swiss(
            occupant,
            &building.street,
            &building.postal_code,
            &building.city,
        )),
        amount: round2(-line.balance),
        currency: "CHF".to_string(),
        message: format!("Utility costs {} - {}", period.label, line.unit_label),
    }
}

/// Builds the statement: apportionment plus occupant and payment slip per unit.
pub async fn build_statement(
    db: &DatabaseConnection,
    config: &AppConfig,
    period_id: PeriodId,
) -> Result<Statement> {
    let apportionment = apportion_period(db, period_id).await?;
    let period = get_period(db, period_id).await?;
    let building = property::get_building(db, BuildingId(period.building_id)).await?;

    let mut warnings = Vec::new();
    if !apportionment.excluded_items.is_empty() {
        warnings.push(format!(
            "{} expense item(s) with unsupported allocation key excluded",
            apportionment.excluded_items.len()
        ));
    }

    let mut lines = Vec::with_capacity(apportionment.lines.len());
    for statement in apportionment.lines {
        let lease = ledger::active_lease(db, UnitId(statement.unit_id)).await?;
        let (occupant, tenant_id) = match lease {
            Some(lease) => {
                let tenant = property::get_tenant(db, TenantId(lease.tenant_id)).await?;
                (tenant.display_name(), Some(tenant.id))
            }
            None => (VACANT_LABEL.to_string(), None),
        };

        let qr_payload = if statement.balance < PAYMENT_SLIP_THRESHOLD && !building.iban.is_empty()
        {
            match payment_slip(config, &building, &period, &statement, &occupant).payload() {
                Ok(payload) => Some(payload),
                Err(e) => {
                    warn!(unit_id = statement.unit_id, error = %e, "Payment slip skipped");
                    warnings.push(format!("{}: payment slip skipped: {e}", statement.unit_label));
                    None
                }
            }
        } else {
            None
        };

        lines.push(StatementLine {
            statement,
            occupant,
            tenant_id,
            qr_payload,
        });
    }

    Ok(Statement {
        period,
        building,
        total_area: apportionment.total_area,
        lines,
        excluded_items: apportionment.excluded_items,
        warnings,
    })
}
