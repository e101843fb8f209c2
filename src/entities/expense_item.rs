//! Expense line item entity - A dated, categorized building expense.
//!
//! Each item carries the allocation key that decides how it is split across
//! units. Only [`AllocationKey::Area`] is processed by the apportionment engine.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Rule for splitting an expense across units
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum AllocationKey {
    /// Weighted by floor area
    #[sea_orm(string_value = "area")]
    Area,
    /// Weighted by number of occupants (not processed)
    #[sea_orm(string_value = "headcount")]
    Headcount,
    /// Weighted by metered consumption (not processed)
    #[sea_orm(string_value = "consumption")]
    Consumption,
}

/// Expense line item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expense_items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Billing period the item is booked to
    pub period_id: i64,
    /// Invoice or booking date
    pub date: Date,
    /// Free-text description (e.g. supplier and invoice number)
    pub description: String,
    /// Cost category (e.g. "heating", "water", "caretaker")
    pub category: String,
    /// Amount in currency units
    pub amount: f64,
    /// How the amount is split across units
    pub allocation_key: AllocationKey,
}

/// Defines relationships between `ExpenseItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each item belongs to one billing period
    #[sea_orm(
        belongs_to = "super::billing_period::Entity",
        from = "Column::PeriodId",
        to = "super::billing_period::Column::Id",
        on_delete = "Cascade"
    )]
    BillingPeriod,
}

impl Related<super::billing_period::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillingPeriod.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
