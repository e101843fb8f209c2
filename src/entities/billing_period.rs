//! Billing period entity - The time span a utility-cost statement covers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Billing period database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "billing_periods")]
pub struct Model {
    /// Unique identifier for the period
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Building whose costs are billed
    pub building_id: i64,
    /// Label shown on statements (e.g. "2024/25")
    pub label: String,
    /// First day of the period
    pub start_date: Date,
    /// Last day of the period
    pub end_date: Date,
    /// Closed periods accept no further expense items
    pub closed: bool,
}

/// Defines relationships between `BillingPeriod` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each period belongs to one building
    #[sea_orm(
        belongs_to = "super::building::Entity",
        from = "Column::BuildingId",
        to = "super::building::Column::Id",
        on_delete = "Cascade"
    )]
    Building,
    /// One period has many expense items
    #[sea_orm(has_many = "super::expense_item::Entity")]
    ExpenseItems,
}

impl Related<super::building::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Building.def()
    }
}

impl Related<super::expense_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
