//! Rent adjustment entity - A recorded change of rent under an existing lease.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Rent adjustment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rent_adjustments")]
pub struct Model {
    /// Unique identifier for the adjustment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Adjusted lease
    pub lease_id: i64,
    /// New mortgage reference rate (percent)
    pub new_reference_rate: f64,
    /// New consumer price index points
    pub new_index_points: f64,
    /// New monthly net rent
    pub new_net_rent: f64,
    /// New monthly utility-cost advance
    pub new_utility_advance: f64,
    /// Date the new rent takes effect
    pub effective_date: Date,
    /// Rationale printed on the letter
    pub rationale: String,
    /// When the adjustment was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `RentAdjustment` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each adjustment belongs to one lease
    #[sea_orm(
        belongs_to = "super::lease::Entity",
        from = "Column::LeaseId",
        to = "super::lease::Column::Id",
        on_delete = "Cascade"
    )]
    Lease,
}

impl Related<super::lease::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lease.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
