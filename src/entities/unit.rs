//! Unit entity - A rentable space (apartment, commercial space, parking stall).
//!
//! Each unit belongs to exactly one building and carries the floor area used as
//! apportionment weight plus the monthly target rent and utility-cost advance.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of rentable space
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Apartment
    #[sea_orm(string_value = "residential")]
    Residential,
    /// Shop, office or workshop
    #[sea_orm(string_value = "commercial")]
    Commercial,
    /// Parking stall or garage
    #[sea_orm(string_value = "parking")]
    Parking,
}

/// Unit database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "units")]
pub struct Model {
    /// Unique identifier for the unit
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Building this unit belongs to
    pub building_id: i64,
    /// Human-readable label (e.g. "3.5 rooms, 2nd floor left")
    pub label: String,
    /// Kind of space
    pub kind: UnitKind,
    /// Number of rooms, if applicable
    pub rooms: Option<f64>,
    /// Floor number (0 = ground floor)
    pub floor: i32,
    /// Floor area in square metres
    pub area_m2: f64,
    /// Target monthly net rent
    pub target_net_rent: f64,
    /// Target monthly utility-cost advance payment
    pub target_utility_advance: f64,
}

/// Defines relationships between Unit and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each unit belongs to one building
    #[sea_orm(
        belongs_to = "super::building::Entity",
        from = "Column::BuildingId",
        to = "super::building::Column::Id",
        on_delete = "Cascade"
    )]
    Building,
    /// One unit has many leases over time
    #[sea_orm(has_many = "super::lease::Entity")]
    Leases,
    /// One unit has many vacancies over time
    #[sea_orm(has_many = "super::vacancy::Entity")]
    Vacancies,
}

impl Related<super::building::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Building.def()
    }
}

impl Related<super::lease::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Leases.def()
    }
}

impl Related<super::vacancy::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vacancies.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
