//! Building entity - A property (Liegenschaft) holding rentable units.
//!
//! A building owns its units and billing periods. The optional registry id
//! (EGID) and construction year are seeded from the federal building registry.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Building database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "buildings")]
pub struct Model {
    /// Unique identifier for the building
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Street and house number
    pub street: String,
    /// Postal code
    pub postal_code: String,
    /// City
    pub city: String,
    /// Two-letter canton code (e.g. "ZH")
    pub canton: String,
    /// Federal building identifier, if known
    pub registry_id: Option<i64>,
    /// Year of construction, if known
    pub construction_year: Option<i32>,
    /// Account receiving rent payments; empty when not yet configured
    pub iban: String,
}

/// Defines relationships between Building and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One building has many units
    #[sea_orm(has_many = "super::unit::Entity")]
    Units,
    /// One building has many billing periods
    #[sea_orm(has_many = "super::billing_period::Entity")]
    BillingPeriods,
    /// One building has many keys
    #[sea_orm(has_many = "super::key::Entity")]
    Keys,
}

impl Related<super::unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Units.def()
    }
}

impl Related<super::billing_period::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillingPeriods.def()
    }
}

impl Related<super::key::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Keys.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
