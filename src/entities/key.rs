//! Key entity - A key type of a building's locking system and its stock.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Key database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "keys")]
pub struct Model {
    /// Unique identifier for the key
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Building the key opens doors in
    pub building_id: i64,
    /// Locking system, e.g. "Kaba star"
    pub system: String,
    /// Number stamped on the key
    pub number: String,
    /// What it opens, e.g. "apartment + cellar"
    pub function: String,
    /// Copies owned in total
    pub total_count: i32,
}

/// Defines relationships between Key and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each key belongs to one building
    #[sea_orm(
        belongs_to = "super::building::Entity",
        from = "Column::BuildingId",
        to = "super::building::Column::Id",
        on_delete = "Cascade"
    )]
    Building,
    /// One key has many hand-overs
    #[sea_orm(has_many = "super::key_issue::Entity")]
    Issues,
}

impl Related<super::building::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Building.def()
    }
}

impl Related<super::key_issue::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Issues.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
