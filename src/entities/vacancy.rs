//! Vacancy entity - A recorded period during which a unit has no active lease.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Why a unit is vacant
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum VacancyReason {
    /// No tenant found yet
    #[sea_orm(string_value = "no_tenant")]
    NoTenant,
    /// Under renovation
    #[sea_orm(string_value = "renovation")]
    Renovation,
    /// Used by the owner
    #[sea_orm(string_value = "owner_use")]
    OwnerUse,
    /// Anything else, see note
    #[sea_orm(string_value = "other")]
    Other,
}

/// Vacancy database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vacancies")]
pub struct Model {
    /// Unique identifier for the vacancy
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Vacant unit
    pub unit_id: i64,
    /// First vacant day
    pub start_date: Date,
    /// Last vacant day; None while open-ended
    pub end_date: Option<Date>,
    /// Reason code
    pub reason: VacancyReason,
    /// Free-text note
    pub note: String,
}

/// Defines relationships between Vacancy and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each vacancy belongs to one unit
    #[sea_orm(
        belongs_to = "super::unit::Entity",
        from = "Column::UnitId",
        to = "super::unit::Column::Id",
        on_delete = "Cascade"
    )]
    Unit,
}

impl Related<super::unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Unit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
