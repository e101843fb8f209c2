//! Contractor entity - A tradesperson assigned to maintenance tickets.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Contractor database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contractors")]
pub struct Model {
    /// Unique identifier for the contractor
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Company name
    pub company: String,
    /// Trade (e.g. "plumbing")
    pub trade: String,
    /// Email address for work orders; may be empty
    pub email: String,
    /// Phone number
    pub phone: String,
}

/// Defines relationships between Contractor and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One contractor works on many tickets
    #[sea_orm(has_many = "super::ticket::Entity")]
    Tickets,
}

impl Related<super::ticket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tickets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
