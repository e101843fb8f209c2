//! Key issue entity - One copy of a key handed to a tenant or someone else.
//!
//! An issue without return date counts against the key's stock.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Key issue database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "key_issues")]
pub struct Model {
    /// Unique identifier for the hand-over
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Handed-out key
    pub key_id: i64,
    /// Receiving tenant
    pub tenant_id: Option<i64>,
    /// Receiver outside the tenant list, e.g. a caretaker; empty for tenants
    pub external_recipient: String,
    /// Day of the hand-over
    pub issued_on: Date,
    /// Day the copy came back
    pub returned_on: Option<Date>,
    /// Whether the receipt was signed
    pub signed: bool,
}

/// Defines relationships between KeyIssue and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each issue is for one key
    #[sea_orm(
        belongs_to = "super::key::Entity",
        from = "Column::KeyId",
        to = "super::key::Column::Id",
        on_delete = "Cascade"
    )]
    Key,
    /// Each issue may go to a tenant
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id",
        on_delete = "SetNull"
    )]
    Tenant,
}

impl Related<super::key::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Key.def()
    }
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
