//! Document entity - A stored file attached to a lease or building.
//!
//! Signed lease contracts returned by the e-signature service land here.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What a stored document is
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Lease contract signed by the tenant
    #[sea_orm(string_value = "lease_signed")]
    LeaseSigned,
    /// Utility-cost statement
    #[sea_orm(string_value = "statement")]
    Statement,
    /// Rent-adjustment letter
    #[sea_orm(string_value = "rent_adjustment")]
    RentAdjustment,
    /// Anything else
    #[sea_orm(string_value = "other")]
    Other,
}

/// Document database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    /// Unique identifier for the document
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Document kind
    pub kind: DocumentKind,
    /// Title shown in listings
    pub title: String,
    /// File name used on download
    pub filename: String,
    /// Raw file contents
    #[serde(skip)]
    pub content: Vec<u8>,
    /// Lease the document belongs to
    pub lease_id: Option<i64>,
    /// Building the document belongs to
    pub building_id: Option<i64>,
    /// When the document was stored
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Document and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each document may belong to a lease
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
