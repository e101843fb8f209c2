//! Lease entity - A tenant's right to occupy a unit for a date range.
//!
//! The `active` flag and the optional end date are maintained by the
//! interval ledger in `core::ledger`; at most one lease per unit is active.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Progress of the e-signature workflow for a lease
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum SignatureStatus {
    /// Not sent for signature
    #[sea_orm(string_value = "none")]
    NotSent,
    /// Submitted, waiting for the tenant
    #[sea_orm(string_value = "sent")]
    Sent,
    /// Signed by the tenant
    #[sea_orm(string_value = "signed")]
    Signed,
    /// Declined by the tenant
    #[sea_orm(string_value = "declined")]
    Declined,
}

/// Lease database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "leases")]
pub struct Model {
    /// Unique identifier for the lease
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Rented unit
    pub unit_id: i64,
    /// Renting tenant
    pub tenant_id: i64,
    /// First day of the lease
    pub start_date: Date,
    /// Last day of the lease; None while open-ended
    pub end_date: Option<Date>,
    /// Monthly net rent
    pub net_rent: f64,
    /// Monthly utility-cost advance payment
    pub utility_advance: f64,
    /// Mortgage reference rate (percent) the rent is based on
    pub reference_rate: f64,
    /// Security deposit, if any
    pub deposit: Option<f64>,
    /// Whether this lease currently occupies the unit
    pub active: bool,
    /// E-signature workflow status
    pub signature_status: SignatureStatus,
    /// Tracking id returned by the e-signature service
    pub signature_tracking_id: Option<String>,
}

impl Model {
    /// Net rent plus utility-cost advance.
    #[must_use]
    pub fn gross_rent(&self) -> f64 {
        self.net_rent + self.utility_advance
    }
}

/// Defines relationships between Lease and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each lease belongs to one unit
    #[sea_orm(
        belongs_to = "super::unit::Entity",
        from = "Column::UnitId",
        to = "super::unit::Column::Id",
        on_delete = "Cascade"
    )]
    Unit,
    /// Each lease belongs to one tenant
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id",
        on_delete = "Restrict"
    )]
    Tenant,
    /// One lease has many rent adjustments
    #[sea_orm(has_many = "super::rent_adjustment::Entity")]
    RentAdjustments,
    /// One lease has many stored documents
    #[sea_orm(has_many = "super::document::Entity")]
    Documents,
    /// One lease has many maintenance tickets
    #[sea_orm(has_many = "super::ticket::Entity")]
    Tickets,
}

impl Related<super::unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Unit.def()
    }
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl Related<super::rent_adjustment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RentAdjustments.def()
    }
}

impl Related<super::document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl Related<super::ticket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tickets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
