//! Ticket entity - A maintenance issue reported for a leased unit.
//!
//! Tickets are reachable by tenants through an unguessable public token.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Urgency of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    /// Emergency
    #[sea_orm(string_value = "high")]
    High,
    /// Regular repair
    #[sea_orm(string_value = "normal")]
    Normal,
    /// Cosmetic
    #[sea_orm(string_value = "low")]
    Low,
}

/// Workflow state of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Just reported
    #[sea_orm(string_value = "new")]
    New,
    /// Being worked on
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    /// Waiting for the tenant to respond
    #[sea_orm(string_value = "waiting_on_tenant")]
    WaitingOnTenant,
    /// Resolved
    #[sea_orm(string_value = "done")]
    Done,
}

impl TicketStatus {
    /// Label used in tenant notices.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::InProgress => "In progress",
            Self::WaitingOnTenant => "Waiting on tenant",
            Self::Done => "Done",
        }
    }
}

/// Ticket database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    /// Unique identifier for the ticket
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Public token (uuid v4) for the tenant-facing view
    #[sea_orm(unique)]
    pub public_token: String,
    /// Lease the issue was reported under, if known
    pub lease_id: Option<i64>,
    /// Short subject
    pub subject: String,
    /// Description of the issue
    pub description: String,
    /// Urgency
    pub priority: TicketPriority,
    /// Workflow state
    pub status: TicketStatus,
    /// Assigned contractor
    pub contractor_id: Option<i64>,
    /// Reporter email for notices
    pub reporter_email: Option<String>,
    /// Reporter phone, passed on to the contractor
    pub reporter_phone: Option<String>,
    /// When the ticket was reported
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Ticket and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each ticket may belong to a lease
    #[sea_orm(
        belongs_to = "super::lease::Entity",
        from = "Column::LeaseId",
        to = "super::lease::Column::Id",
        on_delete = "Cascade"
    )]
    Lease,
    /// Each ticket may be assigned to a contractor
    #[sea_orm(
        belongs_to = "super::contractor::Entity",
        from = "Column::ContractorId",
        to = "super::contractor::Column::Id",
        on_delete = "SetNull"
    )]
    Contractor,
}

impl Related<super::lease::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lease.def()
    }
}

impl Related<super::contractor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contractor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
