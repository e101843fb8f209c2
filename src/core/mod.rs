//! Core business logic - framework-agnostic property, ledger, billing and document operations.
//!
//! Functions here take a `SeaORM` connection plus typed identifiers and never
//! traverse relations implicitly; every lookup is an explicit query.

pub mod apportionment;
pub mod billing;
pub mod documents;
pub mod format;
pub mod ids;
pub mod keys;
pub mod ledger;
pub mod property;
pub mod qr_bill;
pub mod rent_adjustment;
pub mod report;
pub mod ticket;

pub use ids::{
    BuildingId, ContractorId, KeyId, KeyIssueId, LeaseId, PeriodId, TenantId, TicketId, UnitId,
};
