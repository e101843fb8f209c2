//! Tenant entity - A person or company renting one or more units.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Tenant database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tenants")]
pub struct Model {
    /// Unique identifier for the tenant
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Company name; empty for private tenants
    pub company: String,
    /// First name; may be empty for companies
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Email address used for signatures and notices; may be empty
    pub email: String,
    /// Phone number; may be empty
    pub phone: String,
    /// Postal address street
    pub street: String,
    /// Postal address postal code
    pub postal_code: String,
    /// Postal address city
    pub city: String,
    /// Account for deposit refunds and credits; may be empty
    pub payout_iban: String,
}

impl Model {
    /// Display name: company if present, otherwise "First Last".
    #[must_use]
    pub fn display_name(&self) -> String {
        if !self.company.trim().is_empty() {
            return self.company.trim().to_string();
        }
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// Defines relationships between Tenant and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One tenant has many leases
    #[sea_orm(has_many = "super::lease::Entity")]
    Leases,
    /// One tenant holds many key copies
    #[sea_orm(has_many = "super::key_issue::Entity")]
    KeyIssues,
}

impl Related<super::lease::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Leases.def()
    }
}

impl Related<super::key_issue::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::KeyIssues.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
