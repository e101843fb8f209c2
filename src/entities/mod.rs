//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod billing_period;
pub mod building;
pub mod contractor;
pub mod document;
pub mod expense_item;
pub mod key;
pub mod key_issue;
pub mod lease;
pub mod rent_adjustment;
pub mod tenant;
pub mod ticket;
pub mod unit;
pub mod vacancy;

// Re-export specific types to avoid conflicts
pub use billing_period::{
    Column as BillingPeriodColumn, Entity as BillingPeriod, Model as BillingPeriodModel,
};
pub use building::{Column as BuildingColumn, Entity as Building, Model as BuildingModel};
pub use contractor::{Column as ContractorColumn, Entity as Contractor, Model as ContractorModel};
pub use document::{Column as DocumentColumn, Entity as Document, Model as DocumentModel};
pub use expense_item::{
    Column as ExpenseItemColumn, Entity as ExpenseItem, Model as ExpenseItemModel,
};
pub use key::{Column as KeyColumn, Entity as Key, Model as KeyModel};
pub use key_issue::{Column as KeyIssueColumn, Entity as KeyIssue, Model as KeyIssueModel};
pub use lease::{Column as LeaseColumn, Entity as Lease, Model as LeaseModel};
pub use rent_adjustment::{
    Column as RentAdjustmentColumn, Entity as RentAdjustment, Model as RentAdjustmentModel,
};
pub use tenant::{Column as TenantColumn, Entity as Tenant, Model as TenantModel};
pub use ticket::{Column as TicketColumn, Entity as Ticket, Model as TicketModel};
pub use unit::{Column as UnitColumn, Entity as Unit, Model as UnitModel};
pub use vacancy::{Column as VacancyColumn, Entity as Vacancy, Model as VacancyModel};
