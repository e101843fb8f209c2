//! Maintenance tickets and contractor assignment.
//!
//! Tenants reach their ticket through an unguessable public token. Status and
//! contractor changes notify the people involved through a [`Mailer`]; mail
//! failures are logged and handed back as warnings, the change itself stands.

use crate::{
    core::{
        ids::{BuildingId, ContractorId, LeaseId, TicketId, UnitId},
        ledger, property,
    },
    entities::{
        Contractor, Ticket, contractor,
        ticket::{self, TicketPriority, TicketStatus},
    },
    errors::{Error, Result},
    integrations::mail::{Mailer, OutgoingMail, deliver},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use tracing::info;
use uuid::Uuid;

const MAX_SUBJECT_LEN: usize = 100;

/// Input for [`create_contractor`]
#[derive(Debug, Clone, Default)]
pub struct NewContractor {
    /// Company name
    pub company: String,
    /// Trade, e.g. `plumbing`
    pub trade: String,
    /// Email for work orders
    pub email: String,
    /// Phone
    pub phone: String,
}

/// Input for [`create_ticket`]
#[derive(Debug, Clone)]
pub struct NewTicket {
    /// Affected lease, if known
    pub lease_id: Option<LeaseId>,
    /// Short subject
    pub subject: String,
    /// What is broken
    pub description: String,
    /// Urgency
    pub priority: TicketPriority,
    /// Reporter email for notices
    pub reporter_email: Option<String>,
    /// Reporter phone, passed on to the contractor
    pub reporter_phone: Option<String>,
}

/// A ticket after a mutation, with notices that could not be sent
#[derive(Debug, Clone)]
pub struct TicketUpdate {
    /// Current state
    pub ticket: ticket::Model,
    /// Mail failures and skipped notices
    pub warnings: Vec<String>,
}

const fn priority_rank(priority: TicketPriority) -> u8 {
    match priority {
        TicketPriority::High => 0,
        TicketPriority::Normal => 1,
        TicketPriority::Low => 2,
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Creates a contractor. The company name is required.
pub async fn create_contractor(
    db: &DatabaseConnection,
    input: NewContractor,
) -> Result<contractor::Model> {
    let company = input.company.trim();
    if company.is_empty() {
        return Err(Error::validation("Contractor company cannot be empty"));
    }

    contractor::ActiveModel {
        company: Set(company.to_string()),
        trade: Set(input.trade.trim().to_string()),
        email: Set(input.email.trim().to_string()),
        phone: Set(input.phone.trim().to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Finds a contractor by id.
pub async fn get_contractor(
    db: &DatabaseConnection,
    contractor_id: ContractorId,
) -> Result<contractor::Model> {
    Contractor::find_by_id(contractor_id.0)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "contractor",
            id: contractor_id.0,
        })
}

/// Finds a ticket by id.
pub async fn get_ticket(db: &DatabaseConnection, ticket_id: TicketId) -> Result<ticket::Model> {
    Ticket::find_by_id(ticket_id.0)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "ticket",
            id: ticket_id.0,
        })
}

/// Finds a ticket by its public token.
pub async fn get_ticket_by_token(
    db: &DatabaseConnection,
    token: &str,
) -> Result<Option<ticket::Model>> {
    Ticket::find()
        .filter(ticket::Column::PublicToken.eq(token.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists tickets that are not done, most urgent first, then newest first.
pub async fn open_tickets(db: &DatabaseConnection) -> Result<Vec<ticket::Model>> {
    let mut tickets = Ticket::find()
        .filter(ticket::Column::Status.ne(TicketStatus::Done))
        .all(db)
        .await?;
    tickets.sort_by(|a, b| {
        priority_rank(a.priority)
            .cmp(&priority_rank(b.priority))
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b.id.cmp(&a.id))
    });
    Ok(tickets)
}

/// Human-readable location of a ticket: unit and street of its lease.
async fn location(db: &DatabaseConnection, ticket: &ticket::Model) -> Result<String> {
    let Some(lease_id) = ticket.lease_id else {
        return Ok("not specified".to_string());
    };
    let lease = ledger::get_lease(db, LeaseId(lease_id)).await?;
    let unit = property::get_unit(db, UnitId(lease.unit_id)).await?;
    let building = property::get_building(db, BuildingId(unit.building_id)).await?;
    Ok(format!("{}, {} {}", unit.label, building.street, building.city))
}

/// Records a new ticket and acknowledges it to the reporter.
pub async fn create_ticket(
    db: &DatabaseConnection,
    mailer: &dyn Mailer,
    input: NewTicket,
) -> Result<TicketUpdate> {
    let subject = input.subject.trim();
    if subject.is_empty() {
        return Err(Error::validation("Ticket subject cannot be empty"));
    }
    if subject.chars().count() > MAX_SUBJECT_LEN {
        return Err(Error::validation(format!(
            "Ticket subject exceeds {MAX_SUBJECT_LEN} characters"
        )));
    }
    if let Some(lease_id) = input.lease_id {
        ledger::get_lease(db, lease_id).await?;
    }

    let ticket = ticket::ActiveModel {
        public_token: Set(Uuid::new_v4().to_string()),
        lease_id: Set(input.lease_id.map(|id| id.0)),
        subject: Set(subject.to_string()),
        description: Set(input.description.trim().to_string()),
        priority: Set(input.priority),
        status: Set(TicketStatus::New),
        contractor_id: Set(None),
        reporter_email: Set(optional_text(input.reporter_email)),
        reporter_phone: Set(optional_text(input.reporter_phone)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        ticket_id = ticket.id,
        lease_id = ?ticket.lease_id,
        priority = ?ticket.priority,
        "Created ticket"
    );

    let mut warnings = Vec::new();
    if let Some(email) = &ticket.reporter_email {
        let mail = OutgoingMail {
            to: email.clone(),
            subject: format!("Received: {}", ticket.subject),
            body: format!(
                "Hello,\n\nWe have received your report.\n\nSubject: {}\nStatus: {}\nReference: {}\n\nKind regards\nYour property management",
                ticket.subject,
                ticket.status.label(),
                ticket.public_token
            ),
        };
        deliver(mailer, mail, &mut warnings).await;
    }

    Ok(TicketUpdate { ticket, warnings })
}

/// Assigns a contractor and sends the work order.
///
/// Notices go out only when the contractor actually changes and has an email:
/// the work order to the contractor and an info to the reporter.
pub async fn assign_contractor(
    db: &DatabaseConnection,
    mailer: &dyn Mailer,
    ticket_id: TicketId,
    contractor_id: ContractorId,
) -> Result<TicketUpdate> {
    let existing = get_ticket(db, ticket_id).await?;
    let contractor = get_contractor(db, contractor_id).await?;
    let changed = existing.contractor_id != Some(contractor.id);

    let ticket = if changed {
        let mut model: ticket::ActiveModel = existing.into();
        model.contractor_id = Set(Some(contractor.id));
        let ticket = model.update(db).await?;
        info!(
            ticket_id = ticket.id,
            contractor_id = contractor.id,
            "Assigned contractor"
        );
        ticket
    } else {
        existing
    };

    let mut warnings = Vec::new();
    if !changed {
        return Ok(TicketUpdate { ticket, warnings });
    }
    if contractor.email.is_empty() {
        warnings.push(format!(
            "Contractor {} has no email, work order not sent",
            contractor.company
        ));
        return Ok(TicketUpdate { ticket, warnings });
    }

    let work_order = OutgoingMail {
        to: contractor.email.clone(),
        subject: format!("Work order: {}", ticket.subject),
        body: format!(
            "Hello {},\n\nPlease repair the following damage.\n\nLocation: {}\nIssue: {}\nDescription: {}\n\nTenant phone: {}\nTenant email: {}\n\nPlease contact the tenant directly to arrange a visit.",
            contractor.company,
            location(db, &ticket).await?,
            ticket.subject,
            ticket.description,
            ticket.reporter_phone.as_deref().unwrap_or("-"),
            ticket.reporter_email.as_deref().unwrap_or("-"),
        ),
    };
    deliver(mailer, work_order, &mut warnings).await;

    if let Some(email) = &ticket.reporter_email {
        let info_mail = OutgoingMail {
            to: email.clone(),
            subject: format!("Update on your report: {}", ticket.subject),
            body: format!(
                "Hello,\n\nWe have commissioned {}. They will contact you to arrange a visit.\n\nKind regards\nYour property management",
                contractor.company
            ),
        };
        deliver(mailer, info_mail, &mut warnings).await;
    }

    Ok(TicketUpdate { ticket, warnings })
}

/// Changes a ticket's status, notifying the reporter if it actually changed.
pub async fn set_status(
    db: &DatabaseConnection,
    mailer: &dyn Mailer,
    ticket_id: TicketId,
    status: TicketStatus,
) -> Result<TicketUpdate> {
    let existing = get_ticket(db, ticket_id).await?;
    if existing.status == status {
        return Ok(TicketUpdate {
            ticket: existing,
            warnings: Vec::new(),
        });
    }

    let previous = existing.status;
    let mut model: ticket::ActiveModel = existing.into();
    model.status = Set(status);
    let ticket = model.update(db).await?;
    info!(
        ticket_id = ticket.id,
        from = previous.label(),
        to = status.label(),
        "Changed ticket status"
    );

    let mut warnings = Vec::new();
    if let Some(email) = &ticket.reporter_email {
        let mail = OutgoingMail {
            to: email.clone(),
            subject: format!("Status update: {}", ticket.subject),
            body: format!(
                "Hello,\n\nThe status of your report '{}' is now: {}.\n\nKind regards\nYour property management",
                ticket.subject,
                status.label()
            ),
        };
        deliver(mailer, mail, &mut warnings).await;
    }

    Ok(TicketUpdate { ticket, warnings })
}
