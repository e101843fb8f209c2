//! Portfolio reporting.
//!
//! Produces the numbers shown on the back-office dashboard. Functions return
//! structured data; formatting is up to the caller.

use crate::{
    entities::{Building, Lease, Ticket, Unit, lease, ticket, ticket::TicketStatus},
    errors::Result,
};
use sea_orm::{QuerySelect, prelude::*};
use serde::Serialize;
use std::collections::HashSet;

/// Portfolio-wide key figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    /// Number of buildings
    pub buildings: u64,
    /// Number of units
    pub units: u64,
    /// Units with an active lease
    pub occupied_units: u64,
    /// Units without an active lease
    pub vacant_units: u64,
    /// Vacant share in percent, one decimal
    pub vacancy_percent: f64,
    /// Sum of all units' monthly target net rent
    pub total_target_rent: f64,
    /// Tickets not yet done
    pub open_tickets: u64,
}

/// Vacancy rate in percent, rounded to one decimal; 0 without units.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn vacancy_percent(vacant: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let percent = vacant as f64 / total as f64 * 100.0;
    (percent * 10.0).round() / 10.0
}

/// Computes the portfolio summary.
pub async fn portfolio_summary(db: &DatabaseConnection) -> Result<PortfolioSummary> {
    let buildings = Building::find().count(db).await?;
    let units = Unit::find().all(db).await?;

    let occupied: HashSet<i64> = Lease::find()
        .select_only()
        .column(lease::Column::UnitId)
        .filter(lease::Column::Active.eq(true))
        .into_tuple::<i64>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    let open_tickets = Ticket::find()
        .filter(ticket::Column::Status.ne(TicketStatus::Done))
        .count(db)
        .await?;

    let unit_count = units.len() as u64;
    let occupied_units = units.iter().filter(|u| occupied.contains(&u.id)).count() as u64;
    let vacant_units = unit_count - occupied_units;
    let total_target_rent =
        crate::core::format::round2(units.iter().map(|u| u.target_net_rent).sum());

    Ok(PortfolioSummary {
        buildings,
        units: unit_count,
        occupied_units,
        vacant_units,
        vacancy_percent: vacancy_percent(vacant_units, unit_count),
        total_target_rent,
        open_tickets,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::ids::{TenantId, TicketId, UnitId};
    use crate::core::ledger::{self, LedgerPolicy, NewLease};
    use crate::core::ticket::{self, NewTicket};
    use crate::entities::ticket::TicketPriority;
    use crate::test_utils::*;

    #[test]
    fn test_vacancy_percent() {
        assert_eq!(vacancy_percent(0, 0), 0.0);
        assert_eq!(vacancy_percent(1, 3), 33.3);
        assert_eq!(vacancy_percent(2, 3), 66.7);
        assert_eq!(vacancy_percent(4, 4), 100.0);
    }

    #[tokio::test]
    async fn test_empty_portfolio() -> Result<()> {
        let db = setup_test_db().await?;
        let summary = portfolio_summary(&db).await?;
        assert_eq!(summary.units, 0);
        assert_eq!(summary.vacancy_percent, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_portfolio_summary() -> Result<()> {
        let (db, building, unit, tenant) = setup_with_unit_and_tenant().await?;
        create_test_unit(&db, building.id, "B", 60.0, 120.0).await?;
        create_test_unit(&db, building.id, "C", 70.0, 140.0).await?;
        ledger::start_lease(
            &db,
            LedgerPolicy::Strict,
            NewLease::new(UnitId(unit.id), TenantId(tenant.id), date(2024, 1, 1)),
        )
        .await?;

        let mailer = RecordingMailer::default();
        let input = |subject: &str| NewTicket {
            lease_id: None,
            subject: subject.to_string(),
            description: String::new(),
            priority: TicketPriority::Normal,
            reporter_email: None,
            reporter_phone: None,
        };
        ticket::create_ticket(&db, &mailer, input("Door")).await?;
        let done = ticket::create_ticket(&db, &mailer, input("Key")).await?;
        ticket::set_status(&db, &mailer, TicketId(done.ticket.id), TicketStatus::Done).await?;

        let summary = portfolio_summary(&db).await?;
        assert_eq!(summary.buildings, 1);
        assert_eq!(summary.units, 3);
        assert_eq!(summary.occupied_units, 1);
        assert_eq!(summary.vacant_units, 2);
        assert_eq!(summary.vacancy_percent, 66.7);
        assert_eq!(summary.open_tickets, 1);
        Ok(())
    }
}
