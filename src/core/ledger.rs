//! Lease-interval ledger - keeps each unit's occupancy timeline consistent.
//!
//! A unit's history is a date-ordered sequence of leases and vacancies that
//! must not overlap. Starting a lease closes whatever it supersedes; starting a
//! vacancy deactivates the running lease. Every mutation is one database
//! transaction (read the timeline, close intervals, insert the new one).
//!
//! Closure only ever looks forward: an interval is closed when it started
//! before the new start date and is still open on that date. Under
//! [`LedgerPolicy::Strict`] out-of-order inserts are rejected up front, so a
//! backfill can no longer truncate unrelated history. [`LedgerPolicy::Permissive`]
//! skips those checks for importing legacy data as-is.

use crate::{
    core::{
        ids::{LeaseId, TenantId, UnitId},
        property,
    },
    entities::{
        Lease, Vacancy, lease,
        lease::SignatureStatus,
        vacancy::{self, VacancyReason},
    },
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Mortgage reference rate (percent) applied when a lease does not name one.
pub const DEFAULT_REFERENCE_RATE: f64 = 1.75;

/// How strictly new intervals are checked against the existing timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerPolicy {
    /// Reject backfills and overlapping vacancies
    #[default]
    Strict,
    /// Apply forward closure only, without ordering checks
    Permissive,
}

/// Input for [`start_lease`]
#[derive(Debug, Clone)]
pub struct NewLease {
    /// Rented unit
    pub unit_id: UnitId,
    /// Renting tenant
    pub tenant_id: TenantId,
    /// First day
    pub start_date: NaiveDate,
    /// Planned last day, if fixed-term
    pub end_date: Option<NaiveDate>,
    /// Monthly net rent
    pub net_rent: f64,
    /// Monthly utility-cost advance
    pub utility_advance: f64,
    /// Reference rate in percent
    pub reference_rate: f64,
    /// Security deposit
    pub deposit: Option<f64>,
    /// Whether the lease takes over the unit (closes superseded intervals)
    pub active: bool,
}

impl NewLease {
    /// An active, open-ended lease without rent figures.
    #[must_use]
    pub const fn new(unit_id: UnitId, tenant_id: TenantId, start_date: NaiveDate) -> Self {
        Self {
            unit_id,
            tenant_id,
            start_date,
            end_date: None,
            net_rent: 0.0,
            utility_advance: 0.0,
            reference_rate: DEFAULT_REFERENCE_RATE,
            deposit: None,
            active: true,
        }
    }

    /// Sets the monthly net rent and utility-cost advance.
    #[must_use]
    pub const fn with_rent(mut self, net_rent: f64, utility_advance: f64) -> Self {
        self.net_rent = net_rent;
        self.utility_advance = utility_advance;
        self
    }
}

/// Input for [`start_vacancy`]
#[derive(Debug, Clone)]
pub struct NewVacancy {
    /// Vacant unit
    pub unit_id: UnitId,
    /// First vacant day
    pub start_date: NaiveDate,
    /// Last vacant day, if known
    pub end_date: Option<NaiveDate>,
    /// Reason code
    pub reason: VacancyReason,
    /// Free-text note
    pub note: String,
}

impl NewVacancy {
    /// An open-ended vacancy without note.
    #[must_use]
    pub const fn new(unit_id: UnitId, start_date: NaiveDate, reason: VacancyReason) -> Self {
        Self {
            unit_id,
            start_date,
            end_date: None,
            reason,
            note: String::new(),
        }
    }
}

/// One entry of a unit's timeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Interval {
    /// Occupied by a lease
    Lease(lease::Model),
    /// Recorded vacancy
    Vacancy(vacancy::Model),
}

/// Which table an interval lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalKind {
    /// `leases`
    Lease,
    /// `vacancies`
    Vacancy,
}

/// Lightweight reference to an interval, used in [`TimelineIssue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalRef {
    /// Table
    pub kind: IntervalKind,
    /// Primary key
    pub id: i64,
}

impl Interval {
    /// First day of the interval.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        match self {
            Self::Lease(l) => l.start_date,
            Self::Vacancy(v) => v.start_date,
        }
    }

    /// Last day of the interval, `None` while open-ended.
    #[must_use]
    pub const fn end(&self) -> Option<NaiveDate> {
        match self {
            Self::Lease(l) => l.end_date,
            Self::Vacancy(v) => v.end_date,
        }
    }

    /// Reference used in reports.
    #[must_use]
    pub const fn reference(&self) -> IntervalRef {
        match self {
            Self::Lease(l) => IntervalRef {
                kind: IntervalKind::Lease,
                id: l.id,
            },
            Self::Vacancy(v) => IntervalRef {
                kind: IntervalKind::Vacancy,
                id: v.id,
            },
        }
    }

    /// Whether the interval covers `date`.
    #[must_use]
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start() <= date && self.end().is_none_or(|end| end >= date)
    }

    /// Whether a new interval starting on `start` closes this one: it began
    /// earlier and is open (or ends) on or after `start`.
    #[must_use]
    pub fn is_superseded_by(&self, start: NaiveDate) -> bool {
        self.start() < start && self.end().is_none_or(|end| end >= start)
    }
}

/// A consistency problem found by [`check_timeline`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineIssue {
    /// End date lies before the start date
    Inverted(IntervalRef),
    /// Two intervals cover the same day
    Overlap {
        /// Earlier interval
        first: IntervalRef,
        /// Later interval
        second: IntervalRef,
    },
    /// Days between two intervals are not covered
    Gap {
        /// Interval before the gap
        after: IntervalRef,
        /// Interval after the gap
        before: IntervalRef,
        /// Number of uncovered days
        days: i64,
    },
}

/// Result of [`end_lease`]
#[derive(Debug, Clone)]
pub struct EndedLease {
    /// The closed lease
    pub lease: lease::Model,
    /// Follow-up vacancy, if requested
    pub vacancy: Option<vacancy::Model>,
}

fn day_before(date: NaiveDate) -> Result<NaiveDate> {
    date.pred_opt()
        .ok_or_else(|| Error::validation(format!("No day before {date}")))
}

fn day_after(date: NaiveDate) -> Result<NaiveDate> {
    date.succ_opt()
        .ok_or_else(|| Error::validation(format!("No day after {date}")))
}

fn check_end_after_start(start: NaiveDate, end: Option<NaiveDate>) -> Result<()> {
    match end {
        Some(end) if end < start => Err(Error::validation(format!(
            "End date {end} lies before start date {start}"
        ))),
        _ => Ok(()),
    }
}

fn check_money(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

/// Strict mode: the new start must come after every existing start.
fn ensure_in_order(unit_id: UnitId, timeline: &[Interval], start: NaiveDate) -> Result<()> {
    if let Some(later) = timeline.iter().find(|i| i.start() >= start) {
        return Err(Error::IntervalConflict {
            unit_id: unit_id.0,
            message: format!(
                "new interval starting {start} does not follow {:?} {} starting {}",
                later.reference().kind,
                later.reference().id,
                later.start()
            ),
        });
    }
    Ok(())
}

async fn load_timeline<C>(db: &C, unit_id: UnitId) -> Result<Vec<Interval>>
where
    C: ConnectionTrait,
{
    let leases = Lease::find()
        .filter(lease::Column::UnitId.eq(unit_id.0))
        .all(db)
        .await?;
    let vacancies = Vacancy::find()
        .filter(vacancy::Column::UnitId.eq(unit_id.0))
        .all(db)
        .await?;

    let mut timeline: Vec<Interval> = leases
        .into_iter()
        .map(Interval::Lease)
        .chain(vacancies.into_iter().map(Interval::Vacancy))
        .collect();
    timeline.sort_by_key(|i| (i.start(), i.reference().kind == IntervalKind::Lease, i.reference().id));
    Ok(timeline)
}

async fn close_lease<C>(db: &C, lease: &lease::Model, end: NaiveDate) -> Result<()>
where
    C: ConnectionTrait,
{
    let mut model: lease::ActiveModel = lease.clone().into();
    model.end_date = Set(Some(end));
    model.active = Set(false);
    model.update(db).await?;
    info!(
        lease_id = lease.id,
        unit_id = lease.unit_id,
        end_date = %end,
        "Closed lease"
    );
    Ok(())
}

async fn close_vacancy<C>(db: &C, vacancy: &vacancy::Model, end: NaiveDate) -> Result<()>
where
    C: ConnectionTrait,
{
    let mut model: vacancy::ActiveModel = vacancy.clone().into();
    model.end_date = Set(Some(end));
    model.update(db).await?;
    info!(
        vacancy_id = vacancy.id,
        unit_id = vacancy.unit_id,
        end_date = %end,
        "Closed vacancy"
    );
    Ok(())
}

/// Starts a lease on a unit.
///
/// If the new lease is active, every lease or vacancy on the unit that began
/// before the new start and is still open on it ends the day before. Several
/// open intervals (inconsistent legacy data) are all closed. Superseded
/// leases are deactivated.
pub async fn start_lease(
    db: &DatabaseConnection,
    policy: LedgerPolicy,
    input: NewLease,
) -> Result<lease::Model> {
    check_end_after_start(input.start_date, input.end_date)?;
    check_money(input.net_rent)?;
    check_money(input.utility_advance)?;
    if let Some(deposit) = input.deposit {
        check_money(deposit)?;
    }
    if !input.reference_rate.is_finite() || input.reference_rate < 0.0 {
        return Err(Error::validation(format!(
            "Reference rate must be non-negative, got {}",
            input.reference_rate
        )));
    }

    let txn = db.begin().await?;

    property::get_unit(&txn, input.unit_id).await?;
    property::get_tenant(&txn, input.tenant_id).await?;

    let timeline = load_timeline(&txn, input.unit_id).await?;
    if policy == LedgerPolicy::Strict {
        ensure_in_order(input.unit_id, &timeline, input.start_date)?;
    }

    if input.active {
        let closing_end = day_before(input.start_date)?;
        for interval in timeline
            .iter()
            .filter(|i| i.is_superseded_by(input.start_date))
        {
            match interval {
                Interval::Lease(l) => close_lease(&txn, l, closing_end).await?,
                Interval::Vacancy(v) => close_vacancy(&txn, v, closing_end).await?,
            }
        }
    }

    let lease = lease::ActiveModel {
        unit_id: Set(input.unit_id.0),
        tenant_id: Set(input.tenant_id.0),
        start_date: Set(input.start_date),
        end_date: Set(input.end_date),
        net_rent: Set(input.net_rent),
        utility_advance: Set(input.utility_advance),
        reference_rate: Set(input.reference_rate),
        deposit: Set(input.deposit),
        active: Set(input.active),
        signature_status: Set(SignatureStatus::NotSent),
        signature_tracking_id: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(
        lease_id = lease.id,
        unit_id = lease.unit_id,
        tenant_id = lease.tenant_id,
        start_date = %lease.start_date,
        active = lease.active,
        "Started lease"
    );
    Ok(lease)
}

async fn open_vacancy<C>(
    db: &C,
    policy: LedgerPolicy,
    timeline: &[Interval],
    input: NewVacancy,
) -> Result<vacancy::Model>
where
    C: ConnectionTrait,
{
    check_end_after_start(input.start_date, input.end_date)?;

    if policy == LedgerPolicy::Strict {
        ensure_in_order(input.unit_id, timeline, input.start_date)?;
        if let Some(open) = timeline.iter().find(|i| {
            matches!(i, Interval::Vacancy(_)) && i.is_superseded_by(input.start_date)
        }) {
            return Err(Error::IntervalConflict {
                unit_id: input.unit_id.0,
                message: format!(
                    "vacancy {} is still open on {}",
                    open.reference().id,
                    input.start_date
                ),
            });
        }
    }

    let closing_end = day_before(input.start_date)?;
    for interval in timeline {
        let Interval::Lease(lease) = interval else {
            continue;
        };
        if !lease.active {
            continue;
        }
        // Strict mode never moves an earlier end date later
        let end = match (policy, lease.end_date) {
            (LedgerPolicy::Strict, Some(existing)) if existing < closing_end => existing,
            _ => closing_end,
        };
        close_lease(db, lease, end).await?;
    }

    let vacancy = vacancy::ActiveModel {
        unit_id: Set(input.unit_id.0),
        start_date: Set(input.start_date),
        end_date: Set(input.end_date),
        reason: Set(input.reason),
        note: Set(input.note.trim().to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        vacancy_id = vacancy.id,
        unit_id = vacancy.unit_id,
        start_date = %vacancy.start_date,
        reason = ?vacancy.reason,
        "Started vacancy"
    );
    Ok(vacancy)
}

/// Records a vacancy on a unit.
///
/// Every active lease on the unit is deactivated and ends the day before the
/// vacancy starts.
pub async fn start_vacancy(
    db: &DatabaseConnection,
    policy: LedgerPolicy,
    input: NewVacancy,
) -> Result<vacancy::Model> {
    let txn = db.begin().await?;

    property::get_unit(&txn, input.unit_id).await?;
    let timeline = load_timeline(&txn, input.unit_id).await?;
    let vacancy = open_vacancy(&txn, policy, &timeline, input).await?;

    txn.commit().await?;
    Ok(vacancy)
}

/// Ends a lease on `end_date` and optionally opens a vacancy the day after.
///
/// Under [`LedgerPolicy::Strict`] the lease must still be active and the end
/// date must not reach into a later interval of the unit.
pub async fn end_lease(
    db: &DatabaseConnection,
    policy: LedgerPolicy,
    lease_id: LeaseId,
    end_date: NaiveDate,
    follow_up: Option<VacancyReason>,
) -> Result<EndedLease> {
    let txn = db.begin().await?;

    let existing = get_lease(&txn, lease_id).await?;
    if end_date < existing.start_date {
        return Err(Error::validation(format!(
            "End date {end_date} lies before lease start {}",
            existing.start_date
        )));
    }

    if policy == LedgerPolicy::Strict {
        let unit_id = UnitId(existing.unit_id);
        if !existing.active {
            return Err(Error::IntervalConflict {
                unit_id: unit_id.0,
                message: format!("lease {} is no longer active", existing.id),
            });
        }
        let timeline = load_timeline(&txn, unit_id).await?;
        let own = IntervalRef {
            kind: IntervalKind::Lease,
            id: existing.id,
        };
        if let Some(later) = timeline.iter().find(|i| {
            i.reference() != own && i.start() > existing.start_date && i.start() <= end_date
        }) {
            return Err(Error::IntervalConflict {
                unit_id: unit_id.0,
                message: format!(
                    "end date {end_date} reaches into {:?} {} starting {}",
                    later.reference().kind,
                    later.reference().id,
                    later.start()
                ),
            });
        }
    }

    close_lease(&txn, &existing, end_date).await?;
    let lease = get_lease(&txn, lease_id).await?;

    let vacancy = match follow_up {
        Some(reason) => {
            let unit_id = UnitId(lease.unit_id);
            let timeline = load_timeline(&txn, unit_id).await?;
            let input = NewVacancy::new(unit_id, day_after(end_date)?, reason);
            Some(open_vacancy(&txn, policy, &timeline, input).await?)
        }
        None => None,
    };

    txn.commit().await?;
    Ok(EndedLease { lease, vacancy })
}

/// Finds a lease by id.
pub async fn get_lease<C>(db: &C, lease_id: LeaseId) -> Result<lease::Model>
where
    C: ConnectionTrait,
{
    Lease::find_by_id(lease_id.0)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "lease",
            id: lease_id.0,
        })
}

/// Returns the active lease of a unit, if any.
pub async fn active_lease<C>(db: &C, unit_id: UnitId) -> Result<Option<lease::Model>>
where
    C: ConnectionTrait,
{
    Lease::find()
        .filter(lease::Column::UnitId.eq(unit_id.0))
        .filter(lease::Column::Active.eq(true))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns a unit's leases and vacancies ordered by start date.
pub async fn unit_timeline(db: &DatabaseConnection, unit_id: UnitId) -> Result<Vec<Interval>> {
    property::get_unit(db, unit_id).await?;
    load_timeline(db, unit_id).await
}

/// Checks an ordered timeline for inverted intervals, overlaps and gaps.
///
/// Intervals are compared against the one reaching furthest so far, so a long
/// interval overlapping several later ones is reported for each of them.
#[must_use]
pub fn check_timeline(timeline: &[Interval]) -> Vec<TimelineIssue> {
    let mut sorted: Vec<&Interval> = timeline.iter().collect();
    sorted.sort_by_key(|i| i.start());

    let mut issues = Vec::new();
    // (interval, end) of the interval reaching furthest; end None = open
    let mut reach: Option<(IntervalRef, Option<NaiveDate>)> = None;

    for interval in sorted {
        if interval.end().is_some_and(|end| end < interval.start()) {
            issues.push(TimelineIssue::Inverted(interval.reference()));
        }

        if let Some((previous, previous_end)) = reach {
            match previous_end {
                None => issues.push(TimelineIssue::Overlap {
                    first: previous,
                    second: interval.reference(),
                }),
                Some(end) if end >= interval.start() => issues.push(TimelineIssue::Overlap {
                    first: previous,
                    second: interval.reference(),
                }),
                Some(end) => {
                    let days = (interval.start() - end).num_days() - 1;
                    if days > 0 {
                        issues.push(TimelineIssue::Gap {
                            after: previous,
                            before: interval.reference(),
                            days,
                        });
                    }
                }
            }
        }

        let extends = match (reach, interval.end()) {
            (None, _) | (Some((_, Some(_))), None) => true,
            (Some((_, None)), _) => false,
            (Some((_, Some(current))), Some(end)) => end > current,
        };
        if extends {
            reach = Some((interval.reference(), interval.end()));
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    async fn reload_lease(db: &DatabaseConnection, id: i64) -> lease::Model {
        Lease::find_by_id(id).one(db).await.unwrap().unwrap()
    }

    async fn reload_vacancy(db: &DatabaseConnection, id: i64) -> vacancy::Model {
        Vacancy::find_by_id(id).one(db).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_new_lease_closes_open_lease() -> Result<()> {
        let (db, _building, unit, tenant) = setup_with_unit_and_tenant().await?;
        let next_tenant = create_test_tenant(&db, "Keller").await?;
        let unit_id = UnitId(unit.id);

        let old = start_lease(
            &db,
            LedgerPolicy::Strict,
            NewLease::new(unit_id, TenantId(tenant.id), date(2022, 4, 1)).with_rent(1500.0, 180.0),
        )
        .await?;
        let new = start_lease(
            &db,
            LedgerPolicy::Strict,
            NewLease::new(unit_id, TenantId(next_tenant.id), date(2024, 10, 1)),
        )
        .await?;

        let old = reload_lease(&db, old.id).await;
        assert_eq!(old.end_date, Some(date(2024, 9, 30)));
        assert!(!old.active);
        assert_eq!(new.end_date, None);
        assert!(new.active);
        assert_eq!(new.signature_status, SignatureStatus::NotSent);
        assert_eq!(new.reference_rate, DEFAULT_REFERENCE_RATE);

        let active = active_lease(&db, unit_id).await?.unwrap();
        assert_eq!(active.id, new.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_new_lease_closes_open_vacancy() -> Result<()> {
        let (db, _building, unit, tenant) = setup_with_unit_and_tenant().await?;
        let unit_id = UnitId(unit.id);

        let vacancy = start_vacancy(
            &db,
            LedgerPolicy::Strict,
            NewVacancy::new(unit_id, date(2024, 1, 1), VacancyReason::NoTenant),
        )
        .await?;
        start_lease(
            &db,
            LedgerPolicy::Strict,
            NewLease::new(unit_id, TenantId(tenant.id), date(2024, 3, 1)),
        )
        .await?;

        let vacancy = reload_vacancy(&db, vacancy.id).await;
        assert_eq!(vacancy.end_date, Some(date(2024, 2, 29)));

        let timeline = unit_timeline(&db, unit_id).await?;
        assert_eq!(timeline.len(), 2);
        assert!(check_timeline(&timeline).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_vacancy_deactivates_active_lease() -> Result<()> {
        let (db, _building, unit, tenant) = setup_with_unit_and_tenant().await?;
        let unit_id = UnitId(unit.id);

        let lease = start_lease(
            &db,
            LedgerPolicy::Strict,
            NewLease::new(unit_id, TenantId(tenant.id), date(2021, 7, 1)),
        )
        .await?;
        assert!(lease.active);
        assert_eq!(lease.end_date, None);

        let vacancy = start_vacancy(
            &db,
            LedgerPolicy::Strict,
            NewVacancy::new(unit_id, date(2024, 6, 1), VacancyReason::Renovation),
        )
        .await?;

        let lease = reload_lease(&db, lease.id).await;
        assert_eq!(lease.end_date, Some(date(2024, 5, 31)));
        assert!(!lease.active);
        assert_eq!(vacancy.end_date, None);
        assert!(active_lease(&db, unit_id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_inactive_lease_closes_nothing() -> Result<()> {
        let (db, _building, unit, tenant) = setup_with_unit_and_tenant().await?;
        let unit_id = UnitId(unit.id);

        let running = start_lease(
            &db,
            LedgerPolicy::Strict,
            NewLease::new(unit_id, TenantId(tenant.id), date(2023, 1, 1)),
        )
        .await?;

        let mut draft = NewLease::new(unit_id, TenantId(tenant.id), date(2025, 1, 1));
        draft.active = false;
        let draft = start_lease(&db, LedgerPolicy::Strict, draft).await?;

        let running = reload_lease(&db, running.id).await;
        assert!(running.active);
        assert_eq!(running.end_date, None);
        assert!(!draft.active);
        Ok(())
    }

    #[tokio::test]
    async fn test_fixed_term_lease_is_cut_short() -> Result<()> {
        let (db, _building, unit, tenant) = setup_with_unit_and_tenant().await?;
        let unit_id = UnitId(unit.id);

        let mut fixed = NewLease::new(unit_id, TenantId(tenant.id), date(2024, 1, 1));
        fixed.end_date = Some(date(2024, 12, 31));
        let fixed = start_lease(&db, LedgerPolicy::Strict, fixed).await?;

        start_lease(
            &db,
            LedgerPolicy::Strict,
            NewLease::new(unit_id, TenantId(tenant.id), date(2024, 7, 1)),
        )
        .await?;

        let fixed = reload_lease(&db, fixed.id).await;
        assert_eq!(fixed.end_date, Some(date(2024, 6, 30)));
        Ok(())
    }

    #[tokio::test]
    async fn test_closed_history_before_new_start_is_untouched() -> Result<()> {
        let (db, _building, unit, tenant) = setup_with_unit_and_tenant().await?;
        let unit_id = UnitId(unit.id);

        let mut first = NewLease::new(unit_id, TenantId(tenant.id), date(2020, 1, 1));
        first.end_date = Some(date(2020, 12, 31));
        first.active = false;
        let first = start_lease(&db, LedgerPolicy::Strict, first).await?;

        start_lease(
            &db,
            LedgerPolicy::Strict,
            NewLease::new(unit_id, TenantId(tenant.id), date(2021, 1, 1)),
        )
        .await?;

        let first = reload_lease(&db, first.id).await;
        assert_eq!(first.end_date, Some(date(2020, 12, 31)));
        Ok(())
    }

    #[tokio::test]
    async fn test_strict_policy_rejects_backfill() -> Result<()> {
        let (db, _building, unit, tenant) = setup_with_unit_and_tenant().await?;
        let unit_id = UnitId(unit.id);

        let mut first = NewLease::new(unit_id, TenantId(tenant.id), date(2020, 1, 1));
        first.end_date = Some(date(2022, 12, 31));
        let first = start_lease(&db, LedgerPolicy::Strict, first).await?;
        start_lease(
            &db,
            LedgerPolicy::Strict,
            NewLease::new(unit_id, TenantId(tenant.id), date(2023, 1, 1)),
        )
        .await?;

        let result = start_lease(
            &db,
            LedgerPolicy::Strict,
            NewLease::new(unit_id, TenantId(tenant.id), date(2021, 6, 1)),
        )
        .await;
        assert!(matches!(result, Err(Error::IntervalConflict { .. })));

        // Nothing changed
        let first = reload_lease(&db, first.id).await;
        assert_eq!(first.end_date, Some(date(2022, 12, 31)));
        assert_eq!(unit_timeline(&db, unit_id).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_permissive_policy_backfill_truncates_history() -> Result<()> {
        let (db, _building, unit, tenant) = setup_with_unit_and_tenant().await?;
        let unit_id = UnitId(unit.id);

        let mut first = NewLease::new(unit_id, TenantId(tenant.id), date(2020, 1, 1));
        first.end_date = Some(date(2022, 12, 31));
        first.active = false;
        let first = start_lease(&db, LedgerPolicy::Permissive, first).await?;
        let second = start_lease(
            &db,
            LedgerPolicy::Permissive,
            NewLease::new(unit_id, TenantId(tenant.id), date(2023, 1, 1)),
        )
        .await?;

        start_lease(
            &db,
            LedgerPolicy::Permissive,
            NewLease::new(unit_id, TenantId(tenant.id), date(2021, 6, 1)),
        )
        .await?;

        // The interval containing the backfill date is cut, the later one is not
        let first = reload_lease(&db, first.id).await;
        assert_eq!(first.end_date, Some(date(2021, 5, 31)));
        let second = reload_lease(&db, second.id).await;
        assert_eq!(second.end_date, None);

        let issues = check_timeline(&unit_timeline(&db, unit_id).await?);
        assert!(
            issues
                .iter()
                .any(|issue| matches!(issue, TimelineIssue::Overlap { .. }))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_strict_policy_rejects_overlapping_vacancy() -> Result<()> {
        let (db, _building, unit, _tenant) = setup_with_unit_and_tenant().await?;
        let unit_id = UnitId(unit.id);

        start_vacancy(
            &db,
            LedgerPolicy::Strict,
            NewVacancy::new(unit_id, date(2024, 1, 1), VacancyReason::NoTenant),
        )
        .await?;

        let result = start_vacancy(
            &db,
            LedgerPolicy::Strict,
            NewVacancy::new(unit_id, date(2024, 2, 1), VacancyReason::Renovation),
        )
        .await;
        assert!(matches!(result, Err(Error::IntervalConflict { .. })));

        // Permissive mode records it anyway
        start_vacancy(
            &db,
            LedgerPolicy::Permissive,
            NewVacancy::new(unit_id, date(2024, 2, 1), VacancyReason::Renovation),
        )
        .await?;
        assert_eq!(unit_timeline(&db, unit_id).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_end_lease_with_follow_up_vacancy() -> Result<()> {
        let (db, _building, unit, tenant) = setup_with_unit_and_tenant().await?;
        let unit_id = UnitId(unit.id);

        let lease = start_lease(
            &db,
            LedgerPolicy::Strict,
            NewLease::new(unit_id, TenantId(tenant.id), date(2022, 1, 1)),
        )
        .await?;

        let ended = end_lease(
            &db,
            LedgerPolicy::Strict,
            LeaseId(lease.id),
            date(2024, 3, 31),
            Some(VacancyReason::NoTenant),
        )
        .await?;

        assert_eq!(ended.lease.end_date, Some(date(2024, 3, 31)));
        assert!(!ended.lease.active);
        let vacancy = ended.vacancy.unwrap();
        assert_eq!(vacancy.start_date, date(2024, 4, 1));
        assert_eq!(vacancy.end_date, None);

        assert!(check_timeline(&unit_timeline(&db, unit_id).await?).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_end_lease_before_start_is_rejected() -> Result<()> {
        let (db, _building, unit, tenant) = setup_with_unit_and_tenant().await?;
        let lease = start_lease(
            &db,
            LedgerPolicy::Strict,
            NewLease::new(UnitId(unit.id), TenantId(tenant.id), date(2022, 1, 1)),
        )
        .await?;

        let result = end_lease(
            &db,
            LedgerPolicy::Strict,
            LeaseId(lease.id),
            date(2021, 12, 31),
            None,
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_end_superseded_lease_is_rejected() -> Result<()> {
        let (db, _building, unit, tenant) = setup_with_unit_and_tenant().await?;
        let unit_id = UnitId(unit.id);
        let next_tenant = create_test_tenant(&db, "Keller").await?;

        let first = start_lease(
            &db,
            LedgerPolicy::Strict,
            NewLease::new(unit_id, TenantId(tenant.id), date(2020, 1, 1)),
        )
        .await?;
        let second = start_lease(
            &db,
            LedgerPolicy::Strict,
            NewLease::new(unit_id, TenantId(next_tenant.id), date(2023, 1, 1)),
        )
        .await?;

        let result = end_lease(
            &db,
            LedgerPolicy::Strict,
            LeaseId(first.id),
            date(2024, 6, 30),
            Some(VacancyReason::NoTenant),
        )
        .await;
        assert!(matches!(result, Err(Error::IntervalConflict { .. })));

        let first = get_lease(&db, LeaseId(first.id)).await?;
        let second = get_lease(&db, LeaseId(second.id)).await?;
        assert_eq!(first.end_date, Some(date(2022, 12, 31)));
        assert!(second.active);
        assert_eq!(second.end_date, None);
        assert!(check_timeline(&unit_timeline(&db, unit_id).await?).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_end_lease_into_later_interval_is_rejected() -> Result<()> {
        let (db, _building, unit, tenant) = setup_with_unit_and_tenant().await?;
        let unit_id = UnitId(unit.id);

        // An inactive lease cannot be ended again
        let mut planned = NewLease::new(unit_id, TenantId(tenant.id), date(2024, 1, 1));
        planned.active = false;
        let lease = start_lease(&db, LedgerPolicy::Strict, planned).await?;
        let result =
            end_lease(&db, LedgerPolicy::Strict, LeaseId(lease.id), date(2024, 6, 30), None).await;
        assert!(matches!(result, Err(Error::IntervalConflict { .. })));

        let db = setup_test_db().await?;
        let building = create_test_building(&db).await?;
        let unit = create_test_unit(&db, building.id, "Apt 2", 60.0, 100.0).await?;
        let tenant = create_test_tenant(&db, "Huber").await?;
        let unit_id = UnitId(unit.id);
        let lease = start_lease(
            &db,
            LedgerPolicy::Strict,
            NewLease::new(unit_id, TenantId(tenant.id), date(2024, 1, 1)),
        )
        .await?;
        // Legacy data: lease still active although a vacancy follows it
        let mut later = NewVacancy::new(unit_id, date(2024, 9, 1), VacancyReason::Renovation);
        later.end_date = Some(date(2024, 9, 30));
        start_vacancy(&db, LedgerPolicy::Permissive, later).await?;
        let reopened = lease::ActiveModel {
            id: Set(lease.id),
            active: Set(true),
            end_date: Set(None),
            ..Default::default()
        };
        reopened.update(&db).await?;

        let result =
            end_lease(&db, LedgerPolicy::Strict, LeaseId(lease.id), date(2024, 12, 31), None).await;
        assert!(matches!(result, Err(Error::IntervalConflict { .. })));

        let ended =
            end_lease(&db, LedgerPolicy::Strict, LeaseId(lease.id), date(2024, 8, 31), None).await?;
        assert_eq!(ended.lease.end_date, Some(date(2024, 8, 31)));
        Ok(())
    }

    #[tokio::test]
    async fn test_start_lease_validation() -> Result<()> {
        let (db, _building, unit, tenant) = setup_with_unit_and_tenant().await?;

        let mut inverted = NewLease::new(UnitId(unit.id), TenantId(tenant.id), date(2024, 5, 1));
        inverted.end_date = Some(date(2024, 4, 30));
        let result = start_lease(&db, LedgerPolicy::Permissive, inverted).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let negative = NewLease::new(UnitId(unit.id), TenantId(tenant.id), date(2024, 5, 1))
            .with_rent(-10.0, 0.0);
        let result = start_lease(&db, LedgerPolicy::Strict, negative).await;
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));

        let unknown_unit = NewLease::new(UnitId(999), TenantId(tenant.id), date(2024, 5, 1));
        let result = start_lease(&db, LedgerPolicy::Strict, unknown_unit).await;
        assert!(matches!(
            result,
            Err(Error::NotFound { entity: "unit", .. })
        ));
        Ok(())
    }

    fn lease_interval(id: i64, start: NaiveDate, end: Option<NaiveDate>) -> Interval {
        Interval::Lease(lease::Model {
            id,
            unit_id: 1,
            tenant_id: 1,
            start_date: start,
            end_date: end,
            net_rent: 0.0,
            utility_advance: 0.0,
            reference_rate: DEFAULT_REFERENCE_RATE,
            deposit: None,
            active: end.is_none(),
            signature_status: SignatureStatus::NotSent,
            signature_tracking_id: None,
        })
    }

    fn vacancy_interval(id: i64, start: NaiveDate, end: Option<NaiveDate>) -> Interval {
        Interval::Vacancy(vacancy::Model {
            id,
            unit_id: 1,
            start_date: start,
            end_date: end,
            reason: VacancyReason::NoTenant,
            note: String::new(),
        })
    }

    #[test]
    fn test_check_timeline_detects_issues() {
        let timeline = vec![
            lease_interval(1, date(2020, 1, 1), Some(date(2020, 12, 31))),
            // gap of 31 days (January 2021)
            vacancy_interval(2, date(2021, 2, 1), Some(date(2021, 6, 30))),
            // overlaps the vacancy
            lease_interval(3, date(2021, 6, 1), None),
            lease_interval(4, date(2022, 1, 1), Some(date(2021, 12, 1))),
        ];

        let issues = check_timeline(&timeline);
        assert_eq!(
            issues,
            vec![
                TimelineIssue::Gap {
                    after: IntervalRef {
                        kind: IntervalKind::Lease,
                        id: 1
                    },
                    before: IntervalRef {
                        kind: IntervalKind::Vacancy,
                        id: 2
                    },
                    days: 31,
                },
                TimelineIssue::Overlap {
                    first: IntervalRef {
                        kind: IntervalKind::Vacancy,
                        id: 2
                    },
                    second: IntervalRef {
                        kind: IntervalKind::Lease,
                        id: 3
                    },
                },
                TimelineIssue::Inverted(IntervalRef {
                    kind: IntervalKind::Lease,
                    id: 4
                }),
                TimelineIssue::Overlap {
                    first: IntervalRef {
                        kind: IntervalKind::Lease,
                        id: 3
                    },
                    second: IntervalRef {
                        kind: IntervalKind::Lease,
                        id: 4
                    },
                },
            ]
        );
    }

    #[test]
    fn test_interval_predicates() {
        let open = lease_interval(1, date(2024, 1, 1), None);
        assert!(open.covers(date(2030, 1, 1)));
        assert!(!open.covers(date(2023, 12, 31)));
        assert!(open.is_superseded_by(date(2024, 1, 2)));
        assert!(!open.is_superseded_by(date(2024, 1, 1)));

        let closed = vacancy_interval(2, date(2024, 1, 1), Some(date(2024, 3, 31)));
        assert!(closed.is_superseded_by(date(2024, 3, 31)));
        assert!(!closed.is_superseded_by(date(2024, 4, 1)));
    }
}
