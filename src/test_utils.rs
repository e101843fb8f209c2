//! Shared test utilities.
//!
//! In-memory databases, fixture records with sensible defaults, and stand-ins
//! for the external services.

use crate::{
    core::{
        documents::{DocumentContext, DocumentRenderer},
        ids::BuildingId,
        property::{self, NewBuilding, NewTenant, NewUnit},
    },
    entities::{self, unit::UnitKind},
    errors::{Error, Result},
    integrations::{
        mail::{Mailer, OutgoingMail},
        registry::{RegistryClient, RegistryUnit},
        signature::{SignatureClient, SignatureRequest},
    },
};
use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use std::sync::Mutex;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Shorthand for a calendar date; panics on an impossible date.
#[allow(clippy::unwrap_used)]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Creates a test building.
///
/// # Defaults
/// * address: Seestrasse 12, 8800 Thalwil ZH
/// * `iban`: a valid Swiss IBAN
///
/// Calling it twice creates two buildings at the same address.
pub async fn create_test_building(db: &DatabaseConnection) -> Result<entities::building::Model> {
    property::create_building(
        db,
        NewBuilding {
            street: "Seestrasse 12".to_string(),
            postal_code: "8800".to_string(),
            city: "Thalwil".to_string(),
            canton: "ZH".to_string(),
            iban: "CH9300762011623852957".to_string(),
        },
    )
    .await
}

/// Creates a residential test unit with the given area and monthly advance.
pub async fn create_test_unit(
    db: &DatabaseConnection,
    building_id: i64,
    label: &str,
    area_m2: f64,
    monthly_advance: f64,
) -> Result<entities::unit::Model> {
    property::create_unit(
        db,
        NewUnit {
            building_id: BuildingId(building_id),
            label: label.to_string(),
            kind: UnitKind::Residential,
            rooms: Some(3.5),
            floor: 1,
            area_m2,
            target_net_rent: 1500.0,
            target_utility_advance: monthly_advance,
        },
    )
    .await
}

/// Creates a test tenant with the given last name and an email derived from it.
pub async fn create_test_tenant(
    db: &DatabaseConnection,
    last_name: &str,
) -> Result<entities::tenant::Model> {
    property::create_tenant(
        db,
        NewTenant {
            first_name: "Test".to_string(),
            last_name: last_name.to_string(),
            email: format!("{}@example.ch", last_name.to_lowercase()),
            street: "Bahnhofstrasse 1".to_string(),
            postal_code: "8001".to_string(),
            city: "Zürich".to_string(),
            ..NewTenant::default()
        },
    )
    .await
}

/// Database with one building, one unit (`Apt 1`, 50 m², advance 100) and
/// one tenant (Anna Meier) who is not yet linked to the unit.
pub async fn setup_with_unit_and_tenant() -> Result<(
    DatabaseConnection,
    entities::building::Model,
    entities::unit::Model,
    entities::tenant::Model,
)> {
    let db = setup_test_db().await?;
    let building = create_test_building(&db).await?;
    let unit = create_test_unit(&db, building.id, "Apt 1", 50.0, 100.0).await?;
    let tenant = property::create_tenant(
        &db,
        NewTenant {
            first_name: "Anna".to_string(),
            last_name: "Meier".to_string(),
            email: "anna.meier@example.ch".to_string(),
            phone: "+41 79 123 45 67".to_string(),
            street: "Dorfstrasse 3".to_string(),
            postal_code: "8000".to_string(),
            city: "Zürich".to_string(),
            ..NewTenant::default()
        },
    )
    .await?;
    Ok((db, building, unit, tenant))
}

/// Mailer that keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl RecordingMailer {
    /// Messages sent so far.
    #[allow(clippy::unwrap_used)]
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    #[allow(clippy::unwrap_used)]
    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

/// Mailer whose every delivery fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _mail: &OutgoingMail) -> Result<()> {
        Err(Error::external("mail", "SMTP server unreachable"))
    }
}

/// Registry returning canned data, or failing on every call.
#[derive(Debug, Clone, Default)]
pub struct StubRegistry {
    /// Answer to address lookups
    pub registry_id: Option<i64>,
    /// Answer to construction-year lookups
    pub construction_year: Option<i32>,
    /// Answer to dwelling lookups
    pub units: Vec<RegistryUnit>,
    /// Fail every call instead
    pub fail: bool,
}

impl StubRegistry {
    fn check(&self) -> Result<()> {
        if self.fail {
            return Err(Error::external("registry", "service unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl RegistryClient for StubRegistry {
    async fn find_registry_id(
        &self,
        _street: &str,
        _postal_code: &str,
        _city: &str,
    ) -> Result<Option<i64>> {
        self.check()?;
        Ok(self.registry_id)
    }

    async fn find_units(&self, _registry_id: i64) -> Result<Vec<RegistryUnit>> {
        self.check()?;
        Ok(self.units.clone())
    }

    async fn find_construction_year(&self, _registry_id: i64) -> Result<Option<i32>> {
        self.check()?;
        Ok(self.construction_year)
    }
}

/// Signing service that records submissions and serves one document.
#[derive(Debug, Default)]
pub struct StubSignature {
    /// Tracking id handed out for every submission
    pub tracking_id: String,
    /// Bytes returned by downloads; `None` makes downloads fail
    pub document: Option<Vec<u8>>,
    /// Requests received so far
    pub submitted: Mutex<Vec<SignatureRequest>>,
    /// URLs requested so far
    pub downloads: Mutex<Vec<String>>,
}

impl StubSignature {
    /// Requests submitted so far.
    #[allow(clippy::unwrap_used)]
    pub fn submitted(&self) -> Vec<SignatureRequest> {
        self.submitted.lock().unwrap().clone()
    }

    /// URLs downloaded so far.
    #[allow(clippy::unwrap_used)]
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl SignatureClient for StubSignature {
    #[allow(clippy::unwrap_used)]
    async fn submit(&self, request: &SignatureRequest) -> Result<String> {
        self.submitted.lock().unwrap().push(request.clone());
        Ok(self.tracking_id.clone())
    }

    #[allow(clippy::unwrap_used)]
    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.downloads.lock().unwrap().push(url.to_string());
        self.document
            .clone()
            .ok_or_else(|| Error::external("e-signature", "document not found"))
    }
}

/// Renderer that outputs the template id as the document body.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubRenderer;

impl DocumentRenderer for StubRenderer {
    fn render(&self, template_id: &str, _context: &DocumentContext) -> Result<Vec<u8>> {
        Ok(template_id.as_bytes().to_vec())
    }
}
