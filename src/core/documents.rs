//! Document generation and storage.
//!
//! Contexts are built here, turned into bytes by a [`DocumentRenderer`] and
//! kept in the `documents` table. The renderer is a seam: the bundled
//! [`TemplateDirRenderer`] fills plain-text templates, [`PdfFileRenderer`]
//! hands over a finished PDF, and other renderers can be plugged in without
//! touching the context builders.

use crate::{
    config::{AppConfig, settings::DocumentsConfig},
    core::{
        billing::StatementLine,
        format::{fixed2, sanitize_filename, swiss_date, swiss_money},
        ids::{BuildingId, LeaseId, TenantId, UnitId},
        ledger, property,
    },
    entities::{
        Document, billing_period, building, document, document::DocumentKind, unit::UnitKind,
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

/// A value placed into a document template.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    /// Printed as-is
    Text(String),
    /// Printed with Swiss thousands separators, e.g. `1'250.50`
    Money(f64),
    /// Printed as `dd.mm.yyyy`
    Date(NaiveDate),
}

impl ContextValue {
    /// Display form used in templates.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Money(amount) => swiss_money(*amount),
            Self::Date(date) => swiss_date(*date),
        }
    }
}

/// Ordered key/value map handed to a renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentContext {
    values: BTreeMap<String, ContextValue>,
}

impl DocumentContext {
    /// Empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a value.
    pub fn insert(&mut self, key: &str, value: ContextValue) -> &mut Self {
        self.values.insert(key.to_string(), value);
        self
    }

    /// Adds a text value.
    pub fn text(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.insert(key, ContextValue::Text(value.into()))
    }

    /// Adds a money value.
    pub fn money(&mut self, key: &str, amount: f64) -> &mut Self {
        self.insert(key, ContextValue::Money(amount))
    }

    /// Adds a date value.
    pub fn date(&mut self, key: &str, date: NaiveDate) -> &mut Self {
        self.insert(key, ContextValue::Date(date))
    }

    /// Raw value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    /// Rendered value for `key`.
    #[must_use]
    pub fn rendered(&self, key: &str) -> Option<String> {
        self.get(key).map(ContextValue::render)
    }

    /// Iterates keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the context is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Turns a template id plus context into document bytes.
pub trait DocumentRenderer: Send + Sync {
    /// Renders the template.
    ///
    /// # Errors
    /// [`Error::Document`] with the renderer's message.
    fn render(&self, template_id: &str, context: &DocumentContext) -> Result<Vec<u8>>;

    /// Extension of the produced files, without dot.
    fn file_extension(&self) -> &'static str {
        "pdf"
    }
}

/// Replaces every `{{ key }}` placeholder in `template`.
///
/// Whitespace inside the braces is ignored. An unknown key or an unclosed
/// placeholder is a document error.
pub fn fill_template(template: &str, context: &DocumentContext) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            return Err(Error::Document {
                message: "Unclosed placeholder in template".to_string(),
            });
        };

        let key = after_open[..close].trim();
        let value = context.rendered(key).ok_or_else(|| Error::Document {
            message: format!("Unknown placeholder '{key}' in template"),
        })?;
        out.push_str(&value);
        rest = &after_open[close + 2..];
    }
    out.push_str(rest);

    Ok(out)
}

/// Renders `<template_dir>/<template id>.txt` templates.
#[derive(Debug, Clone)]
pub struct TemplateDirRenderer {
    dir: PathBuf,
}

impl TemplateDirRenderer {
    /// Renderer over the configured template directory.
    #[must_use]
    pub fn new(config: &DocumentsConfig) -> Self {
        Self {
            dir: config.template_dir.clone(),
        }
    }
}

impl DocumentRenderer for TemplateDirRenderer {
    fn render(&self, template_id: &str, context: &DocumentContext) -> Result<Vec<u8>> {
        let path = self.dir.join(format!("{template_id}.txt"));
        let template = std::fs::read_to_string(&path).map_err(|e| Error::Document {
            message: format!("Template {} unavailable: {e}", path.display()),
        })?;
        fill_template(&template, context).map(String::into_bytes)
    }

    fn file_extension(&self) -> &'static str {
        "txt"
    }
}

/// Serves an already produced PDF, e.g. a contract exported from an office
/// suite. The context is not used.
#[derive(Debug, Clone)]
pub struct PdfFileRenderer {
    path: PathBuf,
}

impl PdfFileRenderer {
    /// Renderer returning the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DocumentRenderer for PdfFileRenderer {
    fn render(&self, _template_id: &str, _context: &DocumentContext) -> Result<Vec<u8>> {
        let bytes = std::fs::read(&self.path).map_err(|e| Error::Document {
            message: format!("PDF {} unavailable: {e}", self.path.display()),
        })?;
        if !bytes.starts_with(b"%PDF-") {
            return Err(Error::Document {
                message: format!("{} is not a PDF file", self.path.display()),
            });
        }
        Ok(bytes)
    }
}

/// A context ready for rendering, with its template and naming.
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    /// Template to render
    pub template_id: &'static str,
    /// Human-readable title
    pub title: String,
    /// Placeholder values
    pub context: DocumentContext,
}

impl PreparedDocument {
    /// File name derived from the title.
    #[must_use]
    pub fn filename(&self, extension: &str) -> String {
        format!("{}.{extension}", sanitize_filename(&self.title))
    }

    /// Renders the document with `renderer`.
    pub fn render(&self, renderer: &dyn DocumentRenderer) -> Result<Vec<u8>> {
        renderer.render(self.template_id, &self.context)
    }
}

/// Template for a lease contract: parking stalls use a short form.
#[must_use]
pub const fn lease_template(kind: UnitKind) -> &'static str {
    match kind {
        UnitKind::Parking => "lease_parking",
        UnitKind::Residential | UnitKind::Commercial => "lease_residential",
    }
}

fn add_building(context: &mut DocumentContext, building: &building::Model) {
    context
        .text("building_street", &building.street)
        .text("building_postal_code", &building.postal_code)
        .text("building_city", &building.city);
}

/// Builds the lease contract context.
pub async fn lease_contract_context(
    db: &DatabaseConnection,
    config: &AppConfig,
    lease_id: LeaseId,
    today: NaiveDate,
) -> Result<PreparedDocument> {
    let lease = ledger::get_lease(db, lease_id).await?;
    let unit = property::get_unit(db, UnitId(lease.unit_id)).await?;
    let building = property::get_building(db, BuildingId(unit.building_id)).await?;
    let tenant = property::get_tenant(db, TenantId(lease.tenant_id)).await?;

    let mut context = DocumentContext::new();
    context
        .text("management_name", &config.management.name)
        .text("tenant_name", tenant.display_name())
        .text("tenant_street", &tenant.street)
        .text("tenant_postal_code", &tenant.postal_code)
        .text("tenant_city", &tenant.city)
        .text("unit_label", &unit.label)
        .text("unit_floor", unit.floor.to_string())
        .text(
            "unit_rooms",
            unit.rooms.map(|r| r.to_string()).unwrap_or_default(),
        )
        .text("unit_area", fixed2(unit.area_m2))
        .date("start_date", lease.start_date)
        .money("net_rent", lease.net_rent)
        .money("utility_advance", lease.utility_advance)
        .money("gross_rent", lease.gross_rent())
        .money("deposit", lease.deposit.unwrap_or(0.0))
        .text("reference_rate", fixed2(lease.reference_rate))
        .date("today", today);
    add_building(&mut context, &building);

    Ok(PreparedDocument {
        template_id: lease_template(unit.kind),
        title: format!("Lease {} {}", unit.label, tenant.display_name()),
        context,
    })
}

/// Builds the utility-cost statement context for one unit.
#[must_use]
pub fn statement_context(
    period: &billing_period::Model,
    building: &building::Model,
    line: &StatementLine,
    today: NaiveDate,
) -> PreparedDocument {
    let statement = &line.statement;
    let details = statement
        .shares
        .iter()
        .map(|share| format!("{}: {}", share.description, swiss_money(share.amount)))
        .collect::<Vec<_>>()
        .join("\n");

    let mut context = DocumentContext::new();
    context
        .text("period_label", &period.label)
        .date("period_start", period.start_date)
        .date("period_end", period.end_date)
        .text("unit_label", &statement.unit_label)
        .text("occupant", &line.occupant)
        .text("unit_area", fixed2(statement.area_m2))
        .text("details", details)
        .money("allocated_cost", statement.allocated_cost)
        .money("advance_payments", statement.advance_payments_total)
        .money("balance", statement.balance)
        .text(
            "balance_note",
            if statement.is_additional_payment() {
                "Additional payment due"
            } else {
                "Credit in your favour"
            },
        )
        .text("qr_payload", line.qr_payload.clone().unwrap_or_default())
        .date("today", today);
    add_building(&mut context, building);

    PreparedDocument {
        template_id: "statement",
        title: format!("Statement {} {}", period.label, statement.unit_label),
        context,
    }
}

/// Input for [`store_document`]
#[derive(Debug, Clone)]
pub struct NewDocument {
    /// Kind
    pub kind: DocumentKind,
    /// Title
    pub title: String,
    /// File name
    pub filename: String,
    /// File content
    pub content: Vec<u8>,
    /// Related lease
    pub lease_id: Option<LeaseId>,
    /// Related building
    pub building_id: Option<BuildingId>,
}

/// Persists a document.
pub async fn store_document<C>(db: &C, input: NewDocument) -> Result<document::Model>
where
    C: ConnectionTrait,
{
    if input.filename.trim().is_empty() {
        return Err(Error::validation("Document needs a file name"));
    }

    let model = document::ActiveModel {
        kind: Set(input.kind),
        title: Set(input.title.trim().to_string()),
        filename: Set(input.filename.trim().to_string()),
        content: Set(input.content),
        lease_id: Set(input.lease_id.map(|id| id.0)),
        building_id: Set(input.building_id.map(|id| id.0)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        document_id = model.id,
        kind = ?model.kind,
        bytes = model.content.len(),
        "Stored document"
    );
    Ok(model)
}

/// Lists a lease's documents, newest first.
pub async fn documents_for_lease(
    db: &DatabaseConnection,
    lease_id: LeaseId,
) -> Result<Vec<document::Model>> {
    Document::find()
        .filter(document::Column::LeaseId.eq(lease_id.0))
        .order_by_desc(document::Column::CreatedAt)
        .order_by_desc(document::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
