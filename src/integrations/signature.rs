//! E-signature workflow for lease contracts.
//!
//! The contract is rendered, submitted to the signing service and tracked on
//! the lease. The service reports back through a callback; a completed
//! submission stores the signed document.

use crate::{
    config::{AppConfig, settings::SignatureConfig},
    core::{
        documents::{self, DocumentRenderer, NewDocument},
        format::sanitize_filename,
        ids::{BuildingId, LeaseId, TenantId, UnitId},
        ledger, property,
    },
    entities::{
        Document, Lease,
        document::{self, DocumentKind},
        lease::{self, SignatureStatus},
    },
    errors::{Error, Result},
};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::NaiveDate;
use sea_orm::{Set, prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{info, warn};

const SERVICE: &str = "e-signature";

/// A document to be signed by one person
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRequest {
    /// Submission title
    pub title: String,
    /// File name shown to the signer
    pub filename: String,
    /// Document bytes
    pub content: Vec<u8>,
    /// Signer's name
    pub signer_name: String,
    /// Signer's email, the service sends the invitation there
    pub signer_email: String,
    /// Signer's role in the submission
    pub signer_role: String,
}

/// E-signature service.
#[async_trait]
pub trait SignatureClient: Send + Sync {
    /// Submits a document and returns the tracking id.
    async fn submit(&self, request: &SignatureRequest) -> Result<String>;

    /// Downloads a signed document.
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}

/// [`SignatureClient`] for the DocuSeal REST API
pub struct DocuSealClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl DocuSealClient {
    /// Builds a client with an explicit API key.
    pub fn new(config: &SignatureConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::external(SERVICE, e))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    /// Builds a client with the key from `DOCUSEAL_API_KEY`.
    pub fn from_env(config: &SignatureConfig) -> Result<Self> {
        let api_key = std::env::var("DOCUSEAL_API_KEY").map_err(|_| Error::Config {
            message: "DOCUSEAL_API_KEY is not set".to_string(),
        })?;
        Self::new(config, api_key)
    }
}

/// Reads a submission id that may arrive as number or string.
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

#[async_trait]
impl SignatureClient for DocuSealClient {
    async fn submit(&self, request: &SignatureRequest) -> Result<String> {
        let body = json!({
            "name": request.title,
            "send_email": true,
            "documents": [{
                "name": request.filename,
                "file": STANDARD.encode(&request.content),
                "fields": [{
                    "name": format!("{} signature", request.signer_role),
                    "type": "signature",
                    "role": request.signer_role,
                    "required": true,
                }],
            }],
            "submitters": [{
                "role": request.signer_role,
                "email": request.signer_email,
                "name": request.signer_name,
                "send_email": true,
            }],
        });

        let url = format!("{}/submissions/pdf", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("X-Auth-Token", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::external(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::external(SERVICE, format!("status {status}: {text}")));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| Error::external(SERVICE, e))?;
        // The endpoint answers with a submission or a list of submitters
        let submission = match &data {
            Value::Array(items) => items.first().unwrap_or(&Value::Null),
            other => other,
        };

        submission
            .get("id")
            .and_then(id_text)
            .ok_or_else(|| Error::external(SERVICE, "response carries no submission id"))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::external(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::external(
                SERVICE,
                format!("download returned {status}"),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::external(SERVICE, e))?;
        Ok(bytes.to_vec())
    }
}

/// Renders a lease contract and sends it to the tenant for signing.
///
/// The renderer must produce a PDF; anything else is an [`Error::Document`].
/// Stores the tracking id on the lease and sets its status to `sent`.
pub async fn send_lease_for_signature(
    db: &DatabaseConnection,
    config: &AppConfig,
    renderer: &dyn DocumentRenderer,
    client: &dyn SignatureClient,
    lease_id: LeaseId,
    today: NaiveDate,
) -> Result<lease::Model> {
    let lease = ledger::get_lease(db, lease_id).await?;
    let tenant = property::get_tenant(db, TenantId(lease.tenant_id)).await?;
    if tenant.email.trim().is_empty() {
        return Err(Error::validation(format!(
            "Tenant {} has no email address",
            tenant.display_name()
        )));
    }

    let extension = renderer.file_extension();
    if extension != "pdf" {
        return Err(Error::Document {
            message: format!("E-signature needs a PDF contract, renderer produces .{extension}"),
        });
    }

    let prepared = documents::lease_contract_context(db, config, lease_id, today).await?;
    let content = prepared.render(renderer)?;

    let request = SignatureRequest {
        title: prepared.title.clone(),
        filename: prepared.filename(extension),
        content,
        signer_name: tenant.display_name(),
        signer_email: tenant.email.trim().to_string(),
        signer_role: config.signature.signer_role.clone(),
    };
    let tracking_id = client.submit(&request).await?;

    let mut model: lease::ActiveModel = lease.into();
    model.signature_tracking_id = Set(Some(tracking_id.clone()));
    model.signature_status = Set(SignatureStatus::Sent);
    let lease = model.update(db).await?;

    info!(
        lease_id = lease.id,
        tracking_id = %tracking_id,
        "Sent lease for signature"
    );
    Ok(lease)
}

/// Body of a signing-service callback
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CallbackPayload {
    /// e.g. `submission.completed`
    #[serde(default)]
    pub event_type: String,
    /// Submission data
    #[serde(default)]
    pub data: CallbackData,
}

/// Submission part of a callback
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CallbackData {
    /// Submission id, number or string
    #[serde(default)]
    pub id: Value,
    /// `completed`, `declined`, ...
    #[serde(default)]
    pub status: Option<String>,
    /// All documents merged into one file
    #[serde(default)]
    pub combined_document_url: Option<String>,
    /// Individual documents
    #[serde(default)]
    pub documents: Vec<CallbackDocument>,
}

/// One document listed in a callback
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CallbackDocument {
    /// Download URL
    #[serde(default)]
    pub url: Option<String>,
}

impl CallbackPayload {
    /// Submission id as text.
    #[must_use]
    pub fn tracking_id(&self) -> Option<String> {
        id_text(&self.data.id)
    }

    /// Whether the submission was completed by all signers.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.event_type == "submission.completed" || self.data.status.as_deref() == Some("completed")
    }

    /// Status the lease should move to, if any.
    #[must_use]
    pub fn target_status(&self) -> Option<SignatureStatus> {
        if self.is_completed() {
            return Some(SignatureStatus::Signed);
        }
        match self.data.status.as_deref() {
            Some("declined") => Some(SignatureStatus::Declined),
            _ => None,
        }
    }

    /// Combined document, or the first listed one.
    #[must_use]
    pub fn document_url(&self) -> Option<&str> {
        self.data
            .combined_document_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .or_else(|| {
                self.data
                    .documents
                    .iter()
                    .find_map(|doc| doc.url.as_deref().filter(|url| !url.is_empty()))
            })
    }
}

/// Parses a raw callback body.
pub fn parse_callback(body: &[u8]) -> Result<CallbackPayload> {
    serde_json::from_slice(body).map_err(Into::into)
}

/// What a callback changed
#[derive(Debug, Clone, Default)]
pub struct CallbackOutcome {
    /// Lease the callback belonged to; `None` if it was ignored
    pub lease_id: Option<i64>,
    /// Signature status after the callback
    pub status: Option<SignatureStatus>,
    /// Stored signed document
    pub document_id: Option<i64>,
    /// Non-fatal problems
    pub warnings: Vec<String>,
}

impl CallbackOutcome {
    /// Whether the callback matched no lease.
    #[must_use]
    pub const fn is_ignored(&self) -> bool {
        self.lease_id.is_none()
    }
}

/// Applies a signing-service callback to the matching lease.
///
/// Unknown tracking ids are ignored. A completed submission moves the lease to
/// `signed` and stores the signed document; a failed download is reported as
/// a warning and does not undo the status change. A repeated completion for a
/// lease that already has its signed document stores nothing.
pub async fn handle_signature_callback(
    db: &DatabaseConnection,
    client: &dyn SignatureClient,
    payload: &CallbackPayload,
) -> Result<CallbackOutcome> {
    let Some(tracking_id) = payload.tracking_id() else {
        warn!(event_type = %payload.event_type, "Callback without submission id ignored");
        return Ok(CallbackOutcome::default());
    };

    let Some(lease) = Lease::find()
        .filter(lease::Column::SignatureTrackingId.eq(tracking_id.as_str()))
        .one(db)
        .await?
    else {
        info!(tracking_id = %tracking_id, "Callback for unknown submission ignored");
        return Ok(CallbackOutcome::default());
    };

    let mut outcome = CallbackOutcome {
        lease_id: Some(lease.id),
        status: Some(lease.signature_status),
        ..CallbackOutcome::default()
    };

    let lease_id = lease.id;
    let unit_id = lease.unit_id;
    let was_signed = lease.signature_status == SignatureStatus::Signed;
    if let Some(status) = payload.target_status() {
        if status != lease.signature_status {
            let mut model: lease::ActiveModel = lease.into();
            model.signature_status = Set(status);
            model.update(db).await?;
            info!(lease_id, status = ?status, "Updated signature status");
        }
        outcome.status = Some(status);
    }

    if !payload.is_completed() {
        return Ok(outcome);
    }

    if was_signed {
        let stored = Document::find()
            .filter(document::Column::LeaseId.eq(lease_id))
            .filter(document::Column::Kind.eq(DocumentKind::LeaseSigned))
            .count(db)
            .await?;
        if stored > 0 {
            info!(lease_id, "Signed document already stored, repeated callback skipped");
            return Ok(outcome);
        }
    }

    let Some(url) = payload.document_url() else {
        outcome
            .warnings
            .push("Completed submission lists no document".to_string());
        return Ok(outcome);
    };

    match client.download(url).await {
        Ok(content) => {
            let unit = property::get_unit(db, UnitId(unit_id)).await?;
            let document = documents::store_document(
                db,
                NewDocument {
                    kind: DocumentKind::LeaseSigned,
                    title: "Lease contract (signed)".to_string(),
                    filename: format!(
                        "{}.pdf",
                        sanitize_filename(&format!("signed lease {lease_id}"))
                    ),
                    content,
                    lease_id: Some(LeaseId(lease_id)),
                    building_id: Some(BuildingId(unit.building_id)),
                },
            )
            .await?;
            outcome.document_id = Some(document.id);
        }
        Err(e) => {
            warn!(lease_id, error = %e, "Signed document download failed");
            outcome
                .warnings
                .push(format!("Signed document could not be downloaded: {e}"));
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::documents::TemplateDirRenderer;
    use crate::core::ledger::{LedgerPolicy, NewLease};
    use crate::test_utils::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, header, method, path},
    };

    fn request() -> SignatureRequest {
        SignatureRequest {
            title: "Lease Apt 1 Anna Meier".to_string(),
            filename: "lease-apt-1-anna-meier.pdf".to_string(),
            content: b"%PDF".to_vec(),
            signer_name: "Anna Meier".to_string(),
            signer_email: "anna@example.ch".to_string(),
            signer_role: "Tenant".to_string(),
        }
    }

    fn client_for(server: &MockServer) -> DocuSealClient {
        DocuSealClient::new(
            &SignatureConfig {
                base_url: server.uri(),
                timeout_secs: 2,
                signer_role: "Tenant".to_string(),
            },
            "secret".to_string(),
        )
        .unwrap()
    }

    async fn signed_lease_fixture(
        tracking_id: &str,
    ) -> Result<(DatabaseConnection, lease::Model)> {
        let (db, _building, unit, tenant) = setup_with_unit_and_tenant().await?;
        let lease = ledger::start_lease(
            &db,
            LedgerPolicy::Strict,
            NewLease::new(UnitId(unit.id), TenantId(tenant.id), date(2024, 1, 1)),
        )
        .await?;
        let mut model: lease::ActiveModel = lease.into();
        model.signature_tracking_id = Set(Some(tracking_id.to_string()));
        model.signature_status = Set(SignatureStatus::Sent);
        let lease = model.update(&db).await?;
        Ok((db, lease))
    }

    #[tokio::test]
    async fn test_submit_posts_base64_document() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submissions/pdf"))
            .and(header("X-Auth-Token", "secret"))
            .and(body_partial_json(json!({
                "send_email": true,
                "documents": [{ "name": "lease-apt-1-anna-meier.pdf", "file": "JVBERg==" }],
                "submitters": [{ "email": "anna@example.ch", "role": "Tenant" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 4711 })))
            .expect(1)
            .mount(&server)
            .await;

        let tracking_id = client_for(&server).submit(&request()).await.unwrap();
        assert_eq!(tracking_id, "4711");
    }

    #[tokio::test]
    async fn test_submit_accepts_array_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!([{ "id": "abc-1" }, { "id": 2 }])),
            )
            .mount(&server)
            .await;

        let tracking_id = client_for(&server).submit(&request()).await.unwrap();
        assert_eq!(tracking_id, "abc-1");
    }

    #[tokio::test]
    async fn test_submit_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("invalid file"))
            .mount(&server)
            .await;

        let err = client_for(&server).submit(&request()).await.unwrap_err();
        assert!(matches!(err, Error::External { .. }));
        assert!(err.to_string().contains("invalid file"));
    }

    #[tokio::test]
    async fn test_download() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/signed.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-signed".to_vec()))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let bytes = client
            .download(&format!("{}/files/signed.pdf", server.uri()))
            .await
            .unwrap();
        assert_eq!(bytes, b"%PDF-signed".to_vec());

        let missing = client
            .download(&format!("{}/files/other.pdf", server.uri()))
            .await;
        assert!(missing.is_err());
    }

    #[test]
    fn test_parse_callback() {
        let payload = parse_callback(
            br#"{"event_type":"submission.completed","data":{"id":17,"status":"completed",
                "documents":[{"url":"https://files.example/doc.pdf"}]}}"#,
        )
        .unwrap();
        assert_eq!(payload.tracking_id().as_deref(), Some("17"));
        assert!(payload.is_completed());
        assert_eq!(payload.target_status(), Some(SignatureStatus::Signed));
        assert_eq!(payload.document_url(), Some("https://files.example/doc.pdf"));

        let declined =
            parse_callback(br#"{"event_type":"form.declined","data":{"id":"17","status":"declined"}}"#)
                .unwrap();
        assert_eq!(declined.target_status(), Some(SignatureStatus::Declined));
        assert_eq!(declined.document_url(), None);

        let viewed = parse_callback(br#"{"event_type":"form.viewed","data":{"id":17}}"#).unwrap();
        assert_eq!(viewed.target_status(), None);

        assert!(matches!(parse_callback(b"not json"), Err(Error::Json(_))));
    }

    #[tokio::test]
    async fn test_unknown_submission_is_ignored() -> Result<()> {
        let (db, lease) = signed_lease_fixture("100").await?;
        let client = StubSignature::default();
        let payload = parse_callback(br#"{"event_type":"submission.completed","data":{"id":999,"status":"completed"}}"#)?;

        let outcome = handle_signature_callback(&db, &client, &payload).await?;
        assert!(outcome.is_ignored());

        let lease = ledger::get_lease(&db, LeaseId(lease.id)).await?;
        assert_eq!(lease.signature_status, SignatureStatus::Sent);
        Ok(())
    }

    #[tokio::test]
    async fn test_completed_callback_stores_document() -> Result<()> {
        let (db, lease) = signed_lease_fixture("100").await?;
        let client = StubSignature {
            document: Some(b"%PDF-signed".to_vec()),
            ..StubSignature::default()
        };
        let payload = parse_callback(
            br#"{"event_type":"submission.completed","data":{"id":100,"status":"completed",
                "combined_document_url":"https://files.example/combined.pdf"}}"#,
        )?;

        let outcome = handle_signature_callback(&db, &client, &payload).await?;
        assert_eq!(outcome.lease_id, Some(lease.id));
        assert_eq!(outcome.status, Some(SignatureStatus::Signed));
        assert!(outcome.warnings.is_empty());

        let stored = ledger::get_lease(&db, LeaseId(lease.id)).await?;
        assert_eq!(stored.signature_status, SignatureStatus::Signed);

        let docs = documents::documents_for_lease(&db, LeaseId(lease.id)).await?;
        assert_eq!(docs.len(), 1);
        assert_eq!(Some(docs[0].id), outcome.document_id);
        assert_eq!(docs[0].kind, DocumentKind::LeaseSigned);
        assert_eq!(docs[0].content, b"%PDF-signed".to_vec());
        assert_eq!(docs[0].filename, format!("signed-lease-{}.pdf", lease.id));
        assert_eq!(client.downloads(), vec!["https://files.example/combined.pdf".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_download_is_warning() -> Result<()> {
        let (db, lease) = signed_lease_fixture("100").await?;
        let client = StubSignature::default();
        let payload = parse_callback(
            br#"{"event_type":"submission.completed","data":{"id":"100","status":"completed",
                "documents":[{"url":"https://files.example/doc.pdf"}]}}"#,
        )?;

        let outcome = handle_signature_callback(&db, &client, &payload).await?;
        assert_eq!(outcome.status, Some(SignatureStatus::Signed));
        assert_eq!(outcome.document_id, None);
        assert_eq!(outcome.warnings.len(), 1);

        let stored = ledger::get_lease(&db, LeaseId(lease.id)).await?;
        assert_eq!(stored.signature_status, SignatureStatus::Signed);
        Ok(())
    }

    #[tokio::test]
    async fn test_declined_callback() -> Result<()> {
        let (db, lease) = signed_lease_fixture("100").await?;
        let payload = parse_callback(br#"{"event_type":"form.declined","data":{"id":100,"status":"declined"}}"#)?;

        let outcome = handle_signature_callback(&db, &StubSignature::default(), &payload).await?;
        assert_eq!(outcome.status, Some(SignatureStatus::Declined));
        assert!(outcome.document_id.is_none());

        let stored = ledger::get_lease(&db, LeaseId(lease.id)).await?;
        assert_eq!(stored.signature_status, SignatureStatus::Declined);
        Ok(())
    }

    #[tokio::test]
    async fn test_send_lease_for_signature() -> Result<()> {
        let (db, _building, unit, tenant) = setup_with_unit_and_tenant().await?;
        let lease = ledger::start_lease(
            &db,
            LedgerPolicy::Strict,
            NewLease::new(UnitId(unit.id), TenantId(tenant.id), date(2024, 1, 1))
                .with_rent(1500.0, 150.0),
        )
        .await?;
        let client = StubSignature {
            tracking_id: "sub-42".to_string(),
            ..StubSignature::default()
        };

        let updated = send_lease_for_signature(
            &db,
            &AppConfig::default(),
            &StubRenderer,
            &client,
            LeaseId(lease.id),
            date(2023, 12, 1),
        )
        .await?;

        assert_eq!(updated.signature_status, SignatureStatus::Sent);
        assert_eq!(updated.signature_tracking_id.as_deref(), Some("sub-42"));

        let submitted = client.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].signer_email, tenant.email);
        assert_eq!(submitted[0].signer_role, "Tenant");
        assert!(submitted[0].filename.ends_with(".pdf"));
        assert_eq!(submitted[0].content, b"lease_residential".to_vec());
        Ok(())
    }

    #[tokio::test]
    async fn test_send_lease_requires_tenant_email() -> Result<()> {
        let (db, _building, unit, _tenant) = setup_with_unit_and_tenant().await?;
        let no_mail = create_test_tenant(&db, "Ohnemail").await?;
        let mut model: crate::entities::tenant::ActiveModel = no_mail.into();
        model.email = Set(String::new());
        let no_mail = model.update(&db).await?;

        let lease = ledger::start_lease(
            &db,
            LedgerPolicy::Strict,
            NewLease::new(UnitId(unit.id), TenantId(no_mail.id), date(2024, 1, 1)),
        )
        .await?;
        let client = StubSignature::default();

        let result = send_lease_for_signature(
            &db,
            &AppConfig::default(),
            &StubRenderer,
            &client,
            LeaseId(lease.id),
            date(2023, 12, 1),
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        assert!(client.submitted().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_repeated_completion_stores_one_document() -> Result<()> {
        let (db, lease) = signed_lease_fixture("100").await?;
        let client = StubSignature {
            document: Some(b"%PDF-signed".to_vec()),
            ..StubSignature::default()
        };
        let payload = parse_callback(
            br#"{"event_type":"submission.completed","data":{"id":100,"status":"completed",
                "combined_document_url":"https://files.example/combined.pdf"}}"#,
        )?;

        let first = handle_signature_callback(&db, &client, &payload).await?;
        let second = handle_signature_callback(&db, &client, &payload).await?;

        assert!(first.document_id.is_some());
        assert_eq!(second.status, Some(SignatureStatus::Signed));
        assert_eq!(second.document_id, None);
        assert_eq!(client.downloads().len(), 1);
        assert_eq!(documents::documents_for_lease(&db, LeaseId(lease.id)).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_send_lease_rejects_text_renderer() -> Result<()> {
        let (db, _building, unit, tenant) = setup_with_unit_and_tenant().await?;
        let lease = ledger::start_lease(
            &db,
            LedgerPolicy::Strict,
            NewLease::new(UnitId(unit.id), TenantId(tenant.id), date(2024, 1, 1)),
        )
        .await?;
        let client = StubSignature::default();
        let config = AppConfig::default();
        let renderer = TemplateDirRenderer::new(&config.documents);

        let result = send_lease_for_signature(
            &db,
            &config,
            &renderer,
            &client,
            LeaseId(lease.id),
            date(2023, 12, 1),
        )
        .await;
        assert!(matches!(result, Err(Error::Document { .. })));
        assert!(client.submitted().is_empty());

        let stored = ledger::get_lease(&db, LeaseId(lease.id)).await?;
        assert_eq!(stored.signature_status, SignatureStatus::NotSent);
        assert_eq!(stored.signature_tracking_id, None);
        Ok(())
    }
}
