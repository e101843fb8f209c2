//! Application settings loaded from config.toml
//!
//! Every section is optional; missing values fall back to defaults so a fresh
//! checkout runs without a config file. Secrets (`DOCUSEAL_API_KEY`) and the
//! database URL override come from the environment, usually via `.env`.

use crate::core::ledger::LedgerPolicy;
use crate::entities::unit::UnitKind;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Database URL; `DATABASE_URL` takes precedence
    pub database_url: Option<String>,
    /// Lease/vacancy ledger behaviour
    pub ledger: LedgerConfig,
    /// Identity of the property management printed on documents
    pub management: ManagementConfig,
    /// Building registry endpoint
    pub registry: RegistryConfig,
    /// E-signature service endpoint
    pub signature: SignatureConfig,
    /// Document template settings
    pub documents: DocumentsConfig,
    /// Buildings created on first start
    pub buildings: Vec<BuildingSeed>,
}

/// `[ledger]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// `"strict"` (default) or `"permissive"`
    pub policy: LedgerPolicy,
}

/// `[management]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ManagementConfig {
    /// Company name, used as QR-bill creditor
    pub name: String,
    /// Street and number
    pub street: String,
    /// Postal code
    pub postal_code: String,
    /// City
    pub city: String,
}

impl Default for ManagementConfig {
    fn default() -> Self {
        Self {
            name: "Property Management".to_string(),
            street: String::new(),
            postal_code: String::new(),
            city: String::new(),
        }
    }
}

/// `[registry]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Base URL of the geo.admin.ch REST API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api3.geo.admin.ch".to_string(),
            timeout_secs: 10,
        }
    }
}

/// `[signature]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SignatureConfig {
    /// Base URL of the e-signature API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Role name of the signing tenant in the submission
    pub signer_role: String,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.docuseal.com".to_string(),
            timeout_secs: 30,
            signer_role: "Tenant".to_string(),
        }
    }
}

/// `[documents]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Directory holding `<template id>.txt` templates
    pub template_dir: PathBuf,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from("templates"),
        }
    }
}

/// One `[[buildings]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct BuildingSeed {
    /// Street and number
    pub street: String,
    /// Postal code
    pub postal_code: String,
    /// City
    pub city: String,
    /// Canton code
    #[serde(default = "default_canton")]
    pub canton: String,
    /// Rent account
    #[serde(default)]
    pub iban: String,
    /// Units of the building
    #[serde(default)]
    pub units: Vec<UnitSeed>,
}

/// One `[[buildings.units]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct UnitSeed {
    /// Label
    pub label: String,
    /// Kind, defaults to residential
    #[serde(default = "default_unit_kind")]
    pub kind: UnitKind,
    /// Room count
    #[serde(default)]
    pub rooms: Option<f64>,
    /// Floor
    #[serde(default)]
    pub floor: i32,
    /// Floor area in m²
    pub area_m2: f64,
    /// Target monthly net rent
    #[serde(default)]
    pub target_net_rent: f64,
    /// Target monthly utility-cost advance
    #[serde(default)]
    pub target_utility_advance: f64,
}

fn default_canton() -> String {
    "ZH".to_string()
}

const fn default_unit_kind() -> UnitKind {
    UnitKind::Residential
}

/// Loads the configuration from a TOML file.
///
/// # Errors
/// Returns [`Error::Config`] if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path);

    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path.display()),
    })
}

/// Loads the configuration from `CONFIG_PATH` or `./config.toml`.
///
/// A missing file yields the defaults; an unreadable or invalid one is an error.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());

    if !Path::new(&path).exists() {
        info!(path = %path, "No configuration file found, using defaults");
        return Ok(AppConfig::default());
    }

    let config = load_config(&path)?;
    info!(
        path = %path,
        buildings = config.buildings.len(),
        policy = ?config.ledger.policy,
        "Loaded configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            database_url = "sqlite::memory:"

            [ledger]
            policy = "permissive"

            [management]
            name = "Muster Verwaltung AG"
            street = "Bahnhofstrasse 1"
            postal_code = "8001"
            city = "Zürich"

            [registry]
            base_url = "http://localhost:9000"
            timeout_secs = 3

            [[buildings]]
            street = "Seestrasse 12"
            postal_code = "8800"
            city = "Thalwil"
            iban = "CH93 0076 2011 6238 5295 7"

            [[buildings.units]]
            label = "3.5 rooms ground floor"
            area_m2 = 82.5
            rooms = 3.5
            target_net_rent = 1850.0
            target_utility_advance = 220.0

            [[buildings.units]]
            label = "Parking 1"
            kind = "parking"
            area_m2 = 12.0
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.database_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(config.ledger.policy, LedgerPolicy::Permissive);
        assert_eq!(config.management.name, "Muster Verwaltung AG");
        assert_eq!(config.registry.timeout_secs, 3);
        assert_eq!(config.signature.base_url, "https://api.docuseal.com");

        assert_eq!(config.buildings.len(), 1);
        let building = &config.buildings[0];
        assert_eq!(building.canton, "ZH");
        assert_eq!(building.units.len(), 2);
        assert_eq!(building.units[0].kind, UnitKind::Residential);
        assert_eq!(building.units[0].area_m2, 82.5);
        assert_eq!(building.units[1].kind, UnitKind::Parking);
        assert_eq!(building.units[1].target_net_rent, 0.0);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.database_url.is_none());
        assert_eq!(config.ledger.policy, LedgerPolicy::Strict);
        assert_eq!(config.registry.base_url, "https://api3.geo.admin.ch");
        assert_eq!(config.documents.template_dir, PathBuf::from("templates"));
        assert!(config.buildings.is_empty());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
