//! Federal building registry (GWR) lookup.
//!
//! Resolves a building's EGID from its address, reads the construction year and
//! lists the registered dwellings so placeholder units can be created. Every
//! step is best effort: registry failures end up as warnings in
//! [`RegistrySeed`], only database errors fail the operation.

use crate::{
    config::settings::RegistryConfig,
    core::{
        ids::BuildingId,
        property::{self, NewUnit},
    },
    entities::{building, unit::UnitKind},
    errors::{Error, Result},
};
use async_trait::async_trait;
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

const SERVICE: &str = "registry";
const DWELLING_LAYER: &str = "ch.bfs.gebaeude_wohnungs_register-wohnungen";
const BUILDING_LAYER: &str = "ch.bfs.gebaeude_wohnungs_register";

/// A dwelling as listed in the registry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryUnit {
    /// Federal dwelling id (EWID)
    pub dwelling_id: Option<String>,
    /// Number of rooms
    pub rooms: Option<f64>,
    /// Floor, 0 = ground floor, negative = basement
    pub floor: Option<i32>,
    /// Floor area in m²
    pub area_m2: Option<f64>,
}

impl RegistryUnit {
    /// Placeholder label such as `Apt 2 - 3.5 rooms`.
    #[must_use]
    pub fn label(&self) -> String {
        let id = self.dwelling_id.as_deref().unwrap_or("new");
        match self.rooms {
            Some(rooms) => format!("Apt {id} - {rooms} rooms"),
            None => format!("Apt {id} - ? rooms"),
        }
    }
}

/// Building registry lookups.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Finds the EGID for an address, `None` if the address is unknown.
    async fn find_registry_id(
        &self,
        street: &str,
        postal_code: &str,
        city: &str,
    ) -> Result<Option<i64>>;

    /// Lists the dwellings registered for an EGID.
    async fn find_units(&self, registry_id: i64) -> Result<Vec<RegistryUnit>>;

    /// Reads the construction year for an EGID.
    async fn find_construction_year(&self, registry_id: i64) -> Result<Option<i32>>;
}

/// [`RegistryClient`] over the geo.admin.ch REST API
pub struct GeoAdminClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    attrs: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    results: Vec<FindResult>,
}

#[derive(Debug, Deserialize)]
struct FindResult {
    #[serde(default)]
    attributes: serde_json::Map<String, Value>,
}

/// Reads a number that the API sometimes sends as a string.
fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decodes the GWR floor code: 3100 ground floor, 3101.. upper floors,
/// 3401.. basement levels. Plain small numbers pass through.
#[allow(clippy::cast_possible_truncation)]
fn floor_from_code(code: f64) -> Option<i32> {
    if !code.is_finite() {
        return None;
    }
    let code = code.round() as i32;
    match code {
        3100..=3199 => Some(code - 3100),
        3401..=3499 => Some(3400 - code),
        -20..=200 => Some(code),
        _ => None,
    }
}

impl GeoAdminClient {
    /// Builds a client with the configured base URL and timeout.
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::external(SERVICE, e))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::external(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::external(SERVICE, format!("{url} returned {status}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::external(SERVICE, e))
    }

    async fn find_layer(&self, layer: &str, registry_id: i64) -> Result<Vec<FindResult>> {
        let response: FindResponse = self
            .get_json(
                "/rest/services/api/MapServer/find",
                &[
                    ("layer", layer.to_string()),
                    ("searchText", registry_id.to_string()),
                    ("searchField", "egid".to_string()),
                    ("returnGeometry", "false".to_string()),
                    ("sr", "2056".to_string()),
                ],
            )
            .await?;
        Ok(response.results)
    }
}

#[async_trait]
impl RegistryClient for GeoAdminClient {
    async fn find_registry_id(
        &self,
        street: &str,
        postal_code: &str,
        city: &str,
    ) -> Result<Option<i64>> {
        let response: SearchResponse = self
            .get_json(
                "/rest/services/api/SearchServer",
                &[
                    ("searchText", format!("{street} {postal_code} {city}")),
                    ("type", "locations".to_string()),
                    ("origins", "address".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        #[allow(clippy::cast_possible_truncation)]
        let egid = response
            .results
            .first()
            .and_then(|r| number(r.attrs.get("egid")))
            .filter(|id| *id > 0.0)
            .map(|id| id as i64);
        Ok(egid)
    }

    async fn find_units(&self, registry_id: i64) -> Result<Vec<RegistryUnit>> {
        let results = self.find_layer(DWELLING_LAYER, registry_id).await?;
        Ok(results
            .into_iter()
            .map(|r| RegistryUnit {
                dwelling_id: text(r.attributes.get("wewid")),
                rooms: number(r.attributes.get("wanzj")),
                floor: number(r.attributes.get("wstwk")).and_then(floor_from_code),
                area_m2: number(r.attributes.get("warea")),
            })
            .collect())
    }

    async fn find_construction_year(&self, registry_id: i64) -> Result<Option<i32>> {
        let results = self.find_layer(BUILDING_LAYER, registry_id).await?;
        #[allow(clippy::cast_possible_truncation)]
        let year = results
            .first()
            .and_then(|r| number(r.attributes.get("gbauj")))
            .filter(|year| (1000.0..=3000.0).contains(year))
            .map(|year| year as i32);
        Ok(year)
    }
}

/// Outcome of [`seed_building_from_registry`]
#[derive(Debug, Clone, Default)]
pub struct RegistrySeed {
    /// EGID stored on the building, if known
    pub registry_id: Option<i64>,
    /// Construction year stored on the building, if known
    pub construction_year: Option<i32>,
    /// Number of placeholder units created
    pub units_created: usize,
    /// Non-fatal problems
    pub warnings: Vec<String>,
}

fn note(warnings: &mut Vec<String>, building_id: i64, message: String) {
    warn!(building_id, "{message}");
    warnings.push(message);
}

/// Fills a building's registry id, construction year and units from the registry.
///
/// Units are only created when the building has none yet. Placeholder units
/// get the registry's room count, floor and area (0 m² if unknown).
pub async fn seed_building_from_registry(
    db: &DatabaseConnection,
    client: &dyn RegistryClient,
    building_id: BuildingId,
) -> Result<RegistrySeed> {
    let building: building::Model = property::get_building(db, building_id).await?;
    let mut seed = RegistrySeed {
        registry_id: building.registry_id,
        construction_year: building.construction_year,
        ..RegistrySeed::default()
    };

    if seed.registry_id.is_none() {
        match client
            .find_registry_id(&building.street, &building.postal_code, &building.city)
            .await
        {
            Ok(Some(id)) => seed.registry_id = Some(id),
            Ok(None) => note(
                &mut seed.warnings,
                building.id,
                format!(
                    "No registry entry found for {} {} {}",
                    building.street, building.postal_code, building.city
                ),
            ),
            Err(e) => note(&mut seed.warnings, building.id, e.to_string()),
        }
    }

    let Some(registry_id) = seed.registry_id else {
        return Ok(seed);
    };

    if seed.construction_year.is_none() {
        match client.find_construction_year(registry_id).await {
            Ok(year) => seed.construction_year = year,
            Err(e) => note(&mut seed.warnings, building.id, e.to_string()),
        }
    }

    if seed.registry_id != building.registry_id
        || seed.construction_year != building.construction_year
    {
        property::set_registry_data(db, building_id, seed.registry_id, seed.construction_year)
            .await?;
    }

    let existing = property::units_in_building(db, building_id).await?;
    if !existing.is_empty() {
        info!(
            building_id = building.id,
            units = existing.len(),
            "Building already has units, skipping registry units"
        );
        return Ok(seed);
    }

    let units = match client.find_units(registry_id).await {
        Ok(units) => units,
        Err(e) => {
            note(&mut seed.warnings, building.id, e.to_string());
            return Ok(seed);
        }
    };

    let txn = db.begin().await?;
    for registry_unit in &units {
        property::create_unit(
            &txn,
            NewUnit {
                building_id,
                label: registry_unit.label(),
                kind: UnitKind::Residential,
                rooms: registry_unit.rooms,
                floor: registry_unit.floor.unwrap_or(0),
                area_m2: registry_unit
                    .area_m2
                    .filter(|area| area.is_finite() && *area >= 0.0)
                    .unwrap_or(0.0),
                target_net_rent: 0.0,
                target_utility_advance: 0.0,
            },
        )
        .await?;
    }
    txn.commit().await?;
    seed.units_created = units.len();

    info!(
        building_id = building.id,
        registry_id,
        units = seed.units_created,
        "Seeded building from registry"
    );
    Ok(seed)
}
