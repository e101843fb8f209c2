//! Property master data - buildings, units and tenants.
//!
//! Repository-style functions taking typed identifiers. Lookups that may run
//! inside a caller's transaction are generic over [`ConnectionTrait`].

use crate::{
    config::AppConfig,
    core::ids::{BuildingId, TenantId, UnitId},
    entities::{
        Building, Document, Lease, RentAdjustment, Tenant, Ticket, Unit, Vacancy, building,
        document, lease, rent_adjustment, tenant, ticket,
        unit::{self, UnitKind},
        vacancy,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Input for [`create_building`]
#[derive(Debug, Clone)]
pub struct NewBuilding {
    /// Street and number
    pub street: String,
    /// Postal code
    pub postal_code: String,
    /// City
    pub city: String,
    /// Two-letter canton code
    pub canton: String,
    /// Rent account, may be empty
    pub iban: String,
}

/// Input for [`create_unit`]
#[derive(Debug, Clone)]
pub struct NewUnit {
    /// Owning building
    pub building_id: BuildingId,
    /// Label
    pub label: String,
    /// Kind of space
    pub kind: UnitKind,
    /// Room count
    pub rooms: Option<f64>,
    /// Floor
    pub floor: i32,
    /// Floor area in m²
    pub area_m2: f64,
    /// Target monthly net rent
    pub target_net_rent: f64,
    /// Target monthly utility-cost advance
    pub target_utility_advance: f64,
}

/// Input for [`create_tenant`]
#[derive(Debug, Clone, Default)]
pub struct NewTenant {
    /// Company name, empty for private tenants
    pub company: String,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Email
    pub email: String,
    /// Phone
    pub phone: String,
    /// Street
    pub street: String,
    /// Postal code
    pub postal_code: String,
    /// City
    pub city: String,
    /// Payout account
    pub payout_iban: String,
}

fn require_text(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

fn require_money(amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(amount)
}

/// Creates a building after validating the address and canton code.
pub async fn create_building(db: &DatabaseConnection, input: NewBuilding) -> Result<building::Model> {
    let street = require_text(&input.street, "Street")?;
    let postal_code = require_text(&input.postal_code, "Postal code")?;
    let city = require_text(&input.city, "City")?;

    let canton = input.canton.trim().to_uppercase();
    if canton.len() != 2 || !canton.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Error::validation(format!(
            "Canton must be a two-letter code, got '{}'",
            input.canton
        )));
    }

    let model = building::ActiveModel {
        street: Set(street),
        postal_code: Set(postal_code),
        city: Set(city),
        canton: Set(canton),
        registry_id: Set(None),
        construction_year: Set(None),
        iban: Set(input.iban.replace(' ', "").to_uppercase()),
        ..Default::default()
    };

    let result = model.insert(db).await?;
    info!(building_id = result.id, street = %result.street, "Created building");
    Ok(result)
}

/// Finds a building by id.
pub async fn get_building<C>(db: &C, building_id: BuildingId) -> Result<building::Model>
where
    C: ConnectionTrait,
{
    Building::find_by_id(building_id.0)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "building",
            id: building_id.0,
        })
}

/// Lists all buildings ordered by city, then street.
pub async fn list_buildings(db: &DatabaseConnection) -> Result<Vec<building::Model>> {
    Building::find()
        .order_by_asc(building::Column::City)
        .order_by_asc(building::Column::Street)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Stores registry data for a building. `None` leaves the current value untouched.
pub async fn set_registry_data(
    db: &DatabaseConnection,
    building_id: BuildingId,
    registry_id: Option<i64>,
    construction_year: Option<i32>,
) -> Result<building::Model> {
    let existing = get_building(db, building_id).await?;
    let mut model: building::ActiveModel = existing.into();
    if registry_id.is_some() {
        model.registry_id = Set(registry_id);
    }
    if construction_year.is_some() {
        model.construction_year = Set(construction_year);
    }
    model.update(db).await.map_err(Into::into)
}

/// Creates a unit in an existing building.
///
/// The floor area must be finite and non-negative; zero is accepted here and
/// only rejected in aggregate by the apportionment engine.
pub async fn create_unit<C>(db: &C, input: NewUnit) -> Result<unit::Model>
where
    C: ConnectionTrait,
{
    let label = require_text(&input.label, "Unit label")?;
    if !input.area_m2.is_finite() || input.area_m2 < 0.0 {
        return Err(Error::validation(format!(
            "Floor area must be non-negative, got {}",
            input.area_m2
        )));
    }
    require_money(input.target_net_rent)?;
    require_money(input.target_utility_advance)?;

    get_building(db, input.building_id).await?;

    let model = unit::ActiveModel {
        building_id: Set(input.building_id.0),
        label: Set(label),
        kind: Set(input.kind),
        rooms: Set(input.rooms),
        floor: Set(input.floor),
        area_m2: Set(input.area_m2),
        target_net_rent: Set(input.target_net_rent),
        target_utility_advance: Set(input.target_utility_advance),
        ..Default::default()
    };

    let result = model.insert(db).await?;
    info!(
        unit_id = result.id,
        building_id = result.building_id,
        area_m2 = result.area_m2,
        "Created unit"
    );
    Ok(result)
}

/// Finds a unit by id.
pub async fn get_unit<C>(db: &C, unit_id: UnitId) -> Result<unit::Model>
where
    C: ConnectionTrait,
{
    Unit::find_by_id(unit_id.0)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "unit",
            id: unit_id.0,
        })
}

/// Lists the units of a building in creation order.
pub async fn units_in_building<C>(db: &C, building_id: BuildingId) -> Result<Vec<unit::Model>>
where
    C: ConnectionTrait,
{
    Unit::find()
        .filter(unit::Column::BuildingId.eq(building_id.0))
        .order_by_asc(unit::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes a unit together with its lease and vacancy history.
///
/// Tickets, rent adjustments and documents of the unit's leases go with them.
/// Everything happens in one transaction.
pub async fn delete_unit(db: &DatabaseConnection, unit_id: UnitId) -> Result<()> {
    let txn = db.begin().await?;

    let unit = get_unit(&txn, unit_id).await?;

    let lease_ids: Vec<i64> = Lease::find()
        .filter(lease::Column::UnitId.eq(unit.id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|l| l.id)
        .collect();

    if !lease_ids.is_empty() {
        Ticket::delete_many()
            .filter(ticket::Column::LeaseId.is_in(lease_ids.clone()))
            .exec(&txn)
            .await?;
        RentAdjustment::delete_many()
            .filter(rent_adjustment::Column::LeaseId.is_in(lease_ids.clone()))
            .exec(&txn)
            .await?;
        Document::delete_many()
            .filter(document::Column::LeaseId.is_in(lease_ids.clone()))
            .exec(&txn)
            .await?;
        Lease::delete_many()
            .filter(lease::Column::Id.is_in(lease_ids.clone()))
            .exec(&txn)
            .await?;
    }

    let vacancies = Vacancy::delete_many()
        .filter(vacancy::Column::UnitId.eq(unit.id))
        .exec(&txn)
        .await?;

    unit.delete(&txn).await?;
    txn.commit().await?;

    info!(
        unit_id = unit_id.0,
        leases = lease_ids.len(),
        vacancies = vacancies.rows_affected,
        "Deleted unit with its history"
    );
    Ok(())
}

/// Creates a tenant. A last name (or company) is required.
pub async fn create_tenant(db: &DatabaseConnection, input: NewTenant) -> Result<tenant::Model> {
    if input.last_name.trim().is_empty() && input.company.trim().is_empty() {
        return Err(Error::validation("Tenant needs a last name or a company"));
    }

    let model = tenant::ActiveModel {
        company: Set(input.company.trim().to_string()),
        first_name: Set(input.first_name.trim().to_string()),
        last_name: Set(input.last_name.trim().to_string()),
        email: Set(input.email.trim().to_string()),
        phone: Set(input.phone.trim().to_string()),
        street: Set(input.street.trim().to_string()),
        postal_code: Set(input.postal_code.trim().to_string()),
        city: Set(input.city.trim().to_string()),
        payout_iban: Set(input.payout_iban.replace(' ', "").to_uppercase()),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Finds a tenant by id.
pub async fn get_tenant<C>(db: &C, tenant_id: TenantId) -> Result<tenant::Model>
where
    C: ConnectionTrait,
{
    Tenant::find_by_id(tenant_id.0)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "tenant",
            id: tenant_id.0,
        })
}

/// Creates the buildings listed in config.toml that do not exist yet.
///
/// A building counts as existing when street and postal code match. Returns
/// the number of buildings created.
pub async fn seed_buildings(db: &DatabaseConnection, config: &AppConfig) -> Result<usize> {
    let mut created = 0;

    for seed in &config.buildings {
        let exists = Building::find()
            .filter(building::Column::Street.eq(seed.street.trim()))
            .filter(building::Column::PostalCode.eq(seed.postal_code.trim()))
            .one(db)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let txn = db.begin().await?;
        let building = building::ActiveModel {
            street: Set(require_text(&seed.street, "Street")?),
            postal_code: Set(require_text(&seed.postal_code, "Postal code")?),
            city: Set(require_text(&seed.city, "City")?),
            canton: Set(seed.canton.trim().to_uppercase()),
            registry_id: Set(None),
            construction_year: Set(None),
            iban: Set(seed.iban.replace(' ', "").to_uppercase()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for unit_seed in &seed.units {
            create_unit(
                &txn,
                NewUnit {
                    building_id: BuildingId(building.id),
                    label: unit_seed.label.clone(),
                    kind: unit_seed.kind,
                    rooms: unit_seed.rooms,
                    floor: unit_seed.floor,
                    area_m2: unit_seed.area_m2,
                    target_net_rent: unit_seed.target_net_rent,
                    target_utility_advance: unit_seed.target_utility_advance,
                },
            )
            .await?;
        }
        txn.commit().await?;

        info!(building_id = building.id, street = %building.street, units = seed.units.len(), "Seeded building");
        created += 1;
    }

    Ok(created)
}
