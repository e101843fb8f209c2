//! Key register - which keys a building has and who holds them.
//!
//! Each key type has a fixed stock. Handing a copy out records an issue; the
//! copy counts as out until the issue gets a return date. Availability is
//! always derived from the open issues, never stored.

use crate::{
    core::{
        ids::{BuildingId, KeyId, KeyIssueId, TenantId},
        property,
    },
    entities::{Key, KeyIssue, key, key_issue},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Input for [`create_key`]
#[derive(Debug, Clone)]
pub struct NewKey {
    /// Building the key belongs to
    pub building_id: BuildingId,
    /// Locking system
    pub system: String,
    /// Key number
    pub number: String,
    /// Doors it opens
    pub function: String,
    /// Copies owned
    pub total_count: i32,
}

/// Who receives a key copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRecipient {
    /// A tenant on file
    Tenant(TenantId),
    /// Anyone else, by name
    External(String),
}

/// Input for [`issue_key`]
#[derive(Debug, Clone)]
pub struct NewKeyIssue {
    /// Key handed out
    pub key_id: KeyId,
    /// Receiver
    pub recipient: KeyRecipient,
    /// Hand-over date
    pub issued_on: NaiveDate,
    /// Receipt signed on hand-over
    pub signed: bool,
}

/// Adds a key type to a building. The key number is required and at least
/// one copy must exist.
pub async fn create_key(db: &DatabaseConnection, input: NewKey) -> Result<key::Model> {
    let number = input.number.trim();
    if number.is_empty() {
        return Err(Error::validation("Key number cannot be empty"));
    }
    if input.total_count < 1 {
        return Err(Error::validation(format!(
            "Key stock must be at least 1, got {}",
            input.total_count
        )));
    }

    property::get_building(db, input.building_id).await?;

    let result = key::ActiveModel {
        building_id: Set(input.building_id.0),
        system: Set(input.system.trim().to_string()),
        number: Set(number.to_string()),
        function: Set(input.function.trim().to_string()),
        total_count: Set(input.total_count),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        key_id = result.id,
        building_id = result.building_id,
        number = %result.number,
        "Created key"
    );
    Ok(result)
}

/// Finds a key by id.
pub async fn get_key<C>(db: &C, key_id: KeyId) -> Result<key::Model>
where
    C: ConnectionTrait,
{
    Key::find_by_id(key_id.0)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "key",
            id: key_id.0,
        })
}

/// Lists a building's keys by number.
pub async fn keys_for_building(
    db: &DatabaseConnection,
    building_id: BuildingId,
) -> Result<Vec<key::Model>> {
    Key::find()
        .filter(key::Column::BuildingId.eq(building_id.0))
        .order_by_asc(key::Column::Number)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn count_out<C>(db: &C, key_id: KeyId) -> Result<i64>
where
    C: ConnectionTrait,
{
    let open = KeyIssue::find()
        .filter(key_issue::Column::KeyId.eq(key_id.0))
        .filter(key_issue::Column::ReturnedOn.is_null())
        .count(db)
        .await?;
    Ok(i64::try_from(open).unwrap_or(i64::MAX))
}

/// Copies of a key that are not handed out. Never negative.
pub async fn available<C>(db: &C, key_id: KeyId) -> Result<i64>
where
    C: ConnectionTrait,
{
    let key = get_key(db, key_id).await?;
    let out = count_out(db, key_id).await?;
    Ok((i64::from(key.total_count) - out).max(0))
}

/// Changes the stock of a key, e.g. after copies were made or lost.
///
/// The new stock cannot drop below the number of copies currently handed out.
pub async fn set_key_stock(
    db: &DatabaseConnection,
    key_id: KeyId,
    total_count: i32,
) -> Result<key::Model> {
    let txn = db.begin().await?;

    let existing = get_key(&txn, key_id).await?;
    let out = count_out(&txn, key_id).await?;
    if i64::from(total_count) < out.max(1) {
        return Err(Error::validation(format!(
            "Key {} has {out} copies out, stock cannot be set to {total_count}",
            existing.number
        )));
    }

    let mut model: key::ActiveModel = existing.into();
    model.total_count = Set(total_count);
    let result = model.update(&txn).await?;

    txn.commit().await?;
    Ok(result)
}

/// Hands out one copy of a key.
///
/// Fails with a validation error when every copy is already out, when the
/// external recipient has no name, or when the tenant does not exist.
pub async fn issue_key(db: &DatabaseConnection, input: NewKeyIssue) -> Result<key_issue::Model> {
    let txn = db.begin().await?;

    let key = get_key(&txn, input.key_id).await?;
    let (tenant_id, external_recipient) = match &input.recipient {
        KeyRecipient::Tenant(tenant_id) => {
            property::get_tenant(&txn, *tenant_id).await?;
            (Some(tenant_id.0), String::new())
        }
        KeyRecipient::External(name) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::validation("Key recipient name cannot be empty"));
            }
            (None, name.to_string())
        }
    };

    let out = count_out(&txn, input.key_id).await?;
    if out >= i64::from(key.total_count) {
        return Err(Error::validation(format!(
            "All {} copies of key {} are handed out",
            key.total_count, key.number
        )));
    }

    let issue = key_issue::ActiveModel {
        key_id: Set(key.id),
        tenant_id: Set(tenant_id),
        external_recipient: Set(external_recipient),
        issued_on: Set(input.issued_on),
        returned_on: Set(None),
        signed: Set(input.signed),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(
        key_id = issue.key_id,
        issue_id = issue.id,
        tenant_id = ?issue.tenant_id,
        "Issued key"
    );
    Ok(issue)
}

/// Records the return of a handed-out copy.
///
/// A copy can only come back once, and not before it went out.
pub async fn return_key(
    db: &DatabaseConnection,
    issue_id: KeyIssueId,
    returned_on: NaiveDate,
) -> Result<key_issue::Model> {
    let issue = KeyIssue::find_by_id(issue_id.0)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "key issue",
            id: issue_id.0,
        })?;

    if let Some(previous) = issue.returned_on {
        return Err(Error::validation(format!(
            "Key issue {} was already returned on {previous}",
            issue.id
        )));
    }
    if returned_on < issue.issued_on {
        return Err(Error::validation(format!(
            "Return date {returned_on} is before the hand-over on {}",
            issue.issued_on
        )));
    }

    let mut model: key_issue::ActiveModel = issue.into();
    model.returned_on = Set(Some(returned_on));
    let result = model.update(db).await?;

    info!(key_id = result.key_id, issue_id = result.id, "Returned key");
    Ok(result)
}

/// Issues of a key that have not come back, oldest first.
pub async fn open_issues(db: &DatabaseConnection, key_id: KeyId) -> Result<Vec<key_issue::Model>> {
    KeyIssue::find()
        .filter(key_issue::Column::KeyId.eq(key_id.0))
        .filter(key_issue::Column::ReturnedOn.is_null())
        .order_by_asc(key_issue::Column::IssuedOn)
        .order_by_asc(key_issue::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every key copy a tenant currently holds.
pub async fn keys_held_by_tenant(
    db: &DatabaseConnection,
    tenant_id: TenantId,
) -> Result<Vec<key_issue::Model>> {
    KeyIssue::find()
        .filter(key_issue::Column::TenantId.eq(tenant_id.0))
        .filter(key_issue::Column::ReturnedOn.is_null())
        .order_by_asc(key_issue::Column::IssuedOn)
        .all(db)
        .await
        .map_err(Into::into)
}
