//! Swiss QR-bill payload (SPC 0200).
//!
//! Builds the text content of the QR code on the payment part of a bill. The
//! scannable image and the printed receipt are produced elsewhere.

use crate::{
    config::AppConfig,
    core::{
        format::fixed2,
        ids::{BuildingId, LeaseId, TenantId, UnitId},
        ledger, property,
    },
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::Serialize;

/// Highest amount the QR-bill standard accepts.
pub const MAX_AMOUNT: f64 = 999_999_999.99;

const MAX_MESSAGE_LEN: usize = 140;
const MAX_NAME_LEN: usize = 70;

/// Postal address in combined form (address type `K`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    /// Name or company
    pub name: String,
    /// Street and house number
    pub street: String,
    /// Postal code
    pub postal_code: String,
    /// Town
    pub town: String,
    /// Two-letter country code
    pub country: String,
}

impl Address {
    /// A Swiss address.
    #[must_use]
    pub fn swiss(name: &str, street: &str, postal_code: &str, town: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            street: street.trim().to_string(),
            postal_code: postal_code.trim().to_string(),
            town: town.trim().to_string(),
            country: "CH".to_string(),
        }
    }

    fn problems(&self, role: &str) -> Vec<String> {
        let mut problems = Vec::new();
        if self.name.is_empty() {
            problems.push(format!("{role} name is missing"));
        } else if self.name.chars().count() > MAX_NAME_LEN {
            problems.push(format!("{role} name exceeds {MAX_NAME_LEN} characters"));
        }
        if self.street.is_empty() {
            problems.push(format!("{role} street is missing"));
        }
        if self.postal_code.is_empty() || self.town.is_empty() {
            problems.push(format!("{role} postal code or town is missing"));
        }
        if self.country.len() != 2 {
            problems.push(format!("{role} country must be a two-letter code"));
        }
        problems
    }

    fn push_lines(&self, lines: &mut Vec<String>) {
        lines.push("K".to_string());
        lines.push(self.name.clone());
        lines.push(self.street.clone());
        lines.push(format!("{} {}", self.postal_code, self.town));
        lines.push(String::new());
        lines.push(String::new());
        lines.push(self.country.clone());
    }
}

/// Data printed on the payment part of a bill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QrBill {
    /// Creditor IBAN, spaces allowed
    pub account: String,
    /// Payee
    pub creditor: Address,
    /// Payer, if known
    pub debtor: Option<Address>,
    /// Amount in `currency`
    pub amount: f64,
    /// `CHF` or `EUR`
    pub currency: String,
    /// Unstructured message shown to the payer
    pub message: String,
}

/// Checks country prefix, length and the ISO 13616 mod-97 checksum.
#[must_use]
pub fn is_valid_iban(iban: &str) -> bool {
    let compact: String = iban
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if compact.len() != 21 || !(compact.starts_with("CH") || compact.starts_with("LI")) {
        return false;
    }
    if !compact.chars().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }

    let (head, tail) = compact.split_at(4);
    let mut remainder: u32 = 0;
    for c in tail.chars().chain(head.chars()) {
        let Some(value) = c.to_digit(36) else {
            return false;
        };
        let step = if value >= 10 { 100 } else { 10 };
        remainder = (remainder * step + value) % 97;
    }
    remainder == 1
}

impl QrBill {
    /// Space-free, uppercase account.
    #[must_use]
    pub fn compact_account(&self) -> String {
        self.account
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase()
    }

    /// Lists every problem preventing a valid payload.
    #[must_use]
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.account.trim().is_empty() {
            problems.push("IBAN is missing".to_string());
        } else if !is_valid_iban(&self.account) {
            problems.push(format!("IBAN {} is not a valid CH/LI IBAN", self.account));
        }

        problems.extend(self.creditor.problems("Creditor"));
        if let Some(debtor) = &self.debtor {
            problems.extend(debtor.problems("Debtor"));
        }

        if !self.amount.is_finite() || self.amount <= 0.0 {
            problems.push(format!("Amount must be positive, got {}", self.amount));
        } else if self.amount > MAX_AMOUNT {
            problems.push(format!("Amount {} exceeds {MAX_AMOUNT}", self.amount));
        }

        if self.currency != "CHF" && self.currency != "EUR" {
            problems.push(format!("Currency {} is not CHF or EUR", self.currency));
        }
        if self.message.chars().count() > MAX_MESSAGE_LEN {
            problems.push(format!("Message exceeds {MAX_MESSAGE_LEN} characters"));
        }

        problems
    }

    /// Validates the bill, reporting all problems at once.
    ///
    /// # Errors
    /// [`Error::Validation`] listing every problem found.
    pub fn validate(&self) -> Result<()> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::validation(problems.join("; ")))
        }
    }

    /// Builds the newline-separated QR payload.
    ///
    /// # Errors
    /// [`Error::Validation`] if the bill is invalid.
    pub fn payload(&self) -> Result<String> {
        self.validate()?;

        let mut lines = vec![
            "SPC".to_string(),
            "0200".to_string(),
            "1".to_string(),
            self.compact_account(),
        ];
        self.creditor.push_lines(&mut lines);
        // Ultimate creditor, reserved for future use
        lines.extend(std::iter::repeat_n(String::new(), 7));
        lines.push(fixed2(self.amount));
        lines.push(self.currency.clone());
        match &self.debtor {
            Some(debtor) => debtor.push_lines(&mut lines),
            // Payer fills in the address by hand
            None => lines.extend(std::iter::repeat_n(String::new(), 7)),
        }
        lines.push("NON".to_string());
        lines.push(String::new());
        lines.push(self.message.clone());
        lines.push("EPD".to_string());

        Ok(lines.join("\n"))
    }
}

/// Builds the QR bill for one month's gross rent of a lease.
///
/// The creditor is the management company at the building's address and the
/// building's rent account; the debtor is the tenant.
pub async fn monthly_rent_bill(
    db: &DatabaseConnection,
    config: &AppConfig,
    lease_id: LeaseId,
    month: NaiveDate,
) -> Result<QrBill> {
    let lease = ledger::get_lease(db, lease_id).await?;
    let unit = property::get_unit(db, UnitId(lease.unit_id)).await?;
    let building = property::get_building(db, BuildingId(unit.building_id)).await?;
    let tenant = property::get_tenant(db, TenantId(lease.tenant_id)).await?;

    let bill = QrBill {
        account: building.iban.clone(),
        creditor: Address::swiss(
            &config.management.name,
            &building.street,
            &building.postal_code,
            &building.city,
        ),
        debtor: Some(Address::swiss(
            &tenant.display_name(),
            &tenant.street,
            &tenant.postal_code,
            &tenant.city,
        )),
        amount: lease.gross_rent(),
        currency: "CHF".to_string(),
        message: format!("Rent {} - {}", month.format("%m/%Y"), unit.label),
    };
    bill.validate()?;
    Ok(bill)
}
