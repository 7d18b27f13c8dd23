//! # Validation Module
//!
//! Client-id normalization and submission validation.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP boundary (axum Json extractor)                          │
//! │  └── Shape: field types, required keys                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (pure)                                           │
//! │  ├── Required fields non-empty after trimming                          │
//! │  ├── RUT normalizes to 8-10 alphanumerics                              │
//! │  ├── Intake date parses as dd-mm-YYYY                                  │
//! │  └── ≥1 address line, unique positive ordinals                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE(submission_id, ordinal)                                    │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use alta_core::validation::normalize_client_id;
//!
//! assert_eq!(normalize_client_id("12.345.678-K"), "12345678k");
//! ```

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::error::{ValidationError, ValidationErrors};
use crate::types::{AddressLine, NewSubmission, SubmissionHeader};
use crate::{
    CLIENT_ID_MAX_LEN, CLIENT_ID_MIN_LEN, INTAKE_DATE_FORMAT, MAX_ADDRESS_LINES, MAX_TERM_MONTHS,
    MAX_TEXT_LEN,
};

/// Result type for single-value validators.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Client Id (RUT)
// =============================================================================

/// Normalizes a client tax id: drops `.`, `-` and whitespace, lowercases.
///
/// Both stores and the client directory lookup compare on this form.
pub fn normalize_client_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '.' | '-') && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Validates a client id and returns its normalized form.
///
/// ## Rules
/// - Must not be empty
/// - 8 to 10 characters once normalized
/// - Only ASCII letters and digits once normalized
///
/// ## Example
/// ```rust
/// use alta_core::validation::validate_client_id;
///
/// assert_eq!(validate_client_id("12.345.678-9").unwrap(), "123456789");
/// assert!(validate_client_id("1.234").is_err());
/// ```
pub fn validate_client_id(raw: &str) -> ValidationResult<String> {
    const FIELD: &str = "clientId";

    let normalized = normalize_client_id(raw);

    if normalized.is_empty() {
        return Err(ValidationError::required(FIELD));
    }

    if normalized.len() < CLIENT_ID_MIN_LEN {
        return Err(ValidationError::TooShort {
            field: FIELD.to_string(),
            min: CLIENT_ID_MIN_LEN,
        });
    }

    if normalized.len() > CLIENT_ID_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: FIELD.to_string(),
            max: CLIENT_ID_MAX_LEN,
        });
    }

    if !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: FIELD.to_string(),
            reason: "must contain only digits and a check character".to_string(),
        });
    }

    Ok(normalized)
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a required text field and returns it trimmed.
pub fn validate_required_text(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    validate_optional_text(field, value)
}

/// Validates an optional text field and returns it trimmed.
pub fn validate_optional_text(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LEN,
        });
    }

    Ok(value.to_string())
}

/// Validates an intake date and returns it in canonical `dd-mm-YYYY` form.
///
/// ## Example
/// ```rust
/// use alta_core::validation::validate_intake_date;
///
/// assert_eq!(validate_intake_date("1-2-2024").unwrap(), "01-02-2024");
/// assert!(validate_intake_date("2024-02-01").is_err());
/// ```
pub fn validate_intake_date(value: &str) -> ValidationResult<String> {
    const FIELD: &str = "intakeDate";

    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::required(FIELD));
    }

    let date = NaiveDate::parse_from_str(value, INTAKE_DATE_FORMAT).map_err(|_| {
        ValidationError::InvalidFormat {
            field: FIELD.to_string(),
            reason: "expected dd-mm-YYYY".to_string(),
        }
    })?;

    Ok(date.format(INTAKE_DATE_FORMAT).to_string())
}

/// Validates a monetary amount (non-negative, finite).
pub fn validate_amount(field: &str, amount: f64) -> ValidationResult<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates the contract term.
pub fn validate_term_months(months: i64) -> ValidationResult<()> {
    if months <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "termMonths".to_string(),
        });
    }

    if months > MAX_TERM_MONTHS {
        return Err(ValidationError::OutOfRange {
            field: "termMonths".to_string(),
            min: 1,
            max: MAX_TERM_MONTHS,
        });
    }

    Ok(())
}

// =============================================================================
// Submission Validator
// =============================================================================

/// Collects errors while building the normalized copy.
struct Collector {
    errors: Vec<ValidationError>,
}

impl Collector {
    fn take<T: Default>(&mut self, result: ValidationResult<T>) -> T {
        match result {
            Ok(v) => v,
            Err(e) => {
                self.errors.push(e);
                T::default()
            }
        }
    }

    fn check(&mut self, result: ValidationResult<()>) {
        if let Err(e) = result {
            self.errors.push(e);
        }
    }
}

/// Validates a submission and returns its normalized copy.
///
/// Pure: no side effects, every problem is reported at once.
///
/// ## Normalization
/// - Text fields are trimmed
/// - `client_id` is normalized (see [`normalize_client_id`])
/// - `intake_date` is rewritten as zero-padded `dd-mm-YYYY`
/// - Address lines keep their caller-supplied ordinals and order
///
/// ## Example
/// ```rust,ignore
/// let normalized = validate_submission(&submission)?;
/// db.submissions().accept(&normalized).await?;
/// ```
pub fn validate_submission(input: &NewSubmission) -> Result<NewSubmission, ValidationErrors> {
    let mut c = Collector { errors: Vec::new() };
    let h = &input.header;

    let header = SubmissionHeader {
        intake_date: c.take(validate_intake_date(&h.intake_date)),
        client_id: c.take(validate_client_id(&h.client_id)),
        client_name: c.take(validate_required_text("clientName", &h.client_name)),
        sam_number: c.take(validate_optional_text("samNumber", &h.sam_number)),
        business_name: c.take(validate_required_text("businessName", &h.business_name)),
        account_executive: c.take(validate_required_text(
            "accountExecutive",
            &h.account_executive,
        )),
        account_executive_phone: c.take(validate_optional_text(
            "accountExecutivePhone",
            &h.account_executive_phone,
        )),
        client_contact: c.take(validate_optional_text("clientContact", &h.client_contact)),
        client_contact_phone: c.take(validate_optional_text(
            "clientContactPhone",
            &h.client_contact_phone,
        )),
        technical_contact: c.take(validate_optional_text(
            "technicalContact",
            &h.technical_contact,
        )),
        technical_contact_phone: c.take(validate_optional_text(
            "technicalContactPhone",
            &h.technical_contact_phone,
        )),
        project_manager: c.take(validate_optional_text("projectManager", &h.project_manager)),
        project_manager_phone: c.take(validate_optional_text(
            "projectManagerPhone",
            &h.project_manager_phone,
        )),
        project: c.take(validate_required_text("project", &h.project)),
        expense_code: c.take(validate_optional_text("expenseCode", &h.expense_code)),
        provider: c.take(validate_required_text("provider", &h.provider)),
        activity: c.take(validate_required_text("activity", &h.activity)),
        address_type: c.take(validate_required_text("addressType", &h.address_type)),
        other_costs_concept: c.take(validate_optional_text(
            "otherCostsConcept",
            &h.other_costs_concept,
        )),
        other_costs_currency: c.take(validate_optional_text(
            "otherCostsCurrency",
            &h.other_costs_currency,
        )),
        other_costs_amount: h.other_costs_amount,
        installation_currency: c.take(validate_optional_text(
            "installationCurrency",
            &h.installation_currency,
        )),
        installation_cost: h.installation_cost,
        rent_currency: c.take(validate_required_text("rentCurrency", &h.rent_currency)),
        rent_amount: h.rent_amount,
        term_months: h.term_months,
    };

    c.check(validate_amount("otherCostsAmount", h.other_costs_amount));
    c.check(validate_amount("installationCost", h.installation_cost));
    c.check(validate_amount("rentAmount", h.rent_amount));
    c.check(validate_term_months(h.term_months));

    let address_lines = validate_address_lines(&input.address_lines, &mut c);

    match ValidationErrors::from_vec(c.errors) {
        Some(errors) => Err(errors),
        None => Ok(NewSubmission {
            header,
            address_lines,
        }),
    }
}

fn validate_address_lines(lines: &[AddressLine], c: &mut Collector) -> Vec<AddressLine> {
    if lines.is_empty() {
        c.errors.push(ValidationError::required("addressLines"));
        return Vec::new();
    }

    if lines.len() > MAX_ADDRESS_LINES {
        c.errors.push(ValidationError::OutOfRange {
            field: "addressLines".to_string(),
            min: 1,
            max: MAX_ADDRESS_LINES as i64,
        });
    }

    let mut seen = HashSet::with_capacity(lines.len());
    let mut normalized = Vec::with_capacity(lines.len());

    for line in lines {
        if line.ordinal <= 0 {
            c.errors.push(ValidationError::MustBePositive {
                field: "addressLines.ordinal".to_string(),
            });
        } else if !seen.insert(line.ordinal) {
            c.errors.push(ValidationError::Duplicate {
                field: "addressLines.ordinal".to_string(),
                value: line.ordinal.to_string(),
            });
        }

        normalized.push(AddressLine {
            ordinal: line.ordinal,
            address: c.take(validate_required_text("addressLines.address", &line.address)),
            service: c.take(validate_required_text("addressLines.service", &line.service)),
            capacity: c.take(validate_required_text("addressLines.capacity", &line.capacity)),
        });
    }

    normalized
}

// =============================================================================
// Test Fixtures
// =============================================================================

/// A valid submission for tests in this and downstream crates.
#[doc(hidden)]
pub fn sample_submission(client_id: &str, ordinals: &[i64]) -> NewSubmission {
    NewSubmission {
        header: SubmissionHeader {
            intake_date: "15-03-2024".to_string(),
            client_id: client_id.to_string(),
            client_name: "Comercial Andes".to_string(),
            sam_number: "SAM-1001".to_string(),
            business_name: "Comercial Andes SpA".to_string(),
            account_executive: "Paula Rojas".to_string(),
            account_executive_phone: "+56911112222".to_string(),
            client_contact: "Jorge Díaz".to_string(),
            client_contact_phone: "+56933334444".to_string(),
            technical_contact: "Camila Soto".to_string(),
            technical_contact_phone: "+56955556666".to_string(),
            project_manager: "Luis Vera".to_string(),
            project_manager_phone: "+56977778888".to_string(),
            project: "Enlaces sucursales".to_string(),
            expense_code: "PEP-42".to_string(),
            provider: "Proveedor Norte".to_string(),
            activity: "Alta".to_string(),
            address_type: "Sucursal".to_string(),
            other_costs_concept: "Habilitación".to_string(),
            other_costs_currency: "CLP".to_string(),
            other_costs_amount: 150000.0,
            installation_currency: "UF".to_string(),
            installation_cost: 12.5,
            rent_currency: "UF".to_string(),
            rent_amount: 8.75,
            term_months: 36,
        },
        address_lines: ordinals
            .iter()
            .map(|&ordinal| AddressLine {
                ordinal,
                address: format!("Av. Providencia {}", 1000 + ordinal),
                service: "MPLS".to_string(),
                capacity: "100 Mbps".to_string(),
            })
            .collect(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
