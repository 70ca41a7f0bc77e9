//! # Validation Module
//!
//! Input validation utilities for Stockroom.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP boundary (axum extractors)                               │
//! │  ├── Type validation (JSON / query deserialization)                     │
//! │  └── Malformed payloads rejected with 400                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Core / repositories (Rust)                                    │
//! │  └── THIS MODULE: Business rule validation                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── CHECK (price_cents >= 0), CHECK (stock >= 0)                       │
//! │  ├── UNIQUE category names                                              │
//! │  └── Foreign key constraints                                            │
//! │                                                                         │
//! │  Each layer catches a different class of error                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use stockroom_core::validation::{validate_category_name, validate_quantity};
//!
//! // Validate name before database insert
//! validate_category_name("Beverages").unwrap();
//!
//! // Validate quantity before checkout
//! validate_quantity(5).unwrap();
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::{MAX_CATEGORY_NAME_LEN, MAX_PRODUCT_NAME_LEN, REPORT_DATE_FORMAT};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn validate_name(field: &str, name: &str, max: usize) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(name.to_string())
}

/// Validates a category name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 100 characters
///
/// ## Returns
/// The trimmed name.
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_category_name;
///
/// assert_eq!(validate_category_name("  Drinks ").unwrap(), "Drinks");
/// assert!(validate_category_name("").is_err());
/// assert!(validate_category_name(&"A".repeat(101)).is_err());
/// ```
pub fn validate_category_name(name: &str) -> ValidationResult<String> {
    validate_name("name", name, MAX_CATEGORY_NAME_LEN)
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Kopi Susu 250ml").is_ok());
/// assert!(validate_product_name("").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    validate_name("name", name, MAX_PRODUCT_NAME_LEN)
}

/// Validates a name search fragment.
///
/// ## Returns
/// The trimmed fragment, or `None` when there is nothing to search for.
pub fn validate_search_query(query: &str) -> ValidationResult<Option<String>> {
    let query = query.trim();

    if query.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        });
    }

    Ok((!query.is_empty()).then(|| query.to_string()))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a checkout quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - No upper cap; stock is the only limit
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());  // $10.99
/// assert!(validate_price_cents(0).is_ok());     // Free item
/// assert!(validate_price_cents(-100).is_err()); // Invalid
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::Negative {
            field: "stock".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Parses a report date in `YYYY-MM-DD` form.
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::parse_report_date;
///
/// assert!(parse_report_date("start_date", "2024-03-01").is_ok());
/// assert!(parse_report_date("start_date", "").is_err());
/// assert!(parse_report_date("start_date", "03/01/2024").is_err());
/// ```
pub fn parse_report_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    NaiveDate::parse_from_str(value, REPORT_DATE_FORMAT).map_err(|_| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected YYYY-MM-DD".to_string(),
        }
    })
}

/// Validates an inclusive report window.
///
/// ## Rules
/// - Both ends are required
/// - `start` must not be after `end`
pub fn validate_date_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> ValidationResult<(NaiveDate, NaiveDate)> {
    let (start, end) = match (start, end) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            return Err(ValidationError::Required {
                field: "start_date and end_date".to_string(),
            })
        }
    };

    if start > end {
        return Err(ValidationError::InvalidFormat {
            field: "start_date".to_string(),
            reason: format!("{start} is after end_date {end}"),
        });
    }

    Ok((start, end))
}

// =============================================================================
// Unit Tests
// =============================================================================
