//! # Validation Module
//!
//! Input validation for checkout, catalog and report requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Cashier UI                                                   │
//! │  └── Immediate feedback (empty cart, missing payment method)           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (pure, runs before any storage access)           │
//! │  ├── Cart shape: non-empty, quantity > 0, price finite and >= 0        │
//! │  ├── Payment method in the accepted set                                │
//! │  ├── Lengths: name <= 255, description/notes <= 500                    │
//! │  └── Report dates: strict YYYY-MM-DD                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (price > 0, quantity > 0, enums)                │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every validator reports the first offending field. Cart line fields are
//! indexed, e.g. `items[1].quantity`.
//!
//! ## Usage
//! ```rust
//! use kopi_core::validation::{validate_checkout, validate_quantity};
//! use kopi_core::{CartLine, CheckoutRequest};
//!
//! assert!(validate_quantity("quantity", 0).is_err());
//!
//! let request = CheckoutRequest {
//!     items: vec![CartLine { product_id: 1, quantity: 2, price: 25000.0 }],
//!     payment_method: "cash".to_string(),
//!     notes: None,
//! };
//! let checkout = validate_checkout(&request).unwrap();
//! assert_eq!(checkout.total.cents(), 5_000_000);
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{
    CheckoutRequest, NewProduct, PaymentMethod, ProductChanges, ProductDraft, ProductPatch,
    ValidatedCheckout, ValidatedLine,
};
use crate::{MAX_DESCRIPTION_LEN, MAX_NAME_LEN, MAX_NOTES_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name and returns it trimmed.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 255 characters
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    check_max_chars("name", name, MAX_NAME_LEN)?;
    Ok(name.to_string())
}

/// Validates an optional product description.
///
/// Blank descriptions collapse to `None`.
pub fn validate_description(description: Option<&str>) -> ValidationResult<Option<String>> {
    optional_text("description", description, MAX_DESCRIPTION_LEN)
}

/// Validates optional checkout notes (at most 500 characters).
///
/// Blank notes collapse to `None`.
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<Option<String>> {
    optional_text("notes", notes, MAX_NOTES_LEN)
}

fn optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => {
            check_max_chars(field, text, max)?;
            Ok(Some(text.to_string()))
        }
    }
}

/// Length in characters, not bytes: names like "Kopi Susu Gula Aren ☕" are
/// multi-byte.
fn check_max_chars(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Parses a payment method.
///
/// Accepts `cash`, `card` (or its alias `qr`) and `transfer`.
pub fn validate_payment_method(method: &str) -> ValidationResult<PaymentMethod> {
    if method.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "paymentMethod".to_string(),
        });
    }

    method.parse().map_err(|_| ValidationError::NotAllowed {
        field: "paymentMethod".to_string(),
        allowed: PaymentMethod::ACCEPTED.iter().map(|s| s.to_string()).collect(),
    })
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart quantity: a strictly positive integer.
pub fn validate_quantity(field: &str, quantity: i64) -> ValidationResult<i64> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(quantity)
}

/// Validates a cart unit price: finite and non-negative.
///
/// A zero price is allowed for complimentary items.
pub fn validate_unit_price(field: &str, price: f64) -> ValidationResult<Money> {
    let money = to_money(field, price)?;
    if money.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(money)
}

/// Validates a catalog list price: finite and strictly positive after
/// rounding to minor units.
pub fn validate_product_price(price: f64) -> ValidationResult<Money> {
    let money = to_money("price", price)?;
    if !money.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }
    Ok(money)
}

/// Validates a stock level supplied by the catalog (non-negative).
///
/// The ledger may later drive stock below zero; that path does not come
/// through here.
pub fn validate_stock(stock: i64) -> ValidationResult<i64> {
    if stock < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "stock".to_string(),
        });
    }
    Ok(stock)
}

fn to_money(field: &str, value: f64) -> ValidationResult<Money> {
    Money::from_major_f64(value).ok_or_else(|| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a finite amount".to_string(),
    })
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a whole checkout request.
///
/// ## Rules
/// - `items` non-empty
/// - every `quantity` > 0
/// - every `price` finite and >= 0
/// - `paymentMethod` accepted
/// - `notes` at most 500 characters
///
/// Subtotals and the total are computed here with overflow checks, so the
/// ledger only ever writes numbers that add up.
pub fn validate_checkout(request: &CheckoutRequest) -> ValidationResult<ValidatedCheckout> {
    if request.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    let mut lines = Vec::with_capacity(request.items.len());
    let mut total = Money::zero();

    for (index, line) in request.items.iter().enumerate() {
        let quantity = validate_quantity(&format!("items[{index}].quantity"), line.quantity)?;
        let price_field = format!("items[{index}].price");
        let unit_price = validate_unit_price(&price_field, line.price)?;

        let overflow = || ValidationError::InvalidFormat {
            field: price_field.clone(),
            reason: "amount too large".to_string(),
        };
        let subtotal = unit_price
            .checked_multiply_quantity(quantity)
            .ok_or_else(overflow)?;
        total = total.checked_add(subtotal).ok_or_else(overflow)?;

        lines.push(ValidatedLine {
            product_id: line.product_id,
            quantity,
            unit_price,
            subtotal,
        });
    }

    let payment_method = validate_payment_method(&request.payment_method)?;
    let notes = validate_notes(request.notes.as_deref())?;

    Ok(ValidatedCheckout {
        lines,
        payment_method,
        notes,
        total,
    })
}

/// Validates a new catalog entry.
pub fn validate_new_product(input: &NewProduct) -> ValidationResult<ProductDraft> {
    Ok(ProductDraft {
        name: validate_product_name(&input.name)?,
        description: validate_description(input.description.as_deref())?,
        category: input.category,
        price: validate_product_price(input.price)?,
        stock: validate_stock(input.stock)?,
    })
}

/// Validates a partial update. A patch with no fields is rejected.
pub fn validate_product_patch(patch: &ProductPatch) -> ValidationResult<ProductChanges> {
    if patch.is_empty() {
        return Err(ValidationError::Required {
            field: "patch".to_string(),
        });
    }

    Ok(ProductChanges {
        name: patch.name.as_deref().map(validate_product_name).transpose()?,
        description: patch
            .description
            .as_deref()
            .map(|text| validate_description(Some(text)))
            .transpose()?,
        category: patch.category,
        price: patch.price.map(validate_product_price).transpose()?,
        stock: patch.stock.map(validate_stock).transpose()?,
    })
}

/// Parses a report date in strict `YYYY-MM-DD` form.
pub fn parse_report_date(date: &str) -> ValidationResult<NaiveDate> {
    let date = date.trim();

    if date.is_empty() {
        return Err(ValidationError::Required {
            field: "date".to_string(),
        });
    }

    // chrono accepts unpadded fields; insist on the ISO width as well.
    if date.len() != 10 {
        return Err(invalid_date());
    }

    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| invalid_date())
}

fn invalid_date() -> ValidationError {
    ValidationError::InvalidFormat {
        field: "date".to_string(),
        reason: "expected YYYY-MM-DD".to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CartLine, ProductCategory};

    fn cart(items: Vec<CartLine>, method: &str) -> CheckoutRequest {
        CheckoutRequest {
            items,
            payment_method: method.to_string(),
            notes: None,
        }
    }

    fn line(product_id: i64, quantity: i64, price: f64) -> CartLine {
        CartLine {
            product_id,
            quantity,
            price,
        }
    }

    #[test]
    fn test_checkout_total_from_subtotals() {
        let req = cart(vec![line(1, 2, 25000.0), line(2, 1, 30000.0)], "cash");
        let checkout = validate_checkout(&req).unwrap();

        assert_eq!(checkout.total, Money::from_cents(8_000_000));
        assert_eq!(checkout.lines[0].subtotal, Money::from_cents(5_000_000));
        assert_eq!(checkout.lines[1].subtotal, Money::from_cents(3_000_000));
        assert_eq!(checkout.payment_method, PaymentMethod::Cash);
    }

    #[test]
    fn test_checkout_rejects_empty_cart() {
        let err = validate_checkout(&cart(vec![], "cash")).unwrap_err();
        assert_eq!(err.field(), "items");
    }

    #[test]
    fn test_checkout_reports_offending_line() {
        let req = cart(vec![line(1, 1, 10.0), line(2, 0, 10.0)], "cash");
        let err = validate_checkout(&req).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MustBePositive {
                field: "items[1].quantity".to_string()
            }
        );

        let req = cart(vec![line(1, 1, -1.0)], "cash");
        assert_eq!(validate_checkout(&req).unwrap_err().field(), "items[0].price");

        let req = cart(vec![line(1, 1, f64::NAN)], "cash");
        assert!(matches!(
            validate_checkout(&req).unwrap_err(),
            ValidationError::InvalidFormat { .. }
        ));
    }

    #[test]
    fn test_checkout_allows_free_items() {
        let req = cart(vec![line(1, 3, 0.0)], "transfer");
        let checkout = validate_checkout(&req).unwrap();
        assert!(checkout.total.is_zero());
    }

    #[test]
    fn test_checkout_overflow_is_validation_error() {
        let req = cart(vec![line(1, i64::MAX, 1.0)], "cash");
        assert!(validate_checkout(&req).is_err());
    }

    #[test]
    fn test_payment_method_rules() {
        assert_eq!(validate_payment_method("qr").unwrap(), PaymentMethod::Card);
        assert!(matches!(
            validate_payment_method(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_payment_method("crypto"),
            Err(ValidationError::NotAllowed { .. })
        ));
    }

    #[test]
    fn test_notes_length() {
        assert_eq!(validate_notes(Some("   ")).unwrap(), None);
        assert!(validate_notes(Some(&"a".repeat(500))).is_ok());
        assert!(validate_notes(Some(&"a".repeat(501))).is_err());
        // 500 multi-byte characters are still 500 characters
        assert!(validate_notes(Some(&"☕".repeat(500))).is_ok());
    }

    #[test]
    fn test_validate_product_name() {
        assert_eq!(validate_product_name("  Kopi Tubruk ").unwrap(), "Kopi Tubruk");
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(256)).is_err());
    }

    #[test]
    fn test_product_price_must_be_positive() {
        assert_eq!(
            validate_product_price(18000.0).unwrap(),
            Money::from_cents(1_800_000)
        );
        assert!(validate_product_price(0.0).is_err());
        assert!(validate_product_price(-5.0).is_err());
        // rounds to zero minor units
        assert!(validate_product_price(0.001).is_err());
    }

    #[test]
    fn test_new_product() {
        let input = NewProduct {
            name: "Es Kopi Susu".to_string(),
            description: Some("".to_string()),
            category: ProductCategory::Coffee,
            price: 22000.0,
            stock: 10,
        };
        let draft = validate_new_product(&input).unwrap();
        assert_eq!(draft.description, None);
        assert_eq!(draft.price.cents(), 2_200_000);

        let bad = NewProduct { stock: -1, ..input };
        assert_eq!(validate_new_product(&bad).unwrap_err().field(), "stock");
    }

    #[test]
    fn test_product_patch() {
        assert!(validate_product_patch(&ProductPatch::default()).is_err());

        let patch = ProductPatch {
            price: Some(20000.0),
            ..Default::default()
        };
        let changes = validate_product_patch(&patch).unwrap();
        assert_eq!(changes.price, Some(Money::from_cents(2_000_000)));
        assert_eq!(changes.name, None);
        assert_eq!(changes.description, None);

        let clear = ProductPatch {
            description: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(validate_product_patch(&clear).unwrap().description, Some(None));

        let patch = ProductPatch {
            stock: Some(-3),
            ..Default::default()
        };
        assert!(validate_product_patch(&patch).is_err());
    }

    #[test]
    fn test_parse_report_date() {
        assert_eq!(
            parse_report_date("2099-01-01").unwrap(),
            NaiveDate::from_ymd_opt(2099, 1, 1).unwrap()
        );
        assert!(parse_report_date("").is_err());
        assert!(parse_report_date("2024-13-01").is_err());
        assert!(parse_report_date("2024-2-1").is_err());
        assert!(parse_report_date("01/02/2024").is_err());
        assert!(parse_report_date("2024-02-30").is_err());
    }
}
