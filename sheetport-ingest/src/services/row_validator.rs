//! Row Validator
//!
//! Entity-specific, side-effect-free row checks. Violations accumulate, so a
//! row with three problems reports all three. Uniqueness is not checked here;
//! storage enforces it at commit time.

use crate::models::entity::{parse_date_time, parse_decimal, parse_integer};
use crate::models::{RowRecord, RowValidationVerdict};
use crate::templates::{template_for, EntityKind};

/// Per-entity validation rules
pub trait RowValidator: Send + Sync {
    fn entity_kind(&self) -> EntityKind;

    /// Headers that must carry a non-blank value
    fn required_fields(&self) -> &'static [&'static str] {
        template_for(self.entity_kind()).required_headers
    }

    /// Format checks on populated fields; blank values are skipped
    fn check_formats(&self, row: &RowRecord, errors: &mut Vec<String>);

    fn validate(&self, row: RowRecord) -> RowValidationVerdict {
        let mut errors: Vec<String> = self
            .required_fields()
            .iter()
            .filter(|field| row.non_empty(field).is_none())
            .map(|field| format!("Missing required field '{}'", field))
            .collect();

        self.check_formats(&row, &mut errors);
        RowValidationVerdict::from_errors(row, errors)
    }
}

pub struct CustomerValidator;

impl RowValidator for CustomerValidator {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Customer
    }

    fn check_formats(&self, row: &RowRecord, errors: &mut Vec<String>) {
        if let Some(email) = row.non_empty("email") {
            if !email.contains('@') {
                errors.push(format!("Field 'email' must contain '@' (got '{}')", email));
            }
        }

        if let Some(phone) = row.non_empty("phone") {
            if !is_phone_number(phone) {
                errors.push(format!(
                    "Field 'phone' must be a phone number of at least {} digits (got '{}')",
                    MIN_PHONE_DIGITS, phone
                ));
            }
        }

        if let Some(created_at) = row.non_empty("created_at") {
            if parse_date_time(created_at).is_none() {
                errors.push(format!(
                    "Field 'created_at' must be a date (got '{}')",
                    created_at
                ));
            }
        }
    }
}

pub struct ProductValidator;

impl RowValidator for ProductValidator {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Product
    }

    fn check_formats(&self, row: &RowRecord, errors: &mut Vec<String>) {
        if let Some(price) = row.non_empty("price") {
            match parse_decimal(price) {
                None => errors.push(format!(
                    "Field 'price' must be a decimal number (got '{}')",
                    price
                )),
                Some(value) if value < 0.0 => errors.push(format!(
                    "Field 'price' must not be negative (got '{}')",
                    price
                )),
                Some(_) => {}
            }
        }

        if let Some(stock) = row.non_empty("stock") {
            match parse_integer(stock) {
                None => errors.push(format!(
                    "Field 'stock' must be a whole number (got '{}')",
                    stock
                )),
                Some(value) if value < 0 => errors.push(format!(
                    "Field 'stock' must not be negative (got '{}')",
                    stock
                )),
                Some(_) => {}
            }
        }
    }
}

const MIN_PHONE_DIGITS: usize = 6;

fn is_phone_number(value: &str) -> bool {
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')' | '.'));
    allowed && value.chars().filter(|c| c.is_ascii_digit()).count() >= MIN_PHONE_DIGITS
}

static CUSTOMER_VALIDATOR: CustomerValidator = CustomerValidator;
static PRODUCT_VALIDATOR: ProductValidator = ProductValidator;

/// Validator for an entity kind
pub fn validator_for(kind: EntityKind) -> &'static dyn RowValidator {
    match kind {
        EntityKind::Customer => &CUSTOMER_VALIDATOR,
        EntityKind::Product => &PRODUCT_VALIDATOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RowRecord {
        RowRecord::new(
            5,
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_valid_customer() {
        let verdict = validator_for(EntityKind::Customer).validate(row(&[
            ("username", "jdoe"),
            ("fullname", "Jane Doe"),
            ("email", "jane@example.com"),
            ("phone", "+34 (91) 555-12-12"),
            ("created_at", "2024-02-29"),
        ]));
        assert!(verdict.is_valid, "{:?}", verdict.errors);
        assert!(verdict.errors.is_empty());
        assert_eq!(verdict.row_number, 5);
    }

    #[test]
    fn test_missing_fields_accumulate() {
        let verdict = validator_for(EntityKind::Customer).validate(row(&[
            ("username", ""),
            ("email", "not-an-email"),
        ]));
        assert!(!verdict.is_valid);
        assert_eq!(verdict.errors.len(), 3);
        assert!(verdict.errors[0].contains("username"));
        assert!(verdict.errors[1].contains("fullname"));
        assert!(verdict.errors[2].contains("email"));
    }

    #[test]
    fn test_optional_formats_checked_only_when_present() {
        let base = [
            ("username", "u"),
            ("fullname", "U"),
            ("email", "u@x.io"),
        ];
        let validator = validator_for(EntityKind::Customer);
        assert!(validator.validate(row(&base)).is_valid);

        let mut with_bad_phone = base.to_vec();
        with_bad_phone.push(("phone", "call me"));
        let verdict = validator.validate(row(&with_bad_phone));
        assert_eq!(verdict.errors.len(), 1);
        assert!(verdict.errors[0].contains("phone"));
    }

    #[test]
    fn test_product_rules() {
        let validator = validator_for(EntityKind::Product);

        let ok = validator.validate(row(&[("code", "P1"), ("name", "Pen"), ("price", "1.25"), ("stock", "10")]));
        assert!(ok.is_valid);

        let bad = validator.validate(row(&[("code", "P2"), ("name", "Ink"), ("price", "abc"), ("stock", "-1")]));
        assert_eq!(bad.errors.len(), 2);
        assert!(bad.errors[0].contains("price"));
        assert!(bad.errors[1].contains("stock"));

        let negative = validator.validate(row(&[("code", "P3"), ("name", "Cap"), ("price", "-0.5")]));
        assert!(!negative.is_valid);
    }

    #[test]
    fn test_phone_number_shape() {
        assert!(is_phone_number("555 123 456"));
        assert!(!is_phone_number("12345"));
        assert!(!is_phone_number("555-123-abc"));
    }
}
