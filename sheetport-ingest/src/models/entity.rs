//! Importable entities and the header-driven builder
//!
//! Rows are turned into entities through the template's header → field table
//! and [`Entity::assign`], one enumerated field at a time. Unmapped row keys
//! are ignored and unassigned fields keep their zero value.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::templates::{ColumnTemplate, CustomerField, EntityKind, ProductField, TargetField};

/// Cell text could not be coerced into an entity field
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RowConstructionError {
    #[error("Field '{field}' expects {expected}, got '{value}'")]
    InvalidValue {
        field: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("Field {field:?} does not belong to a {kind} entity")]
    FieldMismatch { field: TargetField, kind: EntityKind },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub username: String,
    pub full_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: String,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: i64,
    /// Category code; must exist in storage
    pub category_code: Option<String>,
}

/// Tagged entity built from one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entity {
    Customer(NewCustomer),
    Product(NewProduct),
}

impl Entity {
    /// Entity with every field at its zero value
    pub fn empty(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Customer => Entity::Customer(NewCustomer::default()),
            EntityKind::Product => Entity::Product(NewProduct::default()),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Customer(_) => EntityKind::Customer,
            Entity::Product(_) => EntityKind::Product,
        }
    }

    /// Unique business key (username / product code)
    pub fn key(&self) -> &str {
        match self {
            Entity::Customer(c) => &c.username,
            Entity::Product(p) => &p.code,
        }
    }

    /// Build an entity from corrected-header row data
    pub fn from_row(
        template: &ColumnTemplate,
        row_data: &BTreeMap<String, String>,
    ) -> Result<Self, RowConstructionError> {
        let mut entity = Entity::empty(template.kind);
        for (header, value) in row_data {
            if let Some(field) = template.field_for(header) {
                entity.assign(field, value)?;
            }
        }
        Ok(entity)
    }

    /// Assign raw cell text to one field. Blank text leaves the field as is.
    pub fn assign(&mut self, field: TargetField, raw: &str) -> Result<(), RowConstructionError> {
        let value = raw.trim();
        if value.is_empty() {
            return Ok(());
        }

        match (self, field) {
            (Entity::Customer(c), TargetField::Customer(f)) => match f {
                CustomerField::Username => c.username = value.to_string(),
                CustomerField::FullName => c.full_name = value.to_string(),
                CustomerField::Address => c.address = Some(value.to_string()),
                CustomerField::Phone => c.phone = Some(value.to_string()),
                CustomerField::Email => c.email = value.to_string(),
                CustomerField::CreatedAt => {
                    c.created_at = Some(parse_date_time(value).ok_or_else(|| {
                        RowConstructionError::InvalidValue {
                            field: "created_at",
                            expected: "a date",
                            value: value.to_string(),
                        }
                    })?)
                }
            },
            (Entity::Product(p), TargetField::Product(f)) => match f {
                ProductField::Code => p.code = value.to_string(),
                ProductField::Name => p.name = value.to_string(),
                ProductField::Description => p.description = Some(value.to_string()),
                ProductField::Price => {
                    p.price = parse_decimal(value).ok_or_else(|| {
                        RowConstructionError::InvalidValue {
                            field: "price",
                            expected: "a decimal number",
                            value: value.to_string(),
                        }
                    })?
                }
                ProductField::Stock => {
                    p.stock = parse_integer(value).ok_or_else(|| {
                        RowConstructionError::InvalidValue {
                            field: "stock",
                            expected: "an integer",
                            value: value.to_string(),
                        }
                    })?
                }
                ProductField::Category => p.category_code = Some(value.to_string()),
            },
            (entity, field) => {
                return Err(RowConstructionError::FieldMismatch {
                    field,
                    kind: entity.kind(),
                })
            }
        }
        Ok(())
    }
}

/// Finite decimal number
pub fn parse_decimal(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Integer; spreadsheet floats with no fractional part are accepted
pub fn parse_integer(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(n) = value.parse::<i64>() {
        return Some(n);
    }
    parse_decimal(value)
        .filter(|n| n.fract() == 0.0 && n.abs() < 9.0e15)
        .map(|n| n as i64)
}

/// Date or date-time in one of the accepted spreadsheet layouts
pub fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for layout in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, layout) {
            return Some(dt);
        }
    }
    for layout in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, layout) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::template_for;

    fn data(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_customer_from_row() {
        let entity = Entity::from_row(
            template_for(EntityKind::Customer),
            &data(&[
                ("username", "jdoe"),
                ("fullname", "Jane Doe"),
                ("email", "jane@example.com"),
                ("created_at", "2024-03-01"),
                ("nickname", "ignored"),
            ]),
        )
        .unwrap();

        let Entity::Customer(c) = &entity else {
            panic!("expected customer");
        };
        assert_eq!(c.username, "jdoe");
        assert_eq!(c.full_name, "Jane Doe");
        assert_eq!(c.address, None);
        assert_eq!(
            c.created_at,
            NaiveDate::from_ymd_opt(2024, 3, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
        );
        assert_eq!(entity.key(), "jdoe");
    }

    #[test]
    fn test_product_zero_values_when_unmapped() {
        let entity = Entity::from_row(
            template_for(EntityKind::Product),
            &data(&[("code", "P-1"), ("price", "9.5"), ("stock", "")]),
        )
        .unwrap();

        let Entity::Product(p) = entity else {
            panic!("expected product");
        };
        assert_eq!(p.price, 9.5);
        assert_eq!(p.stock, 0);
        assert_eq!(p.name, "");
        assert_eq!(p.category_code, None);
    }

    #[test]
    fn test_coercion_failure() {
        let err = Entity::from_row(
            template_for(EntityKind::Product),
            &data(&[("code", "P-1"), ("price", "twelve")]),
        )
        .unwrap_err();
        assert!(matches!(err, RowConstructionError::InvalidValue { field: "price", .. }));
    }

    #[test]
    fn test_field_mismatch() {
        let mut entity = Entity::empty(EntityKind::Customer);
        let err = entity
            .assign(TargetField::Product(ProductField::Code), "P-1")
            .unwrap_err();
        assert!(matches!(err, RowConstructionError::FieldMismatch { .. }));
    }

    #[test]
    fn test_parse_integer_accepts_whole_floats() {
        assert_eq!(parse_integer("12"), Some(12));
        assert_eq!(parse_integer("12.0"), Some(12));
        assert_eq!(parse_integer("12.5"), None);
        assert_eq!(parse_integer("abc"), None);
    }

    #[test]
    fn test_parse_date_layouts() {
        assert!(parse_date_time("2024-01-31").is_some());
        assert!(parse_date_time("2024-01-31 10:15:00").is_some());
        assert!(parse_date_time("2024-01-31T10:15:00Z").is_some());
        assert!(parse_date_time("31/01/2024").is_some());
        assert!(parse_date_time("yesterday").is_none());
        assert!(parse_decimal("NaN").is_none());
    }
}
