//! Column Template Registry
//!
//! Static mapping from entity type to its canonical header list and to the
//! header → field table used to build entities without reflection. Adding an
//! entity type is a code change; nothing here mutates at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ImportError;

/// Entity types that can be bulk-imported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Customer,
    Product,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Customer => "customer",
            EntityKind::Product => "product",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ImportError;

    /// Case-insensitive, surrounding whitespace ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.eq_ignore_ascii_case("customer") {
            Ok(EntityKind::Customer)
        } else if name.eq_ignore_ascii_case("product") {
            Ok(EntityKind::Product)
        } else {
            Err(ImportError::UnknownEntityType(name.to_string()))
        }
    }
}

/// Assignable customer fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerField {
    Username,
    FullName,
    Address,
    Phone,
    Email,
    CreatedAt,
}

/// Assignable product fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductField {
    Code,
    Name,
    Description,
    Price,
    Stock,
    Category,
}

/// Target of one header: an entity-tagged field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetField {
    Customer(CustomerField),
    Product(ProductField),
}

/// Canonical layout of one entity type
#[derive(Debug)]
pub struct ColumnTemplate {
    pub kind: EntityKind,
    /// Expected headers, in template order
    pub canonical_headers: &'static [&'static str],
    /// Headers a row must carry a value for
    pub required_headers: &'static [&'static str],
    /// Header → field assignment table
    pub field_map: &'static [(&'static str, TargetField)],
}

impl ColumnTemplate {
    /// Field bound to a header (case-insensitive)
    pub fn field_for(&self, header: &str) -> Option<TargetField> {
        let header = header.trim();
        self.field_map
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(header))
            .map(|(_, field)| *field)
    }

    /// Canonical headers as owned strings, for the correction step
    pub fn canonical_headers(&self) -> Vec<String> {
        self.canonical_headers.iter().map(|h| h.to_string()).collect()
    }
}

static CUSTOMER_TEMPLATE: ColumnTemplate = ColumnTemplate {
    kind: EntityKind::Customer,
    canonical_headers: &["username", "fullname", "address", "phone", "email", "created_at"],
    required_headers: &["username", "fullname", "email"],
    field_map: &[
        ("username", TargetField::Customer(CustomerField::Username)),
        ("fullname", TargetField::Customer(CustomerField::FullName)),
        ("address", TargetField::Customer(CustomerField::Address)),
        ("phone", TargetField::Customer(CustomerField::Phone)),
        ("email", TargetField::Customer(CustomerField::Email)),
        ("created_at", TargetField::Customer(CustomerField::CreatedAt)),
    ],
};

static PRODUCT_TEMPLATE: ColumnTemplate = ColumnTemplate {
    kind: EntityKind::Product,
    canonical_headers: &["code", "name", "description", "price", "stock", "category"],
    required_headers: &["code", "name", "price"],
    field_map: &[
        ("code", TargetField::Product(ProductField::Code)),
        ("name", TargetField::Product(ProductField::Name)),
        ("description", TargetField::Product(ProductField::Description)),
        ("price", TargetField::Product(ProductField::Price)),
        ("stock", TargetField::Product(ProductField::Stock)),
        ("category", TargetField::Product(ProductField::Category)),
    ],
};

/// Template for a known entity kind
pub fn template_for(kind: EntityKind) -> &'static ColumnTemplate {
    match kind {
        EntityKind::Customer => &CUSTOMER_TEMPLATE,
        EntityKind::Product => &PRODUCT_TEMPLATE,
    }
}

/// Look up a template by entity type name (case-insensitive)
pub fn get_template(entity_type: &str) -> Result<&'static ColumnTemplate, ImportError> {
    entity_type.parse::<EntityKind>().map(template_for)
}
