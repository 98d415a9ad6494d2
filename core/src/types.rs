//! Shipment, package and customs records.
//!
//! # Design
//! Each record is decoded from responses with serde and encoded into request
//! parameters through its `Shape`. The serde wire names and the descriptor
//! wire names are kept identical so a record read from the server encodes
//! back under the same keys. Fields the server computes (ids, status,
//! tracking, costs, label data) are `response_only` and never sent.
//!
//! `type` is a keyword, so the Rust field is `kind` and both serde and the
//! descriptor rename it on the wire.

use serde::{Deserialize, Deserializer, Serialize};

use crate::params::{FieldDescriptor, FieldValue, Record, Shape};

/// Id carried by records that have not been created on the server yet.
pub const NO_ID: i64 = -1;

/// Status assigned locally once a void request is acknowledged.
pub const VOIDED_STATUS: &str = "Voided";

/// Reads a JSON `null` as the field's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads a JSON `null` id as `NO_ID`.
fn null_as_no_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or(NO_ID))
}

/// A postal address used as a shipment's origin or destination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    #[serde(deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(deserialize_with = "null_as_default")]
    pub contact: String,
    #[serde(deserialize_with = "null_as_default")]
    pub line1: String,
    #[serde(deserialize_with = "null_as_default")]
    pub line2: String,
    #[serde(deserialize_with = "null_as_default")]
    pub line3: String,
    #[serde(deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(deserialize_with = "null_as_default")]
    pub zip_code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub country: String,
}

static ADDRESS_SHAPE: Shape = Shape {
    name: "Address",
    fields: &[
        FieldDescriptor::scalar("company"),
        FieldDescriptor::scalar("contact"),
        FieldDescriptor::scalar("line1"),
        FieldDescriptor::scalar("line2"),
        FieldDescriptor::scalar("line3"),
        FieldDescriptor::scalar("city"),
        FieldDescriptor::scalar("state"),
        FieldDescriptor::scalar("zip_code"),
        FieldDescriptor::scalar("phone_number"),
        FieldDescriptor::scalar("country"),
    ],
};

impl Record for Address {
    fn shape(&self) -> &'static Shape {
        &ADDRESS_SHAPE
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        let value = match name {
            "company" => &self.company,
            "contact" => &self.contact,
            "line1" => &self.line1,
            "line2" => &self.line2,
            "line3" => &self.line3,
            "city" => &self.city,
            "state" => &self.state,
            "zip_code" => &self.zip_code,
            "phone_number" => &self.phone_number,
            "country" => &self.country,
            _ => return None,
        };
        Some(FieldValue::Str(value))
    }
}

/// A single line item of a customs declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomContent {
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub quantity: String,
    #[serde(deserialize_with = "null_as_default")]
    pub value: String,
    #[serde(deserialize_with = "null_as_default")]
    pub weight: f32,
    #[serde(deserialize_with = "null_as_default")]
    pub weight_units: String,
    #[serde(deserialize_with = "null_as_default")]
    pub hs_tariff_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub country_of_origin: String,
}

static CUSTOM_CONTENT_SHAPE: Shape = Shape {
    name: "CustomContent",
    fields: &[
        FieldDescriptor::scalar("description"),
        FieldDescriptor::scalar("quantity"),
        FieldDescriptor::scalar("value"),
        FieldDescriptor::scalar("weight"),
        FieldDescriptor::scalar("weight_units"),
        FieldDescriptor::scalar("hs_tariff_number"),
        FieldDescriptor::scalar("country_of_origin"),
    ],
};

impl Record for CustomContent {
    fn shape(&self) -> &'static Shape {
        &CUSTOM_CONTENT_SHAPE
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        Some(match name {
            "description" => FieldValue::Str(&self.description),
            "quantity" => FieldValue::Str(&self.quantity),
            "value" => FieldValue::Str(&self.value),
            "weight" => FieldValue::Float(self.weight),
            "weight_units" => FieldValue::Str(&self.weight_units),
            "hs_tariff_number" => FieldValue::Str(&self.hs_tariff_number),
            "country_of_origin" => FieldValue::Str(&self.country_of_origin),
            _ => return None,
        })
    }
}

/// Customs declaration attached to a package. Only needed for international
/// shipments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Custom {
    #[serde(rename = "type")]
    #[serde(deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub comments: String,
    #[serde(deserialize_with = "null_as_default")]
    pub invoice_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub contents: CustomContent,
}

static CUSTOM_SHAPE: Shape = Shape {
    name: "Custom",
    fields: &[
        FieldDescriptor::scalar("kind").renamed("type"),
        FieldDescriptor::scalar("comments"),
        FieldDescriptor::scalar("invoice_number"),
        FieldDescriptor::nested("contents"),
    ],
};

impl Record for Custom {
    fn shape(&self) -> &'static Shape {
        &CUSTOM_SHAPE
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        Some(match name {
            "kind" => FieldValue::Str(&self.kind),
            "comments" => FieldValue::Str(&self.comments),
            "invoice_number" => FieldValue::Str(&self.invoice_number),
            "contents" => FieldValue::Record(&self.contents),
            _ => return None,
        })
    }
}

/// The physical parcel of a shipment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Package {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub width: f32,
    #[serde(deserialize_with = "null_as_default")]
    pub height: f32,
    #[serde(deserialize_with = "null_as_default")]
    pub length: f32,
    #[serde(deserialize_with = "null_as_default")]
    pub weight: f32,
    #[serde(deserialize_with = "null_as_default")]
    pub customs: Custom,
    #[serde(deserialize_with = "null_as_default")]
    pub dimension_units: String,
    #[serde(deserialize_with = "null_as_default")]
    pub weight_units: String,
    #[serde(rename = "type")]
    #[serde(deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub label_url: String,
}

static PACKAGE_SHAPE: Shape = Shape {
    name: "Package",
    fields: &[
        FieldDescriptor::response_only("id"),
        FieldDescriptor::scalar("name"),
        FieldDescriptor::scalar("width"),
        FieldDescriptor::scalar("height"),
        FieldDescriptor::scalar("length"),
        FieldDescriptor::scalar("weight"),
        FieldDescriptor::nested("customs"),
        FieldDescriptor::response_only("dimension_units"),
        FieldDescriptor::response_only("weight_units"),
        FieldDescriptor::response_only("kind").renamed("type"),
        FieldDescriptor::response_only("label_url"),
    ],
};

impl Record for Package {
    fn shape(&self) -> &'static Shape {
        &PACKAGE_SHAPE
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        Some(match name {
            "id" => FieldValue::Int(self.id),
            "name" => FieldValue::Str(&self.name),
            "width" => FieldValue::Float(self.width),
            "height" => FieldValue::Float(self.height),
            "length" => FieldValue::Float(self.length),
            "weight" => FieldValue::Float(self.weight),
            "customs" => FieldValue::Record(&self.customs),
            "dimension_units" => FieldValue::Str(&self.dimension_units),
            "weight_units" => FieldValue::Str(&self.weight_units),
            "kind" => FieldValue::Str(&self.kind),
            "label_url" => FieldValue::Str(&self.label_url),
            _ => return None,
        })
    }
}

/// A shipment between two addresses.
///
/// Build new shipments with `Shipment::new()` (or `Postmaster::new_shipment`)
/// so the id starts at `NO_ID`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Shipment {
    #[serde(deserialize_with = "null_as_no_id")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub to: Address,
    #[serde(deserialize_with = "null_as_default")]
    pub from: Address,
    #[serde(deserialize_with = "null_as_default")]
    pub package: Package,
    #[serde(deserialize_with = "null_as_default")]
    pub carrier: String,
    #[serde(deserialize_with = "null_as_default")]
    pub service: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tracking: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub package_count: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub created_at: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub cost: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub prepaid: bool,
}

impl Default for Shipment {
    fn default() -> Self {
        Self {
            id: NO_ID,
            to: Address::default(),
            from: Address::default(),
            package: Package::default(),
            carrier: String::new(),
            service: String::new(),
            status: String::new(),
            tracking: Vec::new(),
            package_count: 0,
            created_at: 0,
            cost: 0,
            prepaid: false,
        }
    }
}

impl Shipment {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the server has assigned an id.
    pub fn has_id(&self) -> bool {
        self.id != NO_ID
    }

    pub fn is_voided(&self) -> bool {
        self.status == VOIDED_STATUS
    }
}

static SHIPMENT_SHAPE: Shape = Shape {
    name: "Shipment",
    fields: &[
        FieldDescriptor::response_only("id"),
        FieldDescriptor::nested("to"),
        FieldDescriptor::nested("from"),
        FieldDescriptor::nested("package"),
        FieldDescriptor::scalar("carrier"),
        FieldDescriptor::scalar("service"),
        FieldDescriptor::response_only("status"),
        FieldDescriptor::response_only("tracking"),
        FieldDescriptor::scalar("package_count"),
        FieldDescriptor::scalar("created_at"),
        FieldDescriptor::response_only("cost"),
        FieldDescriptor::response_only("prepaid"),
    ],
};

impl Record for Shipment {
    fn shape(&self) -> &'static Shape {
        &SHIPMENT_SHAPE
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        Some(match name {
            "id" => FieldValue::Int(self.id),
            "to" => FieldValue::Record(&self.to),
            "from" => FieldValue::Record(&self.from),
            "package" => FieldValue::Record(&self.package),
            "carrier" => FieldValue::Str(&self.carrier),
            "service" => FieldValue::Str(&self.service),
            "status" => FieldValue::Str(&self.status),
            "tracking" => FieldValue::List(&self.tracking),
            "package_count" => FieldValue::Int(self.package_count),
            "created_at" => FieldValue::Int(self.created_at),
            "cost" => FieldValue::Int(self.cost),
            "prepaid" => FieldValue::Bool(self.prepaid),
            _ => return None,
        })
    }
}

/// One page of shipments. `cursor` is opaque and passed back verbatim to
/// fetch the next page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipmentList {
    #[serde(deserialize_with = "null_as_default")]
    pub results: Vec<Shipment>,
    #[serde(deserialize_with = "null_as_default")]
    pub cursor: String,
    #[serde(deserialize_with = "null_as_default")]
    pub previous_cursor: String,
}

/// A single scan event in a tracking history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingEvent {
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingResult {
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub history: Vec<TrackingEvent>,
    #[serde(deserialize_with = "null_as_default")]
    pub last_update: i64,
}

/// Tracking information for every package of a shipment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub results: Vec<TrackingResult>,
}

/// Body of a void acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoidResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
}
