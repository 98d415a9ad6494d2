//! Flattening of records into form parameters.
//!
//! # Design
//! Every record type carries a static `Shape`: a table of `FieldDescriptor`s
//! declared next to the struct. A descriptor says whether the field is ever
//! sent (`include`), which name it goes out under (`rename`, otherwise the
//! lowercased field name) and whether its value is itself a record that must
//! be flattened recursively (`nested`). The encoder walks that table, asks the
//! record for each included value through `Record::field`, and produces a flat
//! `Params` map whose nested keys are chained with brackets:
//! `package[customs][contents][description]`.
//!
//! A table that disagrees with its record (unknown field, nested flag that
//! does not match the value, a list that cannot be flattened) is a programmer
//! error and surfaces as `EncodeError` rather than a silently wrong map.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use url::form_urlencoded::byte_serialize;

use crate::error::EncodeError;

/// Flat parameter set. Keys are unique and iterate in ascending order, which
/// keeps request bodies deterministic.
pub type Params = BTreeMap<String, String>;

/// Encode-time metadata for a single record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Declared field name, also the key passed to `Record::field`.
    pub name: &'static str,
    /// Wire name override.
    pub rename: Option<&'static str>,
    /// `false` for fields that only ever come back from the server.
    pub include: bool,
    /// `true` when the value is a record to be flattened under this name.
    pub nested: bool,
}

impl FieldDescriptor {
    pub const fn scalar(name: &'static str) -> Self {
        Self {
            name,
            rename: None,
            include: true,
            nested: false,
        }
    }

    pub const fn nested(name: &'static str) -> Self {
        Self {
            name,
            rename: None,
            include: true,
            nested: true,
        }
    }

    /// A field that is decoded from responses but never encoded.
    pub const fn response_only(name: &'static str) -> Self {
        Self {
            name,
            rename: None,
            include: false,
            nested: false,
        }
    }

    pub const fn renamed(self, wire_name: &'static str) -> Self {
        Self {
            rename: Some(wire_name),
            ..self
        }
    }

    /// The name this field is emitted under, before any prefix is applied.
    pub fn wire_name(&self) -> Cow<'static, str> {
        match self.rename {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(self.name.to_lowercase()),
        }
    }
}

/// Descriptor table for one record type.
#[derive(Debug)]
pub struct Shape {
    pub name: &'static str,
    pub fields: &'static [FieldDescriptor],
}

/// A borrowed field value as seen by the encoder.
#[derive(Clone, Copy)]
pub enum FieldValue<'a> {
    Str(&'a str),
    Int(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    List(&'a [String]),
    Record(&'a dyn Record),
}

impl FieldValue<'_> {
    fn kind(&self) -> &'static str {
        match self {
            FieldValue::Str(_) => "string",
            FieldValue::Int(_) | FieldValue::Float(_) | FieldValue::Double(_) => "number",
            FieldValue::Bool(_) => "bool",
            FieldValue::List(_) => "list",
            FieldValue::Record(_) => "record",
        }
    }
}

/// A value the encoder can flatten.
///
/// Implementations return their static `Shape` and resolve every descriptor
/// name to a value. Smart pointers and references forward to the pointee, so
/// a record behind any number of indirections encodes like the record itself.
pub trait Record {
    fn shape(&self) -> &'static Shape;

    /// Value of the field declared as `name`, or `None` if the record has no
    /// such field.
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;
}

macro_rules! forward_record {
    ($($ptr:ty),* $(,)?) => {
        $(
            impl<T: Record + ?Sized> Record for $ptr {
                fn shape(&self) -> &'static Shape {
                    (**self).shape()
                }

                fn field(&self, name: &str) -> Option<FieldValue<'_>> {
                    (**self).field(name)
                }
            }
        )*
    };
}

forward_record!(&T, &mut T, Box<T>, Rc<T>, Arc<T>);

/// Flatten `record` into top-level parameters.
pub fn encode<R: Record + ?Sized>(record: &R) -> Result<Params, EncodeError> {
    encode_with_prefix(record, "")
}

/// Flatten `record` with every key namespaced under `prefix`.
///
/// An empty prefix yields bare field names; otherwise a field `f` is emitted
/// as `prefix[f]`.
pub fn encode_with_prefix<R: Record + ?Sized>(
    record: &R,
    prefix: &str,
) -> Result<Params, EncodeError> {
    let mut params = Params::new();
    flatten(&record, prefix, &mut params)?;
    Ok(params)
}

fn flatten(record: &dyn Record, prefix: &str, out: &mut Params) -> Result<(), EncodeError> {
    let shape = record.shape();
    for descriptor in shape.fields {
        if !descriptor.include {
            continue;
        }

        let name = descriptor.wire_name();
        let key = if prefix.is_empty() {
            name.into_owned()
        } else {
            format!("{prefix}[{name}]")
        };

        let value = record
            .field(descriptor.name)
            .ok_or(EncodeError::UnknownField {
                record: shape.name,
                field: descriptor.name,
            })?;

        match (descriptor.nested, value) {
            (true, FieldValue::Record(inner)) => flatten(inner, &key, out)?,
            (true, other) | (false, other @ FieldValue::Record(_)) => {
                return Err(EncodeError::ShapeMismatch {
                    record: shape.name,
                    field: descriptor.name,
                    expected: if descriptor.nested { "record" } else { "scalar" },
                    found: other.kind(),
                });
            }
            (false, FieldValue::List(_)) => {
                return Err(EncodeError::Unsupported {
                    record: shape.name,
                    field: descriptor.name,
                });
            }
            (false, FieldValue::Str(s)) => emit(out, key, s.to_string(), false)?,
            (false, FieldValue::Int(n)) => emit(out, key, n.to_string(), true)?,
            (false, FieldValue::Float(n)) => emit(out, key, render_float(n), true)?,
            (false, FieldValue::Double(n)) => emit(out, key, render_float(n), true)?,
            (false, FieldValue::Bool(b)) => emit(out, key, b.to_string(), false)?,
        }
    }
    Ok(())
}

/// Shortest round-trip digits, switching to exponent form (`1e+06`,
/// `1.5e-05`) when the decimal exponent is below -4 or at least 6. Non-finite
/// values render as `NaN`, `+Inf` and `-Inf`.
fn render_float<F>(value: F) -> String
where
    F: Copy + Into<f64> + fmt::Display + fmt::LowerExp,
{
    let wide: f64 = value.into();
    if wide.is_nan() {
        return "NaN".to_string();
    }
    if wide.is_infinite() {
        return if wide > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    let scientific = format!("{value:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    match exponent.parse::<i32>() {
        Ok(exp) if !(-4..6).contains(&exp) => {
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.unsigned_abs())
        }
        _ => value.to_string(),
    }
}

/// Insert a rendered scalar unless it reads as "not set".
fn emit(
    out: &mut Params,
    key: String,
    rendered: String,
    numeric: bool,
) -> Result<(), EncodeError> {
    if rendered.is_empty() || (numeric && rendered == "0") {
        return Ok(());
    }
    if out.contains_key(&key) {
        return Err(EncodeError::DuplicateKey(key));
    }
    out.insert(key, rendered);
    Ok(())
}

/// Render parameters as an `application/x-www-form-urlencoded` string.
///
/// Keys are written verbatim so bracketed names stay readable; values are
/// percent-escaped. Empty values are skipped.
pub fn form_encode(params: &Params) -> String {
    params
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| {
            let escaped: String = byte_serialize(value.as_bytes()).collect();
            format!("{key}={escaped}")
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Query-string builder that applies the same "unset" rule as the encoder:
/// zero counts and empty strings are left out.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    params: Params,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(mut self, key: &str, value: u32) -> Self {
        if value > 0 {
            self.params.insert(key.to_string(), value.to_string());
        }
        self
    }

    pub fn text(mut self, key: &str, value: &str) -> Self {
        if !value.is_empty() {
            self.params.insert(key.to_string(), value.to_string());
        }
        self
    }

    pub fn into_params(self) -> Params {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Leaf {
        label: String,
        weight: f32,
        count: i64,
        fragile: bool,
        secret: i64,
    }

    static LEAF_SHAPE: Shape = Shape {
        name: "Leaf",
        fields: &[
            FieldDescriptor::scalar("Label"),
            FieldDescriptor::scalar("weight"),
            FieldDescriptor::scalar("count").renamed("item_count"),
            FieldDescriptor::scalar("fragile"),
            FieldDescriptor::response_only("secret"),
        ],
    };

    impl Record for Leaf {
        fn shape(&self) -> &'static Shape {
            &LEAF_SHAPE
        }

        fn field(&self, name: &str) -> Option<FieldValue<'_>> {
            Some(match name {
                "Label" => FieldValue::Str(&self.label),
                "weight" => FieldValue::Float(self.weight),
                "count" => FieldValue::Int(self.count),
                "fragile" => FieldValue::Bool(self.fragile),
                "secret" => FieldValue::Int(self.secret),
                _ => return None,
            })
        }
    }

    struct Middle {
        leaf: Box<Leaf>,
        hidden: Leaf,
    }

    static MIDDLE_SHAPE: Shape = Shape {
        name: "Middle",
        fields: &[
            FieldDescriptor::nested("leaf"),
            FieldDescriptor {
                include: false,
                ..FieldDescriptor::nested("hidden")
            },
        ],
    };

    impl Record for Middle {
        fn shape(&self) -> &'static Shape {
            &MIDDLE_SHAPE
        }

        fn field(&self, name: &str) -> Option<FieldValue<'_>> {
            Some(match name {
                "leaf" => FieldValue::Record(&self.leaf),
                "hidden" => FieldValue::Record(&self.hidden),
                _ => return None,
            })
        }
    }

    struct Outer {
        middle: Middle,
    }

    static OUTER_SHAPE: Shape = Shape {
        name: "Outer",
        fields: &[FieldDescriptor::nested("middle").renamed("mid")],
    };

    impl Record for Outer {
        fn shape(&self) -> &'static Shape {
            &OUTER_SHAPE
        }

        fn field(&self, name: &str) -> Option<FieldValue<'_>> {
            match name {
                "middle" => Some(FieldValue::Record(&self.middle)),
                _ => None,
            }
        }
    }

    fn leaf() -> Leaf {
        Leaf {
            label: "box".to_string(),
            weight: 2.5,
            count: 3,
            fragile: false,
            secret: 42,
        }
    }

    fn outer() -> Outer {
        Outer {
            middle: Middle {
                leaf: Box::new(leaf()),
                hidden: leaf(),
            },
        }
    }

    #[test]
    fn default_name_is_lowercased_and_rename_wins() {
        let params = encode(&leaf()).unwrap();
        assert_eq!(params.get("label").map(String::as_str), Some("box"));
        assert_eq!(params.get("item_count").map(String::as_str), Some("3"));
        assert!(!params.contains_key("Label"));
        assert!(!params.contains_key("count"));
    }

    #[test]
    fn response_only_fields_are_never_emitted() {
        let params = encode(&leaf()).unwrap();
        assert!(!params.contains_key("secret"));
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn zero_numbers_and_empty_strings_are_omitted() {
        let empty = Leaf {
            label: String::new(),
            weight: 0.0,
            count: 0,
            fragile: false,
            secret: 7,
        };
        let params = encode(&empty).unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("fragile").map(String::as_str), Some("false"));
    }

    #[test]
    fn floats_render_in_shortest_decimal_form() {
        let mut item = leaf();
        item.weight = 10.0;
        assert_eq!(encode(&item).unwrap()["weight"], "10");
        item.weight = 0.1;
        assert_eq!(encode(&item).unwrap()["weight"], "0.1");
        item.weight = 123456.0;
        assert_eq!(encode(&item).unwrap()["weight"], "123456");
    }

    #[test]
    fn large_and_tiny_floats_use_exponent_form() {
        let mut item = leaf();
        item.weight = 1_000_000.0;
        assert_eq!(encode(&item).unwrap()["weight"], "1e+06");
        item.weight = 2_500_000.0;
        assert_eq!(encode(&item).unwrap()["weight"], "2.5e+06");
        item.weight = 0.00001;
        assert_eq!(encode(&item).unwrap()["weight"], "1e-05");
        item.weight = 0.0001;
        assert_eq!(encode(&item).unwrap()["weight"], "0.0001");
    }

    #[test]
    fn float_rendering_edge_cases() {
        assert_eq!(render_float(1e21_f64), "1e+21");
        assert_eq!(render_float(-1.5e-7_f64), "-1.5e-07");
        assert_eq!(render_float(1.0e100_f64), "1e+100");
        assert_eq!(render_float(999_999.0_f32), "999999");
        assert_eq!(render_float(-0.0_f32), "-0");
        assert_eq!(render_float(f32::NAN), "NaN");
        assert_eq!(render_float(f32::INFINITY), "+Inf");
        assert_eq!(render_float(f64::NEG_INFINITY), "-Inf");
    }

    #[test]
    fn nested_keys_chain_brackets_at_every_depth() {
        let params = encode(&outer()).unwrap();
        assert_eq!(params["mid[leaf][label]"], "box");
        assert_eq!(params["mid[leaf][weight]"], "2.5");
        assert_eq!(params["mid[leaf][item_count]"], "3");
        assert!(params.keys().all(|k| !k.contains("hidden")));
    }

    #[test]
    fn excluded_nested_field_is_not_traversed() {
        let params = encode(&outer()).unwrap();
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn prefix_namespaces_top_level_keys() {
        let params = encode_with_prefix(&leaf(), "item").unwrap();
        assert_eq!(params["item[label]"], "box");
        assert!(!params.contains_key("label"));
    }

    #[test]
    fn indirection_is_transparent() {
        let direct = encode(&outer()).unwrap();
        let boxed: Box<Outer> = Box::new(outer());
        let shared = Arc::new(Rc::new(outer()));
        assert_eq!(encode(&boxed).unwrap(), direct);
        assert_eq!(encode(&&&boxed).unwrap(), direct);
        assert_eq!(encode(&shared).unwrap(), direct);
        let dynamic: &dyn Record = &outer();
        assert_eq!(encode(dynamic).unwrap(), direct);
    }

    struct Broken {
        tags: Vec<String>,
        inner: Leaf,
    }

    static UNKNOWN_FIELD_SHAPE: Shape = Shape {
        name: "Broken",
        fields: &[FieldDescriptor::scalar("missing")],
    };

    static SCALAR_AS_NESTED_SHAPE: Shape = Shape {
        name: "Broken",
        fields: &[FieldDescriptor::scalar("inner")],
    };

    static LIST_SHAPE: Shape = Shape {
        name: "Broken",
        fields: &[FieldDescriptor::scalar("tags")],
    };

    static DUPLICATE_SHAPE: Shape = Shape {
        name: "Broken",
        fields: &[
            FieldDescriptor::nested("inner").renamed("x"),
            FieldDescriptor::nested("inner").renamed("x"),
        ],
    };

    struct WithShape<'a>(&'static Shape, &'a Broken);

    impl Record for WithShape<'_> {
        fn shape(&self) -> &'static Shape {
            self.0
        }

        fn field(&self, name: &str) -> Option<FieldValue<'_>> {
            match name {
                "tags" => Some(FieldValue::List(&self.1.tags)),
                "inner" => Some(FieldValue::Record(&self.1.inner)),
                _ => None,
            }
        }
    }

    fn broken() -> Broken {
        Broken {
            tags: vec!["a".to_string()],
            inner: leaf(),
        }
    }

    #[test]
    fn unknown_field_is_a_shape_error() {
        let record = broken();
        let err = encode(&WithShape(&UNKNOWN_FIELD_SHAPE, &record)).unwrap_err();
        assert!(matches!(err, EncodeError::UnknownField { field: "missing", .. }));
    }

    #[test]
    fn record_declared_as_scalar_is_a_shape_error() {
        let record = broken();
        let err = encode(&WithShape(&SCALAR_AS_NESTED_SHAPE, &record)).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::ShapeMismatch {
                expected: "scalar",
                found: "record",
                ..
            }
        ));
    }

    #[test]
    fn included_list_is_unsupported() {
        let record = broken();
        let err = encode(&WithShape(&LIST_SHAPE, &record)).unwrap_err();
        assert!(matches!(err, EncodeError::Unsupported { field: "tags", .. }));
    }

    #[test]
    fn colliding_wire_names_are_rejected() {
        let record = broken();
        let err = encode(&WithShape(&DUPLICATE_SHAPE, &record)).unwrap_err();
        assert!(matches!(err, EncodeError::DuplicateKey(ref key) if key.starts_with("x[")));
    }

    #[test]
    fn form_encode_escapes_values_but_not_keys() {
        let mut params = Params::new();
        params.insert("to[line1]".to_string(), "1 Main St & Co".to_string());
        params.insert("carrier".to_string(), "ups".to_string());
        params.insert("empty".to_string(), String::new());
        assert_eq!(
            form_encode(&params),
            "carrier=ups&to[line1]=1+Main+St+%26+Co"
        );
    }

    #[test]
    fn query_params_drop_unset_values() {
        let params = QueryParams::new()
            .count("limit", 0)
            .text("cursor", "")
            .text("status", "")
            .into_params();
        assert!(params.is_empty());

        let params = QueryParams::new()
            .count("limit", 10)
            .text("cursor", "")
            .text("status", "pending")
            .into_params();
        let expected: Params = [("limit", "10"), ("status", "pending")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(params, expected);
    }
}
