//! Schema descriptors and the generic validator.
//!
//! One closed set of field-kind variants is interpreted by a single
//! validator at both boundaries: caller input before a prompt is
//! rendered, and untrusted model JSON after the call. The model is
//! treated exactly like user input - validation fails closed, never
//! coerces, never substitutes defaults.

use serde_json::{Map, Value};

use crate::error::SchemaViolation;

/// Primitive kind of a schema field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Free-form text.
    Text,
    /// Text that must begin with the `data:image/` URI prefix.
    ImageDataUri,
    /// JSON number (integer or float).
    Number,
    Bool,
    /// String restricted to a closed set of values.
    Enum(&'static [&'static str]),
    /// Homogeneous array of the element kind.
    Array(Box<FieldKind>),
    /// Field may be absent or null; when present it must match the
    /// inner kind.
    Optional(Box<FieldKind>),
}

/// One declared field: name, kind, and human-readable intent.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: &'static str,
}

impl FieldSpec {
    pub fn new(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
        }
    }
}

/// Declared shape of an object flowing into or out of a flow.
#[derive(Debug, Clone)]
pub struct Schema {
    pub fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Validate `candidate` against this schema.
    ///
    /// Returns the value narrowed to the declared fields, or the first
    /// violation found. Undeclared fields are dropped, not rejected:
    /// models routinely append extra keys and callers must never observe
    /// them.
    pub fn validate(&self, candidate: &Value) -> Result<Value, SchemaViolation> {
        let obj = candidate
            .as_object()
            .ok_or_else(|| SchemaViolation::new("$", "expected a JSON object"))?;

        let mut narrowed = Map::new();
        for field in &self.fields {
            match obj.get(field.name) {
                None => {
                    if !matches!(field.kind, FieldKind::Optional(_)) {
                        return Err(SchemaViolation::new(field.name, "missing required field"));
                    }
                }
                Some(Value::Null) => {
                    // Models emit explicit nulls for optionals; treat as absent.
                    if !matches!(field.kind, FieldKind::Optional(_)) {
                        return Err(SchemaViolation::new(field.name, "field is null"));
                    }
                }
                Some(value) => {
                    validate_kind(field.name, &field.kind, value)?;
                    narrowed.insert(field.name.to_string(), value.clone());
                }
            }
        }
        Ok(Value::Object(narrowed))
    }
}

/// Shape of a flow's output: a plain object, or a tagged union resolved
/// by an explicit discriminant field - never by shape sniffing.
#[derive(Debug, Clone)]
pub enum OutputShape {
    Object(Schema),
    Tagged {
        /// Name of the discriminant field, e.g. `kind`.
        tag: &'static str,
        variants: Vec<(&'static str, Schema)>,
    },
}

impl OutputShape {
    /// Validate untrusted model JSON against the declared shape.
    pub fn validate(&self, candidate: &Value) -> Result<Value, SchemaViolation> {
        match self {
            OutputShape::Object(schema) => schema.validate(candidate),
            OutputShape::Tagged { tag, variants } => {
                let obj = candidate
                    .as_object()
                    .ok_or_else(|| SchemaViolation::new("$", "expected a JSON object"))?;
                let tag_value = obj
                    .get(*tag)
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| SchemaViolation::new(*tag, "missing discriminant field"))?;
                let (_, schema) = variants
                    .iter()
                    .find(|(name, _)| *name == tag_value)
                    .ok_or_else(|| {
                        SchemaViolation::new(*tag, format!("unknown variant '{}'", tag_value))
                    })?;
                let mut narrowed = schema.validate(candidate)?;
                if let Some(map) = narrowed.as_object_mut() {
                    map.insert((*tag).to_string(), Value::String(tag_value.to_string()));
                }
                Ok(narrowed)
            }
        }
    }
}

fn validate_kind(path: &str, kind: &FieldKind, value: &Value) -> Result<(), SchemaViolation> {
    match kind {
        FieldKind::Text => {
            if !value.is_string() {
                return Err(SchemaViolation::new(path, "expected a string"));
            }
        }
        FieldKind::ImageDataUri => {
            let s = value
                .as_str()
                .ok_or_else(|| SchemaViolation::new(path, "expected a string"))?;
            if !s.starts_with("data:image/") {
                return Err(SchemaViolation::new(
                    path,
                    "expected a 'data:image/' data URI",
                ));
            }
        }
        FieldKind::Number => {
            if value.as_f64().is_none() {
                return Err(SchemaViolation::new(path, "expected a number"));
            }
        }
        FieldKind::Bool => {
            if !value.is_boolean() {
                return Err(SchemaViolation::new(path, "expected a boolean"));
            }
        }
        FieldKind::Enum(allowed) => {
            let s = value
                .as_str()
                .ok_or_else(|| SchemaViolation::new(path, "expected a string"))?;
            if !allowed.contains(&s) {
                return Err(SchemaViolation::new(
                    path,
                    format!("'{}' is not one of {}", s, allowed.join(", ")),
                ));
            }
        }
        FieldKind::Array(element) => {
            let items = value
                .as_array()
                .ok_or_else(|| SchemaViolation::new(path, "expected an array"))?;
            for (i, item) in items.iter().enumerate() {
                validate_kind(&format!("{}[{}]", path, i), element, item)?;
            }
        }
        FieldKind::Optional(inner) => {
            validate_kind(path, inner, value)?;
        }
    }
    Ok(())
}
