//! Schema-constrained tool callbacks.
//!
//! A tool is a deterministic, synchronous, side-effect-free function the
//! model may invoke mid-reasoning. Arguments and results are validated
//! against the tool's own schemas, so a misbehaving model cannot push an
//! unchecked value through the callback seam. The handler is a plain
//! function pointer: the locality lookup below is a local table, but a
//! real reverse-geocoding service can be swapped in without touching the
//! flow contract.

use serde_json::{json, Value};

use crate::backend::{ToolDefinition, ToolFunction};
use crate::error::SchemaViolation;
use crate::schema::{FieldKind, FieldSpec, Schema};

/// A callable tool: name, schemas, and the registered handler.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Schema,
    pub output_schema: Schema,
    pub handler: fn(&Value) -> Value,
}

impl ToolSpec {
    /// Wire declaration sent to the model alongside the request.
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            kind: "function".to_string(),
            function: ToolFunction {
                name: self.name.to_string(),
                description: self.description.to_string(),
                parameters: schema_to_parameters(&self.input_schema),
            },
        }
    }

    /// Validate arguments, run the handler, validate its result.
    pub fn call(&self, arguments: &Value) -> Result<Value, SchemaViolation> {
        let narrowed = self.input_schema.validate(arguments)?;
        let result = (self.handler)(&narrowed);
        self.output_schema.validate(&result)
    }
}

/// Render a schema as JSON-schema style tool parameters.
fn schema_to_parameters(schema: &Schema) -> Value {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();
    for field in &schema.fields {
        properties.insert(field.name.to_string(), kind_to_parameter(field));
        if !matches!(field.kind, FieldKind::Optional(_)) {
            required.push(Value::String(field.name.to_string()));
        }
    }
    json!({
        "type": "object",
        "properties": Value::Object(properties),
        "required": Value::Array(required),
    })
}

fn kind_to_parameter(field: &FieldSpec) -> Value {
    let mut parameter = kind_to_type(&field.kind);
    if let Some(map) = parameter.as_object_mut() {
        map.insert(
            "description".to_string(),
            Value::String(field.description.to_string()),
        );
    }
    parameter
}

fn kind_to_type(kind: &FieldKind) -> Value {
    match kind {
        FieldKind::Text | FieldKind::ImageDataUri => json!({ "type": "string" }),
        FieldKind::Number => json!({ "type": "number" }),
        FieldKind::Bool => json!({ "type": "boolean" }),
        FieldKind::Enum(allowed) => json!({ "type": "string", "enum": allowed }),
        FieldKind::Array(element) => json!({ "type": "array", "items": kind_to_type(element) }),
        FieldKind::Optional(inner) => kind_to_type(inner),
    }
}

/// Declared locality bounding boxes for the pickup-area lookup.
/// First match wins; anything outside every box falls back to the
/// default below.
struct LocalityBox {
    locality: &'static str,
    city: &'static str,
    lat: (f64, f64),
    lon: (f64, f64),
}

const LOCALITY_BOXES: &[LocalityBox] = &[
    LocalityBox {
        locality: "Hinjawadi",
        city: "Pune",
        lat: (18.55, 18.65),
        lon: (73.70, 73.85),
    },
    LocalityBox {
        locality: "Kothrud",
        city: "Pune",
        lat: (18.49, 18.53),
        lon: (73.78, 73.84),
    },
    LocalityBox {
        locality: "Viman Nagar",
        city: "Pune",
        lat: (18.55, 18.59),
        lon: (73.89, 73.93),
    },
];

const DEFAULT_LOCALITY: (&str, &str) = ("Deccan Gymkhana", "Pune");

/// Deterministic locality lookup over the declared bounding boxes.
pub fn lookup_locality(arguments: &Value) -> Value {
    let latitude = arguments.get("latitude").and_then(|v| v.as_f64());
    let longitude = arguments.get("longitude").and_then(|v| v.as_f64());

    let (locality, city) = match (latitude, longitude) {
        (Some(lat), Some(lon)) => LOCALITY_BOXES
            .iter()
            .find(|b| lat >= b.lat.0 && lat <= b.lat.1 && lon >= b.lon.0 && lon <= b.lon.1)
            .map(|b| (b.locality, b.city))
            .unwrap_or(DEFAULT_LOCALITY),
        _ => DEFAULT_LOCALITY,
    };

    json!({ "locality": locality, "city": city })
}

/// The locality tool with its schemas and registered handler.
pub fn locality_tool() -> ToolSpec {
    ToolSpec {
        name: "lookup_locality",
        description: "Resolve geographic coordinates to the marketplace locality and city.",
        input_schema: Schema::new(vec![
            FieldSpec::new("latitude", FieldKind::Number, "latitude in decimal degrees"),
            FieldSpec::new("longitude", FieldKind::Number, "longitude in decimal degrees"),
        ]),
        output_schema: Schema::new(vec![
            FieldSpec::new("locality", FieldKind::Text, "neighbourhood name"),
            FieldSpec::new("city", FieldKind::Text, "city name"),
        ]),
        handler: lookup_locality,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hinjawadi_coordinates() {
        let result = lookup_locality(&json!({ "latitude": 18.58, "longitude": 73.80 }));
        assert_eq!(result["locality"], "Hinjawadi");
        assert_eq!(result["city"], "Pune");
    }

    #[test]
    fn test_kothrud_coordinates() {
        let result = lookup_locality(&json!({ "latitude": 18.515, "longitude": 73.82 }));
        assert_eq!(result["locality"], "Kothrud");
        assert_eq!(result["city"], "Pune");
    }

    #[test]
    fn test_unmatched_coordinates_fall_back_to_default() {
        let result = lookup_locality(&json!({ "latitude": 19.07, "longitude": 72.87 }));
        assert_eq!(result["locality"], "Deccan Gymkhana");
        assert_eq!(result["city"], "Pune");
    }

    #[test]
    fn test_tool_call_validates_arguments() {
        let tool = locality_tool();
        let err = tool.call(&json!({ "latitude": "18.58" })).unwrap_err();
        assert_eq!(err.field, "latitude");

        let ok = tool
            .call(&json!({ "latitude": 18.58, "longitude": 73.80 }))
            .unwrap();
        assert_eq!(ok["locality"], "Hinjawadi");
    }

    #[test]
    fn test_tool_definition_lists_required_parameters() {
        let definition = locality_tool().definition();
        assert_eq!(definition.kind, "function");
        let required = definition.function.parameters["required"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        assert_eq!(required.len(), 2);
    }
}
