use crate::openapi_builder::{MediaType, Response};
use crate::shape::{Property, ReturnTypeObject};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Return type names of values carrying raw bytes
const BINARY_TYPES: &[&str] = &["Blob", "BunFile", "File"];

/// Return type name of the HTTP response wrapper
const RESPONSE_TYPE: &str = "Response";

const JSON_CONTENT_TYPE: &str = "application/json";
const TEXT_CONTENT_TYPE: &str = "text/plain";
const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

/// OpenAPI Schema definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// The type of the schema (string, number, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format refinement (binary, date-time, regex)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Properties for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Example payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

impl Schema {
    /// A schema with only a `type`.
    pub fn of_type(schema_type: impl Into<String>) -> Self {
        Self {
            schema_type: Some(schema_type.into()),
            ..Default::default()
        }
    }

    fn with_format(schema_type: &str, format: &str) -> Self {
        Self {
            format: Some(format.to_string()),
            ..Self::of_type(schema_type)
        }
    }

    fn object(properties: IndexMap<String, Schema>) -> Self {
        Self {
            properties: Some(properties),
            ..Self::of_type("object")
        }
    }

    fn array(items: Schema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of_type("array")
        }
    }
}

/// Schema generator - converts inferred value shapes to OpenAPI schemas and
/// response maps
#[derive(Debug, Default)]
pub struct SchemaGenerator;

impl SchemaGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate a schema for a value shape. Absent values have none.
    pub fn generate_schema(&self, property: &Property) -> Option<Schema> {
        match property {
            Property::Absent => None,
            Property::String(_) => Some(Schema::of_type("string")),
            Property::Number(_) => Some(Schema::of_type("number")),
            Property::Boolean(_) => Some(Schema::of_type("boolean")),
            Property::Structured(entries) => Some(Schema::object(
                entries
                    .iter()
                    .filter_map(|(key, value)| Some((key.clone(), self.generate_schema(value)?)))
                    .collect(),
            )),
            Property::Sequence(elements) => Some(self.sequence_schema(elements)),
            Property::ReturnType(object) => Some(self.return_type_schema(object)),
        }
    }

    fn return_type_schema(&self, object: &ReturnTypeObject) -> Schema {
        let tag = object.return_type.as_str();

        if is_binary(object) {
            let mut schema = Schema::with_format("string", "binary");
            match object.properties.first() {
                None | Some(Property::Absent) => {}
                Some(Property::Sequence(contents)) if contents.is_empty() => {}
                Some(contents) => schema.example = serde_json::to_value(contents).ok(),
            }
            return schema;
        }
        if tag == "Date" {
            return Schema::with_format("string", "date-time");
        }
        if tag == "RegExp" {
            return Schema::with_format("string", "regex");
        }
        if object.properties.is_empty() {
            return Schema::of_type(tag.to_lowercase());
        }

        debug!(
            "Merging {} positional properties of {}",
            object.properties.len(),
            tag
        );
        Schema::array(Schema::object(self.merged_properties(&object.properties)))
    }

    fn sequence_schema(&self, elements: &[Property]) -> Schema {
        let schemas: Vec<Schema> = elements
            .iter()
            .filter_map(|element| self.generate_schema(element))
            .collect();
        match schemas.first() {
            None => Schema::array(Schema::default()),
            Some(first) if first.properties.is_some() => {
                Schema::array(Schema::object(self.merged_properties(elements)))
            }
            Some(first) => Schema::array(first.clone()),
        }
    }

    /// Union of the object properties of every value, later values winning.
    fn merged_properties(&self, values: &[Property]) -> IndexMap<String, Schema> {
        let mut merged = IndexMap::new();
        for value in values {
            if let Some(Schema {
                properties: Some(properties),
                ..
            }) = self.generate_schema(value)
            {
                merged.extend(properties);
            }
        }
        merged
    }

    /// Build the responses map of a handler from every shape it can return.
    ///
    /// Only response wrappers contribute. Each one is keyed by its `status` (200 when
    /// not given) and described by its `statusText` ("OK" when not given).
    pub fn generate_responses(&self, properties: &[Property]) -> IndexMap<String, Response> {
        let mut responses = IndexMap::new();

        for object in properties.iter().filter_map(Property::as_return_type) {
            if !is_response(object) {
                continue;
            }
            let body = &object.properties[0];
            let init = object.properties.get(1);

            let status = init
                .and_then(|init| entry(init, "status"))
                .and_then(status_code)
                .unwrap_or_else(|| "200".to_string());
            let description = match init.and_then(|init| entry(init, "statusText")) {
                Some(Property::String(text)) => text.clone(),
                _ => "OK".to_string(),
            };
            let content_type = self.determine_content_type(body, init);
            debug!("Response {} ({}) as {}", status, description, content_type);

            let mut content = IndexMap::new();
            content.insert(
                content_type,
                MediaType {
                    schema: self.generate_schema(body),
                },
            );
            responses.insert(
                status,
                Response {
                    description,
                    content: Some(content),
                },
            );
        }

        responses.sort_by(|a, _, b, _| status_order(a).cmp(&status_order(b)));
        responses
    }

    /// Content type of a response body.
    ///
    /// A `content-type` header in the init options wins. Otherwise binary bodies use
    /// their own `type` option or `application/octet-stream`, plain strings are text
    /// and everything else is JSON.
    pub fn determine_content_type(&self, body: &Property, init: Option<&Property>) -> String {
        if let Some(content_type) = init.and_then(header_content_type) {
            return content_type;
        }

        match body {
            Property::String(_) => TEXT_CONTENT_TYPE.to_string(),
            Property::ReturnType(object) if is_binary(object) => object
                .properties
                .get(1)
                .and_then(|options| entry(options, "type"))
                .and_then(|value| match value {
                    Property::String(content_type) => Some(content_type.clone()),
                    _ => None,
                })
                .unwrap_or_else(|| BINARY_CONTENT_TYPE.to_string()),
            _ => JSON_CONTENT_TYPE.to_string(),
        }
    }
}

fn is_binary(object: &ReturnTypeObject) -> bool {
    BINARY_TYPES.contains(&object.return_type.as_str())
}

fn is_response(object: &ReturnTypeObject) -> bool {
    object.return_type == RESPONSE_TYPE && !object.properties.is_empty()
}

/// Case-insensitive lookup of a key in a structured value.
fn entry<'p>(property: &'p Property, key: &str) -> Option<&'p Property> {
    match property {
        Property::Structured(entries) => entries
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value),
        _ => None,
    }
}

/// `headers['content-type']` of response init options, given as an object literal,
/// a list of pairs or a `new Headers(...)` construction.
fn header_content_type(init: &Property) -> Option<String> {
    let headers = entry(init, "headers")?;
    let headers = match headers {
        Property::ReturnType(object) if object.return_type == "Headers" => {
            object.properties.first()?
        }
        other => other,
    };

    let value = match headers {
        Property::Structured(_) => entry(headers, "content-type"),
        Property::Sequence(pairs) => pairs.iter().find_map(|pair| match pair {
            Property::Sequence(kv) => match kv.as_slice() {
                [Property::String(name), value] if name.eq_ignore_ascii_case("content-type") => {
                    Some(value)
                }
                _ => None,
            },
            _ => None,
        }),
        _ => None,
    }?;

    match value {
        Property::String(content_type) => Some(content_type.clone()),
        _ => None,
    }
}

fn status_code(status: &Property) -> Option<String> {
    match status {
        Property::Number(n) if n.fract() == 0.0 && *n >= 0.0 => Some(format!("{}", *n as u64)),
        _ => None,
    }
}

fn status_order(status: &str) -> (u64, String) {
    (status.parse().unwrap_or(u64::MAX), status.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn structured(entries: Vec<(&str, Property)>) -> Property {
        Property::Structured(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    fn string(value: &str) -> Property {
        Property::String(value.to_string())
    }

    fn response(properties: Vec<Property>) -> Property {
        Property::ReturnType(ReturnTypeObject::new("Response", properties))
    }

    fn schema_json(property: &Property) -> Value {
        serde_json::to_value(SchemaGenerator::new().generate_schema(property)).unwrap()
    }

    #[test]
    fn test_primitive_schemas() {
        assert_eq!(schema_json(&string("a")), json!({"type": "string"}));
        assert_eq!(schema_json(&Property::Number(1.0)), json!({"type": "number"}));
        assert_eq!(schema_json(&Property::Boolean(true)), json!({"type": "boolean"}));
        assert_eq!(schema_json(&Property::Absent), Value::Null);
    }

    #[test]
    fn test_nested_object_schema() {
        let body = structured(vec![
            ("message", string("Hello, World!")),
            ("random", Property::Number(0.5)),
            (
                "nested",
                structured(vec![("key", string("value")), ("num", Property::Number(32.0))]),
            ),
            ("missing", Property::Absent),
        ]);

        assert_eq!(
            schema_json(&body),
            json!({
                "type": "object",
                "properties": {
                    "message": {"type": "string"},
                    "random": {"type": "number"},
                    "nested": {
                        "type": "object",
                        "properties": {"key": {"type": "string"}, "num": {"type": "number"}}
                    }
                }
            })
        );
    }

    #[test]
    fn test_binary_schema_with_example() {
        let blob = Property::ReturnType(ReturnTypeObject::new(
            "Blob",
            vec![Property::Sequence(vec![string("hello")])],
        ));
        let empty = Property::ReturnType(ReturnTypeObject::new("BunFile", vec![]));

        assert_eq!(
            schema_json(&blob),
            json!({"type": "string", "format": "binary", "example": ["hello"]})
        );
        assert_eq!(schema_json(&empty), json!({"type": "string", "format": "binary"}));
    }

    #[test]
    fn test_named_return_types() {
        let date = Property::ReturnType(ReturnTypeObject::new("Date", vec![string("2024")]));
        let regex = Property::ReturnType(ReturnTypeObject::new("RegExp", vec![]));
        let number = Property::ReturnType(ReturnTypeObject::new("Number", vec![]));
        let wrapped = Property::ReturnType(ReturnTypeObject::new(
            "Envelope",
            vec![
                structured(vec![("id", Property::Number(1.0))]),
                structured(vec![("name", string("n"))]),
            ],
        ));

        assert_eq!(schema_json(&date), json!({"type": "string", "format": "date-time"}));
        assert_eq!(schema_json(&regex), json!({"type": "string", "format": "regex"}));
        assert_eq!(schema_json(&number), json!({"type": "number"}));
        assert_eq!(
            schema_json(&wrapped),
            json!({
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {"id": {"type": "number"}, "name": {"type": "string"}}
                }
            })
        );
    }

    #[test]
    fn test_sequence_schemas() {
        let empty = Property::Sequence(vec![]);
        let numbers = Property::Sequence(vec![Property::Number(1.0), Property::Number(2.0)]);
        let objects = Property::Sequence(vec![
            structured(vec![("a", string("x"))]),
            structured(vec![("b", Property::Boolean(false))]),
        ]);

        assert_eq!(schema_json(&empty), json!({"type": "array", "items": {}}));
        assert_eq!(
            schema_json(&numbers),
            json!({"type": "array", "items": {"type": "number"}})
        );
        assert_eq!(
            schema_json(&objects),
            json!({
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {"a": {"type": "string"}, "b": {"type": "boolean"}}
                }
            })
        );
    }

    #[test]
    fn test_content_type_detection() {
        let generator = SchemaGenerator::new();
        let blob = Property::ReturnType(ReturnTypeObject::new("Blob", vec![]));
        let typed_blob = Property::ReturnType(ReturnTypeObject::new(
            "Blob",
            vec![
                Property::Sequence(vec![]),
                structured(vec![("type", string("image/png"))]),
            ],
        ));
        let html = structured(vec![(
            "headers",
            structured(vec![("Content-Type", string("text/html"))]),
        )]);
        let headers_object = structured(vec![(
            "headers",
            Property::ReturnType(ReturnTypeObject::new(
                "Headers",
                vec![structured(vec![("content-type", string("text/csv"))])],
            )),
        )]);

        assert_eq!(generator.determine_content_type(&blob, None), "application/octet-stream");
        assert_eq!(generator.determine_content_type(&typed_blob, None), "image/png");
        assert_eq!(generator.determine_content_type(&string("hi"), None), "text/plain");
        assert_eq!(
            generator.determine_content_type(&structured(vec![]), None),
            "application/json"
        );
        assert_eq!(generator.determine_content_type(&blob, Some(&html)), "text/html");
        assert_eq!(
            generator.determine_content_type(&string("a,b"), Some(&headers_object)),
            "text/csv"
        );
    }

    #[test]
    fn test_responses_keyed_by_status() {
        let generator = SchemaGenerator::new();
        let shapes = vec![
            response(vec![
                structured(vec![("id", Property::Number(1.0))]),
                structured(vec![
                    ("status", Property::Number(201.0)),
                    ("statusText", string("Created")),
                ]),
            ]),
            response(vec![structured(vec![("ok", Property::Boolean(true))])]),
            Property::ReturnType(ReturnTypeObject::new("string", vec![])),
            response(vec![]),
        ];

        let responses = generator.generate_responses(&shapes);

        assert_eq!(
            serde_json::to_value(&responses).unwrap(),
            json!({
                "200": {
                    "description": "OK",
                    "content": {"application/json": {"schema": {
                        "type": "object",
                        "properties": {"ok": {"type": "boolean"}}
                    }}}
                },
                "201": {
                    "description": "Created",
                    "content": {"application/json": {"schema": {
                        "type": "object",
                        "properties": {"id": {"type": "number"}}
                    }}}
                }
            })
        );
        assert_eq!(responses.keys().collect::<Vec<_>>(), vec!["200", "201"]);
    }

    #[test]
    fn test_binary_response_defaults_to_octet_stream() {
        let generator = SchemaGenerator::new();
        let shapes = vec![response(vec![Property::ReturnType(ReturnTypeObject::new(
            "BunFile",
            vec![string("./logo.png")],
        ))])];

        let responses = generator.generate_responses(&shapes);
        let content = responses["200"].content.as_ref().unwrap();

        assert_eq!(
            content["application/octet-stream"].schema,
            Some(Schema {
                example: Some(json!("./logo.png")),
                ..Schema::with_format("string", "binary")
            })
        );
    }
}
