//! Raw schema fragments.
//!
//! A [`SchemaNode`] is a schema as written in the document: `$ref` edges are
//! kept as [`SchemaKind::Reference`] strings. Parsing never fails; shapes the
//! compiler declines to model are recorded as [`SchemaKind::Unsupported`] so
//! the error can be raised with full context during compilation.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::pointer::SourcePointer;

/// A raw schema fragment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaNode {
    /// Where the fragment lives, for diagnostics.
    pub pointer: SourcePointer,
    pub kind: SchemaKind,
    pub constraints: Constraints,
    pub extensions: Extensions,
    pub meta: SchemaMeta,
}

/// Structural kind of a schema fragment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaKind {
    /// No type information at all (an open value).
    Any,
    Primitive {
        ty: PrimitiveType,
        format: Option<String>,
    },
    Array {
        items: ArrayItems,
    },
    Object(ObjectSchema),
    Composed(Composition),
    /// An unresolved `$ref`.
    Reference { reference: String },
    /// A shape this engine does not model; the reason is reported at compile time.
    Unsupported { reason: String },
}

/// JSON Schema primitive type names (plus Swagger 2.0 `file`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Integer,
    Number,
    Boolean,
    File,
}

impl PrimitiveType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "file" => Some(Self::File),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::File => "file",
        }
    }
}

/// The `items` of an array schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayItems {
    /// `items` absent: elements are open values.
    Unspecified,
    /// One schema for every element.
    Single(Box<SchemaNode>),
    /// A fixed-length ordered list of schemas (`items: [...]`).
    Tuple {
        items: Vec<SchemaNode>,
        additional: Option<Box<SchemaNode>>,
    },
}

/// An object schema: ordered properties plus required list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectSchema {
    /// Properties in document order.
    pub properties: Vec<(String, SchemaNode)>,
    pub required: Vec<String>,
    pub additional: AdditionalProperties,
    pub discriminator: Option<Discriminator>,
}

/// `additionalProperties`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdditionalProperties {
    Unspecified,
    Allowed(bool),
    Schema(Box<SchemaNode>),
}

/// Discriminator hint (Swagger 2.0 string form or OpenAPI 3 object form).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discriminator {
    pub property_name: String,
    /// Explicit `mapping` table, in document order.
    pub mapping: Vec<(String, String)>,
}

/// `allOf` / `oneOf` / `anyOf`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Composition {
    pub all_of: Vec<SchemaNode>,
    pub one_of: Vec<SchemaNode>,
    pub any_of: Vec<SchemaNode>,
    /// Discriminator declared next to `oneOf`/`anyOf`.
    pub discriminator: Option<Discriminator>,
}

/// Validation constraints.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Constraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "is_false")]
    pub exclusive_minimum: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub exclusive_maximum: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(skip_serializing_if = "is_false")]
    pub unique_items: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn parse(obj: &Map<String, Value>) -> Self {
        let float = |key: &str| obj.get(key).and_then(Value::as_f64);
        let uint = |key: &str| obj.get(key).and_then(Value::as_u64);

        let mut constraints = Self {
            minimum: float("minimum"),
            maximum: float("maximum"),
            multiple_of: float("multipleOf"),
            min_length: uint("minLength"),
            max_length: uint("maxLength"),
            pattern: obj
                .get("pattern")
                .and_then(Value::as_str)
                .map(str::to_string),
            min_items: uint("minItems"),
            max_items: uint("maxItems"),
            unique_items: obj
                .get("uniqueItems")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            min_properties: uint("minProperties"),
            max_properties: uint("maxProperties"),
            enum_values: obj
                .get("enum")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            ..Self::default()
        };

        // Boolean form (Swagger 2.0 / OAS 3.0) or numeric form (OAS 3.1).
        match obj.get("exclusiveMinimum") {
            Some(Value::Bool(b)) => constraints.exclusive_minimum = *b,
            Some(v) if v.is_number() => {
                constraints.minimum = v.as_f64();
                constraints.exclusive_minimum = true;
            }
            _ => {}
        }
        match obj.get("exclusiveMaximum") {
            Some(Value::Bool(b)) => constraints.exclusive_maximum = *b,
            Some(v) if v.is_number() => {
                constraints.maximum = v.as_f64();
                constraints.exclusive_maximum = true;
            }
            _ => {}
        }
        constraints
    }
}

/// Annotations that do not change the shape of a schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "is_false")]
    pub read_only: bool,
    /// OpenAPI 3 `nullable: true`, or `"null"` listed in `type`.
    #[serde(skip_serializing_if = "is_false")]
    pub nullable: bool,
}

impl SchemaMeta {
    fn parse(obj: &Map<String, Value>) -> Self {
        let string = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            title: string("title"),
            description: string("description"),
            default: obj.get("default").cloned(),
            example: obj.get("example").cloned(),
            read_only: obj
                .get("readOnly")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            nullable: obj
                .get("nullable")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }
}

/// Extension keys this system interprets. Everything else in the bag is
/// preserved but never read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    Nullable,
    IsNullable,
    OmitEmpty,
    Order,
    GoName,
    GoType,
    ExternalType,
    DiscriminatorValue,
}

impl Extension {
    pub const ALL: [Extension; 8] = [
        Extension::Nullable,
        Extension::IsNullable,
        Extension::OmitEmpty,
        Extension::Order,
        Extension::GoName,
        Extension::GoType,
        Extension::ExternalType,
        Extension::DiscriminatorValue,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Extension::Nullable => "x-nullable",
            Extension::IsNullable => "x-isnullable",
            Extension::OmitEmpty => "x-omitempty",
            Extension::Order => "x-order",
            Extension::GoName => "x-go-name",
            Extension::GoType => "x-go-type",
            Extension::ExternalType => "x-external-type",
            Extension::DiscriminatorValue => "x-discriminator-value",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ext| ext.key() == key)
    }
}

/// The free-form `x-*` extension bag of a schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Extensions(BTreeMap<String, Value>);

impl Extensions {
    /// Collect every `x-*` key of an object.
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        Self(
            obj.iter()
                .filter(|(k, _)| k.starts_with("x-"))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, ext: Extension) -> Option<&Value> {
        self.0.get(ext.key())
    }

    pub fn bool(&self, ext: Extension) -> Option<bool> {
        self.get(ext).and_then(Value::as_bool)
    }

    pub fn str(&self, ext: Extension) -> Option<&str> {
        self.get(ext).and_then(Value::as_str)
    }

    pub fn i64(&self, ext: Extension) -> Option<i64> {
        self.get(ext).and_then(Value::as_i64)
    }

    /// Whether any recognized key is present.
    pub fn has_recognized(&self) -> bool {
        self.0.keys().any(|k| Extension::from_key(k).is_some())
    }

    /// Keys nobody interprets, in key order.
    pub fn unrecognized(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0
            .iter()
            .filter(|(k, _)| Extension::from_key(k).is_none())
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Entries of `self` win over entries of `other`.
    pub fn overlay(&self, other: &Extensions) -> Extensions {
        let mut merged = other.0.clone();
        merged.extend(self.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        Extensions(merged)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }
}

impl SchemaNode {
    /// Parse a schema fragment located at `pointer`.
    pub fn parse(value: &Value, pointer: SourcePointer) -> Self {
        let obj = match value {
            Value::Object(obj) => obj,
            Value::Bool(true) => return Self::with_kind(pointer, SchemaKind::Any),
            other => {
                return Self::with_kind(
                    pointer,
                    SchemaKind::Unsupported {
                        reason: format!("schema must be an object, found {}", type_name(other)),
                    },
                )
            }
        };

        let extensions = Extensions::from_object(obj);
        let mut meta = SchemaMeta::parse(obj);

        if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
            // Siblings of `$ref` are ignored, except annotations and extensions.
            return Self {
                pointer,
                kind: SchemaKind::Reference {
                    reference: reference.to_string(),
                },
                constraints: Constraints::default(),
                extensions,
                meta: SchemaMeta {
                    title: meta.title,
                    description: meta.description,
                    nullable: meta.nullable,
                    ..SchemaMeta::default()
                },
            };
        }

        let constraints = Constraints::parse(obj);

        let (types, null_listed) = parse_types(obj);
        meta.nullable |= null_listed;

        let kind = if has_composition(obj) {
            SchemaKind::Composed(parse_composition(obj, &pointer))
        } else if types.len() > 1 {
            SchemaKind::Unsupported {
                reason: format!("multiple types are not supported: {}", types.join(", ")),
            }
        } else {
            match types.first().map(String::as_str) {
                Some("object") => SchemaKind::Object(parse_object(obj, &pointer)),
                Some("array") => SchemaKind::Array {
                    items: parse_items(obj, &pointer),
                },
                Some(other) => match PrimitiveType::parse(other) {
                    Some(ty) => SchemaKind::Primitive {
                        ty,
                        format: obj
                            .get("format")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                    },
                    None => SchemaKind::Unsupported {
                        reason: format!("unknown type '{}'", other),
                    },
                },
                None if obj.contains_key("properties")
                    || obj.contains_key("additionalProperties") =>
                {
                    SchemaKind::Object(parse_object(obj, &pointer))
                }
                None if obj.contains_key("items") => SchemaKind::Array {
                    items: parse_items(obj, &pointer),
                },
                None => SchemaKind::Any,
            }
        };

        Self {
            pointer,
            kind,
            constraints,
            extensions,
            meta,
        }
    }

    fn with_kind(pointer: SourcePointer, kind: SchemaKind) -> Self {
        Self {
            pointer,
            kind,
            constraints: Constraints::default(),
            extensions: Extensions::default(),
            meta: SchemaMeta::default(),
        }
    }

    /// Whether this node carries no type information, only annotations.
    pub fn is_pass_through(&self) -> bool {
        matches!(self.kind, SchemaKind::Any) && self.constraints.is_empty()
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Returns the declared types with `"null"` removed, and whether `"null"` was listed.
fn parse_types(obj: &Map<String, Value>) -> (Vec<String>, bool) {
    let raw: Vec<String> = match obj.get("type") {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };
    let null_listed = raw.iter().any(|t| t == "null");
    let types = raw.into_iter().filter(|t| t != "null").collect();
    (types, null_listed)
}

fn has_composition(obj: &Map<String, Value>) -> bool {
    ["allOf", "oneOf", "anyOf"]
        .iter()
        .any(|k| obj.get(*k).and_then(Value::as_array).is_some())
}

fn parse_list(obj: &Map<String, Value>, key: &str, pointer: &SourcePointer) -> Vec<SchemaNode> {
    let base = pointer.child(key);
    obj.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .enumerate()
                .map(|(i, v)| SchemaNode::parse(v, base.index(i)))
                .collect()
        })
        .unwrap_or_default()
}

fn parse_composition(obj: &Map<String, Value>, pointer: &SourcePointer) -> Composition {
    let mut all_of = parse_list(obj, "allOf", pointer);
    let one_of = parse_list(obj, "oneOf", pointer);
    let any_of = parse_list(obj, "anyOf", pointer);
    let mut discriminator = parse_discriminator(obj);

    // Own properties of a composed node form one more trailing allOf branch.
    let has_own_object = obj.contains_key("properties")
        || obj.contains_key("required")
        || obj.contains_key("additionalProperties");
    if has_own_object {
        let mut own = parse_object(obj, pointer);
        if one_of.is_empty() && any_of.is_empty() {
            own.discriminator = discriminator.take();
        } else {
            own.discriminator = None;
        }
        all_of.push(SchemaNode {
            pointer: pointer.clone(),
            kind: SchemaKind::Object(own),
            constraints: Constraints::default(),
            extensions: Extensions::default(),
            meta: SchemaMeta::default(),
        });
    }

    Composition {
        all_of,
        one_of,
        any_of,
        discriminator,
    }
}

fn parse_object(obj: &Map<String, Value>, pointer: &SourcePointer) -> ObjectSchema {
    let props_pointer = pointer.child("properties");
    let properties = obj
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, v)| (name.clone(), SchemaNode::parse(v, props_pointer.child(name))))
                .collect()
        })
        .unwrap_or_default();

    let required = obj
        .get("required")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let additional = match obj.get("additionalProperties") {
        None => AdditionalProperties::Unspecified,
        Some(Value::Bool(b)) => AdditionalProperties::Allowed(*b),
        Some(v) => AdditionalProperties::Schema(Box::new(SchemaNode::parse(
            v,
            pointer.child("additionalProperties"),
        ))),
    };

    ObjectSchema {
        properties,
        required,
        additional,
        discriminator: parse_discriminator(obj),
    }
}

fn parse_items(obj: &Map<String, Value>, pointer: &SourcePointer) -> ArrayItems {
    match obj.get("items") {
        None => ArrayItems::Unspecified,
        Some(Value::Array(items)) => {
            let base = pointer.child("items");
            let additional = obj
                .get("additionalItems")
                .filter(|v| v.is_object())
                .map(|v| Box::new(SchemaNode::parse(v, pointer.child("additionalItems"))));
            ArrayItems::Tuple {
                items: items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| SchemaNode::parse(v, base.index(i)))
                    .collect(),
                additional,
            }
        }
        Some(v) => ArrayItems::Single(Box::new(SchemaNode::parse(v, pointer.child("items")))),
    }
}

fn parse_discriminator(obj: &Map<String, Value>) -> Option<Discriminator> {
    match obj.get("discriminator")? {
        Value::String(name) => Some(Discriminator {
            property_name: name.clone(),
            mapping: Vec::new(),
        }),
        Value::Object(d) => {
            let property_name = d.get("propertyName")?.as_str()?.to_string();
            let mapping = d
                .get("mapping")
                .and_then(Value::as_object)
                .map(|m| {
                    m.iter()
                        .filter_map(|(k, v)| Some((k.clone(), v.as_str()?.to_string())))
                        .collect()
                })
                .unwrap_or_default();
            Some(Discriminator {
                property_name,
                mapping,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> SchemaNode {
        SchemaNode::parse(&value, SourcePointer::new("spec.yaml", "/definitions/T"))
    }

    #[test]
    fn parse_object_keeps_property_order() {
        let node = parse(json!({
            "type": "object",
            "required": ["zeta"],
            "properties": {
                "zeta": { "type": "string" },
                "alpha": { "type": "integer", "format": "int64" }
            }
        }));
        let SchemaKind::Object(obj) = &node.kind else {
            panic!("expected object, got {:?}", node.kind);
        };
        let names: Vec<&str> = obj.properties.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(obj.required, vec!["zeta".to_string()]);
        assert_eq!(
            obj.properties[1].1.pointer.pointer,
            "/definitions/T/properties/alpha"
        );
        assert_eq!(
            obj.properties[1].1.kind,
            SchemaKind::Primitive {
                ty: PrimitiveType::Integer,
                format: Some("int64".into())
            }
        );
    }

    #[test]
    fn parse_reference_ignores_constraint_siblings() {
        let node = parse(json!({
            "$ref": "#/definitions/Pet",
            "maxLength": 3,
            "description": "the pet",
            "x-nullable": true
        }));
        assert_eq!(
            node.kind,
            SchemaKind::Reference {
                reference: "#/definitions/Pet".into()
            }
        );
        assert!(node.constraints.is_empty());
        assert_eq!(node.meta.description.as_deref(), Some("the pet"));
        assert_eq!(node.extensions.bool(Extension::Nullable), Some(true));
    }

    #[test]
    fn parse_tuple_items() {
        let node = parse(json!({
            "type": "array",
            "items": [ { "type": "string" }, { "type": "integer" } ],
            "additionalItems": { "type": "boolean" }
        }));
        let SchemaKind::Array {
            items: ArrayItems::Tuple { items, additional },
        } = &node.kind
        else {
            panic!("expected tuple");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].pointer.pointer, "/definitions/T/items/1");
        assert!(additional.is_some());
    }

    #[test]
    fn composed_node_appends_own_properties_as_branch() {
        let node = parse(json!({
            "allOf": [ { "$ref": "#/definitions/Animal" } ],
            "properties": { "bark": { "type": "boolean" } }
        }));
        let SchemaKind::Composed(comp) = &node.kind else {
            panic!("expected composition");
        };
        assert_eq!(comp.all_of.len(), 2);
        assert!(matches!(comp.all_of[1].kind, SchemaKind::Object(_)));
    }

    #[test]
    fn discriminator_string_and_object_forms() {
        let swagger = parse(json!({
            "type": "object",
            "discriminator": "kind",
            "properties": { "kind": { "type": "string" } }
        }));
        let SchemaKind::Object(obj) = &swagger.kind else {
            panic!("expected object");
        };
        assert_eq!(obj.discriminator.as_ref().unwrap().property_name, "kind");

        let oas = parse(json!({
            "oneOf": [ { "$ref": "#/components/schemas/Cat" } ],
            "discriminator": {
                "propertyName": "petType",
                "mapping": { "cat": "#/components/schemas/Cat" }
            }
        }));
        let SchemaKind::Composed(comp) = &oas.kind else {
            panic!("expected composition");
        };
        let d = comp.discriminator.as_ref().unwrap();
        assert_eq!(d.property_name, "petType");
        assert_eq!(
            d.mapping,
            vec![("cat".to_string(), "#/components/schemas/Cat".to_string())]
        );
    }

    #[test]
    fn null_in_type_list_marks_nullable() {
        let node = parse(json!({ "type": ["string", "null"] }));
        assert!(node.meta.nullable);
        assert!(matches!(
            node.kind,
            SchemaKind::Primitive {
                ty: PrimitiveType::String,
                ..
            }
        ));

        let multi = parse(json!({ "type": ["string", "integer"] }));
        assert!(matches!(multi.kind, SchemaKind::Unsupported { .. }));
    }

    #[test]
    fn exclusive_bounds_accept_both_forms() {
        let old = parse(json!({ "type": "number", "minimum": 1, "exclusiveMinimum": true }));
        assert_eq!(old.constraints.minimum, Some(1.0));
        assert!(old.constraints.exclusive_minimum);

        let new = parse(json!({ "type": "number", "exclusiveMaximum": 10 }));
        assert_eq!(new.constraints.maximum, Some(10.0));
        assert!(new.constraints.exclusive_maximum);
    }

    #[test]
    fn untyped_schema_is_any_and_pass_through() {
        let node = parse(json!({ "description": "anything" }));
        assert_eq!(node.kind, SchemaKind::Any);
        assert!(node.is_pass_through());
    }

    #[test]
    fn unrecognized_extensions_are_preserved() {
        let node = parse(json!({
            "type": "string",
            "x-nullable": false,
            "x-vendor-thing": { "a": 1 }
        }));
        assert!(node.extensions.has_recognized());
        let unknown: Vec<&str> = node.extensions.unrecognized().map(|(k, _)| k).collect();
        assert_eq!(unknown, vec!["x-vendor-thing"]);
    }
}
