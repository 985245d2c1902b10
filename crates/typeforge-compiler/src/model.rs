//! The type IR and the compiled snapshot handed to emitters.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use typeforge_spec_parser::{Constraints, SourcePointer, SpecFormat};

use crate::catalog::ExternalShape;
use crate::formats::PrimitiveKind;
use crate::resolver::ResolvedSchema;

/// Stable, unique identifier of a definition within one compilation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DefinitionId(String);

impl DefinitionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A node of the type IR.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeModel {
    Primitive {
        #[serde(rename = "primitive")]
        kind: PrimitiveKind,
        /// Unrecognized format, kept as a hint.
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<String>,
        #[serde(skip_serializing_if = "Constraints::is_empty")]
        constraints: Constraints,
    },
    Array {
        element: Box<TypeModel>,
        #[serde(skip_serializing_if = "Constraints::is_empty")]
        constraints: Constraints,
    },
    Map {
        value: Box<TypeModel>,
        #[serde(skip_serializing_if = "Constraints::is_empty")]
        constraints: Constraints,
    },
    Object {
        fields: Vec<Field>,
        /// Value type of undeclared properties, when they are allowed.
        #[serde(skip_serializing_if = "Option::is_none")]
        additional: Option<Box<TypeModel>>,
    },
    Enum {
        values: Vec<Value>,
        base: Box<TypeModel>,
    },
    Tuple {
        elements: Vec<TypeModel>,
        #[serde(skip_serializing_if = "Option::is_none")]
        additional: Option<Box<TypeModel>>,
    },
    /// Transparent: always points at a non-alias definition.
    Alias { target: DefinitionId },
    Polymorphic {
        discriminator_field: String,
        /// The base schema's own fields.
        base_fields: Vec<Field>,
        /// Discriminator value to variant definition, in registration order.
        variants: IndexMap<String, DefinitionId>,
    },
    /// An open, untyped value.
    Any,
    External {
        identifier: String,
        shape: ExternalShape,
    },
    /// By-value use of a definition.
    Named { definition: DefinitionId },
    /// Indirection marker closing a cycle.
    CycleRef { definition: DefinitionId },
}

impl TypeModel {
    /// Definitions this node mentions directly or through nested types.
    pub fn referenced_definitions(&self, out: &mut BTreeSet<DefinitionId>) {
        match self {
            TypeModel::Primitive { .. } | TypeModel::Any | TypeModel::External { .. } => {}
            TypeModel::Array { element, .. } => element.referenced_definitions(out),
            TypeModel::Map { value, .. } => value.referenced_definitions(out),
            TypeModel::Object { fields, additional } => {
                for field in fields {
                    field.ty.referenced_definitions(out);
                }
                if let Some(additional) = additional {
                    additional.referenced_definitions(out);
                }
            }
            TypeModel::Enum { base, .. } => base.referenced_definitions(out),
            TypeModel::Tuple {
                elements,
                additional,
            } => {
                for element in elements {
                    element.referenced_definitions(out);
                }
                if let Some(additional) = additional {
                    additional.referenced_definitions(out);
                }
            }
            TypeModel::Alias { target } => {
                out.insert(target.clone());
            }
            TypeModel::Polymorphic {
                base_fields,
                variants,
                ..
            } => {
                for field in base_fields {
                    field.ty.referenced_definitions(out);
                }
                out.extend(variants.values().cloned());
            }
            TypeModel::Named { definition } | TypeModel::CycleRef { definition } => {
                out.insert(definition.clone());
            }
        }
    }
}

/// Whether the emitted representation carries an explicit absent state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Nullability {
    /// Always present.
    NonNull,
    /// Wrapped in an optional.
    Optional,
    /// Not wrapped; absence reads as the default or zero value.
    Defaulted,
}

impl Nullability {
    pub fn is_optional(self) -> bool {
        self == Nullability::Optional
    }
}

/// A field of an object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeModel,
    pub required: bool,
    pub nullability: Nullability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Constraints::is_empty")]
    pub constraints: Constraints,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    /// `x-omitempty`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub omit_empty: Option<bool>,
    /// `x-order`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    /// Preferred target-language identifier (`x-go-name`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip)]
    pub pointer: SourcePointer,
}

/// A named, top-level entry of the flattened graph.
#[derive(Debug, Clone, Serialize)]
pub struct Definition {
    pub id: DefinitionId,
    /// Name in the source document; `None` for synthesized definitions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    pub pointer: SourcePointer,
    /// The resolved body this definition was built from.
    #[serde(skip)]
    pub schema: Arc<ResolvedSchema>,
    /// Definitions whose types mention this one.
    pub back_refs: BTreeSet<DefinitionId>,
    /// Polymorphic base this definition is a variant of.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<DefinitionId>,
    /// Discriminator value selecting this variant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Where an operation input is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamSource {
    Path,
    Query,
    Header,
    Body,
    Form,
}

/// A typed operation input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub source: ParamSource,
    /// Header source carried as a cookie.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cookie: bool,
    pub required: bool,
    pub nullability: Nullability,
    #[serde(rename = "type")]
    pub ty: TypeModel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,
    pub pointer: SourcePointer,
}

/// Response status key. Orders codes ascending, then ranges, then `default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusCode {
    Code(u16),
    /// `4XX` style range, holding the leading digit.
    Range(u16),
    Default,
}

impl StatusCode {
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("default") {
            return Some(StatusCode::Default);
        }
        let bytes = s.as_bytes();
        if bytes.len() == 3 && bytes[1..].eq_ignore_ascii_case(b"xx") {
            let digit = (bytes[0] as char).to_digit(10)?;
            return (1..=5).contains(&digit).then_some(StatusCode::Range(digit as u16));
        }
        match s.parse::<u16>() {
            Ok(code) if (100..=599).contains(&code) => Some(StatusCode::Code(code)),
            _ => None,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::Code(code) => write!(f, "{}", code),
            StatusCode::Range(digit) => write!(f, "{}XX", digit),
            StatusCode::Default => f.write_str("default"),
        }
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A declared response header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseHeader {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeModel,
}

/// A typed response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub description: String,
    /// `None` for responses without a body.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<TypeModel>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<ResponseHeader>,
}

/// A bound API operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    pub id: String,
    pub method: String,
    pub path: String,
    pub pointer: SourcePointer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Inputs in declaration order; the body, if any, is a `Body` parameter.
    pub parameters: Vec<Parameter>,
    pub responses: BTreeMap<StatusCode, Response>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

impl Operation {
    /// Parameters carried by `source`.
    pub fn parameters_in(&self, source: ParamSource) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(move |p| p.source == source)
    }

    /// Type of the request body, if the operation takes one.
    pub fn request_type(&self) -> Option<&TypeModel> {
        self.parameters_in(ParamSource::Body).next().map(|p| &p.ty)
    }
}

/// The finished, read-only result of one compilation.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledModel {
    title: String,
    version: String,
    format: SpecFormat,
    definitions: Vec<Definition>,
    types: IndexMap<DefinitionId, TypeModel>,
    operations: Vec<Operation>,
}

impl CompiledModel {
    pub(crate) fn new(
        title: String,
        version: String,
        format: SpecFormat,
        definitions: Vec<Definition>,
        types: IndexMap<DefinitionId, TypeModel>,
        operations: Vec<Operation>,
    ) -> Self {
        Self {
            title,
            version,
            format,
            definitions,
            types,
            operations,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// `info.version` of the document.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn format(&self) -> SpecFormat {
        self.format
    }

    pub fn definitions(&self) -> &[Definition] {
        &self.definitions
    }

    pub fn types(&self) -> &IndexMap<DefinitionId, TypeModel> {
        &self.types
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn definition(&self, id: &str) -> Option<&Definition> {
        self.definitions.iter().find(|d| d.id.as_str() == id)
    }

    pub fn type_of(&self, id: &str) -> Option<&TypeModel> {
        self.types.get(&DefinitionId::new(id))
    }

    pub fn operation(&self, id: &str) -> Option<&Operation> {
        self.operations.iter().find(|o| o.id == id)
    }

    /// The definition an id stands for: aliases resolve in one hop.
    pub fn resolve_alias<'a>(&'a self, id: &'a DefinitionId) -> &'a DefinitionId {
        match self.types.get(id) {
            Some(TypeModel::Alias { target }) => target,
            _ => id,
        }
    }
}
