use serde::Serialize;
use serde_json::Value;

use crate::pointer::SourcePointer;
use crate::schema::{Extensions, SchemaNode};

/// A parsed API document (Swagger 2.0 or OpenAPI 3.x).
#[derive(Debug, Clone, Serialize)]
pub struct ApiSpec {
    /// URI of the root document.
    pub document: String,
    /// The format detected from the root field.
    pub format: SpecFormat,
    /// The spec version string (e.g. "2.0", "3.0.3").
    pub version: String,
    /// The `info.title` field.
    pub title: String,
    /// The `info.version` field.
    pub api_version: String,
    /// Document-level `consumes` (Swagger 2.0).
    pub consumes: Vec<String>,
    /// Document-level `produces` (Swagger 2.0).
    pub produces: Vec<String>,
    /// Named schemas, in document order.
    pub definitions: Vec<DefinitionSource>,
    /// Path operations, in document order.
    pub operations: Vec<RawOperation>,
    /// Root-level `x-*` extensions.
    pub extensions: Extensions,
}

/// Detected spec format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecFormat {
    Swagger2,
    OpenApi3,
}

impl SpecFormat {
    /// Pointer prefix under which named schemas live.
    pub fn definitions_pointer(self) -> &'static str {
        match self {
            SpecFormat::Swagger2 => "/definitions",
            SpecFormat::OpenApi3 => "/components/schemas",
        }
    }
}

/// A named schema from `definitions` / `components.schemas`.
#[derive(Debug, Clone, Serialize)]
pub struct DefinitionSource {
    pub name: String,
    pub schema: SchemaNode,
}

impl DefinitionSource {
    pub fn pointer(&self) -> &SourcePointer {
        &self.schema.pointer
    }
}

/// A single API operation (path + method) before binding.
#[derive(Debug, Clone, Serialize)]
pub struct RawOperation {
    /// Pointer to the operation object.
    pub pointer: SourcePointer,
    /// The path template (e.g. "/pets/{id}").
    pub path: String,
    /// The HTTP method (uppercase).
    pub method: String,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub deprecated: bool,
    /// Path-level parameters merged with operation-level ones.
    pub parameters: Vec<RawParameter>,
    /// OpenAPI 3 `requestBody`.
    pub request_body: Option<RawRequestBody>,
    /// Responses in document order.
    pub responses: Vec<RawResponse>,
    /// Operation-level `consumes`, or request body media types (OpenAPI 3).
    pub consumes: Option<Vec<String>>,
    /// Operation-level `produces`, or response media types (OpenAPI 3).
    pub produces: Option<Vec<String>>,
    pub extensions: Extensions,
}

/// Where a parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
    Body,
    FormData,
}

impl ParamLocation {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            "body" => Some(Self::Body),
            "formData" => Some(Self::FormData),
            _ => None,
        }
    }
}

/// A declared parameter.
#[derive(Debug, Clone, Serialize)]
pub struct RawParameter {
    /// Pointer to the parameter object (after following a `$ref`).
    pub pointer: SourcePointer,
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    pub description: Option<String>,
    /// The parameter's schema. Swagger 2.0 non-body parameters describe their
    /// type inline; that inline description is parsed as the schema.
    pub schema: SchemaNode,
    /// Swagger 2.0 `collectionFormat`.
    pub collection_format: Option<String>,
    /// OpenAPI 3 `style`.
    pub style: Option<String>,
    /// OpenAPI 3 `explode`.
    pub explode: Option<bool>,
    pub extensions: Extensions,
}

/// An OpenAPI 3 `requestBody`.
#[derive(Debug, Clone, Serialize)]
pub struct RawRequestBody {
    pub pointer: SourcePointer,
    /// `x-codegen-request-body-name`, if set.
    pub name: Option<String>,
    pub required: bool,
    pub description: Option<String>,
    pub media_types: Vec<String>,
    /// Schema of the preferred media type.
    pub schema: Option<SchemaNode>,
    /// Whether the preferred media type is a form encoding.
    pub form: bool,
}

/// A declared response.
#[derive(Debug, Clone, Serialize)]
pub struct RawResponse {
    pub pointer: SourcePointer,
    /// Status code key as written (`"200"`, `"4XX"`, `"default"`).
    pub status: String,
    pub description: String,
    pub schema: Option<SchemaNode>,
    pub headers: Vec<RawHeader>,
    /// Media types declared under `content` (OpenAPI 3).
    pub media_types: Vec<String>,
}

/// A declared response header.
#[derive(Debug, Clone, Serialize)]
pub struct RawHeader {
    pub name: String,
    pub schema: SchemaNode,
}

/// Whether a media type is decoded as JSON.
pub fn is_json_media_type(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or(media_type)
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json") || essence == "*/*"
}

/// Whether a media type carries form fields.
pub fn is_form_media_type(media_type: &str) -> bool {
    let essence = media_type.split(';').next().unwrap_or(media_type).trim();
    essence.eq_ignore_ascii_case("application/x-www-form-urlencoded")
        || essence.eq_ignore_ascii_case("multipart/form-data")
}

pub(crate) fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    value.and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}
