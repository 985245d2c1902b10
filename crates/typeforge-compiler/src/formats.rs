//! Fixed `(type, format)` to primitive mapping.

use serde::Serialize;
use typeforge_spec_parser::PrimitiveType;

/// Language-agnostic primitive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    Bool,
    String,
    Timestamp,
    Date,
    Duration,
    /// Base64-encoded bytes (`format: byte`).
    Base64,
    /// Raw byte stream (`format: binary`, Swagger 2.0 `file`).
    Stream,
    Uuid,
    Email,
    Uri,
    Hostname,
    Ipv4,
    Ipv6,
    Mac,
    Password,
}

/// Map a schema type and format to a primitive kind.
///
/// The second element is `false` when the format was not recognized; the
/// base type is used and the caller keeps the format string as a hint.
pub fn map_primitive(ty: PrimitiveType, format: Option<&str>) -> (PrimitiveKind, bool) {
    use PrimitiveKind::*;

    let known = match (ty, format) {
        (PrimitiveType::Integer, None | Some("int64")) => Some(Int64),
        (PrimitiveType::Integer, Some("int32")) => Some(Int32),
        (PrimitiveType::Integer, Some("int16")) => Some(Int16),
        (PrimitiveType::Integer, Some("int8")) => Some(Int8),
        (PrimitiveType::Integer, Some("uint64")) => Some(Uint64),
        (PrimitiveType::Integer, Some("uint32")) => Some(Uint32),
        (PrimitiveType::Integer, Some("uint16")) => Some(Uint16),
        (PrimitiveType::Integer, Some("uint8")) => Some(Uint8),

        (PrimitiveType::Number, None | Some("double")) => Some(Float64),
        (PrimitiveType::Number, Some("float")) => Some(Float32),
        (PrimitiveType::Number, Some("int32")) => Some(Int32),
        (PrimitiveType::Number, Some("int64")) => Some(Int64),

        (PrimitiveType::Boolean, _) => Some(Bool),
        (PrimitiveType::File, _) => Some(Stream),

        (PrimitiveType::String, None) => Some(String),
        (PrimitiveType::String, Some(format)) => match format {
            "date-time" | "datetime" => Some(Timestamp),
            "date" => Some(Date),
            "duration" => Some(Duration),
            "byte" => Some(Base64),
            "binary" => Some(Stream),
            "uuid" | "uuid3" | "uuid4" | "uuid5" => Some(Uuid),
            "email" => Some(Email),
            "uri" => Some(Uri),
            "hostname" => Some(Hostname),
            "ipv4" => Some(Ipv4),
            "ipv6" => Some(Ipv6),
            "mac" => Some(Mac),
            "password" => Some(Password),
            _ => None,
        },
        _ => None,
    };

    match known {
        Some(kind) => (kind, true),
        None => (base_kind(ty), false),
    }
}

fn base_kind(ty: PrimitiveType) -> PrimitiveKind {
    match ty {
        PrimitiveType::Integer => PrimitiveKind::Int64,
        PrimitiveType::Number => PrimitiveKind::Float64,
        PrimitiveType::Boolean => PrimitiveKind::Bool,
        PrimitiveType::String => PrimitiveKind::String,
        PrimitiveType::File => PrimitiveKind::Stream,
    }
}
