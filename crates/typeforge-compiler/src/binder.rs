//! Operation binding: typed inputs by source, typed outputs by status.

use std::collections::BTreeMap;

use typeforge_spec_parser::{ApiSpec, ParamLocation};
use typeforge_telemetry::log_tolerated;

use crate::builder::TypeBuilder;
use crate::error::CompileError;
use crate::flatten::{FlatKind, FlatOperation, FlatParameter, FlatRequestBody, FlatSchema};
use crate::model::{
    Nullability, Operation, ParamSource, Parameter, Response, ResponseHeader, StatusCode,
};

/// Name of a request body parameter when the document gives none.
const DEFAULT_BODY_NAME: &str = "body";

pub struct Binder<'a> {
    spec: &'a ApiSpec,
    types: &'a TypeBuilder<'a>,
}

impl<'a> Binder<'a> {
    pub fn new(spec: &'a ApiSpec, types: &'a TypeBuilder<'a>) -> Self {
        Self { spec, types }
    }

    pub fn bind(&self, op: &FlatOperation) -> Result<Operation, CompileError> {
        let mut parameters = op
            .parameters
            .iter()
            .map(|p| self.parameter(p))
            .collect::<Result<Vec<_>, CompileError>>()?;
        if let Some(body) = &op.body {
            parameters.extend(self.request_body(body)?);
        }

        self.check_path(op, &parameters)?;

        let mut responses = BTreeMap::new();
        for response in &op.responses {
            let status = StatusCode::parse(&response.raw.status).ok_or_else(|| {
                CompileError::unsupported(
                    &response.raw.pointer,
                    format!("invalid response status '{}'", response.raw.status),
                )
            })?;
            let headers = response
                .headers
                .iter()
                .map(|(name, schema)| {
                    Ok(ResponseHeader {
                        name: name.clone(),
                        ty: self.types.build_type(schema)?,
                    })
                })
                .collect::<Result<Vec<_>, CompileError>>()?;
            responses.insert(
                status,
                Response {
                    description: response.raw.description.clone(),
                    ty: response
                        .schema
                        .as_ref()
                        .map(|s| self.types.build_type(s))
                        .transpose()?,
                    headers,
                },
            );
        }

        Ok(Operation {
            id: op.name.clone(),
            method: op.raw.method.clone(),
            path: op.raw.path.clone(),
            pointer: op.raw.pointer.clone(),
            summary: op.raw.summary.clone(),
            parameters,
            responses,
            consumes: op
                .raw
                .consumes
                .clone()
                .unwrap_or_else(|| self.spec.consumes.clone()),
            produces: op
                .raw
                .produces
                .clone()
                .unwrap_or_else(|| self.spec.produces.clone()),
            deprecated: op.raw.deprecated,
        })
    }

    fn parameter(&self, p: &FlatParameter) -> Result<Parameter, CompileError> {
        let raw = &p.raw;
        let (source, cookie) = match raw.location {
            ParamLocation::Path => (ParamSource::Path, false),
            ParamLocation::Query => (ParamSource::Query, false),
            ParamLocation::Header => (ParamSource::Header, false),
            ParamLocation::Cookie => (ParamSource::Header, true),
            ParamLocation::Body => (ParamSource::Body, false),
            ParamLocation::FormData => (ParamSource::Form, false),
        };
        let nullability = match source {
            ParamSource::Path => Nullability::NonNull,
            _ => self.types.nullability(&p.schema, raw.required),
        };
        Ok(Parameter {
            name: raw.name.clone(),
            source,
            cookie,
            required: raw.required || source == ParamSource::Path,
            nullability,
            ty: self.types.build_type(&p.schema)?,
            default: p.schema.meta.default.clone(),
            description: raw
                .description
                .clone()
                .or_else(|| p.schema.meta.description.clone()),
            collection_format: raw.collection_format.clone(),
            style: raw.style.clone(),
            explode: raw.explode,
            pointer: raw.pointer.clone(),
        })
    }

    /// A request body becomes one `Body` parameter, or one `Form` parameter
    /// per property when it is form encoded.
    fn request_body(&self, body: &FlatRequestBody) -> Result<Vec<Parameter>, CompileError> {
        let Some(schema) = &body.schema else {
            return Ok(Vec::new());
        };

        if body.raw.form {
            if let Some(FlatKind::Object(obj)) = self.object_body(schema).map(|s| &s.kind) {
                return obj
                    .properties
                    .iter()
                    .map(|prop| {
                        Ok(Parameter {
                            name: prop.name.clone(),
                            source: ParamSource::Form,
                            cookie: false,
                            required: prop.required,
                            nullability: self.types.nullability(&prop.schema, prop.required),
                            ty: self.types.build_type(&prop.schema)?,
                            default: prop.schema.meta.default.clone(),
                            description: prop.schema.meta.description.clone(),
                            collection_format: None,
                            style: None,
                            explode: None,
                            pointer: prop.schema.pointer.clone(),
                        })
                    })
                    .collect();
            }
        }

        Ok(vec![Parameter {
            name: body
                .raw
                .name
                .clone()
                .unwrap_or_else(|| DEFAULT_BODY_NAME.to_string()),
            source: ParamSource::Body,
            cookie: false,
            required: body.raw.required,
            nullability: self.types.nullability(schema, body.raw.required),
            ty: self.types.build_type(schema)?,
            default: schema.meta.default.clone(),
            description: body
                .raw
                .description
                .clone()
                .or_else(|| schema.meta.description.clone()),
            collection_format: None,
            style: None,
            explode: None,
            pointer: body.raw.pointer.clone(),
        }])
    }

    /// The object a form body describes, looking through a named definition.
    fn object_body<'s>(&'s self, schema: &'s FlatSchema) -> Option<&'s FlatSchema> {
        match &schema.kind {
            FlatKind::Object(_) => Some(schema),
            FlatKind::Named(id) => self.types.flat().body_of(id),
            _ => None,
        }
    }

    fn check_path(&self, op: &FlatOperation, parameters: &[Parameter]) -> Result<(), CompileError> {
        let placeholders = path_placeholders(&op.raw.path);
        let declared = parameters.iter().filter(|p| p.source == ParamSource::Path);

        for placeholder in &placeholders {
            if !declared.clone().any(|p| &p.name == placeholder) {
                return Err(CompileError::UnboundPathParameter {
                    operation: op.name.clone(),
                    placeholder: placeholder.clone(),
                    location: op.raw.pointer.clone(),
                });
            }
        }

        for param in declared {
            if !placeholders.contains(&param.name) {
                log_tolerated!(
                    PATH_PARAMETER_UNUSED,
                    operation = %op.name,
                    parameter = %param.name,
                    path = %op.raw.path,
                    "path parameter does not appear in the path template"
                );
            }
        }
        Ok(())
    }
}

/// Placeholder names of a path template, in order. `{name+}` binds `name`.
pub fn path_placeholders(path: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            break;
        };
        let name = after[..end].trim_end_matches('+');
        if !name.is_empty() {
            names.push(name.to_string());
        }
        rest = &after[end + 1..];
    }
    names
}
