use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::loader::SchemaDocument;
use crate::model::{
    is_form_media_type, is_json_media_type, string_list, ApiSpec, DefinitionSource,
    ParamLocation, RawHeader, RawOperation, RawParameter, RawRequestBody, RawResponse,
    SpecFormat,
};
use crate::pointer::{self, SourcePointer};
use crate::schema::{Extensions, SchemaNode};

/// HTTP methods we recognize in paths.
const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Maximum `$ref` hops followed for parameters, responses and request bodies.
const MAX_REF_HOPS: usize = 32;

/// URI given to documents parsed from a bare string.
const INLINE_URI: &str = "spec.yaml";

/// Parse a Swagger 2.0 or OpenAPI 3.x document from a YAML/JSON string.
pub fn parse_spec(input: &str) -> Result<ApiSpec, ParseError> {
    let document = SchemaDocument::decode(INLINE_URI, input)?;
    parse_document(&document)
}

/// Parse a spec from a file path.
pub fn parse_spec_file(path: &std::path::Path) -> Result<ApiSpec, ParseError> {
    let content = std::fs::read_to_string(path)?;
    let document = SchemaDocument::decode(path.to_string_lossy(), &content)?;
    parse_document(&document)
}

/// Parse an already decoded root document.
pub fn parse_document(document: &SchemaDocument) -> Result<ApiSpec, ParseError> {
    let root_obj = document
        .root
        .as_object()
        .ok_or_else(|| ParseError::ParseError("spec root must be an object".into()))?;

    let (format, version) = detect_format(root_obj)?;

    let info = root_obj
        .get("info")
        .and_then(|v| v.as_object())
        .ok_or_else(|| ParseError::SchemaError("missing 'info' object".into()))?;

    let title = info
        .get("title")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ParseError::SchemaError("missing 'info.title'".into()))?
        .to_string();

    let api_version = info
        .get("version")
        .and_then(|v| v.as_str())
        .unwrap_or("0.0.0")
        .to_string();

    let ctx = Context {
        document,
        format,
        root: SourcePointer::root(document.uri.clone()),
    };

    let definitions = ctx.parse_definitions(root_obj);
    let operations = ctx.parse_paths(root_obj)?;

    Ok(ApiSpec {
        document: document.uri.clone(),
        format,
        version,
        title,
        api_version,
        consumes: string_list(root_obj.get("consumes")).unwrap_or_default(),
        produces: string_list(root_obj.get("produces")).unwrap_or_default(),
        definitions,
        operations,
        extensions: Extensions::from_object(root_obj),
    })
}

/// Detect whether this is Swagger 2.0 or OpenAPI 3.x and extract the version.
fn detect_format(root: &Map<String, Value>) -> Result<(SpecFormat, String), ParseError> {
    if let Some(version) = root.get("swagger").and_then(|v| v.as_str()) {
        if version != "2.0" {
            return Err(ParseError::SchemaError(format!(
                "unsupported Swagger version: {} (only 2.0 supported)",
                version
            )));
        }
        Ok((SpecFormat::Swagger2, version.to_string()))
    } else if let Some(version) = root.get("openapi").and_then(|v| v.as_str()) {
        if !version.starts_with("3.") {
            return Err(ParseError::SchemaError(format!(
                "unsupported OpenAPI version: {} (only 3.x supported)",
                version
            )));
        }
        Ok((SpecFormat::OpenApi3, version.to_string()))
    } else {
        Err(ParseError::UnknownFormat)
    }
}

struct Context<'a> {
    document: &'a SchemaDocument,
    format: SpecFormat,
    root: SourcePointer,
}

impl<'a> Context<'a> {
    fn parse_definitions(&self, root: &Map<String, Value>) -> Vec<DefinitionSource> {
        let (container, base) = match self.format {
            SpecFormat::Swagger2 => (
                root.get("definitions"),
                self.root.child("definitions"),
            ),
            SpecFormat::OpenApi3 => (
                root.get("components").and_then(|c| c.get("schemas")),
                self.root.child("components").child("schemas"),
            ),
        };

        container
            .and_then(Value::as_object)
            .map(|defs| {
                defs.iter()
                    .map(|(name, value)| DefinitionSource {
                        name: name.clone(),
                        schema: SchemaNode::parse(value, base.child(name)),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Follow local `$ref`s until a concrete object is reached.
    fn deref(
        &self,
        value: &'a Value,
        pointer: SourcePointer,
    ) -> Result<(&'a Map<String, Value>, SourcePointer), ParseError> {
        let mut current = value;
        let mut location = pointer;
        for _ in 0..MAX_REF_HOPS {
            let obj = current.as_object().ok_or_else(|| {
                ParseError::SchemaError(format!("{} must be an object", location))
            })?;
            let Some(reference) = obj.get("$ref").and_then(Value::as_str) else {
                return Ok((obj, location));
            };
            let target = pointer::parse_reference(reference, &self.document.uri)
                .filter(|t| t.document == self.document.uri)
                .ok_or_else(|| ParseError::UnresolvedRef(reference.to_string()))?;
            current = pointer::lookup(&self.document.root, &target.pointer)
                .ok_or_else(|| ParseError::UnresolvedRef(reference.to_string()))?;
            location = target;
        }
        Err(ParseError::UnresolvedRef(format!(
            "{}: too many $ref hops",
            location
        )))
    }

    fn parse_paths(&self, root: &'a Map<String, Value>) -> Result<Vec<RawOperation>, ParseError> {
        let mut operations = Vec::new();

        let paths = match root.get("paths").and_then(|v| v.as_object()) {
            Some(p) => p,
            None => return Ok(operations),
        };
        let paths_pointer = self.root.child("paths");

        for (path, path_item) in paths {
            let (path_obj, path_pointer) = self.deref(path_item, paths_pointer.child(path))?;

            // Path-level parameters (inherited by all operations)
            let path_params = self.parse_parameters(path_obj, &path_pointer)?;

            for method in HTTP_METHODS {
                let Some(op_value) = path_obj.get(*method) else {
                    continue;
                };
                let op_pointer = path_pointer.child(method);
                let op_obj = op_value.as_object().ok_or_else(|| {
                    ParseError::SchemaError(format!(
                        "operation {} {} must be an object",
                        method.to_uppercase(),
                        path
                    ))
                })?;

                let parameters =
                    merge_parameters(&path_params, self.parse_parameters(op_obj, &op_pointer)?);
                let request_body = self.parse_request_body(op_obj, &op_pointer)?;
                let responses = self.parse_responses(op_obj, &op_pointer)?;

                let (consumes, produces) = match self.format {
                    SpecFormat::Swagger2 => (
                        string_list(op_obj.get("consumes")),
                        string_list(op_obj.get("produces")),
                    ),
                    SpecFormat::OpenApi3 => (
                        request_body.as_ref().map(|b| b.media_types.clone()),
                        response_media_types(&responses),
                    ),
                };

                operations.push(RawOperation {
                    pointer: op_pointer,
                    path: path.clone(),
                    method: method.to_uppercase(),
                    operation_id: op_obj
                        .get("operationId")
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string()),
                    summary: op_obj
                        .get("summary")
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string()),
                    deprecated: op_obj
                        .get("deprecated")
                        .and_then(|v| v.as_bool())
                        .unwrap_or(false),
                    parameters,
                    request_body,
                    responses,
                    consumes,
                    produces,
                    extensions: Extensions::from_object(op_obj),
                });
            }
        }

        Ok(operations)
    }

    /// Parse parameters from a path item or operation object.
    fn parse_parameters(
        &self,
        obj: &'a Map<String, Value>,
        owner: &SourcePointer,
    ) -> Result<Vec<RawParameter>, ParseError> {
        let Some(items) = obj.get("parameters").and_then(|v| v.as_array()) else {
            return Ok(Vec::new());
        };
        let base = owner.child("parameters");
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let (param, pointer) = self.deref(item, base.index(i))?;
                self.parse_parameter(param, pointer)
            })
            .collect()
    }

    fn parse_parameter(
        &self,
        param: &Map<String, Value>,
        pointer: SourcePointer,
    ) -> Result<RawParameter, ParseError> {
        let name = param
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ParseError::SchemaError(format!("{}: parameter without name", pointer)))?
            .to_string();
        let location_str = param
            .get("in")
            .and_then(Value::as_str)
            .ok_or_else(|| ParseError::SchemaError(format!("{}: parameter without 'in'", pointer)))?;
        let location = ParamLocation::parse(location_str).ok_or_else(|| {
            ParseError::SchemaError(format!(
                "{}: unknown parameter location '{}'",
                pointer, location_str
            ))
        })?;

        let schema = if let Some(schema) = param.get("schema") {
            SchemaNode::parse(schema, pointer.child("schema"))
        } else if let Some((media, media_obj)) = param
            .get("content")
            .and_then(Value::as_object)
            .and_then(|c| c.iter().next())
        {
            let schema_pointer = pointer.child("content").child(media).child("schema");
            match media_obj.get("schema") {
                Some(schema) => SchemaNode::parse(schema, schema_pointer),
                None => SchemaNode::parse(&Value::Bool(true), schema_pointer),
            }
        } else {
            // Swagger 2.0 non-body parameter: the type is described inline.
            let inline: Map<String, Value> = param
                .iter()
                .filter(|(k, _)| !matches!(k.as_str(), "name" | "in" | "required"))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            SchemaNode::parse(&Value::Object(inline), pointer.clone())
        };

        Ok(RawParameter {
            name,
            location,
            required: param
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(location == ParamLocation::Path),
            description: param
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            schema,
            collection_format: param
                .get("collectionFormat")
                .and_then(Value::as_str)
                .map(str::to_string),
            style: param.get("style").and_then(Value::as_str).map(str::to_string),
            explode: param.get("explode").and_then(Value::as_bool),
            extensions: Extensions::from_object(param),
            pointer,
        })
    }

    /// Parse an OpenAPI 3 `requestBody`.
    fn parse_request_body(
        &self,
        op: &'a Map<String, Value>,
        owner: &SourcePointer,
    ) -> Result<Option<RawRequestBody>, ParseError> {
        let Some(value) = op.get("requestBody") else {
            return Ok(None);
        };
        let (body, pointer) = self.deref(value, owner.child("requestBody"))?;

        let content = body.get("content").and_then(Value::as_object);
        let media_types: Vec<String> = content
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default();
        let preferred = preferred_media_type(&media_types);

        let schema = preferred.and_then(|media| {
            let schema = content?.get(media)?.get("schema")?;
            Some(SchemaNode::parse(
                schema,
                pointer.child("content").child(media).child("schema"),
            ))
        });

        Ok(Some(RawRequestBody {
            name: op
                .get("x-codegen-request-body-name")
                .and_then(Value::as_str)
                .map(str::to_string),
            required: body
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            description: body
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            form: preferred.is_some_and(is_form_media_type),
            media_types: media_types.clone(),
            schema,
            pointer,
        }))
    }

    fn parse_responses(
        &self,
        op: &'a Map<String, Value>,
        owner: &SourcePointer,
    ) -> Result<Vec<RawResponse>, ParseError> {
        let Some(responses) = op.get("responses").and_then(Value::as_object) else {
            return Ok(Vec::new());
        };
        let base = owner.child("responses");

        let mut out = Vec::with_capacity(responses.len());
        for (status, value) in responses {
            if status.starts_with("x-") {
                continue;
            }
            let (response, pointer) = self.deref(value, base.child(status))?;

            let (schema, media_types) = match self.format {
                SpecFormat::Swagger2 => (
                    response
                        .get("schema")
                        .map(|s| SchemaNode::parse(s, pointer.child("schema"))),
                    Vec::new(),
                ),
                SpecFormat::OpenApi3 => {
                    let content = response.get("content").and_then(Value::as_object);
                    let media_types: Vec<String> = content
                        .map(|c| c.keys().cloned().collect())
                        .unwrap_or_default();
                    let schema = preferred_media_type(&media_types).and_then(|media| {
                        let schema = content?.get(media)?.get("schema")?;
                        Some(SchemaNode::parse(
                            schema,
                            pointer.child("content").child(media).child("schema"),
                        ))
                    });
                    (schema, media_types)
                }
            };

            let headers = response
                .get("headers")
                .and_then(Value::as_object)
                .map(|headers| {
                    let headers_pointer = pointer.child("headers");
                    headers
                        .iter()
                        .map(|(name, header)| self.parse_header(name, header, &headers_pointer))
                        .collect::<Result<Vec<_>, _>>()
                })
                .transpose()?
                .unwrap_or_default();

            out.push(RawResponse {
                status: status.clone(),
                description: response
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                schema,
                headers,
                media_types,
                pointer,
            });
        }
        Ok(out)
    }

    fn parse_header(
        &self,
        name: &str,
        value: &'a Value,
        base: &SourcePointer,
    ) -> Result<RawHeader, ParseError> {
        let (header, pointer) = self.deref(value, base.child(name))?;
        let schema = match header.get("schema") {
            Some(schema) => SchemaNode::parse(schema, pointer.child("schema")),
            None => SchemaNode::parse(&Value::Object(header.clone()), pointer),
        };
        Ok(RawHeader {
            name: name.to_string(),
            schema,
        })
    }
}

/// Operation-level parameters override path-level ones with the same name and location.
fn merge_parameters(inherited: &[RawParameter], own: Vec<RawParameter>) -> Vec<RawParameter> {
    let mut merged: Vec<RawParameter> = inherited
        .iter()
        .filter(|p| {
            !own.iter()
                .any(|o| o.name == p.name && o.location == p.location)
        })
        .cloned()
        .collect();
    merged.extend(own);
    merged
}

/// First JSON-ish media type, else the first one declared.
fn preferred_media_type(media_types: &[String]) -> Option<&str> {
    media_types
        .iter()
        .find(|m| is_json_media_type(m))
        .or_else(|| media_types.first())
        .map(String::as_str)
}

fn response_media_types(responses: &[RawResponse]) -> Option<Vec<String>> {
    let mut media_types: Vec<String> = Vec::new();
    for media in responses.iter().flat_map(|r| r.media_types.iter()) {
        if !media_types.contains(media) {
            media_types.push(media.clone());
        }
    }
    (!media_types.is_empty()).then_some(media_types)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PrimitiveType, SchemaKind};

    #[test]
    fn parse_minimal_swagger() {
        let yaml = r#"
swagger: "2.0"
info:
  title: Petstore
  version: "1.0.0"
produces: [application/json]
paths:
  /health:
    get:
      operationId: getHealth
      responses:
        "200":
          description: ok
"#;
        let spec = parse_spec(yaml).unwrap();
        assert_eq!(spec.format, SpecFormat::Swagger2);
        assert_eq!(spec.version, "2.0");
        assert_eq!(spec.title, "Petstore");
        assert_eq!(spec.produces, vec!["application/json".to_string()]);
        assert_eq!(spec.operations.len(), 1);

        let op = &spec.operations[0];
        assert_eq!(op.path, "/health");
        assert_eq!(op.method, "GET");
        assert_eq!(op.operation_id, Some("getHealth".to_string()));
        assert_eq!(op.responses[0].status, "200");
        assert_eq!(op.pointer.pointer, "/paths/~1health/get");
    }

    #[test]
    fn parse_definitions_in_document_order() {
        let yaml = r#"
swagger: "2.0"
info: { title: T, version: "1" }
paths: {}
definitions:
  Zebra: { type: string }
  Aardvark: { type: integer }
"#;
        let spec = parse_spec(yaml).unwrap();
        let names: Vec<&str> = spec.definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Zebra", "Aardvark"]);
        assert_eq!(spec.definitions[1].pointer().pointer, "/definitions/Aardvark");
    }

    #[test]
    fn swagger_inline_parameter_becomes_schema() {
        let yaml = r#"
swagger: "2.0"
info: { title: T, version: "1" }
paths:
  /pets:
    get:
      parameters:
        - name: limit
          in: query
          type: integer
          format: int32
          default: 20
          collectionFormat: csv
      responses:
        default: { description: err }
"#;
        let spec = parse_spec(yaml).unwrap();
        let param = &spec.operations[0].parameters[0];
        assert_eq!(param.location, ParamLocation::Query);
        assert!(!param.required);
        assert_eq!(param.collection_format.as_deref(), Some("csv"));
        assert_eq!(
            param.schema.kind,
            SchemaKind::Primitive {
                ty: PrimitiveType::Integer,
                format: Some("int32".into())
            }
        );
        assert_eq!(param.schema.meta.default, Some(serde_json::json!(20)));
    }

    #[test]
    fn path_parameters_are_inherited_and_overridden() {
        let yaml = r##"
swagger: "2.0"
info: { title: T, version: "1" }
parameters:
  TraceId:
    name: X-Trace
    in: header
    type: string
paths:
  /pets/{id}:
    parameters:
      - name: id
        in: path
        required: true
        type: string
      - $ref: "#/parameters/TraceId"
    get:
      parameters:
        - name: id
          in: path
          required: true
          type: integer
      responses: {}
"##;
        let spec = parse_spec(yaml).unwrap();
        let params = &spec.operations[0].parameters;
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "X-Trace");
        assert_eq!(params[0].pointer.pointer, "/parameters/TraceId");
        assert_eq!(params[1].name, "id");
        assert!(matches!(
            params[1].schema.kind,
            SchemaKind::Primitive {
                ty: PrimitiveType::Integer,
                ..
            }
        ));
    }

    #[test]
    fn parse_openapi3_request_body_and_responses() {
        let yaml = r##"
openapi: "3.0.3"
info: { title: T, version: "1" }
paths:
  /pets:
    post:
      operationId: addPet
      requestBody:
        required: true
        content:
          text/plain:
            schema: { type: string }
          application/json:
            schema:
              $ref: "#/components/schemas/Pet"
      responses:
        "201":
          description: created
          headers:
            Location:
              schema: { type: string }
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/Pet"
components:
  schemas:
    Pet:
      type: object
"##;
        let spec = parse_spec(yaml).unwrap();
        assert_eq!(spec.format, SpecFormat::OpenApi3);
        assert_eq!(spec.definitions[0].pointer().pointer, "/components/schemas/Pet");

        let op = &spec.operations[0];
        let body = op.request_body.as_ref().unwrap();
        assert!(body.required);
        assert!(!body.form);
        assert_eq!(
            body.schema.as_ref().unwrap().pointer.pointer,
            "/paths/~1pets/post/requestBody/content/application~1json/schema"
        );
        assert_eq!(
            op.consumes,
            Some(vec!["text/plain".to_string(), "application/json".to_string()])
        );
        assert_eq!(op.produces, Some(vec!["application/json".to_string()]));

        let created = &op.responses[0];
        assert_eq!(created.headers[0].name, "Location");
        assert!(created.schema.is_some());
    }

    #[test]
    fn openapi3_form_body_is_flagged() {
        let yaml = r#"
openapi: "3.0.0"
info: { title: T, version: "1" }
paths:
  /login:
    post:
      requestBody:
        content:
          application/x-www-form-urlencoded:
            schema:
              type: object
              properties:
                user: { type: string }
      responses: {}
"#;
        let spec = parse_spec(yaml).unwrap();
        let body = spec.operations[0].request_body.as_ref().unwrap();
        assert!(body.form);
    }

    #[test]
    fn unresolved_parameter_ref_is_error() {
        let yaml = r##"
swagger: "2.0"
info: { title: T, version: "1" }
paths:
  /pets:
    get:
      parameters:
        - $ref: "#/parameters/Missing"
      responses: {}
"##;
        let err = parse_spec(yaml).unwrap_err();
        assert!(matches!(err, ParseError::UnresolvedRef(r) if r == "#/parameters/Missing"));
    }

    #[test]
    fn reject_unknown_format() {
        let err = parse_spec("info: { title: T }\npaths: {}\n").unwrap_err();
        assert!(matches!(err, ParseError::UnknownFormat));
    }

    #[test]
    fn reject_swagger_1() {
        let yaml = r#"
swagger: "1.2"
info: { title: T, version: "1" }
"#;
        let err = parse_spec(yaml).unwrap_err();
        assert!(err.to_string().contains("only 2.0 supported"));
    }

    #[test]
    fn missing_title_is_schema_error() {
        let yaml = "openapi: \"3.1.0\"\ninfo: { version: \"1\" }\n";
        let err = parse_spec(yaml).unwrap_err();
        assert!(matches!(err, ParseError::SchemaError(_)));
    }
}
