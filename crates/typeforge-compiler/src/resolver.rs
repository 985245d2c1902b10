//! Reference resolution.
//!
//! Turns the raw `SchemaNode` trees of a document set into `ResolvedSchema`
//! trees in which every `$ref` is either a shared link to the resolved
//! target or, when the target is still being resolved further up the path,
//! a `CycleRef` marker. The result is a finite DAG.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use typeforge_spec_parser::{
    parse_reference, AdditionalProperties, ApiSpec, ArrayItems, Constraints, Discriminator,
    DocumentSet, Extensions, PrimitiveType, RawOperation, RawParameter, RawRequestBody,
    RawResponse, SchemaKind, SchemaMeta, SchemaNode, SourcePointer,
};

use crate::error::CompileError;

/// A schema with every reference resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSchema {
    pub pointer: SourcePointer,
    pub kind: ResolvedKind,
    pub constraints: Constraints,
    pub extensions: Extensions,
    pub meta: SchemaMeta,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedKind {
    Any,
    Primitive {
        ty: PrimitiveType,
        format: Option<String>,
    },
    Array(Box<ResolvedSchema>),
    Tuple {
        items: Vec<ResolvedSchema>,
        additional: Option<Box<ResolvedSchema>>,
    },
    Object(ResolvedObject),
    Composed(ResolvedComposition),
    /// A `$ref` substituted by its (shared) resolved target.
    Link(Arc<ResolvedSchema>),
    /// A `$ref` to a target that is on the current resolution path.
    CycleRef(SourcePointer),
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedObject {
    pub properties: Vec<(String, ResolvedSchema)>,
    pub required: Vec<String>,
    pub additional: ResolvedAdditional,
    pub discriminator: Option<Discriminator>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedAdditional {
    Unspecified,
    Allowed(bool),
    Schema(Box<ResolvedSchema>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedComposition {
    pub all_of: Vec<ResolvedSchema>,
    pub one_of: Vec<ResolvedSchema>,
    pub any_of: Vec<ResolvedSchema>,
    pub discriminator: Option<Discriminator>,
}

impl ResolvedSchema {
    /// Follow links to the node that carries the shape.
    ///
    /// Stops at cycle markers; those are looked up by the caller.
    pub fn target(&self) -> &ResolvedSchema {
        let mut current = self;
        while let ResolvedKind::Link(next) = &current.kind {
            current = next;
        }
        current
    }

    /// Whether the node is a bare reference: a link or cycle marker with
    /// nothing of its own that changes the value space.
    pub fn is_pure_reference(&self) -> bool {
        matches!(self.kind, ResolvedKind::Link(_) | ResolvedKind::CycleRef(_))
            && self.constraints.is_empty()
            && self.meta.default.is_none()
    }

    /// The pointer this node is referenced by, if it is a reference.
    pub fn reference_target(&self) -> Option<&SourcePointer> {
        match &self.kind {
            ResolvedKind::Link(target) => Some(&target.pointer),
            ResolvedKind::CycleRef(target) => Some(target),
            _ => None,
        }
    }

    /// Discriminator declared by this node itself (not inherited through links).
    pub fn own_discriminator(&self) -> Option<&Discriminator> {
        match &self.kind {
            ResolvedKind::Object(obj) => obj.discriminator.as_ref(),
            ResolvedKind::Composed(comp) => comp.discriminator.as_ref().or_else(|| {
                comp.all_of.iter().find_map(|branch| match &branch.kind {
                    ResolvedKind::Object(obj) => obj.discriminator.as_ref(),
                    _ => None,
                })
            }),
            _ => None,
        }
    }
}

/// A named schema after resolution.
#[derive(Debug, Clone)]
pub struct ResolvedDefinition {
    pub name: String,
    pub schema: Arc<ResolvedSchema>,
}

#[derive(Debug, Clone)]
pub struct ResolvedParameter {
    pub raw: RawParameter,
    pub schema: ResolvedSchema,
}

#[derive(Debug, Clone)]
pub struct ResolvedBody {
    pub raw: RawRequestBody,
    pub schema: Option<ResolvedSchema>,
}

#[derive(Debug, Clone)]
pub struct ResolvedResponse {
    pub raw: RawResponse,
    pub schema: Option<ResolvedSchema>,
    pub headers: Vec<(String, ResolvedSchema)>,
}

#[derive(Debug, Clone)]
pub struct ResolvedOperation {
    pub raw: RawOperation,
    pub parameters: Vec<ResolvedParameter>,
    pub body: Option<ResolvedBody>,
    pub responses: Vec<ResolvedResponse>,
}

/// Output of the resolver.
#[derive(Debug, Clone)]
pub struct ResolvedDocument {
    /// Named schemas of the root document, in document order.
    pub definitions: Vec<ResolvedDefinition>,
    pub operations: Vec<ResolvedOperation>,
    /// Every resolved reference target (and definition root), by pointer.
    pub identities: BTreeMap<SourcePointer, Arc<ResolvedSchema>>,
    /// Number of `$ref` edges pointing at each identity.
    pub ref_counts: HashMap<SourcePointer, usize>,
    /// Identities entered through a cycle marker.
    pub cycle_targets: BTreeSet<SourcePointer>,
}

impl ResolvedDocument {
    pub fn identity(&self, pointer: &SourcePointer) -> Option<&Arc<ResolvedSchema>> {
        self.identities.get(pointer)
    }

    pub fn ref_count(&self, pointer: &SourcePointer) -> usize {
        self.ref_counts.get(pointer).copied().unwrap_or(0)
    }
}

/// Depth-first reference resolver.
///
/// Single-threaded: cycle detection relies on the ordered path stack.
pub struct Resolver<'a> {
    documents: &'a DocumentSet,
    cache: HashMap<SourcePointer, Arc<ResolvedSchema>>,
    stack: Vec<SourcePointer>,
    on_stack: HashSet<SourcePointer>,
    ref_counts: HashMap<SourcePointer, usize>,
    cycle_targets: BTreeSet<SourcePointer>,
}

impl<'a> Resolver<'a> {
    pub fn new(documents: &'a DocumentSet) -> Self {
        Self {
            documents,
            cache: HashMap::new(),
            stack: Vec::new(),
            on_stack: HashSet::new(),
            ref_counts: HashMap::new(),
            cycle_targets: BTreeSet::new(),
        }
    }

    /// Resolve definitions (document order) and then operations.
    pub fn resolve(mut self, spec: &ApiSpec) -> Result<ResolvedDocument, CompileError> {
        let mut definitions = Vec::with_capacity(spec.definitions.len());
        for def in &spec.definitions {
            let schema = self.resolve_identity(def.pointer(), &def.schema)?;
            definitions.push(ResolvedDefinition {
                name: def.name.clone(),
                schema,
            });
        }

        let operations = spec
            .operations
            .iter()
            .map(|op| self.resolve_operation(op))
            .collect::<Result<Vec<_>, _>>()?;

        debug_assert!(self.stack.is_empty());

        Ok(ResolvedDocument {
            definitions,
            operations,
            identities: self.cache.into_iter().collect(),
            ref_counts: self.ref_counts,
            cycle_targets: self.cycle_targets,
        })
    }

    fn resolve_operation(&mut self, op: &RawOperation) -> Result<ResolvedOperation, CompileError> {
        let parameters = op
            .parameters
            .iter()
            .map(|raw| {
                Ok(ResolvedParameter {
                    schema: self.resolve_node(&raw.schema)?,
                    raw: raw.clone(),
                })
            })
            .collect::<Result<Vec<_>, CompileError>>()?;

        let body = match &op.request_body {
            Some(raw) => Some(ResolvedBody {
                schema: raw
                    .schema
                    .as_ref()
                    .map(|s| self.resolve_node(s))
                    .transpose()?,
                raw: raw.clone(),
            }),
            None => None,
        };

        let mut responses = Vec::with_capacity(op.responses.len());
        for raw in &op.responses {
            let schema = raw
                .schema
                .as_ref()
                .map(|s| self.resolve_node(s))
                .transpose()?;
            let headers = raw
                .headers
                .iter()
                .map(|h| Ok((h.name.clone(), self.resolve_node(&h.schema)?)))
                .collect::<Result<Vec<_>, CompileError>>()?;
            responses.push(ResolvedResponse {
                raw: raw.clone(),
                schema,
                headers,
            });
        }

        Ok(ResolvedOperation {
            raw: op.clone(),
            parameters,
            body,
            responses,
        })
    }

    /// Resolve the node living at `identity`, once.
    fn resolve_identity(
        &mut self,
        identity: &SourcePointer,
        node: &SchemaNode,
    ) -> Result<Arc<ResolvedSchema>, CompileError> {
        if let Some(cached) = self.cache.get(identity) {
            return Ok(Arc::clone(cached));
        }

        self.stack.push(identity.clone());
        self.on_stack.insert(identity.clone());
        let resolved = self.resolve_node(node);
        self.stack.pop();
        self.on_stack.remove(identity);

        let resolved = Arc::new(resolved?);
        self.cache.insert(identity.clone(), Arc::clone(&resolved));
        Ok(resolved)
    }

    fn resolve_ref(
        &mut self,
        reference: &str,
        site: &SchemaNode,
    ) -> Result<ResolvedKind, CompileError> {
        let unresolvable = || CompileError::UnresolvableReference {
            reference: reference.to_string(),
            location: site.pointer.clone(),
        };

        let target = parse_reference(reference, &site.pointer.document).ok_or_else(unresolvable)?;
        *self.ref_counts.entry(target.clone()).or_insert(0) += 1;

        if self.on_stack.contains(&target) {
            tracing::debug!(target = %target, depth = self.stack.len(), "cycle detected");
            self.cycle_targets.insert(target.clone());
            return Ok(ResolvedKind::CycleRef(target));
        }
        if let Some(cached) = self.cache.get(&target) {
            return Ok(ResolvedKind::Link(Arc::clone(cached)));
        }

        let value = self.documents.lookup(&target).ok_or_else(unresolvable)?;
        let node = SchemaNode::parse(value, target.clone());
        Ok(ResolvedKind::Link(self.resolve_identity(&target, &node)?))
    }

    fn resolve_node(&mut self, node: &SchemaNode) -> Result<ResolvedSchema, CompileError> {
        let kind = match &node.kind {
            SchemaKind::Any => ResolvedKind::Any,
            SchemaKind::Primitive { ty, format } => ResolvedKind::Primitive {
                ty: *ty,
                format: format.clone(),
            },
            SchemaKind::Array { items } => match items {
                ArrayItems::Unspecified => ResolvedKind::Array(Box::new(ResolvedSchema {
                    pointer: node.pointer.child("items"),
                    kind: ResolvedKind::Any,
                    constraints: Constraints::default(),
                    extensions: Extensions::default(),
                    meta: SchemaMeta::default(),
                })),
                ArrayItems::Single(item) => ResolvedKind::Array(Box::new(self.resolve_node(item)?)),
                ArrayItems::Tuple { items, additional } => ResolvedKind::Tuple {
                    items: self.resolve_all(items)?,
                    additional: additional
                        .as_deref()
                        .map(|a| self.resolve_node(a).map(Box::new))
                        .transpose()?,
                },
            },
            SchemaKind::Object(obj) => {
                let mut properties = Vec::with_capacity(obj.properties.len());
                for (name, prop) in &obj.properties {
                    properties.push((name.clone(), self.resolve_node(prop)?));
                }
                let additional = match &obj.additional {
                    AdditionalProperties::Unspecified => ResolvedAdditional::Unspecified,
                    AdditionalProperties::Allowed(allowed) => ResolvedAdditional::Allowed(*allowed),
                    AdditionalProperties::Schema(schema) => {
                        ResolvedAdditional::Schema(Box::new(self.resolve_node(schema)?))
                    }
                };
                ResolvedKind::Object(ResolvedObject {
                    properties,
                    required: obj.required.clone(),
                    additional,
                    discriminator: obj.discriminator.clone(),
                })
            }
            SchemaKind::Composed(comp) => ResolvedKind::Composed(ResolvedComposition {
                all_of: self.resolve_all(&comp.all_of)?,
                one_of: self.resolve_all(&comp.one_of)?,
                any_of: self.resolve_all(&comp.any_of)?,
                discriminator: comp.discriminator.clone(),
            }),
            SchemaKind::Reference { reference } => self.resolve_ref(reference, node)?,
            SchemaKind::Unsupported { reason } => ResolvedKind::Unsupported(reason.clone()),
        };

        Ok(ResolvedSchema {
            pointer: node.pointer.clone(),
            kind,
            constraints: node.constraints.clone(),
            extensions: node.extensions.clone(),
            meta: node.meta.clone(),
        })
    }

    fn resolve_all(&mut self, nodes: &[SchemaNode]) -> Result<Vec<ResolvedSchema>, CompileError> {
        nodes.iter().map(|n| self.resolve_node(n)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typeforge_spec_parser::{parse_document, MemoryLoader};

    fn resolve(yaml: &str) -> ResolvedDocument {
        let set = DocumentSet::from_str("api.yaml", yaml).unwrap();
        let spec = parse_document(set.root()).unwrap();
        Resolver::new(&set).resolve(&spec).unwrap()
    }

    fn count_cycle_refs(schema: &ResolvedSchema, seen: &mut HashSet<*const ResolvedSchema>) -> usize {
        match &schema.kind {
            ResolvedKind::CycleRef(_) => 1,
            ResolvedKind::Link(target) => {
                if seen.insert(Arc::as_ptr(target)) {
                    count_cycle_refs(target, seen)
                } else {
                    0
                }
            }
            ResolvedKind::Array(item) => count_cycle_refs(item, seen),
            ResolvedKind::Tuple { items, additional } => {
                items.iter().map(|i| count_cycle_refs(i, seen)).sum::<usize>()
                    + additional.as_ref().map_or(0, |a| count_cycle_refs(a, seen))
            }
            ResolvedKind::Object(obj) => {
                obj.properties
                    .iter()
                    .map(|(_, p)| count_cycle_refs(p, seen))
                    .sum::<usize>()
                    + match &obj.additional {
                        ResolvedAdditional::Schema(s) => count_cycle_refs(s, seen),
                        _ => 0,
                    }
            }
            ResolvedKind::Composed(comp) => comp
                .all_of
                .iter()
                .chain(&comp.one_of)
                .chain(&comp.any_of)
                .map(|b| count_cycle_refs(b, seen))
                .sum(),
            _ => 0,
        }
    }

    fn total_cycle_refs(doc: &ResolvedDocument) -> usize {
        let mut seen = HashSet::new();
        doc.definitions
            .iter()
            .map(|d| {
                if seen.insert(Arc::as_ptr(&d.schema)) {
                    count_cycle_refs(&d.schema, &mut seen)
                } else {
                    0
                }
            })
            .sum()
    }

    #[test]
    fn local_refs_share_one_node() {
        let doc = resolve(
            r##"
swagger: "2.0"
info: { title: T, version: "1" }
paths: {}
definitions:
  Pet:
    type: object
    properties:
      tag: { $ref: "#/definitions/Tag" }
      other: { $ref: "#/definitions/Tag" }
  Tag:
    type: object
    properties:
      id: { type: integer }
"##,
        );
        let tag_ptr = SourcePointer::new("api.yaml", "/definitions/Tag");
        assert_eq!(doc.ref_count(&tag_ptr), 2);
        assert!(doc.cycle_targets.is_empty());

        let ResolvedKind::Object(pet) = &doc.definitions[0].schema.kind else {
            panic!("Pet should be an object");
        };
        let (ResolvedKind::Link(a), ResolvedKind::Link(b)) =
            (&pet.properties[0].1.kind, &pet.properties[1].1.kind)
        else {
            panic!("properties should be links");
        };
        assert!(Arc::ptr_eq(a, b));
        assert!(Arc::ptr_eq(a, &doc.definitions[1].schema));
    }

    #[test]
    fn self_reference_yields_one_cycle_marker() {
        let doc = resolve(
            r##"
swagger: "2.0"
info: { title: T, version: "1" }
paths: {}
definitions:
  Node:
    type: object
    properties:
      children:
        type: array
        items: { $ref: "#/definitions/Node" }
      parent: { $ref: "#/definitions/Node" }
"##,
        );
        let node = SourcePointer::new("api.yaml", "/definitions/Node");
        assert_eq!(doc.cycle_targets.iter().collect::<Vec<_>>(), vec![&node]);
        // Two reference edges enter the cycle; both are markers.
        assert_eq!(total_cycle_refs(&doc), 2);
    }

    #[test]
    fn mutual_recursion_marks_the_entry_point_once() {
        let doc = resolve(
            r##"
swagger: "2.0"
info: { title: T, version: "1" }
paths: {}
definitions:
  A:
    type: object
    properties:
      b: { $ref: "#/definitions/B" }
  B:
    type: object
    properties:
      a: { $ref: "#/definitions/A" }
"##,
        );
        assert_eq!(doc.cycle_targets.len(), 1);
        assert!(doc
            .cycle_targets
            .contains(&SourcePointer::new("api.yaml", "/definitions/A")));
        assert_eq!(total_cycle_refs(&doc), 1);
    }

    #[test]
    fn dangling_ref_is_unresolvable() {
        let set = DocumentSet::from_str(
            "api.yaml",
            r##"
swagger: "2.0"
info: { title: T, version: "1" }
paths: {}
definitions:
  Pet:
    type: object
    properties:
      owner: { $ref: "#/definitions/Owner" }
"##,
        )
        .unwrap();
        let spec = parse_document(set.root()).unwrap();
        let err = Resolver::new(&set).resolve(&spec).unwrap_err();
        match err {
            CompileError::UnresolvableReference {
                reference,
                location,
            } => {
                assert_eq!(reference, "#/definitions/Owner");
                assert_eq!(location.pointer, "/definitions/Pet/properties/owner");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn cross_document_cycle_is_detected() {
        let loader = MemoryLoader::new()
            .with(
                "main.yaml",
                r#"
swagger: "2.0"
info: { title: T, version: "1" }
paths: {}
definitions:
  Folder:
    type: object
    properties:
      files:
        type: array
        items: { $ref: "other.yaml#/definitions/File" }
"#,
            )
            .with(
                "other.yaml",
                r#"
definitions:
  File:
    type: object
    properties:
      folder: { $ref: "main.yaml#/definitions/Folder" }
"#,
            );
        let set = DocumentSet::load("main.yaml", &loader).unwrap();
        let spec = parse_document(set.root()).unwrap();
        let doc = Resolver::new(&set).resolve(&spec).unwrap();

        assert_eq!(
            doc.cycle_targets.iter().cloned().collect::<Vec<_>>(),
            vec![SourcePointer::new("main.yaml", "/definitions/Folder")]
        );
        assert!(doc
            .identity(&SourcePointer::new("other.yaml", "/definitions/File"))
            .is_some());
    }

    #[test]
    fn operation_schemas_are_resolved() {
        let doc = resolve(
            r##"
swagger: "2.0"
info: { title: T, version: "1" }
paths:
  /pets:
    post:
      parameters:
        - name: pet
          in: body
          schema: { $ref: "#/definitions/Pet" }
      responses:
        "200":
          description: ok
          schema:
            type: array
            items: { $ref: "#/definitions/Pet" }
definitions:
  Pet: { type: object, properties: { id: { type: integer } } }
"##,
        );
        let op = &doc.operations[0];
        assert!(matches!(op.parameters[0].schema.kind, ResolvedKind::Link(_)));
        assert!(matches!(
            op.responses[0].schema.as_ref().unwrap().kind,
            ResolvedKind::Array(_)
        ));
        assert_eq!(
            doc.ref_count(&SourcePointer::new("api.yaml", "/definitions/Pet")),
            2
        );
    }
}
