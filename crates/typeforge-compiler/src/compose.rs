//! `allOf` merge algebra.
//!
//! Branches are merged on the resolved tree. Object branches union their
//! fields and `required` lists; primitive branches of one type merge their
//! constraints; annotation-only branches pass through. A branch that links to
//! a polymorphic base contributes the base's own fields and is recorded, so
//! the variant keeps a pointer to its family instead of absorbing the
//! discriminator.

use std::collections::BTreeMap;
use std::sync::Arc;

use typeforge_spec_parser::{Constraints, Discriminator, PrimitiveType, SourcePointer};

use crate::error::CompileError;
use crate::resolver::{
    ResolvedAdditional, ResolvedComposition, ResolvedKind, ResolvedObject, ResolvedSchema,
};

type Identities = BTreeMap<SourcePointer, Arc<ResolvedSchema>>;

/// Result of merging the `allOf` branches of one node.
#[derive(Debug)]
pub(crate) enum Merged<'a> {
    /// Every branch was annotation-only.
    Any,
    Primitive {
        ty: PrimitiveType,
        format: Option<String>,
        constraints: Constraints,
    },
    /// A single non-object, non-primitive branch (array, tuple).
    Single(&'a ResolvedSchema),
    Object(MergedObject<'a>),
}

#[derive(Debug, Default)]
pub(crate) struct MergedObject<'a> {
    /// Fields in first-declaration order.
    pub properties: Vec<(String, &'a ResolvedSchema)>,
    pub required: Vec<String>,
    pub additional: Option<&'a ResolvedAdditional>,
    /// Discriminator declared by an inline branch.
    pub discriminator: Option<&'a Discriminator>,
    /// Polymorphic bases reached through references, in branch order.
    pub bases: Vec<SourcePointer>,
}

impl<'a> MergedObject<'a> {
    /// View a plain object schema through the merge result type.
    pub fn from_object(obj: &'a ResolvedObject) -> Self {
        Self {
            properties: obj.properties.iter().map(|(n, p)| (n.clone(), p)).collect(),
            required: obj.required.clone(),
            additional: Some(&obj.additional),
            discriminator: obj.discriminator.as_ref(),
            bases: Vec::new(),
        }
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }
}

enum Acc<'a> {
    Empty,
    Primitive {
        ty: PrimitiveType,
        format: Option<String>,
        constraints: Constraints,
    },
    Single(&'a ResolvedSchema),
    Object(MergedObject<'a>),
}

/// Merge the `allOf` part of `comp`, which belongs to `node`.
pub(crate) fn merge_all_of<'a>(
    node: &'a ResolvedSchema,
    comp: &'a ResolvedComposition,
    identities: &'a Identities,
) -> Result<Merged<'a>, CompileError> {
    let mut merger = Merger {
        identities,
        site: &node.pointer,
        stack: vec![node.pointer.clone()],
        acc: Acc::Empty,
    };
    for branch in &comp.all_of {
        merger.add_branch(branch, true)?;
    }
    merger.finish(&node.constraints)
}

/// The own (non-inherited) part of a polymorphic base, as an object.
pub(crate) fn base_object<'a>(
    node: &'a ResolvedSchema,
    identities: &'a Identities,
) -> Result<MergedObject<'a>, CompileError> {
    let mut merger = Merger {
        identities,
        site: &node.pointer,
        stack: vec![node.pointer.clone()],
        acc: Acc::Empty,
    };
    match &node.kind {
        ResolvedKind::Composed(comp) => {
            for branch in &comp.all_of {
                merger.add_branch(branch, true)?;
            }
        }
        _ => merger.add_node(node, true)?,
    }
    match merger.finish(&Constraints::default())? {
        Merged::Object(obj) => Ok(obj),
        Merged::Any => Ok(MergedObject::default()),
        _ => Err(CompileError::unsupported(
            &node.pointer,
            "a schema with a discriminator must be an object",
        )),
    }
}

struct Merger<'a> {
    identities: &'a Identities,
    site: &'a SourcePointer,
    /// Reference targets being merged, to stop `allOf` loops.
    stack: Vec<SourcePointer>,
    acc: Acc<'a>,
}

impl<'a> Merger<'a> {
    fn add_branch(&mut self, branch: &'a ResolvedSchema, inline: bool) -> Result<(), CompileError> {
        match &branch.kind {
            ResolvedKind::Link(target) => self.add_reference(target.target()),
            ResolvedKind::CycleRef(pointer) => {
                let target = self.identities.get(pointer).ok_or_else(|| {
                    CompileError::unsupported(
                        &branch.pointer,
                        format!("allOf branch refers to unknown schema {}", pointer),
                    )
                })?;
                self.add_reference(target.target())
            }
            _ => self.add_node(branch, inline),
        }
    }

    fn add_reference(&mut self, target: &'a ResolvedSchema) -> Result<(), CompileError> {
        if self.stack.contains(&target.pointer) {
            return Err(CompileError::unsupported(
                self.site,
                format!("allOf loops back to {}", target.pointer),
            ));
        }
        self.stack.push(target.pointer.clone());

        let result = if target.own_discriminator().is_some() {
            self.object_acc(&target.pointer)
                .map(|obj| obj.bases.push(target.pointer.clone()))
                .and_then(|()| self.add_base_part(target))
        } else {
            self.add_node(target, false)
        };

        self.stack.pop();
        result
    }

    /// Fields of a polymorphic base, without its discriminator or variants.
    fn add_base_part(&mut self, base: &'a ResolvedSchema) -> Result<(), CompileError> {
        match &base.kind {
            ResolvedKind::Object(_) => self.add_node(base, false),
            ResolvedKind::Composed(comp) => {
                for branch in &comp.all_of {
                    self.add_branch(branch, false)?;
                }
                Ok(())
            }
            _ => Err(CompileError::unsupported(
                &base.pointer,
                "a schema with a discriminator must be an object",
            )),
        }
    }

    fn add_node(&mut self, node: &'a ResolvedSchema, inline: bool) -> Result<(), CompileError> {
        match &node.kind {
            ResolvedKind::Any if node.constraints.is_empty() => Ok(()),
            ResolvedKind::Any => Err(CompileError::unsupported(
                &node.pointer,
                "allOf branch has constraints but no type",
            )),
            ResolvedKind::Link(_) | ResolvedKind::CycleRef(_) => self.add_branch(node, inline),
            ResolvedKind::Object(obj) => {
                let merged = self.object_acc(&node.pointer)?;
                for (name, prop) in &obj.properties {
                    match merged.properties.iter().find(|(n, _)| n == name) {
                        Some((_, existing)) => {
                            if !same_shape(existing, prop) {
                                return Err(CompileError::conflict(
                                    name.as_str(),
                                    &prop.pointer,
                                    "declared with different shapes in allOf branches",
                                ));
                            }
                        }
                        None => merged.properties.push((name.clone(), prop)),
                    }
                }
                for name in &obj.required {
                    if !merged.required.contains(name) {
                        merged.required.push(name.clone());
                    }
                }
                if !matches!(obj.additional, ResolvedAdditional::Unspecified) {
                    match merged.additional {
                        None => merged.additional = Some(&obj.additional),
                        Some(existing) if same_additional(existing, &obj.additional) => {}
                        Some(_) => {
                            return Err(CompileError::conflict(
                                "additionalProperties",
                                &node.pointer,
                                "declared differently in allOf branches",
                            ))
                        }
                    }
                }
                if inline && merged.discriminator.is_none() {
                    merged.discriminator = obj.discriminator.as_ref();
                }
                Ok(())
            }
            ResolvedKind::Composed(comp) => {
                if !comp.one_of.is_empty() || !comp.any_of.is_empty() {
                    return Err(CompileError::unsupported(
                        &node.pointer,
                        "oneOf/anyOf nested inside allOf",
                    ));
                }
                for branch in &comp.all_of {
                    self.add_branch(branch, inline)?;
                }
                Ok(())
            }
            ResolvedKind::Primitive { ty, format } => match &mut self.acc {
                Acc::Empty => {
                    self.acc = Acc::Primitive {
                        ty: *ty,
                        format: format.clone(),
                        constraints: node.constraints.clone(),
                    };
                    Ok(())
                }
                Acc::Primitive {
                    ty: acc_ty,
                    format: acc_format,
                    constraints,
                } if acc_ty == ty => {
                    match (acc_format.as_deref(), format.as_deref()) {
                        (Some(a), Some(b)) if a != b => {
                            return Err(CompileError::conflict(
                                "format",
                                &node.pointer,
                                format!("'{}' vs '{}'", a, b),
                            ))
                        }
                        (None, Some(_)) => *acc_format = format.clone(),
                        _ => {}
                    }
                    merge_constraints(constraints, &node.constraints, &node.pointer)
                }
                _ => Err(self.type_conflict(node, ty.as_str())),
            },
            ResolvedKind::Array(_) | ResolvedKind::Tuple { .. } => match self.acc {
                Acc::Empty => {
                    self.acc = Acc::Single(node);
                    Ok(())
                }
                Acc::Single(existing) if same_shape(existing, node) => Ok(()),
                _ => Err(self.type_conflict(node, "array")),
            },
            ResolvedKind::Unsupported(reason) => {
                Err(CompileError::unsupported(&node.pointer, reason.clone()))
            }
        }
    }

    fn object_acc(&mut self, at: &SourcePointer) -> Result<&mut MergedObject<'a>, CompileError> {
        if matches!(self.acc, Acc::Empty) {
            self.acc = Acc::Object(MergedObject::default());
        }
        match &mut self.acc {
            Acc::Object(obj) => Ok(obj),
            other => Err(CompileError::conflict(
                "type",
                at,
                format!("cannot merge an object with {}", acc_name(other)),
            )),
        }
    }

    fn type_conflict(&self, node: &ResolvedSchema, found: &str) -> CompileError {
        CompileError::conflict(
            "type",
            &node.pointer,
            format!("cannot merge {} with {}", found, acc_name(&self.acc)),
        )
    }

    fn finish(self, own: &Constraints) -> Result<Merged<'a>, CompileError> {
        Ok(match self.acc {
            Acc::Empty => Merged::Any,
            Acc::Primitive {
                ty,
                format,
                mut constraints,
            } => {
                merge_constraints(&mut constraints, own, self.site)?;
                Merged::Primitive {
                    ty,
                    format,
                    constraints,
                }
            }
            Acc::Single(node) => Merged::Single(node),
            Acc::Object(obj) => Merged::Object(obj),
        })
    }
}

fn acc_name(acc: &Acc<'_>) -> &'static str {
    match acc {
        Acc::Empty => "nothing",
        Acc::Primitive { ty, .. } => ty.as_str(),
        Acc::Single(_) => "an array",
        Acc::Object(_) => "an object",
    }
}

/// Fold `from` into `into`. A constraint set to different values is a conflict.
fn merge_constraints(
    into: &mut Constraints,
    from: &Constraints,
    at: &SourcePointer,
) -> Result<(), CompileError> {
    fn merge<T: PartialEq + Clone + std::fmt::Debug>(
        name: &str,
        into: &mut Option<T>,
        from: &Option<T>,
        at: &SourcePointer,
    ) -> Result<(), CompileError> {
        match (into.as_ref(), from) {
            (Some(a), Some(b)) if a != b => Err(CompileError::conflict(
                name,
                at,
                format!("{:?} vs {:?}", a, b),
            )),
            (None, Some(b)) => {
                *into = Some(b.clone());
                Ok(())
            }
            _ => Ok(()),
        }
    }

    merge("minimum", &mut into.minimum, &from.minimum, at)?;
    merge("maximum", &mut into.maximum, &from.maximum, at)?;
    merge("multipleOf", &mut into.multiple_of, &from.multiple_of, at)?;
    merge("minLength", &mut into.min_length, &from.min_length, at)?;
    merge("maxLength", &mut into.max_length, &from.max_length, at)?;
    merge("pattern", &mut into.pattern, &from.pattern, at)?;
    merge("minItems", &mut into.min_items, &from.min_items, at)?;
    merge("maxItems", &mut into.max_items, &from.max_items, at)?;
    merge("minProperties", &mut into.min_properties, &from.min_properties, at)?;
    merge("maxProperties", &mut into.max_properties, &from.max_properties, at)?;
    into.exclusive_minimum |= from.exclusive_minimum;
    into.exclusive_maximum |= from.exclusive_maximum;
    into.unique_items |= from.unique_items;

    if !from.enum_values.is_empty() {
        if into.enum_values.is_empty() {
            into.enum_values = from.enum_values.clone();
        } else if into.enum_values != from.enum_values {
            return Err(CompileError::conflict(
                "enum",
                at,
                "different value sets in allOf branches",
            ));
        }
    }
    Ok(())
}

/// Structural equality after resolution: pointers, annotations and
/// extensions are ignored; references compare by target.
pub(crate) fn same_shape(a: &ResolvedSchema, b: &ResolvedSchema) -> bool {
    if let (Some(x), Some(y)) = (a.reference_target(), b.reference_target()) {
        return x == y;
    }
    let (a, b) = (a.target(), b.target());
    if a.constraints != b.constraints {
        return false;
    }
    match (&a.kind, &b.kind) {
        (ResolvedKind::Any, ResolvedKind::Any) => true,
        (
            ResolvedKind::Primitive { ty: t1, format: f1 },
            ResolvedKind::Primitive { ty: t2, format: f2 },
        ) => t1 == t2 && f1 == f2,
        (ResolvedKind::Array(x), ResolvedKind::Array(y)) => same_shape(x, y),
        (
            ResolvedKind::Tuple {
                items: i1,
                additional: a1,
            },
            ResolvedKind::Tuple {
                items: i2,
                additional: a2,
            },
        ) => {
            i1.len() == i2.len()
                && i1.iter().zip(i2).all(|(x, y)| same_shape(x, y))
                && match (a1, a2) {
                    (Some(x), Some(y)) => same_shape(x, y),
                    (None, None) => true,
                    _ => false,
                }
        }
        (ResolvedKind::Object(o1), ResolvedKind::Object(o2)) => {
            o1.properties.len() == o2.properties.len()
                && o1
                    .properties
                    .iter()
                    .zip(&o2.properties)
                    .all(|((n1, p1), (n2, p2))| n1 == n2 && same_shape(p1, p2))
                && o1.required == o2.required
                && same_additional(&o1.additional, &o2.additional)
                && o1.discriminator == o2.discriminator
        }
        (ResolvedKind::Composed(c1), ResolvedKind::Composed(c2)) => {
            let same_list = |x: &[ResolvedSchema], y: &[ResolvedSchema]| {
                x.len() == y.len() && x.iter().zip(y).all(|(p, q)| same_shape(p, q))
            };
            same_list(&c1.all_of, &c2.all_of)
                && same_list(&c1.one_of, &c2.one_of)
                && same_list(&c1.any_of, &c2.any_of)
                && c1.discriminator == c2.discriminator
        }
        (ResolvedKind::CycleRef(x), ResolvedKind::CycleRef(y)) => x == y,
        _ => false,
    }
}

fn same_additional(a: &ResolvedAdditional, b: &ResolvedAdditional) -> bool {
    match (a, b) {
        (ResolvedAdditional::Unspecified, ResolvedAdditional::Unspecified) => true,
        (ResolvedAdditional::Allowed(x), ResolvedAdditional::Allowed(y)) => x == y,
        (ResolvedAdditional::Schema(x), ResolvedAdditional::Schema(y)) => same_shape(x, y),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{ResolvedDocument, Resolver};
    use typeforge_spec_parser::{parse_document, DocumentSet};

    fn resolve(yaml: &str) -> ResolvedDocument {
        let set = DocumentSet::from_str("api.yaml", yaml).unwrap();
        let spec = parse_document(set.root()).unwrap();
        Resolver::new(&set).resolve(&spec).unwrap()
    }

    fn merge_definition<'a>(
        doc: &'a ResolvedDocument,
        name: &str,
    ) -> Result<Merged<'a>, CompileError> {
        let def = doc.definitions.iter().find(|d| d.name == name).unwrap();
        let ResolvedKind::Composed(comp) = &def.schema.kind else {
            panic!("{} is not composed", name);
        };
        merge_all_of(&def.schema, comp, &doc.identities)
    }

    const HEADER: &str = r#"
swagger: "2.0"
info: { title: T, version: "1" }
paths: {}
"#;

    #[test]
    fn disjoint_objects_union_their_fields() {
        let doc = resolve(&format!(
            "{}{}",
            HEADER,
            r#"
definitions:
  AB:
    allOf:
      - type: object
        required: [a]
        properties:
          a: { type: integer }
      - type: object
        properties:
          b: { type: string }
"#
        ));
        let Merged::Object(obj) = merge_definition(&doc, "AB").unwrap() else {
            panic!("expected an object");
        };
        let names: Vec<&str> = obj.properties.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(obj.is_required("a"));
        assert!(!obj.is_required("b"));
    }

    #[test]
    fn conflicting_field_is_rejected() {
        let doc = resolve(&format!(
            "{}{}",
            HEADER,
            r#"
definitions:
  Bad:
    allOf:
      - type: object
        properties:
          a: { type: integer }
      - type: object
        properties:
          a: { type: string }
"#
        ));
        let err = merge_definition(&doc, "Bad").unwrap_err();
        match err {
            CompileError::CompositionConflict { field, location, .. } => {
                assert_eq!(field, "a");
                assert_eq!(location.pointer, "/definitions/Bad/allOf/1/properties/a");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn identical_duplicate_field_is_accepted() {
        let doc = resolve(&format!(
            "{}{}",
            HEADER,
            r##"
definitions:
  Tag: { type: object, properties: { id: { type: integer } } }
  Twice:
    allOf:
      - type: object
        properties:
          tag: { $ref: "#/definitions/Tag" }
      - type: object
        properties:
          tag: { $ref: "#/definitions/Tag", description: same target }
"##
        ));
        let Merged::Object(obj) = merge_definition(&doc, "Twice").unwrap() else {
            panic!("expected an object");
        };
        assert_eq!(obj.properties.len(), 1);
    }

    #[test]
    fn object_with_primitive_is_a_conflict() {
        let doc = resolve(&format!(
            "{}{}",
            HEADER,
            r#"
definitions:
  Mixed:
    allOf:
      - type: object
        properties:
          a: { type: integer }
      - type: string
"#
        ));
        assert!(matches!(
            merge_definition(&doc, "Mixed").unwrap_err(),
            CompileError::CompositionConflict { ref field, .. } if field == "type"
        ));
    }

    #[test]
    fn primitives_merge_constraints_and_annotations_pass_through() {
        let doc = resolve(&format!(
            "{}{}",
            HEADER,
            r#"
definitions:
  Code:
    allOf:
      - type: string
        minLength: 2
      - description: only documentation
      - type: string
        maxLength: 8
"#
        ));
        match merge_definition(&doc, "Code").unwrap() {
            Merged::Primitive {
                ty, constraints, ..
            } => {
                assert_eq!(ty, PrimitiveType::String);
                assert_eq!(constraints.min_length, Some(2));
                assert_eq!(constraints.max_length, Some(8));
            }
            other => panic!("unexpected merge: {other:?}"),
        }
    }

    #[test]
    fn referenced_base_is_recorded_not_inherited() {
        let doc = resolve(&format!(
            "{}{}",
            HEADER,
            r##"
definitions:
  Animal:
    type: object
    discriminator: kind
    required: [kind]
    properties:
      kind: { type: string }
  Dog:
    allOf:
      - $ref: "#/definitions/Animal"
      - type: object
        properties:
          bark: { type: boolean }
"##
        ));
        let Merged::Object(obj) = merge_definition(&doc, "Dog").unwrap() else {
            panic!("expected an object");
        };
        let names: Vec<&str> = obj.properties.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["kind", "bark"]);
        assert!(obj.discriminator.is_none());
        assert_eq!(obj.bases, vec![SourcePointer::new("api.yaml", "/definitions/Animal")]);
        assert!(obj.is_required("kind"));
    }

    #[test]
    fn primitive_with_polymorphic_base_is_a_conflict() {
        let doc = resolve(&format!(
            "{}{}",
            HEADER,
            r##"
definitions:
  Animal:
    type: object
    discriminator: kind
    required: [kind]
    properties:
      kind: { type: string }
  Weird:
    allOf:
      - type: string
      - $ref: "#/definitions/Animal"
"##
        ));
        match merge_definition(&doc, "Weird").unwrap_err() {
            CompileError::CompositionConflict {
                field, location, ..
            } => {
                assert_eq!(field, "type");
                assert_eq!(location.pointer, "/definitions/Animal");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
