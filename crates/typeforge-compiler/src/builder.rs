//! Type model construction from the flattened graph.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;
use serde_json::Value;
use typeforge_spec_parser::{Constraints, Extension};

use crate::catalog::{external_hint, TypeCatalog};
use crate::error::CompileError;
use crate::flatten::{
    FlatAdditional, FlatBody, FlatDefinition, FlatDocument, FlatKind, FlatObject, FlatProperty,
    FlatSchema,
};
use crate::formats::{map_primitive, PrimitiveKind};
use crate::map_ordered;
use crate::model::{Definition, DefinitionId, Field, Nullability, TypeModel};
use crate::nullability::{decide, Site};
use crate::options::CompileOptions;

/// Builds `TypeModel` nodes for definitions and operation schemas.
pub struct TypeBuilder<'a> {
    flat: &'a FlatDocument,
    options: &'a CompileOptions,
    catalog: &'a dyn TypeCatalog,
}

impl<'a> TypeBuilder<'a> {
    pub fn new(
        flat: &'a FlatDocument,
        options: &'a CompileOptions,
        catalog: &'a dyn TypeCatalog,
    ) -> Self {
        Self {
            flat,
            options,
            catalog,
        }
    }

    /// Build every definition, in flattening order, with back-references.
    pub fn build_definitions(
        &self,
    ) -> Result<(Vec<Definition>, IndexMap<DefinitionId, TypeModel>), CompileError> {
        let built = map_ordered(self.options.parallel, &self.flat.definitions, |d| {
            self.definition_type(d)
        })?;
        let built: Vec<(&FlatDefinition, TypeModel)> =
            self.flat.definitions.iter().zip(built).collect();

        let mut back_refs: HashMap<DefinitionId, BTreeSet<DefinitionId>> = HashMap::new();
        for (def, ty) in &built {
            let mut mentioned = BTreeSet::new();
            ty.referenced_definitions(&mut mentioned);
            for target in mentioned {
                back_refs.entry(target).or_default().insert(def.id.clone());
            }
        }

        let mut definitions = Vec::with_capacity(built.len());
        let mut types = IndexMap::with_capacity(built.len());
        for (def, ty) in built {
            definitions.push(Definition {
                id: def.id.clone(),
                source_name: def.source_name.clone(),
                pointer: def.pointer.clone(),
                schema: def.schema.clone(),
                back_refs: back_refs.remove(&def.id).unwrap_or_default(),
                base: def.base.clone(),
                discriminator_value: def.discriminator_value.clone(),
                description: def.schema.meta.description.clone(),
            });
            types.insert(def.id.clone(), ty);
        }
        Ok((definitions, types))
    }

    fn definition_type(&self, def: &FlatDefinition) -> Result<TypeModel, CompileError> {
        match &def.body {
            FlatBody::Alias(target) => Ok(TypeModel::Alias {
                target: target.clone(),
            }),
            FlatBody::Schema(schema) => self.build_type(schema),
        }
    }

    pub fn build_type(&self, schema: &FlatSchema) -> Result<TypeModel, CompileError> {
        if let Some(identifier) = external_hint(&schema.extensions) {
            let shape =
                self.catalog
                    .lookup(&identifier)
                    .map_err(|err| CompileError::ExternalType {
                        identifier: identifier.clone(),
                        location: schema.pointer.clone(),
                        reason: err.0,
                    })?;
            return Ok(TypeModel::External { identifier, shape });
        }

        let constraints = without_enum(&schema.constraints);
        let ty = match &schema.kind {
            FlatKind::Any if !schema.constraints.enum_values.is_empty() => TypeModel::Primitive {
                kind: infer_enum_base(&schema.constraints.enum_values),
                format: None,
                constraints,
            },
            FlatKind::Any => TypeModel::Any,
            FlatKind::Primitive { ty, format } => {
                let (kind, known) = map_primitive(*ty, format.as_deref());
                TypeModel::Primitive {
                    kind,
                    format: if known { None } else { format.clone() },
                    constraints,
                }
            }
            FlatKind::Array(item) => TypeModel::Array {
                element: Box::new(self.build_type(item)?),
                constraints,
            },
            FlatKind::Tuple { items, additional } => TypeModel::Tuple {
                elements: items
                    .iter()
                    .map(|item| self.build_type(item))
                    .collect::<Result<Vec<_>, CompileError>>()?,
                additional: additional
                    .as_deref()
                    .map(|a| self.build_type(a).map(Box::new))
                    .transpose()?,
            },
            FlatKind::Object(obj) => self.build_object(obj, constraints)?,
            FlatKind::Union {
                discriminator,
                base,
                variants,
            } => TypeModel::Polymorphic {
                discriminator_field: discriminator.clone(),
                base_fields: self.build_fields(&base.properties)?,
                variants: variants.clone(),
            },
            FlatKind::Named(id) => TypeModel::Named {
                definition: id.clone(),
            },
            FlatKind::Cycle(id) => TypeModel::CycleRef {
                definition: id.clone(),
            },
        };

        match ty {
            TypeModel::Primitive { .. } if !schema.constraints.enum_values.is_empty() => {
                Ok(TypeModel::Enum {
                    values: schema.constraints.enum_values.clone(),
                    base: Box::new(ty),
                })
            }
            ty => Ok(ty),
        }
    }

    fn build_object(
        &self,
        obj: &FlatObject,
        constraints: Constraints,
    ) -> Result<TypeModel, CompileError> {
        if obj.properties.is_empty() {
            return Ok(match &obj.additional {
                FlatAdditional::Schema(value) => TypeModel::Map {
                    value: Box::new(self.build_type(value)?),
                    constraints,
                },
                FlatAdditional::Allowed(true) => TypeModel::Map {
                    value: Box::new(TypeModel::Any),
                    constraints,
                },
                FlatAdditional::Allowed(false) => TypeModel::Object {
                    fields: Vec::new(),
                    additional: None,
                },
                FlatAdditional::Unspecified => TypeModel::Any,
            });
        }

        let additional = match &obj.additional {
            FlatAdditional::Schema(value) => Some(Box::new(self.build_type(value)?)),
            FlatAdditional::Allowed(true) => Some(Box::new(TypeModel::Any)),
            FlatAdditional::Allowed(false) | FlatAdditional::Unspecified => None,
        };
        Ok(TypeModel::Object {
            fields: self.build_fields(&obj.properties)?,
            additional,
        })
    }

    /// Fields in declaration order, stably sorted by `x-order` when present.
    pub fn build_fields(&self, properties: &[FlatProperty]) -> Result<Vec<Field>, CompileError> {
        let mut fields = properties
            .iter()
            .map(|prop| self.build_field(prop))
            .collect::<Result<Vec<_>, CompileError>>()?;
        if fields.iter().any(|f| f.order.is_some()) {
            fields.sort_by_key(|f| (f.order.is_none(), f.order.unwrap_or_default()));
        }
        Ok(fields)
    }

    fn build_field(&self, prop: &FlatProperty) -> Result<Field, CompileError> {
        let schema = &prop.schema;
        let ty = self.build_type(schema)?;
        let constraints = if carries_constraints(&ty) {
            Constraints::default()
        } else {
            without_enum(&schema.constraints)
        };
        Ok(Field {
            name: prop.name.clone(),
            nullability: self.nullability(schema, prop.required),
            ty,
            required: prop.required,
            default: schema.meta.default.clone(),
            constraints,
            description: schema.meta.description.clone(),
            read_only: schema.meta.read_only,
            omit_empty: schema.extensions.bool(Extension::OmitEmpty),
            order: schema.extensions.i64(Extension::Order),
            identifier: schema.extensions.str(Extension::GoName).map(str::to_string),
            pointer: schema.pointer.clone(),
        })
    }

    /// Nullability of a value used at `schema`.
    pub fn nullability(&self, schema: &FlatSchema, required: bool) -> Nullability {
        let site = Site::new(schema, required, self.flat, self.catalog);
        decide(
            &site,
            self.options.nullable_policy,
            self.options.nullable_precedence,
        )
    }

    pub(crate) fn flat(&self) -> &FlatDocument {
        self.flat
    }
}

fn without_enum(constraints: &Constraints) -> Constraints {
    Constraints {
        enum_values: Vec::new(),
        ..constraints.clone()
    }
}

fn carries_constraints(ty: &TypeModel) -> bool {
    match ty {
        TypeModel::Primitive { .. } | TypeModel::Array { .. } | TypeModel::Map { .. } => true,
        TypeModel::Enum { base, .. } => carries_constraints(base),
        _ => false,
    }
}

/// Base primitive of an enum declared without a type.
fn infer_enum_base(values: &[Value]) -> PrimitiveKind {
    let non_null = || values.iter().filter(|v| !v.is_null());
    if non_null().all(Value::is_string) {
        PrimitiveKind::String
    } else if non_null().all(|v| v.is_i64() || v.is_u64()) {
        PrimitiveKind::Int64
    } else if non_null().all(Value::is_number) {
        PrimitiveKind::Float64
    } else if non_null().all(Value::is_boolean) {
        PrimitiveKind::Bool
    } else {
        PrimitiveKind::String
    }
}
