//! Schema flattening.
//!
//! Decides which resolved schemas become top-level definitions, names them,
//! collapses alias chains, registers polymorphic families and rewrites every
//! schema so that references to promoted schemas are by identifier.
//!
//! Everything that allocates a name runs on the calling thread, in a fixed
//! order. Only the per-definition and per-operation rewrites fan out.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use typeforge_spec_parser::{
    parse_reference, ApiSpec, Constraints, Extension, Extensions, PrimitiveType, RawOperation,
    RawParameter, RawRequestBody, RawResponse, SchemaMeta, SourcePointer,
};
use typeforge_telemetry::{log_decision, log_tolerated};

use crate::compose::{base_object, merge_all_of, Merged, MergedObject};
use crate::error::CompileError;
use crate::map_ordered;
use crate::model::DefinitionId;
use crate::naming::{identifier, pascal_case, NameAllocator};
use crate::options::{CompileOptions, FlattenPolicy};
use crate::resolver::{
    ResolvedAdditional, ResolvedComposition, ResolvedDocument, ResolvedKind, ResolvedOperation,
    ResolvedSchema,
};

/// Pointer segments that describe structure rather than naming anything.
const STRUCTURAL_SEGMENTS: &[&str] = &[
    "definitions",
    "components",
    "schemas",
    "properties",
    "items",
    "additionalProperties",
    "allOf",
    "oneOf",
    "anyOf",
    "paths",
    "parameters",
    "responses",
    "requestBody",
    "content",
    "schema",
];

/// A schema after flattening.
#[derive(Debug, Clone)]
pub struct FlatSchema {
    pub pointer: SourcePointer,
    pub kind: FlatKind,
    pub constraints: Constraints,
    pub extensions: Extensions,
    pub meta: SchemaMeta,
}

#[derive(Debug, Clone)]
pub enum FlatKind {
    Any,
    Primitive {
        ty: PrimitiveType,
        format: Option<String>,
    },
    Array(Box<FlatSchema>),
    Tuple {
        items: Vec<FlatSchema>,
        additional: Option<Box<FlatSchema>>,
    },
    Object(FlatObject),
    /// A polymorphic base: its own fields plus the registered variants.
    Union {
        discriminator: String,
        base: FlatObject,
        variants: IndexMap<String, DefinitionId>,
    },
    /// By-value use of a promoted schema.
    Named(DefinitionId),
    /// Use of a promoted schema that closes a reference cycle.
    Cycle(DefinitionId),
}

#[derive(Debug, Clone)]
pub struct FlatObject {
    pub properties: Vec<FlatProperty>,
    pub additional: FlatAdditional,
    pub discriminator: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FlatProperty {
    pub name: String,
    pub schema: FlatSchema,
    pub required: bool,
}

#[derive(Debug, Clone)]
pub enum FlatAdditional {
    Unspecified,
    Allowed(bool),
    Schema(Box<FlatSchema>),
}

#[derive(Debug, Clone)]
pub enum FlatBody {
    /// Transparent alias, already collapsed to its final target.
    Alias(DefinitionId),
    Schema(FlatSchema),
}

#[derive(Debug, Clone)]
pub struct FlatDefinition {
    pub id: DefinitionId,
    pub source_name: Option<String>,
    pub pointer: SourcePointer,
    pub schema: Arc<ResolvedSchema>,
    pub body: FlatBody,
    pub base: Option<DefinitionId>,
    pub discriminator_value: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FlatParameter {
    pub raw: RawParameter,
    pub schema: FlatSchema,
}

#[derive(Debug, Clone)]
pub struct FlatRequestBody {
    pub raw: RawRequestBody,
    pub schema: Option<FlatSchema>,
}

#[derive(Debug, Clone)]
pub struct FlatResponse {
    pub raw: RawResponse,
    pub schema: Option<FlatSchema>,
    pub headers: Vec<(String, FlatSchema)>,
}

#[derive(Debug, Clone)]
pub struct FlatOperation {
    /// `operationId`, or a name derived from method and path.
    pub name: String,
    pub raw: RawOperation,
    pub parameters: Vec<FlatParameter>,
    pub body: Option<FlatRequestBody>,
    pub responses: Vec<FlatResponse>,
}

/// Output of the flattener.
#[derive(Debug, Clone)]
pub struct FlatDocument {
    pub definitions: Vec<FlatDefinition>,
    pub operations: Vec<FlatOperation>,
    index: HashMap<DefinitionId, usize>,
}

impl FlatDocument {
    pub fn definition(&self, id: &DefinitionId) -> Option<&FlatDefinition> {
        self.index.get(id).map(|&i| &self.definitions[i])
    }

    /// The schema a definition stands for, looking through its alias.
    pub fn body_of(&self, id: &DefinitionId) -> Option<&FlatSchema> {
        match &self.definition(id)?.body {
            FlatBody::Schema(schema) => Some(schema),
            FlatBody::Alias(target) => match &self.definition(target)?.body {
                FlatBody::Schema(schema) => Some(schema),
                FlatBody::Alias(_) => None,
            },
        }
    }

    pub fn alias_count(&self) -> usize {
        self.definitions
            .iter()
            .filter(|d| matches!(d.body, FlatBody::Alias(_)))
            .count()
    }
}

struct Promoted {
    id: DefinitionId,
    source_name: Option<String>,
    schema: Arc<ResolvedSchema>,
}

/// Final target of an alias, and whether the chain passed through a cycle.
#[derive(Debug, Clone)]
struct AliasTarget {
    target: DefinitionId,
    via_cycle: bool,
}

pub struct Flattener<'a> {
    spec: &'a ApiSpec,
    resolved: &'a ResolvedDocument,
    options: &'a CompileOptions,
    names: NameAllocator,
    ids: HashMap<SourcePointer, DefinitionId>,
    promoted: Vec<Promoted>,
    aliases: HashMap<DefinitionId, AliasTarget>,
    /// Base pointer to its variants, keyed by discriminator value.
    variants_of: HashMap<SourcePointer, IndexMap<String, DefinitionId>>,
    /// Variant to (base, discriminator value).
    variant_info: HashMap<DefinitionId, (DefinitionId, String)>,
}

impl<'a> Flattener<'a> {
    pub fn new(spec: &'a ApiSpec, resolved: &'a ResolvedDocument, options: &'a CompileOptions) -> Self {
        Self {
            spec,
            resolved,
            options,
            names: NameAllocator::new(options.max_name_suffix),
            ids: HashMap::new(),
            promoted: Vec::new(),
            aliases: HashMap::new(),
            variants_of: HashMap::new(),
            variant_info: HashMap::new(),
        }
    }

    pub fn flatten(mut self) -> Result<FlatDocument, CompileError> {
        let resolved = self.resolved;
        let operations: Vec<(String, &ResolvedOperation)> = resolved
            .operations
            .iter()
            .map(|op| (operation_name(&op.raw), op))
            .collect();

        self.promote_reusable()?;
        if self.options.flatten == FlattenPolicy::Full {
            self.promote_anonymous(&operations)?;
        }
        self.collapse_aliases()?;
        self.register_families()?;

        let this = &self;
        let definitions =
            map_ordered(self.options.parallel, &self.promoted, |p| this.flatten_definition(p))?;
        let operations = map_ordered(self.options.parallel, &operations, |(name, op)| {
            this.flatten_operation(name, op)
        })?;

        let index = definitions
            .iter()
            .enumerate()
            .map(|(i, d)| (d.id.clone(), i))
            .collect();
        Ok(FlatDocument {
            definitions,
            operations,
            index,
        })
    }

    fn promote(&mut self, id: DefinitionId, source_name: Option<String>, schema: Arc<ResolvedSchema>) {
        log_decision!(
            DEFINITION_PROMOTED,
            definition = %id,
            pointer = %schema.pointer,
            "schema promoted to definition"
        );
        self.ids.insert(schema.pointer.clone(), id.clone());
        self.promoted.push(Promoted {
            id,
            source_name,
            schema,
        });
    }

    /// Named schemas, then other reusable identities.
    fn promote_reusable(&mut self) -> Result<(), CompileError> {
        let resolved = self.resolved;
        for def in &resolved.definitions {
            let preferred = def
                .schema
                .extensions
                .str(Extension::GoName)
                .unwrap_or(&def.name);
            let id = self.names.allocate(preferred, &def.schema.pointer)?;
            self.promote(id, Some(def.name.clone()), Arc::clone(&def.schema));
        }

        for (pointer, schema) in &resolved.identities {
            if self.ids.contains_key(pointer) {
                continue;
            }
            let reusable = resolved.cycle_targets.contains(pointer)
                || resolved.ref_count(pointer) > 1
                || pointer.document != self.spec.document;
            if reusable {
                let id = self.names.allocate(&name_from_pointer(pointer), pointer)?;
                self.promote(id, None, Arc::clone(schema));
            }
        }
        Ok(())
    }

    /// Every anonymous object- or enum-shaped schema, named by its position.
    fn promote_anonymous(
        &mut self,
        operations: &[(String, &ResolvedOperation)],
    ) -> Result<(), CompileError> {
        let roots: Vec<(String, Arc<ResolvedSchema>)> = self
            .promoted
            .iter()
            .map(|p| (p.id.to_string(), Arc::clone(&p.schema)))
            .collect();
        for (name, schema) in &roots {
            self.walk_children(schema, name)?;
        }

        for (name, op) in operations {
            let base = identifier(name);
            for param in &op.parameters {
                let hint = format!("{}{}", base, pascal_case(&param.raw.name));
                self.walk(&param.schema, &hint)?;
            }
            if let Some(schema) = op.body.as_ref().and_then(|b| b.schema.as_ref()) {
                self.walk(schema, &format!("{}Body", base))?;
            }
            for response in &op.responses {
                let status = pascal_case(&response.raw.status);
                if let Some(schema) = &response.schema {
                    self.walk(schema, &format!("{}{}Body", base, status))?;
                }
                for (header, schema) in &response.headers {
                    self.walk(schema, &format!("{}{}{}", base, status, pascal_case(header)))?;
                }
            }
        }
        Ok(())
    }

    fn walk(&mut self, node: &ResolvedSchema, hint: &str) -> Result<(), CompileError> {
        match &node.kind {
            ResolvedKind::Link(target) => {
                if !self.ids.contains_key(&target.pointer) {
                    self.walk(target, hint)?;
                }
                return Ok(());
            }
            ResolvedKind::CycleRef(_) => return Ok(()),
            _ => {}
        }
        if self.ids.contains_key(&node.pointer) {
            return Ok(());
        }

        if is_promotable(node) {
            let id = self.names.allocate(hint, &node.pointer)?;
            let name = id.to_string();
            self.promote(id, None, Arc::new(node.clone()));
            self.walk_children(node, &name)
        } else {
            self.walk_children(node, hint)
        }
    }

    fn walk_children(&mut self, node: &ResolvedSchema, base: &str) -> Result<(), CompileError> {
        match &node.kind {
            ResolvedKind::Array(item) => self.walk(item, &format!("{}Items", base)),
            ResolvedKind::Tuple { items, additional } => {
                for (i, item) in items.iter().enumerate() {
                    self.walk(item, &format!("{}Tuple{}", base, i))?;
                }
                if let Some(additional) = additional {
                    self.walk(additional, &format!("{}AdditionalItems", base))?;
                }
                Ok(())
            }
            ResolvedKind::Object(obj) => {
                for (name, prop) in &obj.properties {
                    self.walk(prop, &format!("{}{}", base, pascal_case(name)))?;
                }
                if let ResolvedAdditional::Schema(schema) = &obj.additional {
                    self.walk(schema, &format!("{}AdditionalProperties", base))?;
                }
                Ok(())
            }
            // allOf branches are merged into their parent, so their fields
            // are named after it.
            ResolvedKind::Composed(comp) => {
                for branch in &comp.all_of {
                    match &branch.kind {
                        ResolvedKind::Link(target) if !self.ids.contains_key(&target.pointer) => {
                            self.walk_children(target, base)?
                        }
                        ResolvedKind::Link(_) | ResolvedKind::CycleRef(_) => {}
                        _ => self.walk_children(branch, base)?,
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn collapse_aliases(&mut self) -> Result<(), CompileError> {
        // One hop per pure-reference definition.
        let mut direct: HashMap<DefinitionId, (DefinitionId, bool)> = HashMap::new();
        for p in &self.promoted {
            if !p.schema.is_pure_reference() || p.schema.extensions.has_recognized() {
                continue;
            }
            let Some(target) = p.schema.reference_target() else {
                continue;
            };
            if let Some(target_id) = self.ids.get(target) {
                let via_cycle = matches!(p.schema.kind, ResolvedKind::CycleRef(_));
                direct.insert(p.id.clone(), (target_id.clone(), via_cycle));
            }
        }

        for p in &self.promoted {
            let Some((first, first_cycle)) = direct.get(&p.id) else {
                continue;
            };
            let mut seen = HashSet::from([p.id.clone()]);
            let mut current = first;
            let mut via_cycle = *first_cycle;
            loop {
                if !seen.insert(current.clone()) {
                    return Err(CompileError::unsupported(
                        &p.schema.pointer,
                        format!("alias chain of '{}' closes on itself", p.id),
                    ));
                }
                match direct.get(current) {
                    Some((next, cycle)) => {
                        via_cycle |= *cycle;
                        current = next;
                    }
                    None => break,
                }
            }
            log_decision!(
                ALIAS_COLLAPSED,
                alias = %p.id,
                target = %current,
                hops = seen.len() - 1,
                "alias collapsed"
            );
            self.aliases.insert(
                p.id.clone(),
                AliasTarget {
                    target: current.clone(),
                    via_cycle,
                },
            );
        }
        Ok(())
    }

    fn register_families(&mut self) -> Result<(), CompileError> {
        let mut families = Vec::new();
        for p in &self.promoted {
            if self.aliases.contains_key(&p.id) {
                continue;
            }
            if let Some(discriminator) = p.schema.own_discriminator() {
                let variants = self.collect_variants(p, &discriminator.mapping)?;
                log_decision!(
                    POLYMORPHIC_FAMILY,
                    base = %p.id,
                    discriminator = %discriminator.property_name,
                    variants = variants.len(),
                    "polymorphic family registered"
                );
                families.push((p.id.clone(), p.schema.pointer.clone(), variants));
            }
        }

        for (base, pointer, variants) in families {
            for (value, variant) in &variants {
                self.variant_info
                    .entry(variant.clone())
                    .or_insert_with(|| (base.clone(), value.clone()));
            }
            self.variants_of.insert(pointer, variants);
        }
        Ok(())
    }

    fn collect_variants(
        &self,
        base: &Promoted,
        mapping: &[(String, String)],
    ) -> Result<IndexMap<String, DefinitionId>, CompileError> {
        let mut variants: IndexMap<String, DefinitionId> = IndexMap::new();

        for (value, target) in mapping {
            match self.mapping_target(target, &base.schema.pointer.document) {
                Some(id) => {
                    variants.entry(value.clone()).or_insert(id);
                }
                None => log_tolerated!(
                    DISCRIMINATOR_TARGET_SKIPPED,
                    base = %base.id,
                    value = %value,
                    target = %target,
                    "discriminator mapping target is not a definition"
                ),
            }
        }

        // Definitions that extend the base through allOf.
        for q in &self.promoted {
            if q.id == base.id || self.aliases.contains_key(&q.id) {
                continue;
            }
            if let ResolvedKind::Composed(comp) = &q.schema.kind {
                let extends = comp
                    .all_of
                    .iter()
                    .any(|b| b.reference_target() == Some(&base.schema.pointer));
                if extends {
                    self.add_variant(&mut variants, q);
                }
            }
        }

        // OpenAPI 3 oneOf/anyOf next to the discriminator.
        if let ResolvedKind::Composed(comp) = &base.schema.kind {
            for branch in comp.one_of.iter().chain(&comp.any_of) {
                let id = branch
                    .reference_target()
                    .and_then(|t| self.ids.get(t))
                    .ok_or_else(|| {
                        CompileError::unsupported(
                            &branch.pointer,
                            "variants of a polymorphic schema must reference definitions",
                        )
                    })?;
                let id = self.canonical(id);
                if let Some(q) = self.promoted.iter().find(|q| q.id == id) {
                    self.add_variant(&mut variants, q);
                }
            }
        }

        Ok(variants)
    }

    fn add_variant(&self, variants: &mut IndexMap<String, DefinitionId>, variant: &Promoted) {
        if variants.values().any(|v| *v == variant.id) {
            return;
        }
        let value = variant
            .schema
            .extensions
            .str(Extension::DiscriminatorValue)
            .map(str::to_string)
            .or_else(|| variant.source_name.clone())
            .unwrap_or_else(|| variant.id.to_string());
        variants.entry(value).or_insert_with(|| variant.id.clone());
    }

    /// A mapping value is either a reference or a bare definition name.
    fn mapping_target(&self, target: &str, document: &str) -> Option<DefinitionId> {
        let id = if target.contains('#') || target.contains('/') {
            let pointer = parse_reference(target, document)?;
            self.ids.get(&pointer)?.clone()
        } else {
            self.promoted
                .iter()
                .find(|p| p.source_name.as_deref() == Some(target))?
                .id
                .clone()
        };
        Some(self.canonical(&id))
    }

    fn canonical(&self, id: &DefinitionId) -> DefinitionId {
        self.aliases
            .get(id)
            .map(|a| a.target.clone())
            .unwrap_or_else(|| id.clone())
    }

    fn flatten_definition(&self, p: &Promoted) -> Result<FlatDefinition, CompileError> {
        let body = match self.aliases.get(&p.id) {
            Some(alias) => FlatBody::Alias(alias.target.clone()),
            None => FlatBody::Schema(self.flatten_shape(&p.schema)?),
        };
        let (base, discriminator_value) = match self.variant_info.get(&p.id) {
            Some((base, value)) => (Some(base.clone()), Some(value.clone())),
            None => (None, None),
        };
        Ok(FlatDefinition {
            id: p.id.clone(),
            source_name: p.source_name.clone(),
            pointer: p.schema.pointer.clone(),
            schema: Arc::clone(&p.schema),
            body,
            base,
            discriminator_value,
        })
    }

    fn flatten_operation(
        &self,
        name: &str,
        op: &ResolvedOperation,
    ) -> Result<FlatOperation, CompileError> {
        let parameters = op
            .parameters
            .iter()
            .map(|p| {
                Ok(FlatParameter {
                    raw: p.raw.clone(),
                    schema: self.flatten_child(&p.schema)?,
                })
            })
            .collect::<Result<Vec<_>, CompileError>>()?;

        let body = match &op.body {
            Some(body) => Some(FlatRequestBody {
                raw: body.raw.clone(),
                schema: body
                    .schema
                    .as_ref()
                    .map(|s| self.flatten_child(s))
                    .transpose()?,
            }),
            None => None,
        };

        let mut responses = Vec::with_capacity(op.responses.len());
        for response in &op.responses {
            let headers = response
                .headers
                .iter()
                .map(|(name, schema)| Ok((name.clone(), self.flatten_child(schema)?)))
                .collect::<Result<Vec<_>, CompileError>>()?;
            responses.push(FlatResponse {
                raw: response.raw.clone(),
                schema: response
                    .schema
                    .as_ref()
                    .map(|s| self.flatten_child(s))
                    .transpose()?,
                headers,
            });
        }

        Ok(FlatOperation {
            name: name.to_string(),
            raw: op.raw.clone(),
            parameters,
            body,
            responses,
        })
    }

    /// A schema used from somewhere else: promoted ones become `Named`.
    ///
    /// The use site keeps the node's extensions, so field-level hints
    /// (`x-order`, `x-omitempty`, `x-go-name`) survive promotion.
    fn flatten_child(&self, node: &ResolvedSchema) -> Result<FlatSchema, CompileError> {
        match self.ids.get(&node.pointer) {
            Some(id) => Ok(FlatSchema {
                pointer: node.pointer.clone(),
                kind: FlatKind::Named(self.canonical(id)),
                constraints: Constraints::default(),
                extensions: node.extensions.clone(),
                meta: SchemaMeta {
                    description: node.meta.description.clone(),
                    default: node.meta.default.clone(),
                    read_only: node.meta.read_only,
                    nullable: node.meta.nullable,
                    ..SchemaMeta::default()
                },
            }),
            None => self.flatten_shape(node),
        }
    }

    fn flatten_shape(&self, node: &ResolvedSchema) -> Result<FlatSchema, CompileError> {
        let kind = match &node.kind {
            ResolvedKind::Any => FlatKind::Any,
            ResolvedKind::Primitive { ty, format } => FlatKind::Primitive {
                ty: *ty,
                format: format.clone(),
            },
            ResolvedKind::Array(item) => FlatKind::Array(Box::new(self.flatten_child(item)?)),
            ResolvedKind::Tuple { items, additional } => FlatKind::Tuple {
                items: items
                    .iter()
                    .map(|i| self.flatten_child(i))
                    .collect::<Result<Vec<_>, CompileError>>()?,
                additional: additional
                    .as_deref()
                    .map(|a| self.flatten_child(a).map(Box::new))
                    .transpose()?,
            },
            ResolvedKind::Object(obj) => match self.variants_of.get(&node.pointer) {
                Some(variants) => self.flatten_union(node, variants)?,
                None => FlatKind::Object(self.flat_object(&MergedObject::from_object(obj))?),
            },
            ResolvedKind::Composed(comp) => return self.flatten_composed(node, comp),
            ResolvedKind::Link(target) => return self.flatten_link(node, target),
            ResolvedKind::CycleRef(target) => {
                let id = self.ids.get(target).ok_or_else(|| {
                    CompileError::unsupported(
                        &node.pointer,
                        format!("cycle through {} has no definition", target),
                    )
                })?;
                FlatKind::Cycle(self.canonical(id))
            }
            ResolvedKind::Unsupported(reason) => {
                return Err(CompileError::unsupported(&node.pointer, reason.clone()))
            }
        };
        Ok(FlatSchema {
            pointer: node.pointer.clone(),
            kind,
            constraints: node.constraints.clone(),
            extensions: node.extensions.clone(),
            meta: node.meta.clone(),
        })
    }

    fn flatten_link(
        &self,
        site: &ResolvedSchema,
        target: &ResolvedSchema,
    ) -> Result<FlatSchema, CompileError> {
        if let Some(id) = self.ids.get(&target.pointer) {
            let kind = match self.aliases.get(id) {
                Some(alias) if alias.via_cycle => FlatKind::Cycle(alias.target.clone()),
                Some(alias) => FlatKind::Named(alias.target.clone()),
                None => FlatKind::Named(id.clone()),
            };
            return Ok(FlatSchema {
                pointer: site.pointer.clone(),
                kind,
                constraints: site.constraints.clone(),
                extensions: site.extensions.clone(),
                meta: site.meta.clone(),
            });
        }

        // Referenced once and not reusable: inline it under the site's annotations.
        let mut flat = self.flatten_shape(target)?;
        flat.pointer = site.pointer.clone();
        flat.extensions = site.extensions.overlay(&flat.extensions);
        if site.meta.title.is_some() {
            flat.meta.title = site.meta.title.clone();
        }
        if site.meta.description.is_some() {
            flat.meta.description = site.meta.description.clone();
        }
        flat.meta.nullable |= site.meta.nullable;
        Ok(flat)
    }

    fn flatten_composed(
        &self,
        node: &ResolvedSchema,
        comp: &ResolvedComposition,
    ) -> Result<FlatSchema, CompileError> {
        let mut constraints = node.constraints.clone();
        let kind = if let Some(variants) = self.variants_of.get(&node.pointer) {
            self.flatten_union(node, variants)?
        } else if !comp.one_of.is_empty() || !comp.any_of.is_empty() {
            let reason = if comp.discriminator.is_some() {
                "polymorphic schemas with a discriminator must be definitions"
            } else {
                "oneOf/anyOf without a discriminator (untagged union)"
            };
            return Err(CompileError::unsupported(&node.pointer, reason));
        } else {
            match merge_all_of(node, comp, &self.resolved.identities)? {
                Merged::Any => FlatKind::Any,
                Merged::Primitive {
                    ty,
                    format,
                    constraints: merged,
                } => {
                    constraints = merged;
                    FlatKind::Primitive { ty, format }
                }
                Merged::Single(inner) => {
                    let mut flat = self.flatten_shape(inner)?;
                    flat.pointer = node.pointer.clone();
                    flat.extensions = node.extensions.overlay(&flat.extensions);
                    if node.meta.description.is_some() {
                        flat.meta.description = node.meta.description.clone();
                    }
                    return Ok(flat);
                }
                Merged::Object(obj) => FlatKind::Object(self.flat_object(&obj)?),
            }
        };
        Ok(FlatSchema {
            pointer: node.pointer.clone(),
            kind,
            constraints,
            extensions: node.extensions.clone(),
            meta: node.meta.clone(),
        })
    }

    fn flatten_union(
        &self,
        node: &ResolvedSchema,
        variants: &IndexMap<String, DefinitionId>,
    ) -> Result<FlatKind, CompileError> {
        let discriminator = node
            .own_discriminator()
            .map(|d| d.property_name.clone())
            .ok_or_else(|| CompileError::unsupported(&node.pointer, "missing discriminator"))?;
        let base = base_object(node, &self.resolved.identities)?;
        Ok(FlatKind::Union {
            discriminator,
            base: self.flat_object(&base)?,
            variants: variants.clone(),
        })
    }

    fn flat_object(&self, obj: &MergedObject<'_>) -> Result<FlatObject, CompileError> {
        let properties = obj
            .properties
            .iter()
            .map(|(name, prop)| {
                Ok(FlatProperty {
                    name: name.clone(),
                    schema: self.flatten_child(prop)?,
                    required: obj.is_required(name),
                })
            })
            .collect::<Result<Vec<_>, CompileError>>()?;
        let additional = match obj.additional {
            None | Some(ResolvedAdditional::Unspecified) => FlatAdditional::Unspecified,
            Some(ResolvedAdditional::Allowed(allowed)) => FlatAdditional::Allowed(*allowed),
            Some(ResolvedAdditional::Schema(schema)) => {
                FlatAdditional::Schema(Box::new(self.flatten_child(schema)?))
            }
        };
        Ok(FlatObject {
            properties,
            additional,
            discriminator: obj.discriminator.map(|d| d.property_name.clone()),
        })
    }
}

/// Name of an operation: its `operationId`, else method and path.
pub(crate) fn operation_name(op: &RawOperation) -> String {
    match &op.operation_id {
        Some(id) if !id.is_empty() => id.clone(),
        _ => identifier(&format!("{} {}", op.method.to_lowercase(), op.path)),
    }
}

/// Name for a promoted schema that has none in the source.
fn name_from_pointer(pointer: &SourcePointer) -> String {
    let words: Vec<String> = pointer
        .segments()
        .into_iter()
        .filter(|s| !STRUCTURAL_SEGMENTS.contains(&s.as_str()))
        .filter(|s| s.parse::<usize>().is_err())
        .collect();
    if words.is_empty() {
        let file = pointer.document.rsplit('/').next().unwrap_or(&pointer.document);
        return file.split('.').next().unwrap_or(file).to_string();
    }
    pascal_case(&words.join(" "))
}

/// Whether the full policy gives an anonymous schema its own definition.
fn is_promotable(node: &ResolvedSchema) -> bool {
    match &node.kind {
        ResolvedKind::Object(obj) => !obj.properties.is_empty() || obj.discriminator.is_some(),
        ResolvedKind::Composed(comp) => {
            !comp.one_of.is_empty()
                || !comp.any_of.is_empty()
                || comp.all_of.iter().any(|b| {
                    matches!(
                        b.target().kind,
                        ResolvedKind::Object(_)
                            | ResolvedKind::Composed(_)
                            | ResolvedKind::CycleRef(_)
                    )
                })
        }
        ResolvedKind::Primitive { .. } | ResolvedKind::Any => {
            !node.constraints.enum_values.is_empty()
        }
        _ => false,
    }
}
