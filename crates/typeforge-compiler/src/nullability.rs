//! Nullability decisions for fields and parameters.
//!
//! First match wins: explicit extension hint, `required`, default value,
//! then the configured policy. Collections and open values are never
//! wrapped; an optional outcome for them is reported as defaulted.

use typeforge_spec_parser::Extensions;

use crate::catalog::{external_hint, ExternalShape, TypeCatalog};
use crate::flatten::{FlatAdditional, FlatDocument, FlatKind, FlatSchema};
use crate::model::Nullability;
use crate::options::{NullablePolicy, NullablePrecedence};

/// Named definitions are followed at most this deep when classifying a use.
const MAX_SHAPE_DEPTH: usize = 32;

/// Coarse classification of a value, as far as wrapping is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// Primitives, enums, opaque or scalar externals.
    Scalar,
    /// Objects with fields.
    Composite,
    /// Arrays, maps, tuples.
    Collection,
    /// Untyped values; they can hold null themselves.
    Open,
    /// Recursion markers and polymorphic references.
    Indirect,
}

/// The inputs of one decision.
#[derive(Debug, Clone, Copy)]
pub struct Site<'a> {
    pub extensions: &'a Extensions,
    /// `nullable: true` or `"null"` in `type` at the use site.
    pub nullable: bool,
    /// Root schema of the definition the site refers to, if any.
    pub definition: Option<&'a FlatSchema>,
    pub required: bool,
    pub has_default: bool,
    pub shape: ValueShape,
}

impl<'a> Site<'a> {
    pub fn new(
        schema: &'a FlatSchema,
        required: bool,
        flat: &'a FlatDocument,
        catalog: &dyn TypeCatalog,
    ) -> Self {
        let definition = match &schema.kind {
            FlatKind::Named(id) | FlatKind::Cycle(id) => flat.body_of(id),
            _ => None,
        };
        Self {
            extensions: &schema.extensions,
            nullable: schema.meta.nullable,
            definition,
            required,
            has_default: schema.meta.default.is_some(),
            shape: shape_of(schema, flat, catalog),
        }
    }
}

/// The explicit hint for a site, if there is one.
///
/// Extensions at the site, then on the referenced definition, each in
/// `precedence` order; then the `nullable` keyword.
pub fn explicit_hint(site: &Site<'_>, precedence: NullablePrecedence) -> Option<bool> {
    let order = precedence.order();
    let from = |extensions: &Extensions| order.iter().find_map(|ext| extensions.bool(*ext));

    from(site.extensions)
        .or_else(|| site.definition.and_then(|d| from(&d.extensions)))
        .or_else(|| {
            let keyword = site.nullable || site.definition.is_some_and(|d| d.meta.nullable);
            keyword.then_some(true)
        })
}

pub fn decide(
    site: &Site<'_>,
    policy: NullablePolicy,
    precedence: NullablePrecedence,
) -> Nullability {
    let outcome = match explicit_hint(site, precedence) {
        Some(true) => Nullability::Optional,
        Some(false) => Nullability::NonNull,
        None if site.required => Nullability::NonNull,
        None if site.has_default => Nullability::Defaulted,
        None => match (policy, site.shape) {
            (NullablePolicy::NullableByDefault, _) => Nullability::Optional,
            (NullablePolicy::OptionalScalars, ValueShape::Scalar | ValueShape::Indirect) => {
                Nullability::Optional
            }
            (NullablePolicy::OptionalScalars, _) => Nullability::Defaulted,
        },
    };

    match (outcome, site.shape) {
        (Nullability::Optional, ValueShape::Collection | ValueShape::Open) => {
            Nullability::Defaulted
        }
        _ => outcome,
    }
}

/// Classify a schema, looking through named definitions.
pub fn shape_of(schema: &FlatSchema, flat: &FlatDocument, catalog: &dyn TypeCatalog) -> ValueShape {
    shape_at(schema, flat, catalog, 0)
}

fn shape_at(
    schema: &FlatSchema,
    flat: &FlatDocument,
    catalog: &dyn TypeCatalog,
    depth: usize,
) -> ValueShape {
    if let Some(identifier) = external_hint(&schema.extensions) {
        // Lookup failures are reported by the builder.
        return match catalog.lookup(&identifier) {
            Ok(ExternalShape::Object) => ValueShape::Composite,
            Ok(ExternalShape::Collection) => ValueShape::Collection,
            _ => ValueShape::Scalar,
        };
    }

    match &schema.kind {
        FlatKind::Primitive { .. } => ValueShape::Scalar,
        FlatKind::Any if !schema.constraints.enum_values.is_empty() => ValueShape::Scalar,
        FlatKind::Any => ValueShape::Open,
        FlatKind::Array(_) | FlatKind::Tuple { .. } => ValueShape::Collection,
        FlatKind::Object(obj) if obj.properties.is_empty() => match obj.additional {
            FlatAdditional::Schema(_) | FlatAdditional::Allowed(true) => ValueShape::Collection,
            FlatAdditional::Allowed(false) => ValueShape::Composite,
            FlatAdditional::Unspecified => ValueShape::Open,
        },
        FlatKind::Object(_) => ValueShape::Composite,
        FlatKind::Union { .. } | FlatKind::Cycle(_) => ValueShape::Indirect,
        FlatKind::Named(id) => {
            if depth >= MAX_SHAPE_DEPTH {
                return ValueShape::Composite;
            }
            flat.body_of(id)
                .map(|body| shape_at(body, flat, catalog, depth + 1))
                .unwrap_or(ValueShape::Composite)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Map, Value};
    use typeforge_spec_parser::{Constraints, SchemaMeta, SourcePointer};

    fn extensions(nullable: Option<bool>, is_nullable: Option<bool>) -> Extensions {
        let mut map = Map::new();
        if let Some(b) = nullable {
            map.insert("x-nullable".into(), Value::Bool(b));
        }
        if let Some(b) = is_nullable {
            map.insert("x-isnullable".into(), Value::Bool(b));
        }
        Extensions::from_object(&map)
    }

    fn site(extensions: &Extensions, required: bool, shape: ValueShape) -> Site<'_> {
        Site {
            extensions,
            nullable: false,
            definition: None,
            required,
            has_default: false,
            shape,
        }
    }

    const DEFAULTS: (NullablePolicy, NullablePrecedence) =
        (NullablePolicy::OptionalScalars, NullablePrecedence::XNullable);

    fn decide_default(site: &Site<'_>) -> Nullability {
        decide(site, DEFAULTS.0, DEFAULTS.1)
    }

    #[test]
    fn extension_false_beats_missing_required() {
        let ext = extensions(Some(false), None);
        assert_eq!(
            decide_default(&site(&ext, false, ValueShape::Composite)),
            Nullability::NonNull
        );
        assert_eq!(
            decide_default(&site(&ext, false, ValueShape::Scalar)),
            Nullability::NonNull
        );
    }

    #[test]
    fn extension_true_beats_required() {
        let ext = extensions(None, Some(true));
        assert_eq!(
            decide_default(&site(&ext, true, ValueShape::Composite)),
            Nullability::Optional
        );
    }

    #[test]
    fn required_then_default_then_policy() {
        let ext = Extensions::default();
        assert_eq!(
            decide_default(&site(&ext, true, ValueShape::Scalar)),
            Nullability::NonNull
        );

        let mut with_default = site(&ext, false, ValueShape::Scalar);
        with_default.has_default = true;
        assert_eq!(decide_default(&with_default), Nullability::Defaulted);

        assert_eq!(
            decide_default(&site(&ext, false, ValueShape::Scalar)),
            Nullability::Optional
        );
        assert_eq!(
            decide_default(&site(&ext, false, ValueShape::Composite)),
            Nullability::Defaulted
        );
        assert_eq!(
            decide_default(&site(&ext, false, ValueShape::Indirect)),
            Nullability::Optional
        );
        assert_eq!(
            decide(
                &site(&ext, false, ValueShape::Composite),
                NullablePolicy::NullableByDefault,
                NullablePrecedence::XNullable
            ),
            Nullability::Optional
        );
    }

    #[test]
    fn collections_are_never_optional() {
        let ext = extensions(Some(true), None);
        for shape in [ValueShape::Collection, ValueShape::Open] {
            assert_eq!(
                decide(
                    &site(&ext, false, shape),
                    NullablePolicy::NullableByDefault,
                    NullablePrecedence::XNullable
                ),
                Nullability::Defaulted
            );
        }
    }

    #[test]
    fn disagreeing_extensions_follow_configured_precedence() {
        let ext = extensions(Some(false), Some(true));
        let s = site(&ext, false, ValueShape::Scalar);
        assert_eq!(
            decide(&s, NullablePolicy::OptionalScalars, NullablePrecedence::XNullable),
            Nullability::NonNull
        );
        assert_eq!(
            decide(&s, NullablePolicy::OptionalScalars, NullablePrecedence::XIsNullable),
            Nullability::Optional
        );
    }

    #[test]
    fn site_hint_beats_definition_hint() {
        let definition = FlatSchema {
            pointer: SourcePointer::new("api.yaml", "/definitions/Pet"),
            kind: FlatKind::Any,
            constraints: Constraints::default(),
            extensions: Extensions::from_object(
                json!({ "x-nullable": true }).as_object().unwrap(),
            ),
            meta: SchemaMeta::default(),
        };
        let at_site = extensions(Some(false), None);
        let mut s = site(&at_site, false, ValueShape::Composite);
        s.definition = Some(&definition);
        assert_eq!(decide_default(&s), Nullability::NonNull);

        let nothing = Extensions::default();
        let mut s = site(&nothing, false, ValueShape::Composite);
        s.definition = Some(&definition);
        assert_eq!(decide_default(&s), Nullability::Optional);
    }

    #[test]
    fn nullable_keyword_counts_after_extensions() {
        let ext = extensions(Some(false), None);
        let mut s = site(&ext, false, ValueShape::Scalar);
        s.nullable = true;
        assert_eq!(decide_default(&s), Nullability::NonNull);

        let none = Extensions::default();
        let mut s = site(&none, true, ValueShape::Scalar);
        s.nullable = true;
        assert_eq!(decide_default(&s), Nullability::Optional);
    }

    fn shape_strategy() -> impl Strategy<Value = ValueShape> {
        prop_oneof![
            Just(ValueShape::Scalar),
            Just(ValueShape::Composite),
            Just(ValueShape::Collection),
            Just(ValueShape::Open),
            Just(ValueShape::Indirect),
        ]
    }

    fn policy_strategy() -> impl Strategy<Value = NullablePolicy> {
        prop_oneof![
            Just(NullablePolicy::OptionalScalars),
            Just(NullablePolicy::NullableByDefault),
        ]
    }

    proptest! {
        #[test]
        fn explicit_false_is_never_optional(
            is_nullable in proptest::option::of(any::<bool>()),
            required in any::<bool>(),
            has_default in any::<bool>(),
            keyword in any::<bool>(),
            shape in shape_strategy(),
            policy in policy_strategy(),
        ) {
            let ext = extensions(Some(false), is_nullable);
            let s = Site {
                extensions: &ext,
                nullable: keyword,
                definition: None,
                required,
                has_default,
                shape,
            };
            prop_assert_eq!(decide(&s, policy, NullablePrecedence::XNullable), Nullability::NonNull);
        }

        #[test]
        fn precedence_order_is_respected(
            nullable in proptest::option::of(any::<bool>()),
            is_nullable in proptest::option::of(any::<bool>()),
            required in any::<bool>(),
            has_default in any::<bool>(),
            shape in shape_strategy(),
            policy in policy_strategy(),
        ) {
            let ext = extensions(nullable, is_nullable);
            let s = Site {
                extensions: &ext,
                nullable: false,
                definition: None,
                required,
                has_default,
                shape,
            };
            let decided = decide(&s, policy, NullablePrecedence::XNullable);
            let collection = matches!(shape, ValueShape::Collection | ValueShape::Open);

            let expected = match nullable.or(is_nullable) {
                Some(true) if collection => Nullability::Defaulted,
                Some(true) => Nullability::Optional,
                Some(false) => Nullability::NonNull,
                None if required => Nullability::NonNull,
                None if has_default => Nullability::Defaulted,
                None if collection => Nullability::Defaulted,
                None => match (policy, shape) {
                    (NullablePolicy::NullableByDefault, _) => Nullability::Optional,
                    (_, ValueShape::Scalar | ValueShape::Indirect) => Nullability::Optional,
                    _ => Nullability::Defaulted,
                },
            };
            prop_assert_eq!(decided, expected);
        }
    }
}
