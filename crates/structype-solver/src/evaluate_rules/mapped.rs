//! Mapped type evaluation: `{ [P in K]: Template }`
//!
//! Homomorphic mapped types (`K` is `keyof T`) walk the properties of `T`
//! and keep each property's `?` and `readonly` unless the mapped type adds
//! or removes them. Over arrays and tuples they map the elements instead.
//! Any other `K` must evaluate to a finite union of literal keys; each key
//! becomes a required, mutable property.

use crate::errors::SolverError;
use crate::evaluate::TypeEvaluator;
use crate::format::TypeFormatter;
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::intern::TypeInterner;
use crate::type_resolver::TypeResolver;
use crate::types::*;
use crate::utils::number_to_string;
use crate::visitor::{contains_type_parameters, union_members};
use indexmap::IndexMap;
use structype_common::{Atom, CheckerOptions};
use tracing::trace;

/// `readonly` and `?` changes applied to every property of a mapping.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyModifiers {
    pub readonly: Option<MappedModifier>,
    pub optional: Option<MappedModifier>,
}

impl PropertyModifiers {
    /// `Partial<T>`
    pub const PARTIAL: Self = Self {
        readonly: None,
        optional: Some(MappedModifier::Add),
    };
    /// `Required<T>`
    pub const REQUIRED: Self = Self {
        readonly: None,
        optional: Some(MappedModifier::Remove),
    };
    /// `Readonly<T>`
    pub const READONLY: Self = Self {
        readonly: Some(MappedModifier::Add),
        optional: None,
    };

    fn apply(self, prop: &PropertyInfo) -> (bool, bool) {
        (
            apply_modifier(self.optional, prop.optional),
            apply_modifier(self.readonly, prop.readonly),
        )
    }
}

impl From<&MappedType> for PropertyModifiers {
    fn from(mapped: &MappedType) -> Self {
        Self {
            readonly: mapped.readonly_modifier,
            optional: mapped.optional_modifier,
        }
    }
}

fn apply_modifier(modifier: Option<MappedModifier>, current: bool) -> bool {
    match modifier {
        Some(MappedModifier::Add) => true,
        Some(MappedModifier::Remove) => false,
        None => current,
    }
}

fn remove_undefined(interner: &TypeInterner, type_id: TypeId) -> TypeId {
    let members = union_members(interner, type_id);
    if !members.contains(&TypeId::UNDEFINED) {
        return type_id;
    }
    interner.union(
        members
            .into_iter()
            .filter(|member| *member != TypeId::UNDEFINED)
            .collect(),
    )
}

/// Keys a mapped type iterates over.
enum MappedKeys {
    Literals(Vec<Atom>),
    /// `string`, `number`, `symbol` or something not yet known.
    Open,
}

impl<'a, R: TypeResolver> TypeEvaluator<'a, R> {
    pub(crate) fn evaluate_mapped(
        &mut self,
        type_id: TypeId,
        mapped: &MappedType,
    ) -> Result<TypeId, SolverError> {
        if let Some(TypeData::KeyOf(operand)) = self.interner.lookup(mapped.constraint) {
            return self.evaluate_homomorphic_mapped(type_id, mapped, operand);
        }

        let constraint = self.try_evaluate(mapped.constraint)?;
        if contains_type_parameters(self.interner, constraint) {
            return Ok(type_id);
        }
        let MappedKeys::Literals(keys) = self.mapped_keys(constraint) else {
            trace!(mapped = type_id.0, "mapped type over open key set stays deferred");
            return Ok(type_id);
        };

        let mut properties: IndexMap<Atom, PropertyInfo> = IndexMap::with_capacity(keys.len());
        for name in keys {
            let value = self.instantiate_template(mapped, self.key_type(name))?;
            let prop = PropertyInfo::new(name, value);
            let (optional, readonly) = PropertyModifiers::from(mapped).apply(&prop);
            properties.insert(name, prop.with_optional(optional).with_readonly(readonly));
        }
        Ok(self.interner.object(properties.into_values().collect()))
    }

    /// `{ [P in keyof T]: ... }`
    fn evaluate_homomorphic_mapped(
        &mut self,
        type_id: TypeId,
        mapped: &MappedType,
        operand: TypeId,
    ) -> Result<TypeId, SolverError> {
        let source = self.try_evaluate(operand)?;
        if contains_type_parameters(self.interner, source) {
            return Ok(type_id);
        }
        if source.is_never() {
            return Ok(TypeId::NEVER);
        }

        let modifiers = PropertyModifiers::from(mapped);
        let Some(data) = self.interner.lookup(source) else {
            return Ok(type_id);
        };
        match data {
            TypeData::Union(list_id) => {
                // Homomorphic mappings distribute over unions.
                let members = self.interner.type_list(list_id);
                let mut mapped_members = Vec::with_capacity(members.len());
                for &member in members.iter() {
                    mapped_members.push(self.map_homomorphic_member(type_id, mapped, member)?);
                }
                Ok(self.interner.union(mapped_members))
            }
            TypeData::Array(_) | TypeData::Tuple(_) | TypeData::ReadonlyType(_) => {
                self.map_array_like(mapped, source, modifiers)
            }
            _ => self.map_homomorphic_member(type_id, mapped, source),
        }
    }

    fn map_homomorphic_member(
        &mut self,
        type_id: TypeId,
        mapped: &MappedType,
        source: TypeId,
    ) -> Result<TypeId, SolverError> {
        let modifiers = PropertyModifiers::from(mapped);
        let Some(data) = self.interner.lookup(source) else {
            return Ok(type_id);
        };
        let shape = match data {
            TypeData::Object(shape_id) => self.interner.object_shape(shape_id),
            TypeData::Array(_) | TypeData::Tuple(_) | TypeData::ReadonlyType(_) => {
                return self.map_array_like(mapped, source, modifiers);
            }
            TypeData::Intersection(list_id) => {
                let members = self.interner.type_list(list_id).to_vec();
                match self.checker().merged_object_view(&members) {
                    Some(merged) => return self.map_homomorphic_member(type_id, mapped, merged),
                    None => return Ok(type_id),
                }
            }
            TypeData::Intrinsic(_) | TypeData::Literal(_) => {
                // Primitives map to themselves.
                return Ok(source);
            }
            _ => return Ok(type_id),
        };

        let direct_index = self.is_direct_index_template(mapped);
        let mut properties = Vec::with_capacity(shape.properties.len());
        for prop in &shape.properties {
            let mut value = if direct_index {
                // `T[P]` reads the declared type, without the `undefined` an
                // indexed access adds for optional properties.
                prop.type_id
            } else {
                self.instantiate_template(mapped, self.key_type(prop.name))?
            };
            let (optional, readonly) = modifiers.apply(prop);
            if prop.optional && !optional {
                value = remove_undefined(self.interner, value);
            }
            properties.push(PropertyInfo {
                name: prop.name,
                type_id: value,
                optional,
                readonly,
            });
        }
        Ok(self.interner.object(properties))
    }

    /// Mapping an array or tuple maps its elements; `-readonly` and
    /// `readonly` apply to the container.
    fn map_array_like(
        &mut self,
        mapped: &MappedType,
        source: TypeId,
        modifiers: PropertyModifiers,
    ) -> Result<TypeId, SolverError> {
        let (inner, was_readonly) = match self.interner.lookup(source) {
            Some(TypeData::ReadonlyType(inner)) => (inner, true),
            _ => (source, false),
        };
        let mapped_inner = match self.interner.lookup(inner) {
            Some(TypeData::Array(_)) => {
                let mut element = self.instantiate_template(mapped, TypeId::NUMBER)?;
                match modifiers.optional {
                    Some(MappedModifier::Add) => {
                        element = self.interner.union2(element, TypeId::UNDEFINED);
                    }
                    Some(MappedModifier::Remove) => {
                        element = remove_undefined(self.interner, element);
                    }
                    None => {}
                }
                self.interner.array(element)
            }
            Some(TypeData::Tuple(list_id)) => {
                let elements = self.interner.tuple_list(list_id);
                let mut mapped_elements = Vec::with_capacity(elements.len());
                for (index, element) in elements.iter().enumerate() {
                    if element.rest {
                        let spread = self.instantiate_template(mapped, TypeId::NUMBER)?;
                        mapped_elements.push(TupleElement::rest(self.interner.array(spread)));
                        continue;
                    }
                    let key = self.interner.literal_string(&index.to_string());
                    let mut value = self.instantiate_template(mapped, key)?;
                    let optional = apply_modifier(modifiers.optional, element.optional);
                    if element.optional {
                        // The indexed access added `undefined` for the `?`.
                        value = remove_undefined(self.interner, value);
                    }
                    mapped_elements.push(TupleElement {
                        type_id: value,
                        optional,
                        rest: false,
                    });
                }
                self.interner.tuple(mapped_elements)
            }
            _ => return Ok(source),
        };
        let readonly = apply_modifier(modifiers.readonly, was_readonly);
        Ok(if readonly {
            self.interner.readonly(mapped_inner)
        } else {
            mapped_inner
        })
    }

    /// Whether the template is exactly `T[P]` over the mapped `keyof T`.
    fn is_direct_index_template(&self, mapped: &MappedType) -> bool {
        let Some(TypeData::KeyOf(operand)) = self.interner.lookup(mapped.constraint) else {
            return false;
        };
        let Some(TypeData::IndexAccess(object, index)) = self.interner.lookup(mapped.template)
        else {
            return false;
        };
        object == operand
            && matches!(
                self.interner.lookup(index),
                Some(TypeData::TypeParameter(info)) if info.name == mapped.type_param.name
            )
    }

    fn instantiate_template(
        &mut self,
        mapped: &MappedType,
        key: TypeId,
    ) -> Result<TypeId, SolverError> {
        let mut subst = TypeSubstitution::new();
        subst.insert(mapped.type_param.name, key);
        let template = instantiate_type(self.interner, mapped.template, &subst);
        self.try_evaluate(template)
    }

    fn key_type(&self, name: Atom) -> TypeId {
        self.interner.literal_string(&self.interner.resolve_atom(name))
    }

    fn mapped_keys(&self, constraint: TypeId) -> MappedKeys {
        if constraint.is_never() {
            return MappedKeys::Literals(Vec::new());
        }
        let mut names = Vec::new();
        for key in union_members(self.interner, constraint) {
            match self.interner.lookup(key) {
                Some(TypeData::Literal(LiteralValue::String(name))) => names.push(name),
                Some(TypeData::Literal(LiteralValue::Number(value))) => {
                    names.push(self.interner.intern_string(&number_to_string(value.0)));
                }
                _ => return MappedKeys::Open,
            }
        }
        MappedKeys::Literals(names)
    }
}

/// Build an object type with `transform(name, type)` for every property of
/// `source`, then apply `modifiers` to every property.
///
/// `source` may be a reference or generic application; it is evaluated
/// through `resolver` first. Removing `?` also removes `undefined` from the
/// property type before it is transformed.
///
/// ```ignore
/// // Partial<{ a: string }>  ==>  { a?: string }
/// map_properties(&interner, &env, &options, source, |_, ty| ty, PropertyModifiers::PARTIAL)?;
/// ```
pub fn map_properties<R, F>(
    interner: &TypeInterner,
    resolver: &R,
    options: &CheckerOptions,
    source: TypeId,
    mut transform: F,
    modifiers: PropertyModifiers,
) -> Result<TypeId, SolverError>
where
    R: TypeResolver,
    F: FnMut(Atom, TypeId) -> TypeId,
{
    let evaluated = TypeEvaluator::with_resolver(interner, resolver)
        .with_options(*options)
        .try_evaluate(source)?;
    let Some(TypeData::Object(shape_id)) = interner.lookup(evaluated) else {
        return Err(SolverError::NotAnObjectType {
            type_name: TypeFormatter::new(interner)
                .with_resolver(resolver)
                .format(source),
        });
    };
    let shape = interner.object_shape(shape_id);
    let properties = shape
        .properties
        .iter()
        .map(|prop| {
            let (optional, readonly) = modifiers.apply(prop);
            let declared = if prop.optional && !optional {
                remove_undefined(interner, prop.type_id)
            } else {
                prop.type_id
            };
            PropertyInfo {
                name: prop.name,
                type_id: transform(prop.name, declared),
                optional,
                readonly,
            }
        })
        .collect();
    Ok(interner.object(properties))
}

#[cfg(test)]
#[path = "../../tests/mapped_tests.rs"]
mod tests;
