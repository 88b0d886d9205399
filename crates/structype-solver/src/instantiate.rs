//! Generic instantiation.
//!
//! `instantiate_type` rebuilds a type with type parameters (and `infer`
//! placeholders) replaced by the types bound in a [`TypeSubstitution`].
//! Lazy references are left alone; their bodies are instantiated when they
//! are expanded.
//!
//! Distributive conditional types distribute here, at instantiation time:
//! `T extends U ? X : Y` with `T := A | B` becomes the union of the two
//! instantiations, each with `T` bound to one member.

use crate::intern::TypeInterner;
use crate::types::*;
use crate::visitor::union_list_id;
use rustc_hash::FxHashMap;
use structype_common::Atom;

/// Deepest nesting `instantiate_type` will rebuild.
pub const MAX_INSTANTIATION_DEPTH: u32 = 64;

/// Mapping from type parameter name to the type bound to it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeSubstitution {
    map: FxHashMap<Atom, TypeId>,
}

impl TypeSubstitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind declared parameters positionally. Parameters without an argument
    /// fall back to their constraint, then to `unknown`.
    pub fn from_args(params: &[TypeParamInfo], args: &[TypeId]) -> Self {
        let mut subst = Self::new();
        for (index, param) in params.iter().enumerate() {
            let bound = args
                .get(index)
                .copied()
                .or(param.constraint)
                .unwrap_or(TypeId::UNKNOWN);
            subst.insert(param.name, bound);
        }
        subst
    }

    pub fn insert(&mut self, name: Atom, type_id: TypeId) {
        self.map.insert(name, type_id);
    }

    pub fn get(&self, name: Atom) -> Option<TypeId> {
        self.map.get(&name).copied()
    }

    pub fn remove(&mut self, name: Atom) -> Option<TypeId> {
        self.map.remove(&name)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Atom, TypeId)> + '_ {
        self.map.iter().map(|(name, type_id)| (*name, *type_id))
    }

    /// `other`'s bindings win over existing ones.
    pub fn extend(&mut self, other: &TypeSubstitution) {
        for (name, type_id) in other.iter() {
            self.insert(name, type_id);
        }
    }
}

/// Instantiate `type_id` under `subst`.
pub fn instantiate_type(
    interner: &TypeInterner,
    type_id: TypeId,
    subst: &TypeSubstitution,
) -> TypeId {
    if subst.is_empty() {
        return type_id;
    }
    let mut instantiator = TypeInstantiator::new(interner, subst);
    instantiator.instantiate(type_id)
}

pub struct TypeInstantiator<'a> {
    interner: &'a TypeInterner,
    subst: TypeSubstitution,
    cache: FxHashMap<TypeId, TypeId>,
    depth: u32,
}

impl<'a> TypeInstantiator<'a> {
    pub fn new(interner: &'a TypeInterner, subst: &TypeSubstitution) -> Self {
        Self {
            interner,
            subst: subst.clone(),
            cache: FxHashMap::default(),
            depth: 0,
        }
    }

    pub fn instantiate(&mut self, type_id: TypeId) -> TypeId {
        if type_id.is_intrinsic() {
            return type_id;
        }
        if let Some(&cached) = self.cache.get(&type_id) {
            return cached;
        }
        if self.depth >= MAX_INSTANTIATION_DEPTH {
            return type_id;
        }
        self.depth += 1;
        let result = self.instantiate_inner(type_id);
        self.depth -= 1;
        self.cache.insert(type_id, result);
        result
    }

    fn instantiate_inner(&mut self, type_id: TypeId) -> TypeId {
        let Some(data) = self.interner.lookup(type_id) else {
            return type_id;
        };
        let interner = self.interner;
        match data {
            TypeData::Intrinsic(_) | TypeData::Literal(_) | TypeData::Lazy(_) => type_id,
            TypeData::TypeParameter(info) | TypeData::Infer(info) => {
                self.subst.get(info.name).unwrap_or(type_id)
            }
            TypeData::Object(shape_id) => {
                let shape = interner.object_shape(shape_id);
                let properties = shape
                    .properties
                    .iter()
                    .map(|prop| PropertyInfo {
                        type_id: self.instantiate(prop.type_id),
                        ..*prop
                    })
                    .collect();
                interner.object_with_flags(properties, shape.flags)
            }
            TypeData::Array(element) => {
                let element = self.instantiate(element);
                interner.array(element)
            }
            TypeData::ReadonlyType(inner) => {
                let inner = self.instantiate(inner);
                interner.readonly(inner)
            }
            TypeData::Tuple(list_id) => {
                let elements = interner
                    .tuple_list(list_id)
                    .iter()
                    .map(|element| TupleElement {
                        type_id: self.instantiate(element.type_id),
                        ..*element
                    })
                    .collect();
                interner.tuple(elements)
            }
            TypeData::Union(list_id) => {
                let members = interner
                    .type_list(list_id)
                    .iter()
                    .map(|member| self.instantiate(*member))
                    .collect();
                interner.union(members)
            }
            TypeData::Intersection(list_id) => {
                let members = interner
                    .type_list(list_id)
                    .iter()
                    .map(|member| self.instantiate(*member))
                    .collect();
                interner.intersection(members)
            }
            TypeData::Function(shape_id) => {
                let shape = interner.function_shape(shape_id);
                let params = shape
                    .params
                    .iter()
                    .map(|param| ParamInfo {
                        type_id: self.instantiate(param.type_id),
                        ..*param
                    })
                    .collect();
                let return_type = self.instantiate(shape.return_type);
                interner.function(FunctionShape {
                    params,
                    return_type,
                    is_constructor: shape.is_constructor,
                })
            }
            TypeData::Application(app_id) => {
                let app = interner.type_application(app_id);
                let args: Vec<TypeId> = app.args.iter().map(|arg| self.instantiate(*arg)).collect();
                match interner.lookup(app.base) {
                    Some(TypeData::Lazy(def_id)) => interner.application(def_id, args),
                    _ => type_id,
                }
            }
            TypeData::Conditional(cond_id) => {
                let cond = interner.conditional_type(cond_id);
                if let Some(distributed) = self.distribute_conditional(type_id, &cond) {
                    return distributed;
                }
                interner.conditional(ConditionalType {
                    check_type: self.instantiate(cond.check_type),
                    extends_type: self.instantiate(cond.extends_type),
                    true_type: self.instantiate(cond.true_type),
                    false_type: self.instantiate(cond.false_type),
                    is_distributive: cond.is_distributive,
                })
            }
            TypeData::Mapped(mapped_id) => {
                let mapped = interner.mapped_type(mapped_id);
                let constraint = self.instantiate(mapped.constraint);
                // The mapped type's own parameter shadows outer bindings.
                let shadowed = self.subst.remove(mapped.type_param.name);
                let saved_cache = std::mem::take(&mut self.cache);
                let template = self.instantiate(mapped.template);
                self.cache = saved_cache;
                if let Some(previous) = shadowed {
                    self.subst.insert(mapped.type_param.name, previous);
                }
                interner.mapped(MappedType {
                    constraint,
                    template,
                    ..*mapped
                })
            }
            TypeData::IndexAccess(object, index) => {
                let object = self.instantiate(object);
                let index = self.instantiate(index);
                interner.index_access(object, index)
            }
            TypeData::KeyOf(operand) => {
                let operand = self.instantiate(operand);
                interner.keyof(operand)
            }
            TypeData::TemplateLiteral(template_id) => {
                let spans = interner
                    .template_list(template_id)
                    .iter()
                    .map(|span| match span {
                        TemplateSpan::Text(text) => TemplateSpan::Text(*text),
                        TemplateSpan::Type(inner) => TemplateSpan::Type(self.instantiate(*inner)),
                    })
                    .collect();
                interner.template_literal(spans)
            }
        }
    }

    /// A distributive conditional whose checked parameter is bound to a
    /// union is instantiated once per member; `never` yields `never`.
    fn distribute_conditional(
        &mut self,
        type_id: TypeId,
        cond: &ConditionalType,
    ) -> Option<TypeId> {
        if !cond.is_distributive {
            return None;
        }
        let Some(TypeData::TypeParameter(param)) = self.interner.lookup(cond.check_type) else {
            return None;
        };
        let bound = self.subst.get(param.name)?;
        if bound.is_never() {
            return Some(TypeId::NEVER);
        }
        let list_id = union_list_id(self.interner, bound)?;
        let members = self.interner.type_list(list_id);
        let instantiated = members
            .iter()
            .map(|&member| {
                let mut subst = self.subst.clone();
                subst.insert(param.name, member);
                instantiate_type(self.interner, type_id, &subst)
            })
            .collect();
        Some(self.interner.union(instantiated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_inside_structures() {
        let interner = TypeInterner::new();
        let t = interner.type_param("T", None);
        let value = interner.intern_string("value");
        let boxed = interner.object(vec![PropertyInfo::new(value, interner.array(t))]);

        let mut subst = TypeSubstitution::new();
        subst.insert(interner.intern_string("T"), TypeId::STRING);
        let result = instantiate_type(&interner, boxed, &subst);

        let expected = interner.object(vec![PropertyInfo::new(
            value,
            interner.array(TypeId::STRING),
        )]);
        assert_eq!(result, expected);
    }

    #[test]
    fn mapped_parameter_shadows_outer_binding() {
        let interner = TypeInterner::new();
        let p_name = interner.intern_string("P");
        let p = interner.type_param("P", None);
        let mapped = interner.mapped(MappedType {
            type_param: TypeParamInfo {
                name: p_name,
                constraint: None,
            },
            constraint: interner.literal_string("a"),
            template: p,
            readonly_modifier: None,
            optional_modifier: None,
        });

        let mut subst = TypeSubstitution::new();
        subst.insert(p_name, TypeId::NUMBER);
        assert_eq!(instantiate_type(&interner, mapped, &subst), mapped);
    }

    #[test]
    fn missing_arguments_use_constraint() {
        let interner = TypeInterner::new();
        let params = [
            TypeParamInfo {
                name: interner.intern_string("A"),
                constraint: None,
            },
            TypeParamInfo {
                name: interner.intern_string("B"),
                constraint: Some(TypeId::STRING),
            },
        ];
        let subst = TypeSubstitution::from_args(&params, &[TypeId::NUMBER]);
        assert_eq!(subst.get(params[0].name), Some(TypeId::NUMBER));
        assert_eq!(subst.get(params[1].name), Some(TypeId::STRING));
    }
}
