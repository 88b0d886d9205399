//! `keyof T` evaluation.
//!
//! - object types give the union of their property names
//! - arrays give `number | "length"`, tuples add their positions
//! - `keyof (A | B)` keeps only the keys both sides have
//! - `keyof (A & B)` combines the keys of both
//! - `keyof any` is `string | number | symbol`, `keyof unknown` is `never`

use crate::errors::SolverError;
use crate::evaluate::TypeEvaluator;
use crate::type_resolver::TypeResolver;
use crate::types::*;
use crate::utils::is_numeric_literal_name;
use crate::visitor::{contains_type_parameters, union_members};
use structype_common::Atom;

impl<'a, R: TypeResolver> TypeEvaluator<'a, R> {
    pub(crate) fn evaluate_keyof(
        &mut self,
        type_id: TypeId,
        operand: TypeId,
    ) -> Result<TypeId, SolverError> {
        let evaluated = self.try_evaluate(operand)?;

        // `keyof { [P in K]: X }` is `K` even while `K` is generic.
        if let Some(TypeData::Mapped(mapped_id)) = self.interner.lookup(evaluated) {
            let mapped = self.interner.mapped_type(mapped_id);
            return self.try_evaluate(mapped.constraint);
        }

        if contains_type_parameters(self.interner, evaluated)
            || matches!(self.interner.lookup(evaluated), Some(TypeData::Lazy(_)))
        {
            if evaluated == operand {
                return Ok(type_id);
            }
            return Ok(self.interner.keyof(evaluated));
        }

        self.keys_of(evaluated)
    }

    fn keys_of(&mut self, operand: TypeId) -> Result<TypeId, SolverError> {
        match operand {
            TypeId::ANY | TypeId::NEVER => return Ok(self.property_key_type()),
            TypeId::UNKNOWN | TypeId::ERROR => return Ok(TypeId::NEVER),
            _ => {}
        }
        let Some(data) = self.interner.lookup(operand) else {
            return Ok(TypeId::NEVER);
        };
        let keys = match data {
            TypeData::Object(shape_id) => {
                let shape = self.interner.object_shape(shape_id);
                let keys = shape
                    .properties
                    .iter()
                    .map(|prop| self.key_literal(prop.name))
                    .collect();
                self.interner.union(keys)
            }
            TypeData::Array(_) => {
                let length = self.interner.literal_string("length");
                self.interner.union2(TypeId::NUMBER, length)
            }
            TypeData::Tuple(list_id) => {
                let elements = self.interner.tuple_list(list_id);
                let mut keys = vec![TypeId::NUMBER, self.interner.literal_string("length")];
                for (index, element) in elements.iter().enumerate() {
                    if element.rest {
                        break;
                    }
                    keys.push(self.interner.literal_string(&index.to_string()));
                }
                self.interner.union(keys)
            }
            TypeData::ReadonlyType(inner) => return self.keys_of(inner),
            TypeData::Intrinsic(IntrinsicKind::String)
            | TypeData::Literal(LiteralValue::String(_))
            | TypeData::TemplateLiteral(_) => {
                let length = self.interner.literal_string("length");
                self.interner.union2(TypeId::NUMBER, length)
            }
            TypeData::Union(list_id) => {
                let members = self.interner.type_list(list_id);
                let mut common: Option<Vec<TypeId>> = None;
                for &member in members.iter() {
                    let keys = self.keys_of(member)?;
                    let keys = union_members(self.interner, keys);
                    common = Some(match common {
                        None => keys,
                        Some(previous) => self.common_keys(&previous, &keys),
                    });
                }
                self.interner.union(common.unwrap_or_default())
            }
            TypeData::Intersection(list_id) => {
                let members = self.interner.type_list(list_id);
                let mut keys = Vec::with_capacity(members.len());
                for &member in members.iter() {
                    keys.push(self.keys_of(member)?);
                }
                self.interner.union(keys)
            }
            _ => TypeId::NEVER,
        };
        Ok(keys)
    }

    /// Keys of `left` also present in `right`, where a literal key is
    /// present in a key set holding its primitive.
    fn common_keys(&self, left: &[TypeId], right: &[TypeId]) -> Vec<TypeId> {
        let covered = |key: TypeId, set: &[TypeId]| {
            set.contains(&key)
                || match self.interner.lookup(key) {
                    Some(TypeData::Literal(value)) => set.contains(&value.primitive()),
                    _ => false,
                }
        };
        let mut common: Vec<TypeId> = left
            .iter()
            .copied()
            .filter(|key| covered(*key, right))
            .collect();
        let extra: Vec<TypeId> = right
            .iter()
            .copied()
            .filter(|key| !common.contains(key) && covered(*key, left))
            .collect();
        common.extend(extra);
        common
    }

    /// `"name"`, or a number literal for numeric names (`0`, `1.5`).
    fn key_literal(&self, name: Atom) -> TypeId {
        let text = self.interner.resolve_atom(name);
        if is_numeric_literal_name(&text)
            && let Ok(value) = text.parse::<f64>()
        {
            return self.interner.literal_number(value);
        }
        self.interner.literal_string(&text)
    }

    /// `string | number | symbol`
    pub(crate) fn property_key_type(&self) -> TypeId {
        self.interner
            .union(vec![TypeId::STRING, TypeId::NUMBER, TypeId::SYMBOL])
    }
}
