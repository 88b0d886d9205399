//! Indexed access `T[K]` evaluation.
//!
//! ```typescript
//! type A = { a: string; b?: number }["b"];   // number | undefined
//! type B = string[][number];                 // string
//! type C = [boolean, string][0 | 1];         // boolean | string
//! type D = (X | Y)["kind"];                  // X["kind"] | Y["kind"]
//! ```
//!
//! A key the object does not have evaluates to `error`.

use crate::errors::SolverError;
use crate::evaluate::TypeEvaluator;
use crate::type_resolver::TypeResolver;
use crate::types::*;
use crate::utils::{number_to_string, tuple_index};
use crate::visitor::contains_type_parameters;
use tracing::trace;

impl<'a, R: TypeResolver> TypeEvaluator<'a, R> {
    pub(crate) fn evaluate_index_access(
        &mut self,
        type_id: TypeId,
        object: TypeId,
        index: TypeId,
    ) -> Result<TypeId, SolverError> {
        let evaluated_object = self.try_evaluate(object)?;
        let evaluated_index = self.try_evaluate(index)?;

        if contains_type_parameters(self.interner, evaluated_object)
            || contains_type_parameters(self.interner, evaluated_index)
        {
            if evaluated_object == object && evaluated_index == index {
                return Ok(type_id);
            }
            return Ok(self.interner.index_access(evaluated_object, evaluated_index));
        }

        self.index_into(evaluated_object, evaluated_index)
    }

    fn index_into(&mut self, object: TypeId, index: TypeId) -> Result<TypeId, SolverError> {
        if object.is_any() || index.is_any() {
            return Ok(TypeId::ANY);
        }
        if object.is_error() || index.is_error() {
            return Ok(TypeId::ERROR);
        }
        if index.is_never() {
            return Ok(TypeId::NEVER);
        }

        if let Some(TypeData::Union(list_id)) = self.interner.lookup(index) {
            let mut results = Vec::new();
            for &key in self.interner.type_list(list_id).iter() {
                results.push(self.index_into(object, key)?);
            }
            return Ok(self.interner.union(results));
        }

        let Some(data) = self.interner.lookup(object) else {
            return Ok(TypeId::ERROR);
        };
        let result = match data {
            TypeData::Union(list_id) => {
                let mut results = Vec::new();
                for &member in self.interner.type_list(list_id).iter() {
                    results.push(self.index_into(member, index)?);
                }
                self.interner.union(results)
            }
            TypeData::Object(shape_id) => {
                let shape = self.interner.object_shape(shape_id);
                self.property_of(&shape, index)
            }
            TypeData::Intersection(list_id) => {
                let members = self.interner.type_list(list_id).to_vec();
                match self.checker().merged_object_view(&members) {
                    Some(merged) => self.index_into(merged, index)?,
                    None => {
                        let mut found = Vec::new();
                        for member in members {
                            let value = self.index_into(member, index)?;
                            if !value.is_error() {
                                found.push(value);
                            }
                        }
                        if found.is_empty() {
                            TypeId::ERROR
                        } else {
                            self.interner.intersection(found)
                        }
                    }
                }
            }
            TypeData::Array(element) => {
                if self.is_numeric_key(index) {
                    element
                } else if self.is_length_key(index) {
                    TypeId::NUMBER
                } else {
                    TypeId::ERROR
                }
            }
            TypeData::Tuple(list_id) => {
                let elements = self.interner.tuple_list(list_id);
                self.tuple_element_at(&elements, index)
            }
            TypeData::ReadonlyType(inner) => self.index_into(inner, index)?,
            TypeData::Intrinsic(IntrinsicKind::String)
            | TypeData::Literal(LiteralValue::String(_))
            | TypeData::TemplateLiteral(_) => {
                if self.is_numeric_key(index) {
                    TypeId::STRING
                } else if self.is_length_key(index) {
                    TypeId::NUMBER
                } else {
                    TypeId::ERROR
                }
            }
            _ => TypeId::ERROR,
        };
        if result.is_error() {
            trace!(object = object.0, index = index.0, "indexed access has no such key");
        }
        Ok(result)
    }

    fn property_of(&self, shape: &ObjectShape, index: TypeId) -> TypeId {
        let Some(name) = self.key_text(index) else {
            return TypeId::ERROR;
        };
        let name = self.interner.intern_string(&name);
        match shape.find(name) {
            Some(prop) if prop.optional => self.interner.union2(prop.type_id, TypeId::UNDEFINED),
            Some(prop) => prop.type_id,
            None => TypeId::ERROR,
        }
    }

    fn tuple_element_at(&self, elements: &[TupleElement], index: TypeId) -> TypeId {
        if index == TypeId::NUMBER {
            let values = elements
                .iter()
                .map(|element| {
                    if element.rest {
                        self.interner.rest_element_type(element.type_id)
                    } else if element.optional {
                        self.interner.union2(element.type_id, TypeId::UNDEFINED)
                    } else {
                        element.type_id
                    }
                })
                .collect();
            return self.interner.union(values);
        }
        if self.is_length_key(index) {
            return self.tuple_length(elements);
        }
        let Some(position) = self.key_text(index).and_then(|text| tuple_index(&text)) else {
            return TypeId::ERROR;
        };
        for (at, element) in elements.iter().enumerate() {
            if element.rest {
                // Positions past a rest element can be any later element.
                let mut tail = vec![self.interner.rest_element_type(element.type_id)];
                tail.extend(elements[at + 1..].iter().map(|e| e.type_id));
                return self.interner.union(tail);
            }
            if at == position {
                return if element.optional {
                    self.interner.union2(element.type_id, TypeId::UNDEFINED)
                } else {
                    element.type_id
                };
            }
        }
        TypeId::ERROR
    }

    fn tuple_length(&self, elements: &[TupleElement]) -> TypeId {
        if elements.iter().any(|element| element.rest) {
            return TypeId::NUMBER;
        }
        let required = elements.iter().filter(|element| !element.optional).count();
        let lengths = (required..=elements.len())
            .map(|length| self.interner.literal_number(length as f64))
            .collect();
        self.interner.union(lengths)
    }

    /// Property name a literal key stands for.
    fn key_text(&self, index: TypeId) -> Option<String> {
        match self.interner.lookup(index)? {
            TypeData::Literal(LiteralValue::String(name)) => {
                Some(self.interner.resolve_atom(name).to_string())
            }
            TypeData::Literal(LiteralValue::Number(value)) => Some(number_to_string(value.0)),
            _ => None,
        }
    }

    fn is_numeric_key(&self, index: TypeId) -> bool {
        index == TypeId::NUMBER
            || matches!(
                self.interner.lookup(index),
                Some(TypeData::Literal(LiteralValue::Number(_)))
            )
    }

    fn is_length_key(&self, index: TypeId) -> bool {
        self.key_text(index).is_some_and(|text| text == "length")
    }
}
