//! Type interning.
//!
//! `TypeInterner` hash-conses [`TypeData`] into [`TypeId`]s and owns the
//! side tables for variable-length payloads. All constructors normalise their
//! input so that structurally equal types always intern to the same id:
//!
//! - unions and intersections are flattened, deduplicated and sorted
//! - object properties are sorted by name
//! - tuple spreads of tuple types are spliced in place
//! - template literals with only literal holes collapse to string literals
//!
//! Every table is a `DashMap`, so one interner can be shared by threads that
//! run independent queries.

use crate::def::DefId;
use crate::types::*;
use crate::utils::number_to_string;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use structype_common::{Atom, ShardedInterner};
use tracing::trace;

/// Intersections over unions are distributed (`(A | B) & C` becomes
/// `(A & C) | (B & C)`) only while the cross product stays this small.
pub const MAX_INTERSECTION_DISTRIBUTION: usize = 32;

// =============================================================================
// InternTable
// =============================================================================

/// Bidirectional table for one kind of side-table payload.
struct InternTable<T> {
    ids: DashMap<Arc<T>, u32>,
    values: DashMap<u32, Arc<T>>,
    next: AtomicU32,
    empty: Arc<T>,
}

impl<T: Eq + Hash + Default> InternTable<T> {
    fn new() -> Self {
        Self {
            ids: DashMap::new(),
            values: DashMap::new(),
            next: AtomicU32::new(0),
            empty: Arc::new(T::default()),
        }
    }

    fn intern(&self, value: T) -> u32 {
        if let Some(id) = self.ids.get(&value) {
            return *id;
        }
        let value = Arc::new(value);
        match self.ids.entry(value.clone()) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let id = self.next.fetch_add(1, Ordering::Relaxed);
                self.values.insert(id, value);
                entry.insert(id);
                id
            }
        }
    }

    /// Ids from another interner resolve to the default payload.
    fn get(&self, id: u32) -> Arc<T> {
        self.values
            .get(&id)
            .map(|value| value.clone())
            .unwrap_or_else(|| self.empty.clone())
    }

    fn len(&self) -> usize {
        self.values.len()
    }
}

// =============================================================================
// TypeInterner
// =============================================================================

pub struct TypeInterner {
    atoms: ShardedInterner,
    types: DashMap<TypeData, TypeId>,
    type_data: DashMap<u32, TypeData>,
    next_type: AtomicU32,
    object_shapes: InternTable<ObjectShape>,
    tuple_lists: InternTable<Vec<TupleElement>>,
    type_lists: InternTable<Vec<TypeId>>,
    function_shapes: InternTable<FunctionShape>,
    applications: InternTable<TypeApplication>,
    conditionals: InternTable<ConditionalType>,
    mapped_types: InternTable<MappedType>,
    template_lists: InternTable<Vec<TemplateSpan>>,
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeInterner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeInterner")
            .field("types", &self.type_data.len())
            .field("object_shapes", &self.object_shapes.len())
            .finish()
    }
}

impl TypeInterner {
    pub fn new() -> Self {
        let interner = Self {
            atoms: ShardedInterner::new(),
            types: DashMap::new(),
            type_data: DashMap::new(),
            next_type: AtomicU32::new(TypeId::FIRST_USER),
            object_shapes: InternTable::new(),
            tuple_lists: InternTable::new(),
            type_lists: InternTable::new(),
            function_shapes: InternTable::new(),
            applications: InternTable::new(),
            conditionals: InternTable::new(),
            mapped_types: InternTable::new(),
            template_lists: InternTable::new(),
        };
        for kind in IntrinsicKind::ALL {
            interner.register_fixed(kind.type_id(), TypeData::Intrinsic(kind));
        }
        interner.register_fixed(
            TypeId::BOOLEAN_TRUE,
            TypeData::Literal(LiteralValue::Boolean(true)),
        );
        interner.register_fixed(
            TypeId::BOOLEAN_FALSE,
            TypeData::Literal(LiteralValue::Boolean(false)),
        );
        interner
    }

    fn register_fixed(&self, id: TypeId, data: TypeData) {
        self.types.insert(data, id);
        self.type_data.insert(id.0, data);
    }

    // -------------------------------------------------------------------------
    // Core table access
    // -------------------------------------------------------------------------

    pub fn intern(&self, data: TypeData) -> TypeId {
        if let Some(id) = self.types.get(&data) {
            return *id;
        }
        match self.types.entry(data) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let id = TypeId(self.next_type.fetch_add(1, Ordering::Relaxed));
                self.type_data.insert(id.0, data);
                entry.insert(id);
                id
            }
        }
    }

    pub fn lookup(&self, id: TypeId) -> Option<TypeData> {
        self.type_data.get(&id.0).map(|data| *data)
    }

    /// Number of interned types, intrinsics included.
    pub fn len(&self) -> usize {
        self.type_data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.type_data.is_empty()
    }

    pub fn intern_string(&self, value: &str) -> Atom {
        self.atoms.intern(value)
    }

    pub fn resolve_atom(&self, atom: Atom) -> Arc<str> {
        self.atoms.resolve(atom)
    }

    pub fn object_shape(&self, id: ObjectShapeId) -> Arc<ObjectShape> {
        self.object_shapes.get(id.0)
    }

    pub fn tuple_list(&self, id: TupleListId) -> Arc<Vec<TupleElement>> {
        self.tuple_lists.get(id.0)
    }

    pub fn type_list(&self, id: TypeListId) -> Arc<Vec<TypeId>> {
        self.type_lists.get(id.0)
    }

    pub fn function_shape(&self, id: FunctionShapeId) -> Arc<FunctionShape> {
        self.function_shapes.get(id.0)
    }

    pub fn type_application(&self, id: TypeApplicationId) -> Arc<TypeApplication> {
        self.applications.get(id.0)
    }

    pub fn conditional_type(&self, id: ConditionalTypeId) -> Arc<ConditionalType> {
        self.conditionals.get(id.0)
    }

    pub fn mapped_type(&self, id: MappedTypeId) -> Arc<MappedType> {
        self.mapped_types.get(id.0)
    }

    pub fn template_list(&self, id: TemplateLiteralId) -> Arc<Vec<TemplateSpan>> {
        self.template_lists.get(id.0)
    }

    // -------------------------------------------------------------------------
    // Literals
    // -------------------------------------------------------------------------

    pub fn literal_string(&self, value: &str) -> TypeId {
        let atom = self.intern_string(value);
        self.intern(TypeData::Literal(LiteralValue::String(atom)))
    }

    pub fn literal_number(&self, value: f64) -> TypeId {
        self.intern(TypeData::Literal(LiteralValue::Number(OrderedFloat(value))))
    }

    pub fn literal_boolean(&self, value: bool) -> TypeId {
        if value {
            TypeId::BOOLEAN_TRUE
        } else {
            TypeId::BOOLEAN_FALSE
        }
    }

    pub fn literal_bigint(&self, digits: &str) -> TypeId {
        let atom = self.intern_string(digits);
        self.intern(TypeData::Literal(LiteralValue::BigInt(atom)))
    }

    // -------------------------------------------------------------------------
    // Objects, arrays, tuples, functions
    // -------------------------------------------------------------------------

    pub fn object(&self, properties: Vec<PropertyInfo>) -> TypeId {
        self.object_with_flags(properties, ObjectFlags::empty())
    }

    /// Object type of an object literal expression; subject to excess
    /// property checks until widened.
    pub fn object_fresh(&self, properties: Vec<PropertyInfo>) -> TypeId {
        self.object_with_flags(properties, ObjectFlags::FRESH_LITERAL)
    }

    pub fn object_with_flags(
        &self,
        mut properties: Vec<PropertyInfo>,
        flags: ObjectFlags,
    ) -> TypeId {
        properties.sort_by_key(|prop| prop.name);
        // Later duplicates win.
        properties.dedup_by(|later, earlier| {
            if later.name == earlier.name {
                *earlier = *later;
                true
            } else {
                false
            }
        });
        let shape = self.object_shapes.intern(ObjectShape { flags, properties });
        self.intern(TypeData::Object(ObjectShapeId(shape)))
    }

    /// `{}`
    pub fn empty_object(&self) -> TypeId {
        self.object(Vec::new())
    }

    pub fn array(&self, element: TypeId) -> TypeId {
        self.intern(TypeData::Array(element))
    }

    /// `readonly T[]` / `readonly [..]`. Wrapping twice is a no-op.
    pub fn readonly(&self, inner: TypeId) -> TypeId {
        if let Some(TypeData::ReadonlyType(_)) = self.lookup(inner) {
            return inner;
        }
        self.intern(TypeData::ReadonlyType(inner))
    }

    pub fn tuple(&self, elements: Vec<TupleElement>) -> TypeId {
        let mut flat: Vec<TupleElement> = Vec::with_capacity(elements.len());
        for element in elements {
            if element.rest {
                let spread = match self.lookup(element.type_id) {
                    Some(TypeData::ReadonlyType(inner)) => inner,
                    _ => element.type_id,
                };
                if let Some(TypeData::Tuple(list)) = self.lookup(spread) {
                    flat.extend(self.tuple_list(list).iter().copied());
                    continue;
                }
            }
            flat.push(element);
        }

        // More than one rest element: everything from the first rest onwards
        // collapses into a single rest of the union of the element types.
        if flat.iter().filter(|element| element.rest).count() > 1 {
            let first_rest = flat.iter().position(|element| element.rest).unwrap_or(0);
            let tail: Vec<TypeId> = flat[first_rest..]
                .iter()
                .map(|element| {
                    if element.rest {
                        self.rest_element_type(element.type_id)
                    } else {
                        element.type_id
                    }
                })
                .collect();
            flat.truncate(first_rest);
            let tail_union = self.union(tail);
            flat.push(TupleElement::rest(self.array(tail_union)));
        }

        let list = self.tuple_lists.intern(flat);
        self.intern(TypeData::Tuple(TupleListId(list)))
    }

    /// Convenience: `[A, B, C]`.
    pub fn tuple_of(&self, types: &[TypeId]) -> TypeId {
        self.tuple(types.iter().copied().map(TupleElement::required).collect())
    }

    /// Convenience: `[A, B, ...R[]]`.
    pub fn tuple_with_rest(&self, fixed: &[TypeId], rest_element: TypeId) -> TypeId {
        let mut elements: Vec<TupleElement> =
            fixed.iter().copied().map(TupleElement::required).collect();
        elements.push(TupleElement::rest(self.array(rest_element)));
        self.tuple(elements)
    }

    /// Element type produced by spreading `spread` (`...spread`).
    pub fn rest_element_type(&self, spread: TypeId) -> TypeId {
        match self.lookup(spread) {
            Some(TypeData::Array(element)) => element,
            Some(TypeData::ReadonlyType(inner)) => self.rest_element_type(inner),
            Some(TypeData::Tuple(list)) => {
                let elements = self.tuple_list(list);
                let members = elements
                    .iter()
                    .map(|element| {
                        if element.rest {
                            self.rest_element_type(element.type_id)
                        } else {
                            element.type_id
                        }
                    })
                    .collect();
                self.union(members)
            }
            Some(TypeData::Intrinsic(IntrinsicKind::Any)) => TypeId::ANY,
            _ => self.index_access(spread, TypeId::NUMBER),
        }
    }

    pub fn function(&self, shape: FunctionShape) -> TypeId {
        let id = self.function_shapes.intern(shape);
        self.intern(TypeData::Function(FunctionShapeId(id)))
    }

    /// Convenience: `(params) => return_type`.
    pub fn function_type(&self, params: Vec<ParamInfo>, return_type: TypeId) -> TypeId {
        self.function(FunctionShape::new(params, return_type))
    }

    /// Convenience: `new (params) => instance_type`.
    pub fn constructor_type(&self, params: Vec<ParamInfo>, instance_type: TypeId) -> TypeId {
        self.function(FunctionShape {
            params,
            return_type: instance_type,
            is_constructor: true,
        })
    }

    // -------------------------------------------------------------------------
    // Generics and type-level operators
    // -------------------------------------------------------------------------

    pub fn type_param(&self, name: &str, constraint: Option<TypeId>) -> TypeId {
        let name = self.intern_string(name);
        self.intern(TypeData::TypeParameter(TypeParamInfo { name, constraint }))
    }

    pub fn type_param_info(&self, info: TypeParamInfo) -> TypeId {
        self.intern(TypeData::TypeParameter(info))
    }

    /// `infer Name`
    pub fn infer(&self, name: &str) -> TypeId {
        let name = self.intern_string(name);
        self.intern(TypeData::Infer(TypeParamInfo {
            name,
            constraint: None,
        }))
    }

    pub fn lazy(&self, def_id: DefId) -> TypeId {
        self.intern(TypeData::Lazy(def_id))
    }

    /// `Def<Args>`. With no arguments this is just the lazy reference.
    pub fn application(&self, def_id: DefId, args: Vec<TypeId>) -> TypeId {
        let base = self.lazy(def_id);
        if args.is_empty() {
            return base;
        }
        let id = self.applications.intern(TypeApplication { base, args });
        self.intern(TypeData::Application(TypeApplicationId(id)))
    }

    pub fn conditional(&self, conditional: ConditionalType) -> TypeId {
        let id = self.conditionals.intern(conditional);
        self.intern(TypeData::Conditional(ConditionalTypeId(id)))
    }

    pub fn mapped(&self, mapped: MappedType) -> TypeId {
        let id = self.mapped_types.intern(mapped);
        self.intern(TypeData::Mapped(MappedTypeId(id)))
    }

    pub fn index_access(&self, object: TypeId, index: TypeId) -> TypeId {
        self.intern(TypeData::IndexAccess(object, index))
    }

    pub fn keyof(&self, operand: TypeId) -> TypeId {
        self.intern(TypeData::KeyOf(operand))
    }

    pub fn template_literal(&self, spans: Vec<TemplateSpan>) -> TypeId {
        let mut normalized: Vec<TemplateSpan> = Vec::with_capacity(spans.len());
        let mut text = String::new();
        for span in spans {
            match span {
                TemplateSpan::Text(atom) => text.push_str(&self.resolve_atom(atom)),
                TemplateSpan::Type(type_id) => match self.lookup(type_id) {
                    Some(TypeData::Literal(LiteralValue::String(atom)))
                    | Some(TypeData::Literal(LiteralValue::BigInt(atom))) => {
                        text.push_str(&self.resolve_atom(atom));
                    }
                    Some(TypeData::Literal(LiteralValue::Number(value))) => {
                        text.push_str(&number_to_string(value.0));
                    }
                    Some(TypeData::Literal(LiteralValue::Boolean(value))) => {
                        text.push_str(if value { "true" } else { "false" });
                    }
                    Some(TypeData::Intrinsic(IntrinsicKind::Never)) => return TypeId::NEVER,
                    _ => {
                        if !text.is_empty() {
                            normalized.push(TemplateSpan::Text(self.intern_string(&text)));
                            text.clear();
                        }
                        normalized.push(TemplateSpan::Type(type_id));
                    }
                },
            }
        }
        if normalized.is_empty() {
            return self.literal_string(&text);
        }
        if !text.is_empty() {
            normalized.push(TemplateSpan::Text(self.intern_string(&text)));
        }
        if normalized.as_slice() == [TemplateSpan::Type(TypeId::STRING)] {
            return TypeId::STRING;
        }
        let id = self.template_lists.intern(normalized);
        self.intern(TypeData::TemplateLiteral(TemplateLiteralId(id)))
    }

    // -------------------------------------------------------------------------
    // Unions
    // -------------------------------------------------------------------------

    pub fn union2(&self, a: TypeId, b: TypeId) -> TypeId {
        self.union(vec![a, b])
    }

    pub fn union(&self, members: Vec<TypeId>) -> TypeId {
        let mut flat: SmallVec<[TypeId; 8]> = SmallVec::new();
        for member in members {
            match self.lookup(member) {
                Some(TypeData::Union(list)) => flat.extend(self.type_list(list).iter().copied()),
                _ => flat.push(member),
            }
        }

        if flat.contains(&TypeId::ERROR) {
            return TypeId::ERROR;
        }
        if flat.contains(&TypeId::ANY) {
            return TypeId::ANY;
        }
        if flat.contains(&TypeId::UNKNOWN) {
            return TypeId::UNKNOWN;
        }
        flat.retain(|member| !member.is_never());
        flat.sort_unstable();
        flat.dedup();

        // Literal members are absorbed by their primitive.
        let has_string = flat.contains(&TypeId::STRING);
        let has_number = flat.contains(&TypeId::NUMBER);
        let has_boolean = flat.contains(&TypeId::BOOLEAN);
        let has_bigint = flat.contains(&TypeId::BIGINT);
        if has_string || has_number || has_boolean || has_bigint {
            flat.retain(|member| match self.lookup(*member) {
                Some(TypeData::Literal(literal)) => match literal.primitive() {
                    TypeId::STRING => !has_string,
                    TypeId::NUMBER => !has_number,
                    TypeId::BOOLEAN => !has_boolean,
                    TypeId::BIGINT => !has_bigint,
                    _ => true,
                },
                Some(TypeData::TemplateLiteral(_)) => !has_string,
                _ => true,
            });
        }

        if flat.contains(&TypeId::BOOLEAN_TRUE) && flat.contains(&TypeId::BOOLEAN_FALSE) {
            flat.retain(|member| {
                *member != TypeId::BOOLEAN_TRUE && *member != TypeId::BOOLEAN_FALSE
            });
            flat.push(TypeId::BOOLEAN);
            flat.sort_unstable();
        }

        match flat.len() {
            0 => TypeId::NEVER,
            1 => flat[0],
            _ => {
                let list = self.type_lists.intern(flat.into_vec());
                self.intern(TypeData::Union(TypeListId(list)))
            }
        }
    }

    // -------------------------------------------------------------------------
    // Intersections
    // -------------------------------------------------------------------------

    pub fn intersection2(&self, a: TypeId, b: TypeId) -> TypeId {
        self.intersection(vec![a, b])
    }

    pub fn intersection(&self, members: Vec<TypeId>) -> TypeId {
        let mut flat: SmallVec<[TypeId; 8]> = SmallVec::new();
        for member in members {
            match self.lookup(member) {
                Some(TypeData::Intersection(list)) => {
                    flat.extend(self.type_list(list).iter().copied())
                }
                _ => flat.push(member),
            }
        }

        if flat.contains(&TypeId::NEVER) {
            return TypeId::NEVER;
        }
        if flat.contains(&TypeId::ERROR) {
            return TypeId::ERROR;
        }
        if flat.contains(&TypeId::ANY) {
            return TypeId::ANY;
        }
        flat.retain(|member| !member.is_unknown());
        flat.sort_unstable();
        flat.dedup();

        match flat.len() {
            0 => return TypeId::UNKNOWN,
            1 => return flat[0],
            _ => {}
        }

        if let Some(distributed) = self.distribute_intersection(&flat) {
            return distributed;
        }

        if self.has_disjoint_primitives(&flat) {
            trace!(members = ?flat, "intersection of disjoint primitives reduces to never");
            return TypeId::NEVER;
        }

        // `"a" & string` is `"a"`.
        let literal_primitives: FxHashSet<TypeId> = flat
            .iter()
            .filter_map(|member| match self.lookup(*member) {
                Some(TypeData::Literal(literal)) => Some(literal.primitive()),
                _ => None,
            })
            .collect();
        if !literal_primitives.is_empty() {
            flat.retain(|member| !literal_primitives.contains(member));
        }

        match flat.len() {
            0 => TypeId::UNKNOWN,
            1 => flat[0],
            _ => {
                let list = self.type_lists.intern(flat.into_vec());
                self.intern(TypeData::Intersection(TypeListId(list)))
            }
        }
    }

    fn distribute_intersection(&self, members: &[TypeId]) -> Option<TypeId> {
        let unions: Vec<(usize, Arc<Vec<TypeId>>)> = members
            .iter()
            .enumerate()
            .filter_map(|(index, member)| match self.lookup(*member) {
                Some(TypeData::Union(list)) => Some((index, self.type_list(list))),
                _ => None,
            })
            .collect();
        if unions.is_empty() {
            return None;
        }
        let product = unions
            .iter()
            .try_fold(1usize, |acc, (_, list)| acc.checked_mul(list.len()))?;
        if product > MAX_INTERSECTION_DISTRIBUTION {
            return None;
        }

        let mut combinations: Vec<Vec<TypeId>> = vec![
            members
                .iter()
                .enumerate()
                .filter(|(index, _)| !unions.iter().any(|(u, _)| u == index))
                .map(|(_, member)| *member)
                .collect(),
        ];
        for (_, list) in &unions {
            let mut next = Vec::with_capacity(combinations.len() * list.len());
            for combination in &combinations {
                for &choice in list.iter() {
                    let mut extended = combination.clone();
                    extended.push(choice);
                    next.push(extended);
                }
            }
            combinations = next;
        }
        let results = combinations
            .into_iter()
            .map(|combination| self.intersection(combination))
            .collect();
        Some(self.union(results))
    }

    /// Two different primitive families (or two different literals of the
    /// same family) can never share a value.
    fn has_disjoint_primitives(&self, members: &[TypeId]) -> bool {
        let mut families: SmallVec<[TypeId; 4]> = SmallVec::new();
        let mut literals: SmallVec<[TypeId; 4]> = SmallVec::new();
        for &member in members {
            let family = match self.lookup(member) {
                Some(TypeData::Intrinsic(kind)) if kind.is_primitive() => member,
                Some(TypeData::Intrinsic(IntrinsicKind::Object)) => TypeId::OBJECT,
                Some(TypeData::Literal(literal)) => {
                    literals.push(member);
                    literal.primitive()
                }
                Some(TypeData::TemplateLiteral(_)) => TypeId::STRING,
                _ => continue,
            };
            if !families.contains(&family) {
                families.push(family);
            }
        }
        families.len() > 1 || literals.len() > 1
    }
}

#[cfg(test)]
#[path = "../tests/intern_tests.rs"]
mod tests;
