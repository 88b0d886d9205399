//! `infer` pattern matching for conditional types.
//!
//! Matching walks the check type and the `extends` pattern side by side and
//! records, for every `infer X` placeholder it reaches, the type found at the
//! same position together with the variance of that position. Candidates
//! live in a union-find table (one key per placeholder) so that alternatives
//! of a union pattern can be tried and rolled back.
//!
//! ```typescript
//! type R = F extends (...args: any[]) => infer R ? R : never;
//! type E = A extends Array<infer E> ? E : never;
//! type P = F extends (x: infer P) => void ? P : never;   // contravariant
//! type Head = S extends `${infer H}-${string}` ? H : never;
//! ```

use crate::errors::{SolverError, UnresolvedInferenceError};
use crate::evaluate::TypeEvaluator;
use crate::instantiate::TypeSubstitution;
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::type_resolver::TypeResolver;
use crate::types::*;
use crate::utils::number_to_string;
use crate::visitor::{collect_infer_params, contains_infer};
use ena::unify::{InPlace, InPlaceUnificationTable, NoError, Snapshot, UnifyKey, UnifyValue};
use smallvec::SmallVec;
use structype_common::Atom;
use tracing::trace;

use super::template_literal::match_template_spans;

/// Key of one `infer` placeholder in the unification table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct InferVar(u32);

/// Candidates collected for one placeholder, split by variance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct InferCandidates {
    covariant: SmallVec<[TypeId; 2]>,
    contravariant: SmallVec<[TypeId; 2]>,
}

impl InferCandidates {
    fn single(type_id: TypeId, polarity: Polarity) -> Self {
        let mut candidates = Self::default();
        match polarity {
            Polarity::Covariant => candidates.covariant.push(type_id),
            Polarity::Contravariant => candidates.contravariant.push(type_id),
        }
        candidates
    }
}

impl UnifyKey for InferVar {
    type Value = InferCandidates;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        InferVar(u)
    }

    fn tag() -> &'static str {
        "InferVar"
    }
}

impl UnifyValue for InferCandidates {
    type Error = NoError;

    fn unify_values(a: &Self, b: &Self) -> Result<Self, Self::Error> {
        let mut merged = a.clone();
        for &ty in &b.covariant {
            if !merged.covariant.contains(&ty) {
                merged.covariant.push(ty);
            }
        }
        for &ty in &b.contravariant {
            if !merged.contravariant.contains(&ty) {
                merged.contravariant.push(ty);
            }
        }
        Ok(merged)
    }
}

/// Variance of the position being matched.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Polarity {
    Covariant,
    Contravariant,
}

impl Polarity {
    pub(crate) fn flip(self) -> Self {
        match self {
            Self::Covariant => Self::Contravariant,
            Self::Contravariant => Self::Covariant,
        }
    }
}

pub(crate) struct InferSnapshot(Snapshot<InPlace<InferVar>>);

/// Candidate table for the placeholders of one `extends` pattern.
pub(crate) struct InferenceContext {
    table: InPlaceUnificationTable<InferVar>,
    vars: Vec<(TypeParamInfo, InferVar)>,
    guard: RecursionGuard<(TypeId, TypeId)>,
}

impl InferenceContext {
    pub(crate) fn new(params: &[TypeParamInfo]) -> Self {
        let mut table = InPlaceUnificationTable::new();
        let vars = params
            .iter()
            .map(|param| (*param, table.new_key(InferCandidates::default())))
            .collect();
        Self {
            table,
            vars,
            guard: RecursionGuard::with_profile(RecursionProfile::Inference),
        }
    }

    fn var(&self, name: Atom) -> Option<InferVar> {
        self.vars
            .iter()
            .find(|(param, _)| param.name == name)
            .map(|(_, var)| *var)
    }

    pub(crate) fn add_candidate(&mut self, name: Atom, type_id: TypeId, polarity: Polarity) {
        if let Some(var) = self.var(name) {
            self.table
                .union_value(var, InferCandidates::single(type_id, polarity));
        }
    }

    pub(crate) fn probe(&mut self, name: Atom) -> Option<InferCandidates> {
        let var = self.var(name)?;
        Some(self.table.probe_value(var))
    }

    pub(crate) fn snapshot(&mut self) -> InferSnapshot {
        InferSnapshot(self.table.snapshot())
    }

    pub(crate) fn rollback_to(&mut self, snapshot: InferSnapshot) {
        self.table.rollback_to(snapshot.0);
    }

    pub(crate) fn commit(&mut self, snapshot: InferSnapshot) {
        self.table.commit(snapshot.0);
    }

    fn params(&self) -> Vec<TypeParamInfo> {
        self.vars.iter().map(|(param, _)| *param).collect()
    }
}

impl<'a, R: TypeResolver> TypeEvaluator<'a, R> {
    /// Match `source` against `pattern`, collecting candidates in `ctx`.
    ///
    /// A `false` result means the shapes are incompatible; the caller then
    /// takes the false branch.
    pub(crate) fn match_infer_pattern(
        &mut self,
        ctx: &mut InferenceContext,
        source: TypeId,
        pattern: TypeId,
        polarity: Polarity,
    ) -> Result<bool, SolverError> {
        if let Some(TypeData::Infer(info)) = self.interner.lookup(pattern) {
            if let Some(constraint) = info.constraint
                && !self.is_subtype(source, constraint)
            {
                return Ok(false);
            }
            ctx.add_candidate(info.name, source, polarity);
            return Ok(true);
        }

        if !contains_infer(self.interner, pattern) {
            return Ok(match polarity {
                Polarity::Covariant => self.is_subtype(source, pattern),
                // Parameter positions; strictness is settled by the final check.
                Polarity::Contravariant => {
                    self.is_subtype(pattern, source) || self.is_subtype(source, pattern)
                }
            });
        }

        match ctx.guard.enter((source, pattern)) {
            RecursionResult::Entered => {}
            RecursionResult::Cycle => return Ok(true),
            RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => {
                return Err(SolverError::EvaluationDepthExceeded);
            }
        }
        let result = self.match_infer_pattern_inner(ctx, source, pattern, polarity);
        ctx.guard.leave((source, pattern));
        result
    }

    fn match_infer_pattern_inner(
        &mut self,
        ctx: &mut InferenceContext,
        source: TypeId,
        pattern: TypeId,
        polarity: Polarity,
    ) -> Result<bool, SolverError> {
        let source = self.try_evaluate(source)?;

        if source.is_any() || source.is_never() {
            for param in collect_infer_params(self.interner, pattern) {
                ctx.add_candidate(param.name, source, polarity);
            }
            return Ok(true);
        }

        let pattern_data = self.interner.lookup(pattern);

        // A union source matches when every member does; candidates of the
        // members accumulate into a union.
        if let Some(TypeData::Union(list_id)) = self.interner.lookup(source)
            && !matches!(pattern_data, Some(TypeData::Union(_)))
        {
            for &member in self.interner.type_list(list_id).iter() {
                if !self.match_infer_pattern(ctx, member, pattern, polarity)? {
                    return Ok(false);
                }
            }
            return Ok(true);
        }

        let Some(pattern_data) = pattern_data else {
            return Ok(false);
        };
        let Some(source_data) = self.interner.lookup(source) else {
            return Ok(false);
        };

        match (source_data, pattern_data) {
            (_, TypeData::Union(list_id)) => {
                let members = self.interner.type_list(list_id);
                self.match_union_pattern(ctx, source, &members, polarity)
            }
            (_, TypeData::Intersection(list_id)) => {
                for &member in self.interner.type_list(list_id).iter() {
                    if !self.match_infer_pattern(ctx, source, member, polarity)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (TypeData::Application(s_app), TypeData::Application(p_app)) => {
                let s_app = self.interner.type_application(s_app);
                let p_app = self.interner.type_application(p_app);
                if s_app.base == p_app.base && s_app.args.len() == p_app.args.len() {
                    for (&s_arg, &p_arg) in s_app.args.iter().zip(p_app.args.iter()) {
                        if !self.match_infer_pattern(ctx, s_arg, p_arg, polarity)? {
                            return Ok(false);
                        }
                    }
                    return Ok(true);
                }
                self.match_expanded_pattern(ctx, source, pattern, polarity)
            }
            (_, TypeData::Application(_) | TypeData::Lazy(_)) => {
                self.match_expanded_pattern(ctx, source, pattern, polarity)
            }
            (TypeData::Array(s_elem), TypeData::Array(p_elem)) => {
                self.match_infer_pattern(ctx, s_elem, p_elem, polarity)
            }
            (TypeData::Tuple(s_list), TypeData::Array(p_elem)) => {
                let s_elems = self.interner.tuple_list(s_list);
                for elem in s_elems.iter() {
                    let element = self.tuple_element_value(elem);
                    if !self.match_infer_pattern(ctx, element, p_elem, polarity)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (TypeData::Tuple(s_list), TypeData::Tuple(p_list)) => {
                let s_elems = self.interner.tuple_list(s_list);
                let p_elems = self.interner.tuple_list(p_list);
                self.match_tuple_elements(ctx, &s_elems, &p_elems, polarity)
            }
            (TypeData::ReadonlyType(s_inner), TypeData::ReadonlyType(p_inner)) => {
                self.match_infer_pattern(ctx, s_inner, p_inner, polarity)
            }
            (TypeData::ReadonlyType(_), TypeData::Array(_) | TypeData::Tuple(_)) => Ok(false),
            (TypeData::Array(_) | TypeData::Tuple(_), TypeData::ReadonlyType(p_inner)) => {
                self.match_infer_pattern(ctx, source, p_inner, polarity)
            }
            (TypeData::Function(s_fn), TypeData::Function(p_fn)) => {
                let s_shape = self.interner.function_shape(s_fn);
                let p_shape = self.interner.function_shape(p_fn);
                self.match_signature(ctx, &s_shape, &p_shape, polarity)
            }
            (TypeData::Object(s_shape), TypeData::Object(p_shape)) => {
                let s_shape = self.interner.object_shape(s_shape);
                let p_shape = self.interner.object_shape(p_shape);
                self.match_object_properties(ctx, &s_shape, &p_shape, polarity)
            }
            (_, TypeData::Object(p_shape)) => {
                let Some(apparent) = self.checker().apparent_shape(source) else {
                    return Ok(false);
                };
                let p_shape = self.interner.object_shape(p_shape);
                self.match_object_properties(ctx, &apparent, &p_shape, polarity)
            }
            (
                TypeData::Literal(LiteralValue::String(text)),
                TypeData::TemplateLiteral(template_id),
            ) => self.match_template_pattern(ctx, text, template_id, polarity),
            (TypeData::Literal(value), TypeData::TemplateLiteral(template_id)) => {
                // `${1}` style sources match against their rendered text.
                let text = match value {
                    LiteralValue::Number(number) => number_to_string(number.0),
                    LiteralValue::Boolean(flag) => flag.to_string(),
                    LiteralValue::BigInt(digits) => self.interner.resolve_atom(digits).to_string(),
                    LiteralValue::String(_) => return Ok(false),
                };
                let text = self.interner.intern_string(&text);
                self.match_template_pattern(ctx, text, template_id, polarity)
            }
            _ => Ok(false),
        }
    }

    fn match_expanded_pattern(
        &mut self,
        ctx: &mut InferenceContext,
        source: TypeId,
        pattern: TypeId,
        polarity: Polarity,
    ) -> Result<bool, SolverError> {
        let expanded = match self.interner.lookup(pattern) {
            Some(TypeData::Application(app_id)) => {
                let app = self.interner.type_application(app_id);
                match self.interner.lookup(app.base) {
                    Some(TypeData::Lazy(def_id)) => self.expand_application(def_id, &app.args),
                    _ => None,
                }
            }
            Some(TypeData::Lazy(def_id)) => self.resolver.resolve_lazy(def_id, self.interner),
            _ => None,
        };
        match expanded {
            Some(expanded) if expanded != pattern => {
                self.match_infer_pattern(ctx, source, expanded, polarity)
            }
            _ => Ok(false),
        }
    }

    /// `T extends infer U | undefined`: members without placeholders are
    /// tried first by plain assignability; then each member with
    /// placeholders is tried on its own, discarding candidates of failed
    /// attempts.
    fn match_union_pattern(
        &mut self,
        ctx: &mut InferenceContext,
        source: TypeId,
        members: &[TypeId],
        polarity: Polarity,
    ) -> Result<bool, SolverError> {
        let (with_infer, plain): (Vec<TypeId>, Vec<TypeId>) = members
            .iter()
            .partition(|member| contains_infer(self.interner, **member));

        if plain.iter().any(|member| self.is_subtype(source, *member)) {
            return Ok(true);
        }

        for member in with_infer {
            let snapshot = ctx.snapshot();
            if self.match_infer_pattern(ctx, source, member, polarity)? {
                ctx.commit(snapshot);
                return Ok(true);
            }
            ctx.rollback_to(snapshot);
        }
        Ok(false)
    }

    /// Value type of a tuple position: the element type of a rest spread,
    /// widened with `undefined` for optional elements.
    fn tuple_element_value(&self, elem: &TupleElement) -> TypeId {
        if elem.rest {
            self.interner.rest_element_type(elem.type_id)
        } else if elem.optional {
            self.interner.union2(elem.type_id, TypeId::UNDEFINED)
        } else {
            elem.type_id
        }
    }

    /// Tuple patterns: `[infer H, ...infer T]`, `[...infer I, infer L]`.
    ///
    /// The pattern's rest element (at most one) takes the middle of the
    /// source; fixed pattern elements align with the start and the end.
    fn match_tuple_elements(
        &mut self,
        ctx: &mut InferenceContext,
        source: &[TupleElement],
        pattern: &[TupleElement],
        polarity: Polarity,
    ) -> Result<bool, SolverError> {
        let Some(rest_index) = pattern.iter().position(|elem| elem.rest) else {
            if source.iter().any(|elem| elem.rest) || source.len() > pattern.len() {
                return Ok(false);
            }
            for (index, p_elem) in pattern.iter().enumerate() {
                match source.get(index) {
                    Some(s_elem) => {
                        if s_elem.optional && !p_elem.optional {
                            return Ok(false);
                        }
                        let value = self.tuple_element_value(s_elem);
                        if !self.match_infer_pattern(ctx, value, p_elem.type_id, polarity)? {
                            return Ok(false);
                        }
                    }
                    None if p_elem.optional => {}
                    None => return Ok(false),
                }
            }
            return Ok(true);
        };

        let prefix = &pattern[..rest_index];
        let suffix = &pattern[rest_index + 1..];
        let source_rest = source.iter().position(|elem| elem.rest);

        // A source rest can only land in the pattern's middle.
        let fixed_end = source_rest.unwrap_or(source.len());
        if fixed_end < prefix.len() {
            return Ok(false);
        }
        if source_rest.is_some() && !suffix.is_empty() {
            return Ok(false);
        }
        if source.len() < prefix.len() + suffix.len() {
            return Ok(false);
        }

        for (s_elem, p_elem) in source.iter().zip(prefix.iter()) {
            let value = self.tuple_element_value(s_elem);
            if !self.match_infer_pattern(ctx, value, p_elem.type_id, polarity)? {
                return Ok(false);
            }
        }
        let suffix_start = source.len() - suffix.len();
        for (s_elem, p_elem) in source[suffix_start..].iter().zip(suffix.iter()) {
            let value = self.tuple_element_value(s_elem);
            if !self.match_infer_pattern(ctx, value, p_elem.type_id, polarity)? {
                return Ok(false);
            }
        }

        let middle = source[prefix.len()..suffix_start].to_vec();
        let rest_pattern = pattern[rest_index].type_id;
        match self.interner.lookup(rest_pattern) {
            Some(TypeData::Array(p_elem)) => {
                for elem in &middle {
                    let value = self.tuple_element_value(elem);
                    if !self.match_infer_pattern(ctx, value, p_elem, polarity)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => {
                let middle = self.interner.tuple(middle);
                self.match_infer_pattern(ctx, middle, rest_pattern, polarity)
            }
        }
    }

    /// Parameters are matched with flipped variance; a parameter the source
    /// lacks reads as `unknown`. `...args: infer P` takes the remaining
    /// source parameters as a tuple.
    fn match_signature(
        &mut self,
        ctx: &mut InferenceContext,
        source: &FunctionShape,
        pattern: &FunctionShape,
        polarity: Polarity,
    ) -> Result<bool, SolverError> {
        if source.is_constructor != pattern.is_constructor {
            return Ok(false);
        }
        let param_polarity = polarity.flip();

        for (index, p_param) in pattern.params.iter().enumerate() {
            if p_param.rest {
                let remaining: Vec<TupleElement> = source
                    .params
                    .iter()
                    .skip(index)
                    .map(|param| TupleElement {
                        type_id: param.type_id,
                        optional: param.optional,
                        rest: param.rest,
                    })
                    .collect();
                let remaining = self.interner.tuple(remaining);
                if !self.match_infer_pattern(ctx, remaining, p_param.type_id, param_polarity)? {
                    return Ok(false);
                }
                break;
            }
            let s_param = match source.params.get(index) {
                Some(param) if param.rest => self.interner.rest_element_type(param.type_id),
                Some(param) => param.type_id,
                None => match source.rest_param() {
                    Some(rest) => self.interner.rest_element_type(rest.type_id),
                    None => TypeId::UNKNOWN,
                },
            };
            if !self.match_infer_pattern(ctx, s_param, p_param.type_id, param_polarity)? {
                return Ok(false);
            }
        }

        self.match_infer_pattern(ctx, source.return_type, pattern.return_type, polarity)
    }

    fn match_object_properties(
        &mut self,
        ctx: &mut InferenceContext,
        source: &ObjectShape,
        pattern: &ObjectShape,
        polarity: Polarity,
    ) -> Result<bool, SolverError> {
        for p_prop in &pattern.properties {
            let Some(s_prop) = source.find(p_prop.name) else {
                if p_prop.optional {
                    continue;
                }
                return Ok(false);
            };
            if s_prop.optional && !p_prop.optional {
                return Ok(false);
            }
            if !self.match_infer_pattern(ctx, s_prop.type_id, p_prop.type_id, polarity)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Split `text` along the pattern's fixed spans; each `infer` hole binds
    /// the captured substring (as a number literal when constrained to
    /// `number`).
    fn match_template_pattern(
        &mut self,
        ctx: &mut InferenceContext,
        text: Atom,
        template_id: TemplateLiteralId,
        polarity: Polarity,
    ) -> Result<bool, SolverError> {
        let text = self.interner.resolve_atom(text);
        let spans = self.interner.template_list(template_id);
        let Some(captures) = match_template_spans(self.interner, &text, &spans) else {
            return Ok(false);
        };
        for (hole, captured) in captures {
            let Some(TypeData::Infer(info)) = self.interner.lookup(hole) else {
                continue;
            };
            let bound = match info.constraint {
                Some(TypeId::NUMBER) => match captured.parse::<f64>() {
                    Ok(value) => self.interner.literal_number(value),
                    Err(_) => return Ok(false),
                },
                _ => self.interner.literal_string(&captured),
            };
            if let Some(constraint) = info.constraint
                && !self.is_subtype(bound, constraint)
            {
                return Ok(false);
            }
            ctx.add_candidate(info.name, bound, polarity);
        }
        Ok(true)
    }

    /// Turn the collected candidates into bindings.
    ///
    /// Covariant candidates merge into a union, contravariant ones into an
    /// intersection. With both, the union wins when it is assignable to the
    /// intersection.
    pub(crate) fn resolve_inference(
        &mut self,
        ctx: &mut InferenceContext,
    ) -> Result<TypeSubstitution, SolverError> {
        let mut bindings = TypeSubstitution::new();
        for param in ctx.params() {
            let candidates = ctx.probe(param.name).unwrap_or_default();
            let resolved = match (
                candidates.covariant.is_empty(),
                candidates.contravariant.is_empty(),
            ) {
                (false, true) => self.interner.union(candidates.covariant.to_vec()),
                (true, false) => self.interner.intersection(candidates.contravariant.to_vec()),
                (false, false) => {
                    let upper = self.interner.union(candidates.covariant.to_vec());
                    let lower = self.interner.intersection(candidates.contravariant.to_vec());
                    if self.is_subtype(upper, lower) {
                        upper
                    } else {
                        return Err(self.unresolved(param.name));
                    }
                }
                (true, true) => return Err(self.unresolved(param.name)),
            };
            trace!(
                name = %self.interner.resolve_atom(param.name),
                resolved = resolved.0,
                "resolved infer variable"
            );
            bindings.insert(param.name, resolved);
        }
        Ok(bindings)
    }

    fn unresolved(&self, name: Atom) -> SolverError {
        UnresolvedInferenceError {
            name: self.interner.resolve_atom(name).to_string(),
        }
        .into()
    }
}
