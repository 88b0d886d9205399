//! Template literal types: `` `hello ${T}` ``
//!
//! Evaluation expands holes bound to finite literal unions into a union of
//! string literals (the cartesian product over all holes). Matching a string
//! against a template is a backtracking split along the fixed text spans.

use crate::errors::SolverError;
use crate::evaluate::TypeEvaluator;
use crate::intern::TypeInterner;
use crate::type_resolver::TypeResolver;
use crate::types::*;
use crate::utils::number_to_string;
use crate::visitor::{contains_type_parameters, union_members};
use tracing::trace;

/// Largest number of literal combinations a template is expanded into.
/// Bigger products keep the template form.
pub const TEMPLATE_LITERAL_EXPANSION_LIMIT: usize = 100;

impl<'a, R: TypeResolver> TypeEvaluator<'a, R> {
    /// `get${K}` with `K = "a" | "b"` evaluates to `"geta" | "getb"`;
    /// `${"a"|"b"}-${1|2}` to the four combinations.
    pub(crate) fn evaluate_template_literal(
        &mut self,
        type_id: TypeId,
        template_id: TemplateLiteralId,
    ) -> Result<TypeId, SolverError> {
        let spans = self.interner.template_list(template_id);

        let mut evaluated = Vec::with_capacity(spans.len());
        for span in spans.iter() {
            evaluated.push(match span {
                TemplateSpan::Text(text) => TemplateSpan::Text(*text),
                TemplateSpan::Type(hole) => TemplateSpan::Type(self.try_evaluate(*hole)?),
            });
        }

        let generic = evaluated.iter().any(|span| match span {
            TemplateSpan::Type(hole) => contains_type_parameters(self.interner, *hole),
            TemplateSpan::Text(_) => false,
        });

        // Per hole, the literal alternatives it can take (or the hole itself).
        let mut choices: Vec<Vec<TemplateSpan>> = Vec::with_capacity(evaluated.len());
        let mut combinations: usize = 1;
        for span in &evaluated {
            let options = match span {
                TemplateSpan::Type(hole) if !generic => match self.literal_alternatives(*hole) {
                    Some(literals) => literals.into_iter().map(TemplateSpan::Type).collect(),
                    None => vec![*span],
                },
                _ => vec![*span],
            };
            combinations = combinations.saturating_mul(options.len());
            choices.push(options);
        }

        if generic || combinations == 1 || combinations > TEMPLATE_LITERAL_EXPANSION_LIMIT {
            let rebuilt = self.interner.template_literal(evaluated);
            if rebuilt == type_id {
                return Ok(type_id);
            }
            trace!(template = type_id.0, rebuilt = rebuilt.0, "template literal rebuilt");
            return Ok(rebuilt);
        }

        let mut products: Vec<Vec<TemplateSpan>> = vec![Vec::with_capacity(choices.len())];
        for options in &choices {
            let mut next = Vec::with_capacity(products.len() * options.len());
            for prefix in &products {
                for option in options {
                    let mut combined = prefix.clone();
                    combined.push(*option);
                    next.push(combined);
                }
            }
            products = next;
        }
        let members = products
            .into_iter()
            .map(|spans| self.interner.template_literal(spans))
            .collect();
        Ok(self.interner.union(members))
    }

    /// Literal members of a finite hole type, `boolean` read as
    /// `true | false`. `None` when some member is not a literal.
    fn literal_alternatives(&self, hole: TypeId) -> Option<Vec<TypeId>> {
        let mut literals = Vec::new();
        for member in union_members(self.interner, hole) {
            match self.interner.lookup(member) {
                Some(TypeData::Literal(_)) => literals.push(member),
                _ if member == TypeId::BOOLEAN => {
                    literals.push(TypeId::BOOLEAN_TRUE);
                    literals.push(TypeId::BOOLEAN_FALSE);
                }
                _ => return None,
            }
        }
        (literals.len() > 1).then_some(literals)
    }
}

/// Split `text` along `spans`.
///
/// Returns the substring captured by every hole (paired with the hole type)
/// when the text matches. Holes take the shortest capture that lets the rest
/// match; a hole directly followed by another hole captures at least one
/// character.
pub(crate) fn match_template_spans(
    interner: &TypeInterner,
    text: &str,
    spans: &[TemplateSpan],
) -> Option<Vec<(TypeId, String)>> {
    let mut captures = Vec::new();
    match_from(interner, text, spans, &mut captures).then_some(captures)
}

fn match_from(
    interner: &TypeInterner,
    text: &str,
    spans: &[TemplateSpan],
    captures: &mut Vec<(TypeId, String)>,
) -> bool {
    let Some((first, rest)) = spans.split_first() else {
        return text.is_empty();
    };
    match first {
        TemplateSpan::Text(fixed) => {
            let fixed = interner.resolve_atom(*fixed);
            match text.strip_prefix(&*fixed) {
                Some(remaining) => match_from(interner, remaining, rest, captures),
                None => false,
            }
        }
        TemplateSpan::Type(hole) => {
            if rest.is_empty() {
                if hole_accepts(interner, *hole, text) {
                    captures.push((*hole, text.to_string()));
                    return true;
                }
                return false;
            }
            let min_len = usize::from(matches!(rest.first(), Some(TemplateSpan::Type(_))));
            let ends = text
                .char_indices()
                .map(|(index, _)| index)
                .chain(std::iter::once(text.len()))
                .skip(min_len);
            for end in ends {
                let candidate = &text[..end];
                if !hole_accepts(interner, *hole, candidate) {
                    continue;
                }
                captures.push((*hole, candidate.to_string()));
                if match_from(interner, &text[end..], rest, captures) {
                    return true;
                }
                captures.pop();
            }
            false
        }
    }
}

/// Whether a hole of type `hole` can render as `text`.
pub(crate) fn hole_accepts(interner: &TypeInterner, hole: TypeId, text: &str) -> bool {
    match hole {
        TypeId::STRING | TypeId::ANY => return true,
        TypeId::NUMBER => return is_numeric_text(text),
        TypeId::BIGINT => return is_bigint_text(text),
        TypeId::BOOLEAN => return text == "true" || text == "false",
        TypeId::UNDEFINED => return text == "undefined",
        TypeId::NULL => return text == "null",
        _ => {}
    }
    match interner.lookup(hole) {
        Some(TypeData::Infer(info) | TypeData::TypeParameter(info)) => match info.constraint {
            Some(constraint) => hole_accepts(interner, constraint, text),
            None => true,
        },
        Some(TypeData::Literal(LiteralValue::String(value))) => {
            *interner.resolve_atom(value) == *text
        }
        Some(TypeData::Literal(LiteralValue::Number(value))) => number_to_string(value.0) == text,
        Some(TypeData::Literal(LiteralValue::Boolean(value))) => {
            text == if value { "true" } else { "false" }
        }
        Some(TypeData::Literal(LiteralValue::BigInt(digits))) => {
            *interner.resolve_atom(digits) == *text
        }
        Some(TypeData::Union(list_id)) => interner
            .type_list(list_id)
            .iter()
            .any(|member| hole_accepts(interner, *member, text)),
        Some(TypeData::TemplateLiteral(nested)) => {
            let spans = interner.template_list(nested);
            match_template_spans(interner, text, &spans).is_some()
        }
        _ => false,
    }
}

/// Text a `${number}` hole accepts: a finite number without surrounding
/// whitespace.
fn is_numeric_text(text: &str) -> bool {
    !text.is_empty()
        && text.trim() == text
        && text.parse::<f64>().is_ok_and(|value| value.is_finite())
}

fn is_bigint_text(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(interner: &TypeInterner, parts: &[Result<&str, TypeId>]) -> Vec<TemplateSpan> {
        parts
            .iter()
            .map(|part| match part {
                Ok(text) => TemplateSpan::Text(interner.intern_string(text)),
                Err(hole) => TemplateSpan::Type(*hole),
            })
            .collect()
    }

    #[test]
    fn splits_on_fixed_text() {
        let interner = TypeInterner::new();
        let pattern = spans(&interner, &[Ok("id-"), Err(TypeId::NUMBER), Ok("-x")]);
        let captures = match_template_spans(&interner, "id-42-x", &pattern).unwrap();
        assert_eq!(captures, vec![(TypeId::NUMBER, "42".to_string())]);
        assert!(match_template_spans(&interner, "id-abc-x", &pattern).is_none());
    }

    #[test]
    fn adjacent_holes_take_one_char_first() {
        let interner = TypeInterner::new();
        let pattern = spans(&interner, &[Err(TypeId::STRING), Err(TypeId::STRING)]);
        let captures = match_template_spans(&interner, "abc", &pattern).unwrap();
        assert_eq!(captures[0].1, "a");
        assert_eq!(captures[1].1, "bc");
    }

    #[test]
    fn number_holes_reject_whitespace_and_empty() {
        assert!(is_numeric_text("1.5"));
        assert!(is_numeric_text("-3e2"));
        assert!(!is_numeric_text(""));
        assert!(!is_numeric_text(" 1"));
        assert!(!is_numeric_text("NaN"));
    }
}
