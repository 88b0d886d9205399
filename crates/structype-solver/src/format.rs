//! Rendering types as TypeScript-like source text, for error messages and
//! logs.

use crate::intern::TypeInterner;
use crate::type_resolver::TypeResolver;
use crate::types::*;
use crate::utils::number_to_string;
use std::sync::Arc;
use structype_common::Atom;

const MAX_FORMAT_DEPTH: u32 = 24;

pub struct TypeFormatter<'a> {
    interner: &'a TypeInterner,
    resolver: Option<&'a dyn TypeResolver>,
    depth: u32,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(interner: &'a TypeInterner) -> Self {
        Self {
            interner,
            resolver: None,
            depth: 0,
        }
    }

    /// Use `resolver` to print definition names instead of `<def N>`.
    pub fn with_resolver(mut self, resolver: &'a dyn TypeResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn atom(&self, atom: Atom) -> Arc<str> {
        self.interner.resolve_atom(atom)
    }

    pub fn format(&mut self, type_id: TypeId) -> String {
        if self.depth >= MAX_FORMAT_DEPTH {
            return "...".to_string();
        }
        self.depth += 1;
        let rendered = self.format_inner(type_id);
        self.depth -= 1;
        rendered
    }

    fn format_inner(&mut self, type_id: TypeId) -> String {
        let Some(data) = self.interner.lookup(type_id) else {
            return format!("<unknown type {}>", type_id.0);
        };
        match data {
            TypeData::Intrinsic(kind) => kind.name().to_string(),
            TypeData::Literal(value) => self.format_literal(&value),
            TypeData::Object(shape_id) => self.format_object(&self.interner.object_shape(shape_id)),
            TypeData::Array(element) => format!("{}[]", self.format_operand(element)),
            TypeData::ReadonlyType(inner) => format!("readonly {}", self.format(inner)),
            TypeData::Tuple(list_id) => {
                let elements = self.interner.tuple_list(list_id);
                let rendered: Vec<String> = elements
                    .iter()
                    .map(|element| {
                        let inner = self.format(element.type_id);
                        if element.rest {
                            format!("...{inner}")
                        } else if element.optional {
                            format!("{inner}?")
                        } else {
                            inner
                        }
                    })
                    .collect();
                format!("[{}]", rendered.join(", "))
            }
            TypeData::Union(list_id) => {
                let members = self.interner.type_list(list_id);
                let rendered: Vec<String> =
                    members.iter().map(|m| self.format_operand(*m)).collect();
                rendered.join(" | ")
            }
            TypeData::Intersection(list_id) => {
                let members = self.interner.type_list(list_id);
                let rendered: Vec<String> =
                    members.iter().map(|m| self.format_operand(*m)).collect();
                rendered.join(" & ")
            }
            TypeData::Function(shape_id) => {
                self.format_function(&self.interner.function_shape(shape_id))
            }
            TypeData::TypeParameter(info) => self.atom(info.name).to_string(),
            TypeData::Infer(info) => format!("infer {}", self.atom(info.name)),
            TypeData::Lazy(def_id) => match self.resolver.and_then(|r| r.def_name(def_id)) {
                Some(name) => self.atom(name).to_string(),
                None => format!("<def {}>", def_id.0),
            },
            TypeData::Application(app_id) => {
                let app = self.interner.type_application(app_id);
                let base = self.format(app.base);
                let args: Vec<String> = app.args.iter().map(|arg| self.format(*arg)).collect();
                format!("{base}<{}>", args.join(", "))
            }
            TypeData::Conditional(cond_id) => {
                let cond = self.interner.conditional_type(cond_id);
                format!(
                    "{} extends {} ? {} : {}",
                    self.format_operand(cond.check_type),
                    self.format_operand(cond.extends_type),
                    self.format(cond.true_type),
                    self.format(cond.false_type)
                )
            }
            TypeData::Mapped(mapped_id) => {
                let mapped = self.interner.mapped_type(mapped_id);
                let readonly = match mapped.readonly_modifier {
                    Some(MappedModifier::Add) => "readonly ",
                    Some(MappedModifier::Remove) => "-readonly ",
                    None => "",
                };
                let optional = match mapped.optional_modifier {
                    Some(MappedModifier::Add) => "?",
                    Some(MappedModifier::Remove) => "-?",
                    None => "",
                };
                format!(
                    "{{ {readonly}[{} in {}]{optional}: {} }}",
                    self.atom(mapped.type_param.name),
                    self.format(mapped.constraint),
                    self.format(mapped.template)
                )
            }
            TypeData::IndexAccess(object, index) => {
                format!("{}[{}]", self.format_operand(object), self.format(index))
            }
            TypeData::KeyOf(operand) => format!("keyof {}", self.format_operand(operand)),
            TypeData::TemplateLiteral(template_id) => {
                let spans = self.interner.template_list(template_id);
                let mut out = String::from("`");
                for span in spans.iter() {
                    match span {
                        TemplateSpan::Text(text) => out.push_str(&self.atom(*text)),
                        TemplateSpan::Type(inner) => {
                            out.push_str("${");
                            out.push_str(&self.format(*inner));
                            out.push('}');
                        }
                    }
                }
                out.push('`');
                out
            }
        }
    }

    /// Parenthesise types that bind looser than postfix `[]` or infix `|`.
    fn format_operand(&mut self, type_id: TypeId) -> String {
        let rendered = self.format(type_id);
        match self.interner.lookup(type_id) {
            Some(
                TypeData::Union(_)
                | TypeData::Intersection(_)
                | TypeData::Function(_)
                | TypeData::Conditional(_)
                | TypeData::KeyOf(_)
                | TypeData::ReadonlyType(_),
            ) => format!("({rendered})"),
            _ => rendered,
        }
    }

    fn format_literal(&self, value: &LiteralValue) -> String {
        match value {
            LiteralValue::String(atom) => {
                let text = self.atom(*atom);
                format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
            }
            LiteralValue::Number(number) => number_to_string(number.0),
            LiteralValue::Boolean(value) => value.to_string(),
            LiteralValue::BigInt(digits) => format!("{}n", self.atom(*digits)),
        }
    }

    fn format_object(&mut self, shape: &ObjectShape) -> String {
        if shape.properties.is_empty() {
            return "{}".to_string();
        }
        let rendered: Vec<String> = shape
            .properties
            .iter()
            .map(|prop| {
                format!(
                    "{}{}{}: {}",
                    if prop.readonly { "readonly " } else { "" },
                    self.atom(prop.name),
                    if prop.optional { "?" } else { "" },
                    self.format(prop.type_id)
                )
            })
            .collect();
        format!("{{ {} }}", rendered.join("; "))
    }

    fn format_function(&mut self, shape: &FunctionShape) -> String {
        let params: Vec<String> = shape
            .params
            .iter()
            .enumerate()
            .map(|(index, param)| {
                let name = match param.name {
                    Some(name) => self.atom(name).to_string(),
                    None => format!("arg{index}"),
                };
                let ty = self.format(param.type_id);
                if param.rest {
                    format!("...{name}: {ty}")
                } else if param.optional {
                    format!("{name}?: {ty}")
                } else {
                    format!("{name}: {ty}")
                }
            })
            .collect();
        let prefix = if shape.is_constructor { "new " } else { "" };
        format!(
            "{prefix}({}) => {}",
            params.join(", "),
            self.format(shape.return_type)
        )
    }
}
