use std::{collections::HashMap, sync::OnceLock};

use crate::rjscript::{
    ast::{
        expr::{Expr, ExprKind},
        literal::Literal,
    },
    diagnostics::{Diagnostic, DiagnosticSink},
    evaluator::runtime::value::RJSValue,
    semantics::types::VarType,
};

/// Converts one value; `None` when this particular value has no counterpart.
pub type ConverterFn = fn(&RJSValue) -> Option<RJSValue>;

pub const CONVERTERS_TBL: &[(VarType, VarType, ConverterFn)] = &[
    (VarType::Number, VarType::String, to_text),
    (VarType::Bool, VarType::String, to_text),
    (VarType::Location, VarType::String, to_text),
    (VarType::String, VarType::Number, parse_number),
    (VarType::String, VarType::Bool, parse_bool),
];

static CONVERTERS: OnceLock<HashMap<(VarType, VarType), ConverterFn>> = OnceLock::new();

fn to_text(value: &RJSValue) -> Option<RJSValue> {
    Some(RJSValue::String(value.to_string()))
}

fn parse_number(value: &RJSValue) -> Option<RJSValue> {
    match value {
        RJSValue::String(s) => s.trim().parse::<f64>().ok().map(RJSValue::Number),
        _ => None,
    }
}

fn parse_bool(value: &RJSValue) -> Option<RJSValue> {
    match value {
        RJSValue::String(s) => match s.trim() {
            "true" | "yes" => Some(RJSValue::Bool(true)),
            "false" | "no" => Some(RJSValue::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

pub fn converter(from: VarType, to: VarType) -> Option<ConverterFn> {
    CONVERTERS
        .get_or_init(|| {
            CONVERTERS_TBL
                .iter()
                .map(|(from, to, f)| ((*from, *to), *f))
                .collect()
        })
        .get(&(from, to))
        .copied()
}

/// Convert a single runtime value to `to`, passing it through when it already fits.
pub fn convert_value(value: &RJSValue, to: &VarType) -> Option<RJSValue> {
    if value.is_type(to) {
        return Some(value.clone());
    }
    converter(value.to_type(), *to).and_then(|f| f(value))
}

/// Whether values of `from` may turn into `to` at run time.
pub fn may_convert(from: VarType, to: VarType) -> bool {
    from.is_subtype_of(&to) || from == VarType::Any || converter(from, to).is_some()
}

impl Expr {
    /// Rewrite this expression so it only produces values of type `to`.
    ///
    /// Constants are converted right away; anything only known at run time is
    /// wrapped in a `Converted` node. Returns `None` when no conversion exists,
    /// after explaining why into `log`.
    pub fn converted_to(&self, to: &VarType, log: &mut dyn DiagnosticSink) -> Option<Expr> {
        if self.return_type().is_subtype_of(to) {
            return Some(self.clone());
        }
        match &self.kind {
            ExprKind::Literal(values) => {
                let mut converted = Vec::with_capacity(values.len());
                for lit in values {
                    match convert_value(&lit.to_value(), to) {
                        Some(value) => converted.push(Literal::from_value(&value)),
                        None => {
                            log.report(Diagnostic::new(
                                None,
                                format!("{} cannot be converted to {}", lit, to),
                            ));
                            return None;
                        }
                    }
                }
                Some(self.with_kind(ExprKind::Literal(converted)))
            }

            ExprKind::List(items) => items
                .iter()
                .map(|item| item.converted_to(to, log))
                .collect::<Option<Vec<_>>>()
                .map(|items| self.with_kind(ExprKind::List(items))),

            // Always start over from what was written, so a later conversion
            // to a different type is not limited by an earlier one.
            ExprKind::Converted { source, .. } => source.converted_to(to, log),

            ExprKind::Variable { ty, .. } => {
                if may_convert(*ty, *to) {
                    Some(self.with_kind(ExprKind::Converted {
                        source: Box::new(self.clone()),
                        to: *to,
                    }))
                } else {
                    log.report(Diagnostic::new(None, format!("{} can never be a {}", self, to)));
                    None
                }
            }
        }
    }
}
