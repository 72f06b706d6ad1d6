use tracing::debug;

use crate::rjscript::{
    ast::expr::{Expr, ExprKind},
    evaluator::runtime::{eval_ctx::EvalCtx, value::RJSValue},
    semantics::converters::convert_value,
};

impl Expr {
    /// Materialize every value this expression produces for `ctx`.
    /// An expression with nothing to offer yields an empty sequence.
    pub fn eval_array(&self, ctx: &EvalCtx) -> Vec<RJSValue> {
        match &self.kind {
            ExprKind::Literal(values) => values.iter().map(|lit| lit.to_value()).collect(),

            ExprKind::Variable { name, .. } => ctx.get_var(name).to_vec(),

            ExprKind::List(items) => items.iter().flat_map(|item| item.eval_array(ctx)).collect(),

            ExprKind::Converted { source, to } => source
                .eval_array(ctx)
                .into_iter()
                .filter_map(|value| {
                    let converted = convert_value(&value, to);
                    if converted.is_none() {
                        debug!(%value, target = %to, "dropping value that cannot be converted");
                    }
                    converted
                })
                .collect(),
        }
    }
}
