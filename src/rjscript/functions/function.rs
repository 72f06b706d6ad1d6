use std::{fmt, rc::Rc};

use tracing::warn;

use crate::rjscript::{
    ast::expr::Expr,
    evaluator::runtime::{
        eval_ctx::EvalCtx,
        value::{BoundaryCopy, RJSValue},
    },
    functions::signature::Signature,
    semantics::converters::convert_value,
};

/// Native implementation: one slot per declared parameter, already filled.
pub type NativeFn = fn(&[Vec<RJSValue>]) -> Option<Vec<RJSValue>>;

/// Something a call site can invoke once it is bound.
pub trait Function {
    fn signature(&self) -> &Rc<Signature>;

    /// Runs the body. `params` holds exactly one slot per declared parameter.
    fn call(&self, params: &[Vec<RJSValue>]) -> Option<Vec<RJSValue>>;

    /// Forgets whatever the last invocation returned.
    fn reset_return_value(&self) -> bool;

    /// Fills left-out trailing parameters from their defaults and runs the
    /// body. Returns `None` rather than an empty sequence.
    fn execute(&self, params: Vec<Vec<RJSValue>>) -> Option<Vec<RJSValue>> {
        let signature = self.signature();
        if params.len() > signature.max_parameters() {
            warn!(
                function = signature.name(),
                given = params.len(),
                "more parameter slots than declared parameters"
            );
            return None;
        }

        let mut slots = params;
        for param in &signature.parameters()[slots.len()..] {
            match &param.default {
                Some(default) => slots.push(default.boundary_copy()),
                None => {
                    warn!(function = signature.name(), parameter = %param.name, "missing parameter without default");
                    return None;
                }
            }
        }

        let result = self.call(&slots)?;
        if result.is_empty() {
            None
        } else {
            Some(result)
        }
    }
}

pub struct NativeFunction {
    signature: Rc<Signature>,
    body: NativeFn,
}

impl NativeFunction {
    pub fn new(signature: Signature, body: NativeFn) -> Self {
        Self {
            signature: Rc::new(signature),
            body,
        }
    }
}

impl Function for NativeFunction {
    fn signature(&self) -> &Rc<Signature> {
        &self.signature
    }

    fn call(&self, params: &[Vec<RJSValue>]) -> Option<Vec<RJSValue>> {
        (self.body)(params)
    }

    fn reset_return_value(&self) -> bool {
        true
    }
}

/// A function declared by a script. Its parameters become variables of a
/// fresh context in which `body` is evaluated.
pub struct ScriptFunction {
    signature: Rc<Signature>,
    body: Expr,
}

impl ScriptFunction {
    pub fn new(signature: Signature, body: Expr) -> Self {
        Self {
            signature: Rc::new(signature),
            body,
        }
    }
}

impl Function for ScriptFunction {
    fn signature(&self) -> &Rc<Signature> {
        &self.signature
    }

    fn call(&self, params: &[Vec<RJSValue>]) -> Option<Vec<RJSValue>> {
        let mut ctx = EvalCtx::new(format!("function {}", self.signature.name()));
        for (param, values) in self.signature.parameters().iter().zip(params) {
            ctx.set_var(param.name.clone(), values.clone());
        }

        let ty = self.signature.return_type()?;
        let mut values: Vec<RJSValue> = self
            .body
            .eval_array(&ctx)
            .iter()
            .filter_map(|value| convert_value(value, &ty))
            .collect();
        if self.signature.returns_single() {
            values.truncate(1);
        }
        Some(values)
    }

    /// Nothing outlives a call: every call evaluates in a fresh context.
    fn reset_return_value(&self) -> bool {
        true
    }
}

impl fmt::Debug for dyn Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.signature())
    }
}
