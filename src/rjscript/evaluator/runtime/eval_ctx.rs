use std::collections::HashMap;

use crate::rjscript::evaluator::runtime::value::RJSValue;

/// The event an expression is evaluated against: its name plus the variables
/// it carries. Every variable holds a sequence of values.
#[derive(Debug, Clone, Default)]
pub struct EvalCtx {
    pub event: String,
    vars: HashMap<String, Vec<RJSValue>>,
}

impl EvalCtx {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            vars: HashMap::new(),
        }
    }

    pub fn with_var(mut self, name: impl Into<String>, values: Vec<RJSValue>) -> Self {
        self.set_var(name, values);
        self
    }

    pub fn set_var(&mut self, name: impl Into<String>, values: Vec<RJSValue>) {
        self.vars.insert(name.into(), values);
    }

    /// Unset variables read as an empty sequence.
    pub fn get_var(&self, name: &str) -> &[RJSValue] {
        self.vars.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}
