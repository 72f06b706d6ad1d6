use std::fmt;

use crate::rjscript::{
    evaluator::runtime::value::RJSValue,
    semantics::types::{Cardinality, VarType},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: VarType,
    pub cardinality: Cardinality,
    /// Used when a call leaves this parameter out. Only trailing parameters
    /// can effectively be left out.
    pub default: Option<Vec<RJSValue>>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: VarType, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            ty,
            cardinality,
            default: None,
        }
    }

    pub fn with_default(mut self, default: Vec<RJSValue>) -> Self {
        self.default = Some(default);
        self
    }

    #[inline]
    pub fn is_single(&self) -> bool {
        self.cardinality.is_single()
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)?;
        if !self.is_single() {
            write!(f, "...")?;
        }
        if let Some(default) = &self.default {
            let rendered: Vec<String> = default.iter().map(|v| format!("{:?}", v.to_string())).collect();
            write!(f, " = {}", rendered.join(", "))?;
        }
        Ok(())
    }
}

/// The declared shape of a function. Immutable once built; redeclaring a
/// function produces a new `Signature`.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    name: String,
    parameters: Vec<Parameter>,
    return_type: Option<VarType>,
    returns: Cardinality,
}

impl Signature {
    pub fn new(name: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        Self {
            name: name.into(),
            parameters,
            return_type: None,
            returns: Cardinality::Single,
        }
    }

    pub fn returning(mut self, ty: VarType, cardinality: Cardinality) -> Self {
        self.return_type = Some(ty);
        self.returns = cardinality;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Panics when `index` is out of range: call sites are validated against
    /// the arity bounds before anything looks parameters up.
    #[inline]
    pub fn parameter(&self, index: usize) -> &Parameter {
        &self.parameters[index]
    }

    /// Everything up to and including the last parameter without a default.
    pub fn min_parameters(&self) -> usize {
        self.parameters
            .iter()
            .rposition(|p| p.default.is_none())
            .map_or(0, |i| i + 1)
    }

    #[inline]
    pub fn max_parameters(&self) -> usize {
        self.parameters.len()
    }

    /// `None` for functions that don't return anything.
    #[inline]
    pub fn return_type(&self) -> Option<VarType> {
        self.return_type
    }

    #[inline]
    pub fn returns_single(&self) -> bool {
        self.returns.is_single()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.parameters.iter().map(|p| p.to_string()).collect();
        write!(f, "{}({})", self.name, params.join(", "))?;
        if let Some(ty) = self.return_type {
            write!(f, " :: {}", ty)?;
            if !self.returns_single() {
                write!(f, "...")?;
            }
        }
        Ok(())
    }
}
