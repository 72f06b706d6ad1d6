use std::fmt;

use crate::rjscript::{
    evaluator::runtime::value::{Location, RJSValue},
    semantics::types::VarType,
};

/// A constant written in a script. Unlike `RJSValue` it never shares state,
/// so every evaluation hands out fresh values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Bool(bool),
    Location(f64, f64, f64),
}

impl Literal {
    pub fn to_type(&self) -> VarType {
        match self {
            Literal::Number(_) => VarType::Number,
            Literal::String(_) => VarType::String,
            Literal::Bool(_) => VarType::Bool,
            Literal::Location(..) => VarType::Location,
        }
    }

    pub fn to_value(&self) -> RJSValue {
        match self {
            Literal::Number(n) => RJSValue::Number(*n),
            Literal::String(s) => RJSValue::String(s.clone()),
            Literal::Bool(b) => RJSValue::Bool(*b),
            Literal::Location(x, y, z) => RJSValue::location(Location::new(*x, *y, *z)),
        }
    }

    pub fn from_value(value: &RJSValue) -> Literal {
        match value {
            RJSValue::Number(n) => Literal::Number(*n),
            RJSValue::String(s) => Literal::String(s.clone()),
            RJSValue::Bool(b) => Literal::Bool(*b),
            RJSValue::Location(loc) => {
                let loc = loc.borrow();
                Literal::Location(loc.x, loc.y, loc.z)
            }
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::String(s) => write!(f, "\"{}\"", s),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Location(x, y, z) => write!(f, "location({}, {}, {})", x, y, z),
        }
    }
}
