use std::{cell::RefCell, fmt, rc::Rc};

use crate::rjscript::semantics::types::VarType;

/// A point in the world. Shared by reference inside `RJSValue`, so scripts
/// holding the same value observe each other's mutations.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn shift(&mut self, dx: f64, dy: f64, dz: f64) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }
}

pub type LocationRef = Rc<RefCell<Location>>;

#[derive(Debug, Clone, PartialEq)]
pub enum RJSValue {
    Number(f64),
    String(String),
    Bool(bool),
    Location(LocationRef),
}

impl RJSValue {
    pub fn location(loc: Location) -> RJSValue {
        RJSValue::Location(Rc::new(RefCell::new(loc)))
    }

    /// Check whether this value conforms to the requested VarType.
    pub fn is_type(&self, var_type: &VarType) -> bool {
        self.to_type().is_subtype_of(var_type)
    }

    pub fn to_type(&self) -> VarType {
        match self {
            RJSValue::Bool(_) => VarType::Bool,
            RJSValue::Number(_) => VarType::Number,
            RJSValue::String(_) => VarType::String,
            RJSValue::Location(_) => VarType::Location,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            RJSValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for RJSValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RJSValue::String(s) => write!(f, "{}", s),
            RJSValue::Number(n) => write!(f, "{}", n),
            RJSValue::Bool(b) => write!(f, "{}", b),
            RJSValue::Location(loc) => {
                let loc = loc.borrow();
                write!(f, "x: {}, y: {}, z: {}", loc.x, loc.y, loc.z)
            }
        }
    }
}

/// Values crossing a call boundary go through `boundary_copy`. Types that are
/// shared by reference must hand out an independent deep copy here; plain
/// values just clone.
pub trait BoundaryCopy {
    fn boundary_copy(&self) -> Self;
}

impl BoundaryCopy for RJSValue {
    fn boundary_copy(&self) -> Self {
        match self {
            RJSValue::Location(loc) => RJSValue::location(*loc.borrow()),
            other => other.clone(),
        }
    }
}

impl<T: BoundaryCopy> BoundaryCopy for Vec<T> {
    fn boundary_copy(&self) -> Self {
        self.iter().map(BoundaryCopy::boundary_copy).collect()
    }
}

/// Statically typed view of a function result.
pub trait FromValue: Sized {
    fn from_value(value: RJSValue) -> Option<Self>;
}

impl FromValue for RJSValue {
    #[inline]
    fn from_value(value: RJSValue) -> Option<Self> {
        Some(value)
    }
}

impl FromValue for f64 {
    fn from_value(value: RJSValue) -> Option<Self> {
        value.as_number()
    }
}

impl FromValue for bool {
    fn from_value(value: RJSValue) -> Option<Self> {
        match value {
            RJSValue::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: RJSValue) -> Option<Self> {
        match value {
            RJSValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl FromValue for Location {
    fn from_value(value: RJSValue) -> Option<Self> {
        match value {
            RJSValue::Location(loc) => Some(*loc.borrow()),
            _ => None,
        }
    }
}
