#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarType {
    Bool,
    Number,
    String,
    Location,
    Any,
    Undefined,
}

impl VarType {
    /// Every concrete type is a subtype of itself and of `any`.
    pub fn is_subtype_of(&self, other: &VarType) -> bool {
        self == other || *other == VarType::Any
    }

    pub fn parse(name: &str) -> Option<VarType> {
        use VarType::*;
        match name.trim() {
            "bool" | "boolean" => Some(Bool),
            "num" | "number" => Some(Number),
            "str" | "text" | "string" => Some(String),
            "loc" | "location" => Some(Location),
            "any" | "object" => Some(Any),
            _ => None,
        }
    }
}

impl std::fmt::Display for VarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use VarType::*;
        match self {
            Bool => write!(f, "bool"),
            Number => write!(f, "num"),
            String => write!(f, "str"),
            Location => write!(f, "loc"),
            Any => write!(f, "any"),
            Undefined => write!(f, "undefined"),
        }
    }
}

/// Whether a slot holds exactly one value or a sequence of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cardinality {
    #[default]
    Single,
    Multiple,
}

impl Cardinality {
    #[inline]
    pub fn from_multiple(multiple: bool) -> Self {
        if multiple {
            Cardinality::Multiple
        } else {
            Cardinality::Single
        }
    }

    #[inline]
    pub fn is_single(self) -> bool {
        self == Cardinality::Single
    }
}

/// Renders "not a num" / "not a num or str" for diagnostics about expected types.
pub fn not_of_type(expected: &[VarType]) -> String {
    let names: Vec<String> = expected.iter().map(|t| t.to_string()).collect();
    match names.as_slice() {
        [] => "not of any known type".to_string(),
        [only] => format!("not a {}", only),
        [init @ .., last] => format!("neither a {} nor a {}", init.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_accepts_everything() {
        assert!(VarType::Number.is_subtype_of(&VarType::Any));
        assert!(VarType::Location.is_subtype_of(&VarType::Location));
        assert!(!VarType::Any.is_subtype_of(&VarType::Number));
        assert!(!VarType::String.is_subtype_of(&VarType::Number));
    }

    #[test]
    fn parses_aliases() {
        assert_eq!(VarType::parse("number"), Some(VarType::Number));
        assert_eq!(VarType::parse(" str "), Some(VarType::String));
        assert_eq!(VarType::parse("player"), None);
    }

    #[test]
    fn describes_expected_types() {
        assert_eq!(not_of_type(&[VarType::Number]), "not a num");
        assert_eq!(
            not_of_type(&[VarType::Number, VarType::Bool, VarType::String]),
            "neither a num, bool nor a str"
        );
    }
}
