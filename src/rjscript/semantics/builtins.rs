use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Sum,
    Join,
    Location,
    Shift,
    Round,
    Print,
}

pub const BUILTINS_TBL: &[(Builtin, &'static str)] = &[
    (Builtin::Sum, "sum"),
    (Builtin::Join, "join"),
    (Builtin::Location, "location"),
    (Builtin::Shift, "shift"),
    (Builtin::Round, "round"),
    (Builtin::Print, "print"),
];

#[inline]
pub fn builtin_names_set() -> HashSet<&'static str> {
    BUILTINS_TBL.iter().map(|(_, n)| *n).collect()
}
