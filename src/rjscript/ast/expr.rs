use std::fmt;

use crate::rjscript::{
    ast::{literal::Literal, node::Located, position::Position},
    semantics::types::VarType,
};

/// A position-carrying expression.
pub type Expr = Located<ExprKind>;

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// `1`, `"a"`, or a list of constants `1, 2 and 3`.
    Literal(Vec<Literal>),

    /// `{name}`. `ty` is `any` unless the declaring scope knows better.
    Variable { name: String, ty: VarType },

    /// `a, b and c`: every item's values, in order.
    List(Vec<Expr>),

    /// `source` converted to `to` value by value when evaluated.
    Converted { source: Box<Expr>, to: VarType },
}

impl Expr {
    pub fn literal(values: Vec<Literal>, pos: Position) -> Expr {
        Expr::new(ExprKind::Literal(values), pos)
    }

    pub fn variable(name: impl Into<String>, pos: Position) -> Expr {
        Expr::new(
            ExprKind::Variable {
                name: name.into(),
                ty: VarType::Any,
            },
            pos,
        )
    }

    pub fn list(items: Vec<Expr>, pos: Position) -> Expr {
        Expr::new(ExprKind::List(items), pos)
    }

    /// The type every value produced by this expression conforms to.
    pub fn return_type(&self) -> VarType {
        match &self.kind {
            ExprKind::Literal(values) => common_type(values.iter().map(Literal::to_type)),
            ExprKind::Variable { ty, .. } => *ty,
            ExprKind::List(items) => common_type(items.iter().map(Expr::return_type)),
            ExprKind::Converted { to, .. } => *to,
        }
    }

    /// The expression as written, before any conversion was applied.
    pub fn source(&self) -> &Expr {
        match &self.kind {
            ExprKind::Converted { source, .. } => source.source(),
            _ => self,
        }
    }
}

fn common_type(mut types: impl Iterator<Item = VarType>) -> VarType {
    let Some(first) = types.next() else {
        return VarType::Any;
    };
    if types.all(|t| t == first) {
        first
    } else {
        VarType::Any
    }
}

fn write_enumeration<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            if i + 1 == items.len() {
                write!(f, " and ")?;
            } else {
                write!(f, ", ")?;
            }
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Literal(values) => write_enumeration(f, values),
            ExprKind::Variable { name, .. } => write!(f, "{{{}}}", name),
            ExprKind::List(items) => {
                write!(f, "(")?;
                write_enumeration(f, items)?;
                write!(f, ")")
            }
            ExprKind::Converted { .. } => write!(f, "{}", self.source()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_like_script_text() {
        let lit = Expr::literal(
            vec![Literal::Number(1.0), Literal::Number(2.0), Literal::Number(3.0)],
            Position::UNKNOWN,
        );
        assert_eq!(lit.to_string(), "1, 2 and 3");

        let list = Expr::list(
            vec![
                Expr::literal(vec![Literal::String("a".into())], Position::UNKNOWN),
                Expr::variable("b", Position::UNKNOWN),
            ],
            Position::UNKNOWN,
        );
        assert_eq!(list.to_string(), "(\"a\" and {b})");
    }

    #[test]
    fn mixed_list_is_any() {
        let list = Expr::literal(
            vec![Literal::Number(1.0), Literal::Bool(true)],
            Position::UNKNOWN,
        );
        assert_eq!(list.return_type(), VarType::Any);
    }
}
