pub mod expr;
pub mod literal;
pub mod node;
pub mod position;
