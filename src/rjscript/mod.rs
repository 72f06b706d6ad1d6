pub mod ast;
pub mod diagnostics;
pub mod evaluator;
pub mod functions;
pub mod semantics;
