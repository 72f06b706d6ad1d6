pub mod builtins;
pub mod engine;
pub mod runtime;
