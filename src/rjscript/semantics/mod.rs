pub mod builtins;
pub mod converters;
pub mod types;
