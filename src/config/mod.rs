pub mod compiled;
pub mod manager;
pub mod raw;
pub mod resolver;
