pub mod eval_ctx;
pub mod value;
