//! Function declarations, definitions and the call sites that use them.
//!
//! A script declares functions (`Signature`), defines them (`Function`) and
//! calls them (`FunctionReference`). The `Functions` registry knows what is
//! currently declared and who calls what; replacing a definition yields a
//! `Redefined` event which `CallSites` turns into re-validation of every
//! subscribed caller.

pub mod callers;
pub mod function;
pub mod reference;
pub mod registry;
pub mod signature;

pub use callers::{CallSiteId, CallSiteRef, CallSites, Revalidate, Revalidation};
pub use function::{Function, NativeFunction, ScriptFunction};
pub use reference::FunctionReference;
pub use registry::{FunctionLookup, Functions, Redefined};
pub use signature::{Parameter, Signature};
