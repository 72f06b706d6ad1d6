use std::{
    collections::{BTreeSet, HashMap},
    rc::Rc,
};

use tracing::{debug, info};

use crate::rjscript::{
    evaluator::builtins::core::builtins_table,
    functions::{callers::CallSiteId, function::Function, signature::Signature},
};

/// What a call site needs from wherever functions are declared.
pub trait FunctionLookup {
    fn signature(&self, name: &str) -> Option<Rc<Signature>>;

    fn function(&self, name: &str) -> Option<Rc<dyn Function>>;

    /// Subscribes `caller` to redefinitions of `name`. Idempotent.
    fn register_caller(&mut self, name: &str, caller: CallSiteId);
}

/// Emitted when a definition is replaced or removed. Every call site listed
/// in `callers` should validate itself again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redefined {
    pub name: String,
    pub callers: Vec<CallSiteId>,
}

#[derive(Default)]
pub struct Functions {
    signatures: HashMap<String, Rc<Signature>>,
    functions: HashMap<String, Rc<dyn Function>>,
    callers: HashMap<String, BTreeSet<CallSiteId>>,
}

impl Functions {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the native builtins.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for function in builtins_table() {
            registry.define(function);
        }
        registry
    }

    /// Makes a signature known before its body exists, so call sites can be
    /// validated against it. Replacing an earlier declaration notifies its callers.
    pub fn declare(&mut self, signature: Signature) -> Option<Redefined> {
        let name = signature.name().to_string();
        debug!(function = %name, "declaring signature");
        let previous = self.signatures.insert(name.clone(), Rc::new(signature));
        previous.and_then(|_| self.redefined(&name))
    }

    /// Installs `function` and its signature. Replacing an earlier
    /// definition, or coming back after a removal, notifies its callers;
    /// following a bare declaration does not.
    pub fn define(&mut self, function: Rc<dyn Function>) -> Option<Redefined> {
        let name = function.signature().name().to_string();
        debug!(function = %name, "defining function");
        let declared = self
            .signatures
            .insert(name.clone(), Rc::clone(function.signature()))
            .is_some();
        let replaced = self.functions.insert(name.clone(), function).is_some();
        if replaced || !declared {
            self.redefined(&name)
        } else {
            None
        }
    }

    /// Deletes both signature and body. Callers stay subscribed so they can
    /// report that the function went away.
    pub fn remove(&mut self, name: &str) -> Option<Redefined> {
        let had_signature = self.signatures.remove(name).is_some();
        let had_function = self.functions.remove(name).is_some();
        if had_signature || had_function {
            info!(function = %name, "function removed");
            self.redefined(name)
        } else {
            None
        }
    }

    pub fn forget_caller(&mut self, caller: CallSiteId) {
        for set in self.callers.values_mut() {
            set.remove(&caller);
        }
        self.callers.retain(|_, set| !set.is_empty());
    }

    pub fn callers(&self, name: &str) -> impl Iterator<Item = CallSiteId> + '_ {
        self.callers.get(name).into_iter().flatten().copied()
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.signatures.contains_key(name)
    }

    fn redefined(&self, name: &str) -> Option<Redefined> {
        let callers: Vec<CallSiteId> = self.callers(name).collect();
        if callers.is_empty() {
            return None;
        }
        Some(Redefined {
            name: name.to_string(),
            callers,
        })
    }
}

impl FunctionLookup for Functions {
    fn signature(&self, name: &str) -> Option<Rc<Signature>> {
        self.signatures.get(name).cloned()
    }

    fn function(&self, name: &str) -> Option<Rc<dyn Function>> {
        self.functions.get(name).cloned()
    }

    fn register_caller(&mut self, name: &str, caller: CallSiteId) {
        self.callers.entry(name.to_string()).or_default().insert(caller);
    }
}
