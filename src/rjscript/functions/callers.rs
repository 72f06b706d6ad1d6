use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::{Rc, Weak},
    sync::atomic::{AtomicU64, Ordering},
};

use tracing::{debug, info};

use crate::rjscript::{
    diagnostics::DiagnosticSink,
    functions::registry::{FunctionLookup, Redefined},
};

static NEXT_CALL_SITE: AtomicU64 = AtomicU64::new(1);

/// Identity of one call site, unique for the whole process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallSiteId(u64);

impl CallSiteId {
    pub fn next() -> Self {
        CallSiteId(NEXT_CALL_SITE.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for CallSiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A call site that can be asked to bind itself again.
pub trait Revalidate {
    fn call_site(&self) -> CallSiteId;

    fn function_name(&self) -> &str;

    fn validate(
        &mut self,
        first: bool,
        registry: &mut dyn FunctionLookup,
        sink: &mut dyn DiagnosticSink,
    ) -> bool;
}

pub type CallSiteRef = Rc<RefCell<dyn Revalidate>>;

/// Outcome of delivering one `Redefined` event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Revalidation {
    pub rebound: usize,
    pub stale: usize,
}

/// Weak handles to live call sites, keyed by identity. Owners keep the
/// call sites alive; dropped ones are pruned on the next dispatch.
#[derive(Default)]
pub struct CallSites {
    sites: HashMap<CallSiteId, Weak<RefCell<dyn Revalidate>>>,
}

impl CallSites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracking the same call site twice is a no-op.
    pub fn track(&mut self, site: &CallSiteRef) {
        let id = site.borrow().call_site();
        self.sites.entry(id).or_insert_with(|| Rc::downgrade(site));
    }

    pub fn untrack(&mut self, id: CallSiteId) {
        self.sites.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Re-validates every tracked caller named in `event`. A caller that
    /// fails keeps running against its previous binding.
    pub fn dispatch(
        &mut self,
        event: &Redefined,
        registry: &mut dyn FunctionLookup,
        sink: &mut dyn DiagnosticSink,
    ) -> Revalidation {
        let mut outcome = Revalidation::default();
        for id in &event.callers {
            let Some(site) = self.sites.get(id).and_then(Weak::upgrade) else {
                debug!(call_site = %id, "pruning dropped call site");
                self.sites.remove(id);
                continue;
            };
            if site.borrow_mut().validate(false, registry, sink) {
                outcome.rebound += 1;
            } else {
                outcome.stale += 1;
            }
        }
        info!(
            function = %event.name,
            rebound = outcome.rebound,
            stale = outcome.stale,
            "revalidated callers after redefinition"
        );
        outcome
    }
}
