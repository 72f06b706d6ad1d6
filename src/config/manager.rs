//! Owns every loaded script together with the function registry they share.
//!
//! Loading a folder declares all signatures first, then validates every call
//! site, then defines the bodies, so scripts may call functions from files
//! loaded after them. Reloading one file redefines its functions and lets the
//! callers in the other files re-validate; those that no longer fit keep
//! running against the previous definition.

use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    rc::Rc,
};

use tracing::{debug, info, warn};

use crate::rjscript::{
    diagnostics::DiagnosticSink,
    evaluator::runtime::{eval_ctx::EvalCtx, value::RJSValue},
    functions::{
        callers::{CallSiteRef, CallSites, Revalidation},
        function::{Function, ScriptFunction},
        reference::FunctionReference,
        registry::{FunctionLookup, Functions, Redefined},
    },
};

use super::{
    compiled::{compile_script, CompiledScript, CompiledTrigger},
    resolver::{list_scripts, load_script},
};

pub type CallRef = Rc<RefCell<FunctionReference>>;

struct LoadedTrigger {
    on: String,
    calls: Vec<CallRef>,
}

#[derive(Default)]
struct LoadedScript {
    functions: Vec<String>,
    triggers: Vec<LoadedTrigger>,
}

/// Result of one call made while firing an event.
#[derive(Debug, Clone, PartialEq)]
pub struct FiredCall {
    pub script: String,
    pub call: String,
    pub values: Option<Vec<RJSValue>>,
}

pub struct ScriptManager {
    root_folder: PathBuf,
    registry: Functions,
    call_sites: CallSites,
    scripts: BTreeMap<String, LoadedScript>,
    owners: HashMap<String, String>,
}

/// Scripts are keyed by file name; only files directly inside the root are loaded.
pub fn script_name(path: &Path) -> Result<String, String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| format!("Invalid script path '{}'", path.display()))
}

fn read_script(path: &Path, name: &str) -> Result<CompiledScript, String> {
    let raw = load_script(path)?;
    compile_script(&raw, Rc::from(name))
}

fn merge_event(events: &mut BTreeMap<String, Redefined>, event: Option<Redefined>) {
    let Some(event) = event else { return };
    match events.get_mut(&event.name) {
        Some(existing) => {
            for caller in event.callers {
                if !existing.callers.contains(&caller) {
                    existing.callers.push(caller);
                }
            }
        }
        None => {
            events.insert(event.name.clone(), event);
        }
    }
}

impl ScriptManager {
    /// Loads every script in `root_folder`. Unreadable or invalid files fail
    /// the whole load; call sites that don't validate are reported to `sink`
    /// and left out.
    pub fn new(root_folder: impl Into<PathBuf>, sink: &mut dyn DiagnosticSink) -> Result<Self, String> {
        let root_folder = root_folder.into();
        let mut manager = ScriptManager {
            root_folder,
            registry: Functions::with_builtins(),
            call_sites: CallSites::new(),
            scripts: BTreeMap::new(),
            owners: HashMap::new(),
        };

        let mut compiled = Vec::new();
        for path in list_scripts(&manager.root_folder)? {
            let name = script_name(&path)?;
            let script = read_script(&path, &name)?;
            for function in script.function_names() {
                if let Some(owner) = manager.owners.insert(function.to_string(), name.clone()) {
                    return Err(format!(
                        "{}: the function '{}' is already defined in {}",
                        name, function, owner
                    ));
                }
            }
            compiled.push((name, script));
        }

        for (_, script) in &compiled {
            for function in &script.functions {
                manager.registry.declare(function.signature.clone());
            }
        }

        for (name, script) in &compiled {
            let triggers = manager.bind_triggers(&script.triggers, sink);
            manager.scripts.insert(
                name.clone(),
                LoadedScript {
                    functions: script.function_names().map(str::to_string).collect(),
                    triggers,
                },
            );
        }

        for (_, script) in compiled {
            for function in script.functions {
                if let Some(body) = function.body {
                    let defined: Rc<dyn Function> = Rc::new(ScriptFunction::new(function.signature, body));
                    manager.registry.define(defined);
                }
            }
        }
        manager.link_calls();

        info!(
            scripts = manager.scripts.len(),
            calls = manager.call_count(),
            "scripts loaded"
        );
        Ok(manager)
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn registry(&self) -> &Functions {
        &self.registry
    }

    pub fn script_names(&self) -> impl Iterator<Item = &str> {
        self.scripts.keys().map(String::as_str)
    }

    /// Number of call sites that validated and are kept.
    pub fn call_count(&self) -> usize {
        self.scripts
            .values()
            .flat_map(|s| &s.triggers)
            .map(|t| t.calls.len())
            .sum()
    }

    /// The kept call sites of one script, in file order.
    pub fn calls(&self, script: &str) -> Vec<CallRef> {
        self.scripts
            .get(script)
            .into_iter()
            .flat_map(|s| &s.triggers)
            .flat_map(|t| t.calls.iter().cloned())
            .collect()
    }

    /// Validates every call of `triggers` for the first time. Failing calls
    /// are dropped; the others are tracked for redefinitions.
    fn bind_triggers(
        &mut self,
        triggers: &[CompiledTrigger],
        sink: &mut dyn DiagnosticSink,
    ) -> Vec<LoadedTrigger> {
        let mut loaded = Vec::with_capacity(triggers.len());
        for trigger in triggers {
            let mut calls = Vec::with_capacity(trigger.calls.len());
            for call in &trigger.calls {
                let mut reference: FunctionReference = FunctionReference::new(
                    call.function.clone(),
                    Some(call.site.clone()),
                    call.expect.clone(),
                    call.args.clone(),
                );
                if !reference.validate(true, &mut self.registry, sink) {
                    debug!(call = %reference, "dropping call that failed to validate");
                    continue;
                }
                let reference: CallRef = Rc::new(RefCell::new(reference));
                let tracked: CallSiteRef = reference.clone();
                self.call_sites.track(&tracked);
                calls.push(reference);
            }
            loaded.push(LoadedTrigger {
                on: trigger.on.clone(),
                calls,
            });
        }
        loaded
    }

    /// Gives every call site bound to a declaration its callable, so a later
    /// incompatible redefinition cannot swap it out.
    fn link_calls(&self) {
        for script in self.scripts.values() {
            for call in script.triggers.iter().flat_map(|t| &t.calls) {
                call.borrow_mut().resolve(&self.registry);
            }
        }
    }

    fn forget_calls(&mut self, script: &LoadedScript) {
        for call in script.triggers.iter().flat_map(|t| &t.calls) {
            let id = call.borrow().id();
            self.registry.forget_caller(id);
            self.call_sites.untrack(id);
        }
    }

    fn dispatch(
        &mut self,
        events: BTreeMap<String, Redefined>,
        sink: &mut dyn DiagnosticSink,
    ) -> Revalidation {
        let mut total = Revalidation::default();
        for event in events.into_values() {
            let outcome = self.call_sites.dispatch(&event, &mut self.registry, sink);
            total.rebound += outcome.rebound;
            total.stale += outcome.stale;
        }
        total
    }

    /// Brings the script at `path` up to date with the file on disk. A file
    /// that no longer exists is unloaded. When the new content is invalid
    /// the previous version stays loaded and the error is returned.
    pub fn reload(&mut self, path: &Path, sink: &mut dyn DiagnosticSink) -> Result<Revalidation, String> {
        let name = script_name(path)?;
        if !path.exists() {
            return Ok(self.unload(&name, sink));
        }

        let compiled = read_script(path, &name)?;
        for function in compiled.function_names() {
            match self.owners.get(function) {
                Some(owner) if *owner != name => {
                    return Err(format!(
                        "{}: the function '{}' is already defined in {}",
                        name, function, owner
                    ))
                }
                _ => {}
            }
        }
        info!(script = %name, "reloading script");

        let old = self.scripts.remove(&name).unwrap_or_default();
        self.forget_calls(&old);

        let mut events = BTreeMap::new();
        for function in &old.functions {
            if !compiled.function_names().any(|f| f == function) {
                merge_event(&mut events, self.registry.remove(function));
                self.owners.remove(function);
            }
        }

        for function in compiled.functions.iter().cloned() {
            let fname = function.signature.name().to_string();
            match function.body {
                Some(body) => {
                    merge_event(&mut events, self.registry.declare(function.signature.clone()));
                    let defined: Rc<dyn Function> =
                        Rc::new(ScriptFunction::new(function.signature, body));
                    merge_event(&mut events, self.registry.define(defined));
                }
                None => {
                    if self.registry.function(&fname).is_some() {
                        // the old body must not outlive its declaration
                        merge_event(&mut events, self.registry.remove(&fname));
                    }
                    merge_event(&mut events, self.registry.declare(function.signature));
                }
            }
            self.owners.insert(fname, name.clone());
        }

        let triggers = self.bind_triggers(&compiled.triggers, sink);
        self.scripts.insert(
            name.clone(),
            LoadedScript {
                functions: compiled.function_names().map(str::to_string).collect(),
                triggers,
            },
        );

        let outcome = self.dispatch(events, sink);
        if outcome.stale > 0 {
            warn!(
                script = %name,
                stale = outcome.stale,
                "some callers keep using the previous definitions"
            );
        }
        Ok(outcome)
    }

    /// Drops a script with its functions and call sites.
    pub fn unload(&mut self, name: &str, sink: &mut dyn DiagnosticSink) -> Revalidation {
        let Some(old) = self.scripts.remove(name) else {
            debug!(script = %name, "nothing to unload");
            return Revalidation::default();
        };
        info!(script = %name, "unloading script");
        self.forget_calls(&old);

        let mut events = BTreeMap::new();
        for function in &old.functions {
            merge_event(&mut events, self.registry.remove(function));
            self.owners.remove(function);
        }
        self.dispatch(events, sink)
    }

    /// Runs every call listed under `event`, script by script in name order.
    pub fn fire(&self, event: &str, ctx: &EvalCtx, sink: &mut dyn DiagnosticSink) -> Vec<FiredCall> {
        let mut fired = Vec::new();
        for (script, loaded) in &self.scripts {
            for trigger in loaded.triggers.iter().filter(|t| t.on == event) {
                for call in &trigger.calls {
                    let mut reference = call.borrow_mut();
                    let values = reference.execute(ctx, &self.registry, sink);
                    reference.reset_return_value();
                    info!(
                        script = %script,
                        call = %reference,
                        result = %render(values.as_deref()),
                        "call executed"
                    );
                    fired.push(FiredCall {
                        script: script.clone(),
                        call: reference.to_string(),
                        values,
                    });
                }
            }
        }
        if fired.is_empty() {
            debug!(event = %event, "no calls registered for event");
        }
        fired
    }
}

fn render(values: Option<&[RJSValue]>) -> String {
    match values {
        Some(values) => values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        None => "<none>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::rjscript::diagnostics::Diagnostic;

    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).expect("write script");
        path
    }

    #[test]
    fn scripts_may_call_functions_of_later_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            dir.path(),
            "a.json",
            r#"{ "triggers": [{ "on": "go", "calls": [{ "function": "double", "args": [21] }] }] }"#,
        );
        write(
            dir.path(),
            "b.json",
            r#"{ "functions": [{ "name": "double", "params": [{ "name": "n", "type": "num" }],
                 "returns": { "type": "num", "multiple": true },
                 "body": { "list": [{ "var": "n" }, { "var": "n" }] } }] }"#,
        );

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let manager = ScriptManager::new(dir.path(), &mut diagnostics).expect("loads");
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        assert_eq!(manager.call_count(), 1);

        let fired = manager.fire("go", &EvalCtx::new("go"), &mut diagnostics);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].script, "a.json");
        assert_eq!(
            fired[0].values,
            Some(vec![RJSValue::Number(21.0), RJSValue::Number(21.0)])
        );
    }

    #[test]
    fn invalid_calls_are_reported_and_dropped() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            dir.path(),
            "a.json",
            r#"{ "triggers": [{ "on": "go", "calls": [
                { "function": "missing", "line": 4 },
                { "function": "round", "args": [1, 2] },
                { "function": "round", "args": ["2.6"] } ] }] }"#,
        );

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let manager = ScriptManager::new(dir.path(), &mut diagnostics).expect("loads");
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(
            diagnostics[0].to_string(),
            "a.json:4:1 The function 'missing' does not exist."
        );
        assert!(diagnostics[1].message.starts_with("The function 'round' has only 1 argument, but 2 are given."));

        let fired = manager.fire("go", &EvalCtx::new("go"), &mut diagnostics);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].values, Some(vec![RJSValue::Number(3.0)]));
    }

    #[test]
    fn duplicate_functions_across_scripts_fail_the_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "a.json", r#"{ "functions": [{ "name": "f" }] }"#);
        write(dir.path(), "b.json", r#"{ "functions": [{ "name": "f" }] }"#);
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let err = ScriptManager::new(dir.path(), &mut diagnostics).err().expect("fails");
        assert_eq!(err, "b.json: the function 'f' is already defined in a.json");
    }

    #[test]
    fn failed_reload_keeps_the_old_script() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(
            dir.path(),
            "a.json",
            r#"{ "triggers": [{ "on": "go", "calls": [{ "function": "sum", "args": [1, 2] }] }] }"#,
        );
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let mut manager = ScriptManager::new(dir.path(), &mut diagnostics).expect("loads");

        fs::write(&path, "{ not json").expect("write");
        assert!(manager.reload(&path, &mut diagnostics).is_err());
        let fired = manager.fire("go", &EvalCtx::new("go"), &mut diagnostics);
        assert_eq!(fired[0].values, Some(vec![RJSValue::Number(3.0)]));
    }

    #[test]
    fn deleting_a_file_unloads_it() {
        let dir = tempfile::tempdir().expect("tempdir");
        let lib = write(
            dir.path(),
            "lib.json",
            r#"{ "functions": [{ "name": "one", "returns": { "type": "num" }, "body": 1 }] }"#,
        );
        write(
            dir.path(),
            "main.json",
            r#"{ "triggers": [{ "on": "go", "calls": [{ "function": "one" }] }] }"#,
        );
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let mut manager = ScriptManager::new(dir.path(), &mut diagnostics).expect("loads");

        fs::remove_file(&lib).expect("remove");
        let outcome = manager.reload(&lib, &mut diagnostics).expect("unloads");
        assert_eq!(outcome, Revalidation { rebound: 0, stale: 1 });
        assert!(!manager.registry().is_declared("one"));
        assert_eq!(manager.script_names().collect::<Vec<_>>(), ["main.json"]);
        assert!(diagnostics[0].message.starts_with("The function 'one' was deleted or renamed"));

        // the stale caller still holds the removed definition
        let fired = manager.fire("go", &EvalCtx::new("go"), &mut diagnostics);
        assert_eq!(fired[0].values, Some(vec![RJSValue::Number(1.0)]));
    }
}
