use std::{fmt, marker::PhantomData, rc::Rc};

use tracing::debug;

use crate::rjscript::{
    ast::{expr::Expr, position::SourceSite},
    diagnostics::{fancy_order_number, Diagnostic, DiagnosticSink, RetainingLog},
    evaluator::runtime::{
        eval_ctx::EvalCtx,
        value::{BoundaryCopy, FromValue, RJSValue},
    },
    functions::{
        callers::{CallSiteId, Revalidate},
        function::Function,
        registry::FunctionLookup,
        signature::Signature,
    },
    semantics::types::{not_of_type, VarType},
};

const STALE: &str = "but is still used in other script(s). \
These will continue to use the old version of the function until the environment restarts.";

const LIST_HINT: &str = "If you want to use lists in function calls, you have to use additional \
parentheses, e.g. 'give(player, (iron ore and gold ore))'";

#[derive(Debug)]
enum Binding {
    /// Never validated successfully. `late` caches a callable found while executing.
    Unbound { late: Option<Rc<dyn Function>> },
    Bound {
        signature: Rc<Signature>,
        /// May still be missing when only the signature was declared.
        function: Option<Rc<dyn Function>>,
        single_uber_param: bool,
    },
}

/// One call of a function by name, as written in a script.
///
/// A reference is validated once when its script is loaded (`first = true`)
/// and again each time the function it calls is redefined (`first = false`).
/// A failed validation never touches the previous binding, so a call site
/// whose function changed incompatibly keeps calling the old definition.
///
/// `T` is the type of values the surrounding code expects back.
#[derive(Debug)]
pub struct FunctionReference<T = RJSValue> {
    id: CallSiteId,
    function_name: String,
    parameters: Vec<Expr>,
    binding: Binding,
    single_result: bool,
    expected_return_types: Option<Vec<VarType>>,
    site: Option<SourceSite>,
    _returns: PhantomData<fn() -> T>,
}

impl<T: FromValue> FunctionReference<T> {
    pub fn new(
        function_name: impl Into<String>,
        site: Option<SourceSite>,
        expected_return_types: Option<Vec<VarType>>,
        parameters: Vec<Expr>,
    ) -> Self {
        Self {
            id: CallSiteId::next(),
            function_name: function_name.into(),
            parameters,
            binding: Binding::Unbound { late: None },
            single_result: false,
            expected_return_types,
            site,
            _returns: PhantomData,
        }
    }

    #[inline]
    pub fn id(&self) -> CallSiteId {
        self.id
    }

    #[inline]
    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    #[inline]
    pub fn parameters(&self) -> &[Expr] {
        &self.parameters
    }

    #[inline]
    pub fn site(&self) -> Option<&SourceSite> {
        self.site.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.binding, Binding::Bound { .. })
    }

    /// The signature adopted by the last successful validation.
    pub fn signature(&self) -> Option<&Rc<Signature>> {
        match &self.binding {
            Binding::Bound { signature, .. } => Some(signature),
            Binding::Unbound { .. } => None,
        }
    }

    pub fn function(&self) -> Option<&Rc<dyn Function>> {
        match &self.binding {
            Binding::Bound { function, .. } => function.as_ref(),
            Binding::Unbound { late } => late.as_ref(),
        }
    }

    pub fn single_uber_param(&self) -> bool {
        matches!(
            self.binding,
            Binding::Bound {
                single_uber_param: true,
                ..
            }
        )
    }

    /// Binds this call to the current definition of its function.
    ///
    /// Logs exactly one diagnostic and returns `false` on the first problem
    /// found. On success the argument expressions are replaced by their
    /// converted forms and this call site is registered as a caller.
    pub fn validate(
        &mut self,
        first: bool,
        registry: &mut dyn FunctionLookup,
        sink: &mut dyn DiagnosticSink,
    ) -> bool {
        debug!(function = %self.function_name, call_site = %self.id, first, "validating function call");
        let name = self.function_name.as_str();

        let Some(signature) = registry.signature(name) else {
            return self.fail(
                first,
                sink,
                format!("The function '{}' does not exist.", name),
                format!("The function '{}' was deleted or renamed, {}", name, STALE),
            );
        };
        let function = registry.function(name);

        let mut single_result = self.single_result;
        if let Some(expected) = &self.expected_return_types {
            let Some(returns) = signature.return_type() else {
                return self.fail(
                    first,
                    sink,
                    format!("The function '{}' doesn't return any value.", name),
                    format!("The function '{}' was redefined with no return value, {}", name, STALE),
                );
            };
            if !expected.iter().any(|ty| returns.is_subtype_of(ty)) {
                return self.fail(
                    first,
                    sink,
                    format!(
                        "The returned value of the function '{}', {}, is {}.",
                        name,
                        returns,
                        not_of_type(expected)
                    ),
                    format!(
                        "The function '{}' was redefined with a different, incompatible return type, {}",
                        name, STALE
                    ),
                );
            }
            if first {
                single_result = signature.returns_single();
            } else if self.single_result && !signature.returns_single() {
                sink.report(Diagnostic::new(
                    None,
                    format!(
                        "The function '{}' was redefined with a different, incompatible return type, {}",
                        name, STALE
                    ),
                ));
                return false;
            }
        }

        // arity is only checked when the function doesn't collect everything
        // into one parameter accepting multiple values
        let max = signature.max_parameters();
        let min = signature.min_parameters();
        let given = self.parameters.len();
        let single_uber_param = max == 1 && !signature.parameter(0).is_single();

        if !single_uber_param && given > max {
            let message = if max == 0 {
                format!(
                    "The function '{}' has no arguments, but {} are given. \
                     To call a function without parameters, just write the function name followed by '()', e.g. 'func()'.",
                    name, given
                )
            } else {
                format!(
                    "The function '{}' has only {} argument{}, but {} are given. {}",
                    name,
                    max,
                    plural(max),
                    given,
                    LIST_HINT
                )
            };
            return self.fail(first, sink, message, arity_changed(name));
        }
        if given < min {
            return self.fail(
                first,
                sink,
                format!(
                    "The function '{}' requires at least {} argument{}, but only {} {} given.",
                    name,
                    min,
                    plural(min),
                    given,
                    if given == 1 { "is" } else { "are" }
                ),
                arity_changed(name),
            );
        }

        let mut converted = Vec::with_capacity(given);
        for (i, arg) in self.parameters.iter().enumerate() {
            let param = signature.parameter(if single_uber_param { 0 } else { i });
            let mut log = RetainingLog::new();
            match arg.converted_to(&param.ty, &mut log) {
                Some(expr) => {
                    log.discard();
                    converted.push(expr);
                }
                None => {
                    // on re-validation only the staleness of the caller is reported
                    if first {
                        log.flush_into(self.site.as_ref(), sink);
                    } else {
                        log.discard();
                    }
                    return self.fail(
                        first,
                        sink,
                        format!(
                            "The {} argument given to the function '{}' is not of the required type {}. \
                             Check the correct order of the arguments and put lists into parentheses if appropriate \
                             (e.g. 'give(player, (iron ore and gold ore))'). Please note that storing the value in a \
                             variable and then using that variable as parameter will suppress this error, but it still won't work.",
                            fancy_order_number(i + 1),
                            name,
                            param.ty
                        ),
                        format!(
                            "The function '{}' was redefined with different, incompatible arguments, {}",
                            name, STALE
                        ),
                    );
                }
            }
        }

        debug!(function = %name, signature = %signature, single_uber_param, "call site bound");
        self.parameters = converted;
        self.single_result = single_result;
        self.binding = Binding::Bound {
            signature,
            function,
            single_uber_param,
        };
        registry.register_caller(&self.function_name, self.id);
        true
    }

    fn fail(&self, first: bool, sink: &mut dyn DiagnosticSink, initial: String, stale: String) -> bool {
        let diagnostic = if first {
            Diagnostic::new(self.site.clone(), initial)
        } else {
            Diagnostic::new(None, stale)
        };
        sink.report(diagnostic);
        false
    }

    /// Calls the bound function with this call site's arguments evaluated
    /// against `ctx`. `None` means no values, including when there is no
    /// function to call.
    pub fn execute(
        &mut self,
        ctx: &EvalCtx,
        registry: &dyn FunctionLookup,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<Vec<T>> {
        let Some(function) = self.resolve(registry) else {
            sink.report(Diagnostic::new(
                self.site.clone(),
                "Invalid function call to function that does not exist yet. \
                 Be careful when using functions during environment load.",
            ));
            return None;
        };

        let params = self.materialize(ctx);
        let values = function.execute(params)?;
        Some(values.into_iter().filter_map(T::from_value).collect())
    }

    /// Looks up the callable if this call site has none yet. Once found it
    /// is kept until the next successful validation.
    pub fn resolve(&mut self, registry: &dyn FunctionLookup) -> Option<Rc<dyn Function>> {
        let slot = match &mut self.binding {
            Binding::Bound { function, .. } => function,
            Binding::Unbound { late } => late,
        };
        if slot.is_none() {
            *slot = registry.function(&self.function_name);
        }
        slot.clone()
    }

    /// Evaluates every argument, deep-copying what would otherwise be shared
    /// with the callee. Empty argument values are passed on as they are.
    fn materialize(&self, ctx: &EvalCtx) -> Vec<Vec<RJSValue>> {
        if self.single_uber_param() && self.parameters.len() > 1 {
            let flat: Vec<RJSValue> = self
                .parameters
                .iter()
                .flat_map(|p| p.eval_array(ctx))
                .map(|v| v.boundary_copy())
                .collect();
            vec![flat]
        } else {
            self.parameters
                .iter()
                .map(|p| p.eval_array(ctx).boundary_copy())
                .collect()
        }
    }

    pub fn reset_return_value(&self) -> bool {
        self.function().map_or(false, |f| f.reset_return_value())
    }

    pub fn is_single(&self) -> bool {
        self.single_result
    }

    /// Panics when asked before any successful validation.
    pub fn return_type(&self) -> VarType {
        match &self.binding {
            Binding::Bound { signature, .. } => signature.return_type().unwrap_or(VarType::Undefined),
            Binding::Unbound { .. } => panic!(
                "return type of '{}' requested before the call site was validated",
                self.function_name
            ),
        }
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn arity_changed(name: &str) -> String {
    format!(
        "The function '{}' was redefined with a different, incompatible amount of arguments, {}",
        name, STALE
    )
}

impl<T> fmt::Display for FunctionReference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.function_name)?;
        for (i, param) in self.parameters.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ")")
    }
}

impl<T: FromValue> Revalidate for FunctionReference<T> {
    fn call_site(&self) -> CallSiteId {
        self.id
    }

    fn function_name(&self) -> &str {
        &self.function_name
    }

    fn validate(
        &mut self,
        first: bool,
        registry: &mut dyn FunctionLookup,
        sink: &mut dyn DiagnosticSink,
    ) -> bool {
        FunctionReference::validate(self, first, registry, sink)
    }
}
