use std::rc::Rc;

use tracing::debug;

use crate::rjscript::{
    ast::{
        expr::Expr,
        literal::Literal,
        position::{Position, SourceSite},
    },
    evaluator::runtime::value::RJSValue,
    functions::signature::{Parameter, Signature},
    semantics::{
        builtins::builtin_names_set,
        converters::convert_value,
        types::{Cardinality, VarType},
    },
};

use super::raw::{RawCall, RawExpr, RawFunction, RawParam, RawScript, RawTrigger, RawValue};

#[derive(Debug, Clone)]
pub struct CompiledFunction {
    pub signature: Signature,
    /// `None` for a declaration without a body.
    pub body: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct CompiledCall {
    pub function: String,
    pub args: Vec<Expr>,
    pub expect: Option<Vec<VarType>>,
    pub site: SourceSite,
}

#[derive(Debug, Clone)]
pub struct CompiledTrigger {
    pub on: String,
    pub calls: Vec<CompiledCall>,
}

#[derive(Debug, Clone, Default)]
pub struct CompiledScript {
    pub functions: Vec<CompiledFunction>,
    pub triggers: Vec<CompiledTrigger>,
}

impl CompiledScript {
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(|f| f.signature.name())
    }
}

fn parse_type(name: &str, what: &str) -> Result<VarType, String> {
    VarType::parse(name).ok_or_else(|| format!("Unknown type '{}' for {}", name, what))
}

fn compile_value(value: &RawValue) -> Literal {
    match value {
        RawValue::Bool(b) => Literal::Bool(*b),
        RawValue::Number(n) => Literal::Number(*n),
        RawValue::Text(s) => Literal::String(s.clone()),
        RawValue::Location { loc: [x, y, z] } => Literal::Location(*x, *y, *z),
    }
}

pub fn compile_expr(expr: &RawExpr, pos: Position) -> Expr {
    match expr {
        RawExpr::One(value) => Expr::literal(vec![compile_value(value)], pos),
        RawExpr::Many(values) => Expr::literal(values.iter().map(compile_value).collect(), pos),
        RawExpr::Var { var } => Expr::variable(var.clone(), pos),
        RawExpr::List { list } => {
            Expr::list(list.iter().map(|item| compile_expr(item, pos)).collect(), pos)
        }
    }
}

/// Flattens a constant expression into the values of a parameter default.
fn constant_values(expr: &RawExpr, out: &mut Vec<Literal>) -> Result<(), String> {
    match expr {
        RawExpr::One(value) => out.push(compile_value(value)),
        RawExpr::Many(values) => out.extend(values.iter().map(compile_value)),
        RawExpr::List { list } => {
            for item in list {
                constant_values(item, out)?;
            }
        }
        RawExpr::Var { var } => {
            return Err(format!("a default value must be a constant, found variable '{}'", var))
        }
    }
    Ok(())
}

fn compile_default(
    expr: &RawExpr,
    ty: VarType,
    cardinality: Cardinality,
) -> Result<Vec<RJSValue>, String> {
    let mut literals = Vec::new();
    constant_values(expr, &mut literals)?;
    if literals.is_empty() {
        return Err("a default value cannot be empty".to_string());
    }
    if cardinality.is_single() && literals.len() > 1 {
        return Err("a single parameter cannot default to several values".to_string());
    }
    literals
        .iter()
        .map(|literal| {
            convert_value(&literal.to_value(), &ty)
                .ok_or_else(|| format!("the default value {} is not a {}", literal, ty))
        })
        .collect()
}

fn compile_param(function: &str, param: &RawParam) -> Result<Parameter, String> {
    let what = format!("parameter '{}' of function '{}'", param.name, function);
    let ty = parse_type(&param.ty, &what)?;
    let cardinality = Cardinality::from_multiple(param.multiple);
    let compiled = Parameter::new(param.name.clone(), ty, cardinality);
    match &param.default {
        Some(default) => {
            let values = compile_default(default, ty, cardinality)
                .map_err(|e| format!("Invalid {}: {}", what, e))?;
            Ok(compiled.with_default(values))
        }
        None => Ok(compiled),
    }
}

fn compile_function(function: &RawFunction, pos: Position) -> Result<CompiledFunction, String> {
    debug!(function = %function.name, "Compiling function");
    if function.name.is_empty() {
        return Err("A function needs a name".to_string());
    }
    if builtin_names_set().contains(function.name.as_str()) {
        return Err(format!(
            "The function '{}' is built in and cannot be redefined",
            function.name
        ));
    }

    let mut parameters = Vec::with_capacity(function.params.len());
    for param in &function.params {
        if parameters.iter().any(|p: &Parameter| p.name == param.name) {
            return Err(format!(
                "Duplicate parameter '{}' in function '{}'",
                param.name, function.name
            ));
        }
        parameters.push(compile_param(&function.name, param)?);
    }

    let mut signature = Signature::new(function.name.clone(), parameters);
    if let Some(returns) = &function.returns {
        let what = format!("the return value of function '{}'", function.name);
        let ty = parse_type(&returns.ty, &what)?;
        signature = signature.returning(ty, Cardinality::from_multiple(returns.multiple));
    }

    Ok(CompiledFunction {
        signature,
        body: function.body.as_ref().map(|body| compile_expr(body, pos)),
    })
}

fn compile_call(call: &RawCall, index: usize, script: &Rc<str>) -> Result<CompiledCall, String> {
    // Without an explicit line, calls are numbered in file order.
    let pos = Position::new(call.line.unwrap_or(index + 1), 1);
    let expect = match &call.expect {
        Some(names) => {
            let what = format!("the expected result of '{}'", call.function);
            Some(
                names
                    .iter()
                    .map(|n| parse_type(n, &what))
                    .collect::<Result<Vec<_>, String>>()?,
            )
        }
        None => None,
    };
    Ok(CompiledCall {
        function: call.function.clone(),
        args: call.args.iter().map(|a| compile_expr(a, pos)).collect(),
        expect,
        site: SourceSite::new(Some(Rc::clone(script)), pos),
    })
}

fn compile_trigger(
    trigger: &RawTrigger,
    next_index: &mut usize,
    script: &Rc<str>,
) -> Result<CompiledTrigger, String> {
    debug!(event = %trigger.on, calls = trigger.calls.len(), "Compiling trigger");
    let mut calls = Vec::with_capacity(trigger.calls.len());
    for call in &trigger.calls {
        calls.push(compile_call(call, *next_index, script)?);
        *next_index += 1;
    }
    Ok(CompiledTrigger {
        on: trigger.on.clone(),
        calls,
    })
}

/// Turns a parsed script file into typed signatures and expressions.
/// `script` names the file in diagnostics.
pub fn compile_script(raw: &RawScript, script: Rc<str>) -> Result<CompiledScript, String> {
    let mut functions: Vec<CompiledFunction> = Vec::with_capacity(raw.functions.len());
    for (i, function) in raw.functions.iter().enumerate() {
        let compiled = compile_function(function, Position::new(i + 1, 1))
            .map_err(|e| format!("{}: {}", script, e))?;
        if functions.iter().any(|f| f.signature.name() == compiled.signature.name()) {
            return Err(format!(
                "{}: the function '{}' is defined twice",
                script,
                compiled.signature.name()
            ));
        }
        functions.push(compiled);
    }

    let mut next_index = 0;
    let triggers = raw
        .triggers
        .iter()
        .map(|t| compile_trigger(t, &mut next_index, &script))
        .collect::<Result<Vec<_>, String>>()
        .map_err(|e| format!("{}: {}", script, e))?;

    Ok(CompiledScript {
        functions,
        triggers,
    })
}

#[cfg(test)]
mod tests {
    use crate::rjscript::{
        ast::expr::ExprKind,
        evaluator::runtime::value::Location,
    };

    use super::*;

    fn parse(json: &str) -> RawScript {
        serde_json::from_str(json).expect("valid manifest")
    }

    fn name() -> Rc<str> {
        Rc::from("test.json")
    }

    #[test]
    fn compiles_signatures_with_defaults() {
        let raw = parse(
            r#"{ "functions": [{ "name": "f",
                "params": [{ "name": "a", "type": "num" },
                           { "name": "b", "type": "str", "multiple": true, "default": ["x", "y"] }],
                "returns": { "type": "num" }, "body": { "var": "a" } }] }"#,
        );
        let script = compile_script(&raw, name()).expect("compiles");
        let sig = &script.functions[0].signature;
        assert_eq!(sig.to_string(), r#"f(a: num, b: str... = "x", "y") :: num"#);
        assert_eq!(sig.min_parameters(), 1);
        assert!(script.functions[0].body.is_some());
    }

    #[test]
    fn defaults_are_converted_to_the_parameter_type() {
        let raw = parse(
            r#"{ "functions": [{ "name": "f",
                "params": [{ "name": "n", "type": "num", "default": "4" },
                           { "name": "l", "type": "loc", "default": { "loc": [1, 2, 3] } }] }] }"#,
        );
        let script = compile_script(&raw, name()).expect("compiles");
        let params = script.functions[0].signature.parameters();
        assert_eq!(params[0].default, Some(vec![RJSValue::Number(4.0)]));
        assert_eq!(
            params[1].default,
            Some(vec![RJSValue::location(Location::new(1.0, 2.0, 3.0))])
        );
    }

    #[test]
    fn rejects_bad_declarations() {
        let cases = [
            (r#"{ "functions": [{ "name": "f", "params": [{ "name": "a", "type": "vector" }] }] }"#, "Unknown type 'vector'"),
            (r#"{ "functions": [{ "name": "sum" }] }"#, "built in"),
            (r#"{ "functions": [{ "name": "f" }, { "name": "f" }] }"#, "defined twice"),
            (r#"{ "functions": [{ "name": "f", "params": [{ "name": "a", "type": "num", "default": { "var": "x" } }] }] }"#, "must be a constant"),
            (r#"{ "functions": [{ "name": "f", "params": [{ "name": "a", "type": "num", "default": [1, 2] }] }] }"#, "several values"),
            (r#"{ "functions": [{ "name": "f", "params": [{ "name": "a", "type": "num", "default": "abc" }] }] }"#, "not a num"),
            (r#"{ "functions": [{ "name": "f", "params": [{ "name": "a", "type": "num" }, { "name": "a", "type": "num" }] }] }"#, "Duplicate parameter"),
        ];
        for (json, expected) in cases {
            let err = compile_script(&parse(json), name()).unwrap_err();
            assert!(err.starts_with("test.json: "), "{}", err);
            assert!(err.contains(expected), "'{}' should mention '{}'", err, expected);
        }
    }

    #[test]
    fn calls_carry_their_site_and_expectations() {
        let raw = parse(
            r#"{ "triggers": [
                { "on": "a", "calls": [{ "function": "f", "args": [1, { "var": "x" }] }] },
                { "on": "b", "calls": [{ "function": "g", "expect": ["num", "str"], "line": 12 },
                                       { "function": "h" }] } ] }"#,
        );
        let script = compile_script(&raw, name()).expect("compiles");
        let first = &script.triggers[0].calls[0];
        assert_eq!(first.site.to_string(), "test.json:1:1");
        assert!(matches!(first.args[0].kind, ExprKind::Literal(_)));
        assert!(matches!(first.args[1].kind, ExprKind::Variable { .. }));

        let second = &script.triggers[1].calls[0];
        assert_eq!(second.site.pos.line, 12);
        assert_eq!(second.expect, Some(vec![VarType::Number, VarType::String]));
        assert_eq!(script.triggers[1].calls[1].site.pos.line, 3);
    }

    #[test]
    fn unknown_expected_type_is_an_error() {
        let raw = parse(r#"{ "triggers": [{ "on": "a", "calls": [{ "function": "f", "expect": ["blob"] }] }] }"#);
        assert!(compile_script(&raw, name()).unwrap_err().contains("Unknown type 'blob'"));
    }
}
