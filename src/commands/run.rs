use std::{error::Error, io, path::PathBuf};

use clap::Args;
use rjsbind::{
    config::{
        compiled::compile_expr,
        manager::ScriptManager,
        raw::{RawExpr, RawValue},
        resolver::resolve_scripts_path,
    },
    filewatcher::watcher,
    rjscript::{
        ast::position::Position,
        diagnostics::TracingSink,
        evaluator::runtime::{eval_ctx::EvalCtx, value::RJSValue},
    },
};
use tracing::{error, info, warn};

/// Load the scripts and fire one event.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Folder holding the script files
    #[arg(short, long, value_name = "DIR")]
    pub scripts: PathBuf,

    /// Event whose calls are executed
    #[arg(short, long)]
    pub event: String,

    /// Variable visible to the calls, e.g. `--var player='"Steve"'` or `--var n=[1,2]`
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Keep running and fire the event again after every script change
    #[arg(long)]
    pub watch: bool,
}

fn parse_var(arg: &str) -> Result<(String, String), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", arg))?;
    if name.is_empty() {
        return Err(format!("missing variable name in '{}'", arg));
    }
    Ok((name.to_string(), value.to_string()))
}

/// The value is read as a script constant; anything else is taken as text.
fn var_values(value: &str) -> Vec<RJSValue> {
    let expr = serde_json::from_str::<RawExpr>(value)
        .unwrap_or_else(|_| RawExpr::One(RawValue::Text(value.to_string())));
    compile_expr(&expr, Position::UNKNOWN).eval_array(&EvalCtx::default())
}

pub async fn run(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let root = resolve_scripts_path(&args.scripts)?;
    info!(root = %root.display(), event = %args.event, watch_enabled = args.watch, "running scripts");

    let mut sink = TracingSink::default();
    let mut manager = ScriptManager::new(&root, &mut sink)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("loading scripts failed: {}", e)))?;

    let mut ctx = EvalCtx::new(args.event.clone());
    for (name, value) in &args.vars {
        ctx.set_var(name.clone(), var_values(value));
    }

    manager.fire(&args.event, &ctx, &mut sink);
    if !args.watch {
        return Ok(());
    }

    let mut changes = watcher::spawn_watcher(manager.root_folder())
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    loop {
        tokio::select! {
            changed = changes.recv() => {
                let Some(paths) = changed else {
                    warn!("file watcher stopped");
                    return Ok(());
                };
                for path in paths {
                    match manager.reload(&path, &mut sink) {
                        Ok(outcome) => info!(
                            script = %path.display(),
                            rebound = outcome.rebound,
                            stale = outcome.stale,
                            "script reloaded"
                        ),
                        Err(err) => error!(error = %err, "Script reload error"),
                    }
                }
                manager.fire(&args.event, &ctx, &mut sink);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rjsbind::rjscript::evaluator::runtime::value::Location;

    use super::*;

    #[test]
    fn vars_split_on_the_first_equals_sign() {
        assert_eq!(
            parse_var("eq=a=b").expect("parses"),
            ("eq".to_string(), "a=b".to_string())
        );
        assert!(parse_var("novalue").is_err());
        assert!(parse_var("=1").is_err());
    }

    #[test]
    fn var_values_accept_constants_and_fall_back_to_text() {
        assert_eq!(
            var_values("[1, 2]"),
            vec![RJSValue::Number(1.0), RJSValue::Number(2.0)]
        );
        assert_eq!(
            var_values(r#"{"loc":[1,2,3]}"#),
            vec![RJSValue::location(Location::new(1.0, 2.0, 3.0))]
        );
        assert_eq!(var_values("Steve"), vec![RJSValue::String("Steve".into())]);
        assert_eq!(var_values(r#""quoted""#), vec![RJSValue::String("quoted".into())]);
    }
}
