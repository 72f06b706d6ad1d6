use std::{error::Error, io, path::PathBuf};

use clap::Args;
use rjsbind::{
    config::{manager::ScriptManager, resolver::resolve_scripts_path},
    rjscript::diagnostics::TracingSink,
};
use tracing::info;

/// Load every script and report calls that don't fit their functions.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Folder holding the script files
    #[arg(short, long, value_name = "DIR")]
    pub scripts: PathBuf,
}

pub async fn run(args: CheckArgs) -> Result<(), Box<dyn Error>> {
    let root = resolve_scripts_path(&args.scripts)?;
    info!(root = %root.display(), "checking scripts");

    let mut sink = TracingSink::default();
    let manager = ScriptManager::new(&root, &mut sink)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("loading scripts failed: {}", e)))?;

    if sink.reported > 0 {
        return Err(format!("{} problem(s) found", sink.reported).into());
    }
    info!(
        scripts = manager.script_names().count(),
        calls = manager.call_count(),
        "all calls are valid"
    );
    Ok(())
}
