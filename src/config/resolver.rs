use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use super::raw::RawScript;

/// Resolves a scripts folder given on the command line against the current directory.
pub fn resolve_scripts_path(arg: &Path) -> Result<PathBuf, String> {
    if arg.is_absolute() {
        return Ok(arg.to_path_buf());
    }
    env::current_dir()
        .map(|cwd| cwd.join(arg))
        .map_err(|e| format!("Failed to get current directory: {}", e))
}

pub fn is_script_file(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "json")
}

/// Every script file directly inside `root`, in a stable order.
pub fn list_scripts(root: &Path) -> Result<Vec<PathBuf>, String> {
    let entries = fs::read_dir(root)
        .map_err(|e| format!("Failed to read scripts folder '{}': {}", root.display(), e))?;

    let mut scripts = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| format!("Failed to read scripts folder '{}': {}", root.display(), e))?
            .path();
        if path.is_file() && is_script_file(&path) {
            scripts.push(path);
        }
    }
    scripts.sort();
    Ok(scripts)
}

pub fn load_script(path: &Path) -> Result<RawScript, String> {
    let file_content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            format!("Script file '{}' not found.", path.display())
        } else {
            format!("Failed to read script file '{}': {}", path.display(), e)
        }
    })?;
    serde_json::from_str(&file_content)
        .map_err(|e| format!("Failed to parse script file '{}': {}", path.display(), e))
}
