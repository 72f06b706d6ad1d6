use std::path::{Path, PathBuf};

use notify::{event::EventKind, recommended_watcher, Event, RecursiveMode, Watcher};
use tokio::{runtime::Handle, sync::mpsc};
use tracing::{debug, error, info};

use crate::config::resolver::is_script_file;

/// Script files touched by `event`. Reads and metadata-only events don't count.
pub fn changed_scripts(event: &Event) -> Vec<PathBuf> {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => event
            .paths
            .iter()
            .filter(|p| is_script_file(p))
            .cloned()
            .collect(),
        _ => Vec::new(),
    }
}

/// Watches `root` for script changes. The watcher runs on its own task and
/// only forwards paths; reloading is up to whoever owns the receiver.
pub fn spawn_watcher(root: &Path) -> Result<mpsc::Receiver<Vec<PathBuf>>, String> {
    let rt_handle = Handle::current();
    let (event_tx, mut event_rx) = mpsc::channel::<notify::Result<Event>>(100);

    let mut watcher = recommended_watcher(move |res| {
        let tx_clone = event_tx.clone();
        rt_handle.spawn(async move {
            if tx_clone.send(res).await.is_err() {
                info!("File watcher event channel closed");
            }
        });
    })
    .map_err(|e| format!("Failed to initialize file watcher: {}", e))?;

    watcher
        .watch(root, RecursiveMode::NonRecursive)
        .map_err(|e| format!("Failed to watch scripts folder '{}': {}", root.display(), e))?;
    info!(folder = %root.display(), "Watching scripts for changes...");

    let (paths_tx, paths_rx) = mpsc::channel::<Vec<PathBuf>>(16);
    tokio::spawn(async move {
        // dropping the watcher stops the notifications
        let _watcher = watcher;
        while let Some(res) = event_rx.recv().await {
            match res {
                Ok(event) => {
                    let paths = changed_scripts(&event);
                    if paths.is_empty() {
                        continue;
                    }
                    debug!(?event, "File change detected");
                    if paths_tx.send(paths).await.is_err() {
                        info!("Script change receiver dropped, stopping watcher");
                        break;
                    }
                }
                Err(err) => error!(error = ?err, "Watch error"),
            }
        }
    });

    Ok(paths_rx)
}

#[cfg(test)]
mod tests {
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};

    use super::*;

    #[test]
    fn only_script_writes_are_forwarded() {
        let modify = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/s/a.json"))
            .add_path(PathBuf::from("/s/a.json.swp"));
        assert_eq!(changed_scripts(&modify), [PathBuf::from("/s/a.json")]);

        let created = Event::new(EventKind::Create(CreateKind::File)).add_path(PathBuf::from("/s/b.json"));
        assert_eq!(changed_scripts(&created).len(), 1);

        let removed = Event::new(EventKind::Remove(RemoveKind::File)).add_path(PathBuf::from("/s/b.json"));
        assert_eq!(changed_scripts(&removed).len(), 1);

        let read = Event::new(EventKind::Access(AccessKind::Any)).add_path(PathBuf::from("/s/a.json"));
        assert!(changed_scripts(&read).is_empty());
    }

    #[tokio::test]
    async fn missing_folder_cannot_be_watched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = spawn_watcher(&dir.path().join("nope")).unwrap_err();
        assert!(err.starts_with("Failed to watch scripts folder"));
    }
}
