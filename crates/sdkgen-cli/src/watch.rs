//! `generate --watch`: regenerate when the description file changes.

// Internal imports (std, crate)
use std::path::Path;
use std::time::Duration;

use crate::run_generation;

// External imports (alphabetized)
use anyhow::{bail, Context};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use sdkgen_core::GenerationConfig;
use tokio::sync::mpsc;

/// Editors often write a file in several steps
const DEBOUNCE: Duration = Duration::from_millis(300);

/// Generate once, then again after every change until interrupted
pub async fn run(config: &GenerationConfig) -> anyhow::Result<()> {
    if config.openapi_path.starts_with("http://") || config.openapi_path.starts_with("https://") {
        bail!("--watch needs a local description file, got {}", config.openapi_path);
    }
    let description = std::fs::canonicalize(&config.openapi_path)
        .with_context(|| format!("Failed to resolve {}", config.openapi_path))?;
    let directory = description
        .parent()
        .map(Path::to_path_buf)
        .context("Description file has no parent directory")?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |result| {
        let _ = tx.send(result);
    })
    .context("Failed to create file watcher")?;
    watcher
        .watch(&directory, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", directory.display()))?;

    if let Err(e) = run_generation(config).await {
        tracing::error!("{:#}", e);
    }
    tracing::info!("Watching {} for changes (Ctrl+C to stop)", description.display());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping watcher");
                return Ok(());
            }
            event = rx.recv() => {
                let Some(event) = event else {
                    bail!("File watcher stopped unexpectedly");
                };
                match event {
                    Ok(event) if touches(&event, &description) => {
                        tokio::time::sleep(DEBOUNCE).await;
                        while rx.try_recv().is_ok() {}
                        tracing::info!("{} changed, regenerating", description.display());
                        if let Err(e) = run_generation(config).await {
                            tracing::error!("{:#}", e);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("File watcher error: {}", e),
                }
            }
        }
    }
}

/// Whether an event modifies the watched file
fn touches(event: &Event, file: &Path) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event.paths.iter().any(|path| {
            path.as_path() == file
                || std::fs::canonicalize(path)
                    .map(|p| p.as_path() == file)
                    .unwrap_or(false)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use notify::event::{CreateKind, ModifyKind};

    #[test]
    fn test_touches_only_the_description() {
        let file = PathBuf::from("/specs/openapi.yaml");
        let modify = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(file.clone());
        assert!(touches(&modify, &file));

        let other = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/specs/other.yaml"));
        assert!(!touches(&other, &file));

        let access = Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(file.clone());
        assert!(!touches(&access, &file));
    }
}
