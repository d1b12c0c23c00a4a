//! Writing rendered files to disk.
//!
//! Files are written concurrently. A file whose content on disk already
//! matches the rendered text is left untouched, so regenerating an unchanged
//! description does not bump modification times.

// Internal imports (std, crate)
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::rendering::RenderedOutput;
use crate::Result;

// External imports (alphabetized)
use futures::future::try_join_all;
use tokio::fs;

/// What happened to the files of one output directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    /// Whether the directory was emptied before writing
    pub cleaned: bool,
}

impl WriteSummary {
    pub fn total(&self) -> usize {
        self.written.len() + self.unchanged.len()
    }
}

enum FileOutcome {
    Written(PathBuf),
    Unchanged(PathBuf),
}

/// Write every file of `output` below `root`, optionally emptying `root` first
pub async fn write_output(root: &Path, output: &RenderedOutput, clean: bool) -> Result<WriteSummary> {
    let mut summary = WriteSummary::default();
    if clean && fs::try_exists(root).await? {
        log::debug!("Cleaning output directory {}", root.display());
        fs::remove_dir_all(root).await?;
        summary.cleaned = true;
    }
    fs::create_dir_all(root).await?;

    let tasks = output.files.iter().map(|(relative, content)| async move {
        let path = root.join(checked_relative(relative)?);
        write_if_changed(path, content).await
    });
    for outcome in try_join_all(tasks).await? {
        match outcome {
            FileOutcome::Written(path) => summary.written.push(path),
            FileOutcome::Unchanged(path) => summary.unchanged.push(path),
        }
    }
    log::debug!(
        "{}: {} files written, {} unchanged",
        output.language,
        summary.written.len(),
        summary.unchanged.len()
    );
    Ok(summary)
}

async fn write_if_changed(path: PathBuf, content: &str) -> Result<FileOutcome> {
    match fs::read(&path).await {
        Ok(existing) if existing == content.as_bytes() => {
            log::trace!("unchanged {}", path.display());
            return Ok(FileOutcome::Unchanged(path));
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(&path, content).await?;
    log::trace!("wrote {}", path.display());
    Ok(FileOutcome::Written(path))
}

/// Rendered paths are relative and never leave the output root
fn checked_relative(relative: &str) -> Result<&Path> {
    let path = Path::new(relative);
    if path.components().all(|c| matches!(c, Component::Normal(_))) {
        Ok(path)
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("refusing to write outside the output directory: {}", relative),
        )
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::GenerationLanguage;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn output(files: &[(&str, &str)]) -> RenderedOutput {
        RenderedOutput {
            language: GenerationLanguage::CSharp,
            files: files
                .iter()
                .map(|(p, c)| (p.to_string(), c.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[tokio::test]
    async fn test_writes_nested_files() -> crate::Result<()> {
        let dir = tempdir()?;
        let rendered = output(&[
            ("ApiClient.cs", "class ApiClient {}\n"),
            ("Models/Pet.cs", "class Pet {}\n"),
        ]);

        let summary = write_output(dir.path(), &rendered, false).await?;

        assert_eq!(summary.written.len(), 2);
        let pet = fs::read_to_string(dir.path().join("Models/Pet.cs")).await?;
        assert_eq!(pet, "class Pet {}\n");
        Ok(())
    }

    #[tokio::test]
    async fn test_skips_unchanged_files() -> crate::Result<()> {
        let dir = tempdir()?;
        let first = output(&[("A.cs", "a\n"), ("B.cs", "b\n")]);
        write_output(dir.path(), &first, false).await?;

        let second = output(&[("A.cs", "a\n"), ("B.cs", "b changed\n")]);
        let summary = write_output(dir.path(), &second, false).await?;

        assert_eq!(summary.unchanged, vec![dir.path().join("A.cs")]);
        assert_eq!(summary.written, vec![dir.path().join("B.cs")]);
        assert_eq!(summary.total(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_clean_removes_stale_files() -> crate::Result<()> {
        let dir = tempdir()?;
        let root = dir.path().join("out");
        write_output(&root, &output(&[("Old.cs", "old\n")]), false).await?;

        let summary = write_output(&root, &output(&[("New.cs", "new\n")]), true).await?;

        assert!(summary.cleaned);
        assert!(!fs::try_exists(root.join("Old.cs")).await?);
        assert!(fs::try_exists(root.join("New.cs")).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() -> crate::Result<()> {
        let dir = tempdir()?;
        let result = write_output(dir.path(), &output(&[("../evil.cs", "x")]), false).await;
        assert!(matches!(result, Err(crate::Error::Io(_))));
        Ok(())
    }
}
