use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::Result;

/// A file selected for processing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceFile {
    /// Forward-slash path relative to the scanned directory; the sort key.
    pub relative: String,
    pub path: PathBuf,
}

/// Enumerates the files of a build directory in a fixed order.
#[derive(Debug)]
pub struct SourceDiscovery {
    extensions: Vec<String>,
    exclude: Vec<String>,
}

impl SourceDiscovery {
    pub fn new(extensions: &[String]) -> Self {
        Self {
            extensions: extensions.iter().map(|ext| ext.trim_start_matches('.').to_string()).collect(),
            exclude: Vec::new(),
        }
    }

    /// Skip a file by its path relative to the scanned directory.
    pub fn exclude(mut self, relative: impl Into<String>) -> Self {
        self.exclude.push(relative.into());
        self
    }

    /// Find all matching files under `root`, sorted by relative path
    pub fn find_source_files(&self, root: &Path) -> Result<Vec<SourceFile>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry?;
            if !entry.file_type().is_file() || !self.has_extension(entry.path()) {
                continue;
            }
            let relative = relative_path(root, entry.path());
            if self.exclude.contains(&relative) {
                continue;
            }
            files.push(SourceFile {
                relative,
                path: entry.into_path(),
            });
        }

        // Sort for consistent ordering
        files.sort();
        Ok(files)
    }

    pub fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|wanted| wanted == ext))
    }
}

fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
