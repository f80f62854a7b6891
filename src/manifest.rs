//! The generated code lookup table.
//!
//! The manifest is a JavaScript object literal rather than JSON because
//! messages are kept as the expressions they were written as (template
//! literals, concatenations), not as evaluated strings.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::error::Result;
use crate::package::PackageMetadata;
use crate::syntax::quote;
use crate::transform::{CodeAllocator, ErrorCodeEntry};

/// Serializes a run's entries into the manifest file.
#[derive(Debug, Clone)]
pub struct ManifestEmitter {
    package: PackageMetadata,
    tab_width: usize,
}

impl ManifestEmitter {
    pub fn new(package: PackageMetadata, tab_width: usize) -> Self {
        Self { package, tab_width }
    }

    /// Key of the leading metadata property.
    pub fn version_key(&self) -> String {
        format!("{} version", self.package.name)
    }

    pub fn render(&self, entries: &[ErrorCodeEntry]) -> String {
        let indent = " ".repeat(self.tab_width);
        let mut out = self.header();

        out.push_str("{\n");
        out.push_str(&format!(
            "{}{}: {}",
            indent,
            quote(&self.version_key()),
            quote(&self.package.version)
        ));

        for entry in entries {
            out.push_str(",\n\n");
            out.push_str(&format!("{}{}: {{\n", indent, entry.code));
            out.push_str(&format!(
                "{indent}{indent}file: {},\n",
                quote(&format!("{}/{}", self.package.name, entry.file))
            ));
            out.push_str(&format!("{indent}{indent}line: {},\n", entry.line));
            out.push_str(&format!("{indent}{indent}node: {}", entry.node));
            if !entry.args.is_empty() {
                out.push_str(&format!(",\n{indent}{indent}args: [{}]", entry.args.join(", ")));
            }
            out.push_str(&format!("\n{indent}}}"));
        }

        out.push_str("\n}\n");
        out
    }

    /// Writes the manifest for everything `allocator` recorded. The allocator
    /// is consumed: a run emits exactly once.
    #[instrument(skip(self, allocator), fields(codes = allocator.len()))]
    pub fn emit(&self, allocator: CodeAllocator, path: &Path) -> Result<PathBuf> {
        let rendered = self.render(allocator.entries());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, rendered)?;
        info!(path = %path.display(), "wrote error code manifest");
        Ok(path.to_path_buf())
    }

    fn header(&self) -> String {
        let name = &self.package.name;
        [
            "Lookup table for production error codes such as \"Invariant Violation: 35\".".to_string(),
            format!("Generated while building {name}; codes are reassigned on every release,"),
            format!("so consult the copy of this file shipped with your installed {name} version."),
            "This file is not meant to be imported.".to_string(),
        ]
        .iter()
        .map(|line| format!("// {}\n", line))
        .collect()
    }
}
