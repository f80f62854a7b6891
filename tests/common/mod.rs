#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use invariant_codes::{Config, Pipeline, RunOptions, RunReport};

/// A throwaway package with a `package.json` and a `dist/` directory.
pub struct TestProject {
    temp_dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let project = Self {
            temp_dir: TempDir::new().unwrap(),
        };
        project.write("package.json", r#"{ "name": "@test/pkg", "version": "0.0.1" }"#);
        fs::create_dir_all(project.dist()).unwrap();
        project
    }

    pub fn with_dist_files(files: &[(&str, &str)]) -> Self {
        let project = Self::new();
        for (relative, text) in files {
            project.write_dist(relative, text);
        }
        project
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn dist(&self) -> PathBuf {
        self.root().join("dist")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dist().join("invariantErrorCodes.js")
    }

    pub fn write(&self, relative: &str, text: &str) {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    pub fn write_dist(&self, relative: &str, text: &str) {
        self.write(&format!("dist/{relative}"), text);
    }

    pub fn read_dist(&self, relative: &str) -> String {
        fs::read_to_string(self.dist().join(relative)).unwrap()
    }

    pub fn read_manifest(&self) -> String {
        fs::read_to_string(self.manifest_path()).unwrap()
    }

    pub fn run(&self, config: Config) -> RunReport {
        Pipeline::new(config)
            .unwrap()
            .run(&RunOptions::new(self.root()))
            .unwrap()
    }

    pub fn check(&self, config: Config) -> RunReport {
        Pipeline::new(config)
            .unwrap()
            .run(&RunOptions::new(self.root()).dry_run(true))
            .unwrap()
    }
}

pub const PROD: &str = "process.env.NODE_ENV === \"production\"";
