use rayon::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::discovery::{SourceDiscovery, SourceFile};
use crate::error::Result;
use crate::manifest::ManifestEmitter;
use crate::package::PackageMetadata;
use crate::transform::{CodeAllocator, SourceUnit, Transformer};

/// Stack of each parse worker. Parsing and rewriting a file run on a
/// separately grown stack of `limits.stack_mib`.
const WORKER_STACK_SIZE: usize = 16 * 1024 * 1024;

/// Per-invocation settings that are not part of the project configuration.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Project root; `package.json` and the dist directory are resolved against it.
    pub root: PathBuf,
    /// Overrides `output.dist_dir`.
    pub dist_dir: Option<PathBuf>,
    /// Parse workers. `Some(1)` parses sequentially, `None` uses one per CPU.
    pub jobs: Option<usize>,
    /// Compute everything but write nothing.
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            dist_dir: None,
            jobs: None,
            dry_run: false,
        }
    }
}

impl RunOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    pub fn dist_dir(&self, config: &Config) -> PathBuf {
        self.root
            .join(self.dist_dir.as_deref().unwrap_or(config.output.dist_dir.as_path()))
    }
}

/// Codes allocated in one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: String,
    pub codes: usize,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub files_scanned: usize,
    pub files_parsed: usize,
    /// Files whose output differs from their input, in discovery order.
    pub changed: Vec<FileReport>,
    pub codes: usize,
    /// `None` for dry runs.
    pub manifest: Option<PathBuf>,
    pub dry_run: bool,
    pub duration: Duration,
}

impl RunReport {
    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }
}

/// Rewrites every matching file under the dist directory and emits the
/// manifest.
pub struct Pipeline {
    config: Config,
    transformer: Transformer,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        let transformer = Transformer::new(&config)?;
        Ok(Self { config, transformer })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    #[instrument(skip(self, options), fields(root = %options.root.display(), dry_run = options.dry_run))]
    pub fn run(&self, options: &RunOptions) -> Result<RunReport> {
        let start = Instant::now();
        let dist_dir = options.dist_dir(&self.config);
        let manifest_path = dist_dir.join(&self.config.output.manifest);

        // Read package metadata up front so a bad package.json fails before any work
        let package = PackageMetadata::load(&options.root.join(&self.config.output.package_json))?;

        let files = SourceDiscovery::new(&self.config.output.extensions)
            .exclude(self.config.output.manifest.clone())
            .find_source_files(&dist_dir)?;
        info!(files = files.len(), dist = %dist_dir.display(), "discovered source files");

        let units = self.parse_files(&files, options.jobs)?;
        let files_parsed = units.iter().filter(|unit| unit.program.is_some()).count();

        // Code allocation is order dependent, so this phase stays sequential
        let mut allocator = CodeAllocator::new();
        let mut changed = Vec::new();
        let mut outputs = Vec::new();
        for (file, unit) in files.iter().zip(units) {
            let rewritten = self.transformer.rewrite_unit(unit, &mut allocator);
            if rewritten.changed() {
                changed.push(FileReport {
                    path: rewritten.path.clone(),
                    codes: rewritten.codes,
                });
                outputs.push((file.path.clone(), rewritten.output));
            }
        }
        let codes = allocator.len();

        let manifest = if options.dry_run {
            debug!(changed = changed.len(), codes, "dry run, nothing written");
            None
        } else {
            for (path, output) in &outputs {
                fs::write(path, output)?;
                debug!(file = %path.display(), "wrote rewritten file");
            }
            if codes == 0 && manifest_path.exists() {
                warn!(
                    manifest = %manifest_path.display(),
                    "no sites found, replacing the existing manifest with an empty one"
                );
            }
            let emitter = ManifestEmitter::new(package, self.config.output.tab_width);
            Some(emitter.emit(allocator, &manifest_path)?)
        };

        let report = RunReport {
            files_scanned: files.len(),
            files_parsed,
            changed,
            codes,
            manifest,
            dry_run: options.dry_run,
            duration: start.elapsed(),
        };
        info!(
            scanned = report.files_scanned,
            parsed = report.files_parsed,
            changed = report.changed.len(),
            codes = report.codes,
            "run complete"
        );
        Ok(report)
    }

    /// Reads and parses every file, failing on the first error in discovery
    /// order. Results come back in the same order as `files`.
    fn parse_files(&self, files: &[SourceFile], jobs: Option<usize>) -> Result<Vec<SourceUnit>> {
        if jobs == Some(1) {
            return self.parse_files_sequential(files);
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.unwrap_or(0))
            .stack_size(WORKER_STACK_SIZE)
            .thread_name(|i| format!("parse-{i}"))
            .build()
            .map(|pool| pool.install(|| self.parse_files_parallel(files)))
            .unwrap_or_else(|e| {
                warn!("failed to create thread pool ({e}), parsing sequentially");
                self.parse_files_sequential(files)
            })
    }

    fn parse_files_parallel(&self, files: &[SourceFile]) -> Result<Vec<SourceUnit>> {
        let results: Vec<_> = files.par_iter().map(|file| self.read_and_parse(file)).collect();
        results.into_iter().collect()
    }

    fn parse_files_sequential(&self, files: &[SourceFile]) -> Result<Vec<SourceUnit>> {
        files.iter().map(|file| self.read_and_parse(file)).collect()
    }

    fn read_and_parse(&self, file: &SourceFile) -> Result<SourceUnit> {
        let text = fs::read_to_string(&file.path)?;
        self.transformer.parse_unit(file.relative.clone(), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RewriteError;
    use tempfile::TempDir;

    fn project(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("package.json"),
            r#"{"name":"pkg","version":"1.0.0"}"#,
        )
        .unwrap();
        for (relative, text) in files {
            let path = temp_dir.path().join("dist").join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, text).unwrap();
        }
        temp_dir
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(Config::for_testing()).unwrap()
    }

    #[test]
    fn test_run_rewrites_and_emits() {
        let temp_dir = project(&[
            ("b.js", "invariant.warn('second');\n"),
            ("a.js", "invariant(x, 'first');\n"),
            ("plain.js", "export const y = 2;\n"),
        ]);

        let report = pipeline().run(&RunOptions::new(temp_dir.path())).unwrap();
        assert_eq!(report.files_scanned, 3);
        assert_eq!(report.files_parsed, 2);
        assert_eq!(report.codes, 2);
        assert_eq!(
            report.changed,
            vec![
                FileReport { path: "a.js".to_string(), codes: 1 },
                FileReport { path: "b.js".to_string(), codes: 1 },
            ]
        );

        let a = fs::read_to_string(temp_dir.path().join("dist/a.js")).unwrap();
        assert!(a.contains("invariant(x, 1)"));
        let b = fs::read_to_string(temp_dir.path().join("dist/b.js")).unwrap();
        assert!(b.contains("|| invariant.warn('second')"));

        let manifest = report.manifest.unwrap();
        assert_eq!(manifest, temp_dir.path().join("dist/invariantErrorCodes.js"));
        let text = fs::read_to_string(manifest).unwrap();
        assert!(text.contains("file: \"pkg/a.js\",\n    line: 1,\n    node: 'first'"));
        assert!(text.contains("file: \"pkg/b.js\",\n    line: 1,\n    node: 'second'"));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let source = "invariant(x, 'first');\n";
        let temp_dir = project(&[("a.js", source)]);

        let report = pipeline()
            .run(&RunOptions::new(temp_dir.path()).dry_run(true))
            .unwrap();
        assert!(report.has_changes());
        assert_eq!(report.codes, 1);
        assert!(report.manifest.is_none());
        assert_eq!(fs::read_to_string(temp_dir.path().join("dist/a.js")).unwrap(), source);
        assert!(!temp_dir.path().join("dist/invariantErrorCodes.js").exists());
    }

    #[test]
    fn test_parse_failure_aborts_before_writing() {
        let good = "invariant(x, 'fine');\n";
        let temp_dir = project(&[("a.js", good), ("z.js", "invariant(x, 'broken';\n")]);

        let err = pipeline().run(&RunOptions::new(temp_dir.path())).unwrap_err();
        assert!(matches!(err, RewriteError::Parse { ref file, .. } if file == "z.js"));
        assert_eq!(fs::read_to_string(temp_dir.path().join("dist/a.js")).unwrap(), good);
        assert!(!temp_dir.path().join("dist/invariantErrorCodes.js").exists());
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let files: Vec<(String, String)> = (0..12)
            .map(|i| (format!("m{:02}.js", i), format!("invariant(v{i}, 'message {i}');\n")))
            .collect();
        let borrowed: Vec<(&str, &str)> = files.iter().map(|(p, t)| (p.as_str(), t.as_str())).collect();

        let sequential = project(&borrowed);
        let parallel = project(&borrowed);
        pipeline().run(&RunOptions::new(sequential.path()).jobs(1)).unwrap();
        pipeline().run(&RunOptions::new(parallel.path()).jobs(4)).unwrap();

        let manifest = |dir: &TempDir| fs::read_to_string(dir.path().join("dist/invariantErrorCodes.js")).unwrap();
        assert_eq!(manifest(&sequential), manifest(&parallel));
    }

    #[test]
    fn test_missing_package_json() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("dist")).unwrap();
        let err = pipeline().run(&RunOptions::new(temp_dir.path())).unwrap_err();
        assert!(matches!(err, RewriteError::Io(_)));
    }

    #[test]
    fn test_dist_dir_override() {
        let temp_dir = project(&[]);
        let out = temp_dir.path().join("build");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("x.js"), "invariant(a, 'b');").unwrap();

        let options = RunOptions {
            dist_dir: Some(PathBuf::from("build")),
            ..RunOptions::new(temp_dir.path())
        };
        let report = pipeline().run(&options).unwrap();
        assert_eq!(report.codes, 1);
        assert!(out.join("invariantErrorCodes.js").exists());
    }

    #[test]
    fn test_rerun_replaces_manifest_with_empty_one() {
        let temp_dir = project(&[("a.js", "invariant(x, 'first');\n")]);
        let pipeline = pipeline();
        pipeline.run(&RunOptions::new(temp_dir.path())).unwrap();

        let report = pipeline.run(&RunOptions::new(temp_dir.path())).unwrap();
        assert_eq!(report.codes, 0);
        let text = fs::read_to_string(temp_dir.path().join("dist/invariantErrorCodes.js")).unwrap();
        assert!(text.ends_with("{\n  \"pkg version\": \"1.0.0\"\n}\n"));
    }

    #[test]
    fn test_deep_nesting_fails_cleanly() {
        let deep = format!("{}invariant(x, 'm'){};\n", "(".repeat(5000), ")".repeat(5000));
        let temp_dir = project(&[("a.js", "invariant(x, 'fine');\n"), ("deep.js", &deep)]);

        let err = pipeline().run(&RunOptions::new(temp_dir.path())).unwrap_err();
        match err {
            RewriteError::Parse { file, source } => {
                assert_eq!(file, "deep.js");
                assert!(source.message.starts_with("nesting too deep"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
        assert!(!temp_dir.path().join("dist/invariantErrorCodes.js").exists());
    }
}
