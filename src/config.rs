use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, RewriteError};
use crate::syntax::ParseLimits;

/// Name of the configuration file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "invariant-codes.toml";

/// Prefix of environment overrides, e.g. `INVARIANT_CODES__OUTPUT__TAB_WIDTH=4`.
pub const ENV_PREFIX: &str = "INVARIANT_CODES";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub patterns: PatternConfig,
    pub build_mode: BuildModeConfig,
    pub output: OutputConfig,
    pub limits: LimitsConfig,
    pub logging: LoggingConfig,
}

/// Names of the diagnostic calls that get rewritten
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Assertion function, called as `assertion(condition, message, ...)`.
    pub assertion: String,
    /// Object whose methods log diagnostics, e.g. `invariant.warn(...)`.
    pub diagnostic_object: String,
    pub diagnostic_methods: Vec<String>,
    /// Error type constructed as `new ErrorType(message, ...)`.
    pub error_type: String,
    /// Case-insensitive regex a file must match to be parsed at all. Derived
    /// from the names above when unset.
    pub prefilter: Option<String>,
}

/// The expression selecting the production code path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildModeConfig {
    /// Dotted member chain compared against `production`.
    pub field: String,
    pub production: String,
}

/// Where sources are read from and generated output goes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory to rewrite, relative to the project root.
    pub dist_dir: PathBuf,
    /// Manifest file name, written inside `dist_dir`.
    pub manifest: String,
    /// Package metadata, relative to the project root.
    pub package_json: PathBuf,
    pub extensions: Vec<String>,
    pub tab_width: usize,
}

/// Bounds on how much nesting a file may have
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Files nested deeper than this fail to parse with "nesting too deep".
    pub max_nesting: usize,
    /// Stack for parsing and rewriting one file, in MiB.
    pub stack_mib: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            assertion: "invariant".to_string(),
            diagnostic_object: "invariant".to_string(),
            diagnostic_methods: vec!["warn".to_string(), "error".to_string()],
            error_type: "InvariantError".to_string(),
            prefilter: None,
        }
    }
}

impl Default for BuildModeConfig {
    fn default() -> Self {
        Self {
            field: "process.env.NODE_ENV".to_string(),
            production: "production".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dist_dir: PathBuf::from("dist"),
            manifest: "invariantErrorCodes.js".to_string(),
            package_json: PathBuf::from("package.json"),
            extensions: vec!["js".to_string()],
            tab_width: 2,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let limits = ParseLimits::default();
        Self {
            max_nesting: limits.max_nesting,
            stack_mib: limits.stack_size / (1024 * 1024),
        }
    }
}

impl LimitsConfig {
    pub fn parse_limits(&self) -> ParseLimits {
        ParseLimits {
            max_nesting: self.max_nesting,
            stack_size: self.stack_mib * 1024 * 1024,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(), // pretty, json, compact
        }
    }
}

impl PatternConfig {
    /// The prefilter regex source: the configured one, or an alternation of
    /// every recognized name.
    pub fn prefilter_pattern(&self) -> String {
        if let Some(pattern) = &self.prefilter {
            return pattern.clone();
        }
        let mut names = vec![
            self.assertion.as_str(),
            self.diagnostic_object.as_str(),
            self.error_type.as_str(),
        ];
        names.sort_unstable();
        names.dedup();
        names
            .into_iter()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("|")
    }
}

impl Config {
    /// Load configuration with precedence (highest first):
    /// 1. Environment variables (`INVARIANT_CODES__SECTION__KEY`)
    /// 2. `invariant-codes.toml` in the current directory (if it exists)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_dir(&std::env::current_dir()?)
    }

    /// Load configuration from a specific project directory
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_file = dir.join(CONFIG_FILE_NAME);
        if config_file.exists() {
            Self::build(Some(&config_file))
        } else {
            Self::build(None)
        }
    }

    /// Load configuration from an explicit file, which must exist
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RewriteError::InvalidConfig(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        Self::build(Some(path))
    }

    fn build(file: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder().add_source(ConfigBuilder::try_from(&Config::default())?);

        if let Some(file) = file {
            builder = builder.add_source(File::from(file));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("patterns.diagnostic_methods")
                .with_list_parse_key("output.extensions"),
        );

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the rewrite produce broken output
    pub fn validate(&self) -> Result<()> {
        let names = [
            ("patterns.assertion", &self.patterns.assertion),
            ("patterns.diagnostic_object", &self.patterns.diagnostic_object),
            ("patterns.error_type", &self.patterns.error_type),
        ];
        for (key, name) in names {
            if !is_identifier(name) {
                return Err(RewriteError::InvalidConfig(format!(
                    "{} must be a JavaScript identifier, got {:?}",
                    key, name
                )));
            }
        }
        if let Some(method) = self.patterns.diagnostic_methods.iter().find(|m| !is_identifier(m)) {
            return Err(RewriteError::InvalidConfig(format!(
                "patterns.diagnostic_methods entries must be identifiers, got {:?}",
                method
            )));
        }
        if !self.build_mode.field.split('.').all(is_identifier) {
            return Err(RewriteError::InvalidConfig(format!(
                "build_mode.field must be a dotted member chain, got {:?}",
                self.build_mode.field
            )));
        }
        if self.output.tab_width == 0 || self.output.tab_width > 16 {
            return Err(RewriteError::InvalidConfig(format!(
                "output.tab_width must be between 1 and 16, got {}",
                self.output.tab_width
            )));
        }
        if self.limits.max_nesting == 0 {
            return Err(RewriteError::InvalidConfig(
                "limits.max_nesting must be at least 1".to_string(),
            ));
        }
        if !(1..=4096).contains(&self.limits.stack_mib) {
            return Err(RewriteError::InvalidConfig(format!(
                "limits.stack_mib must be between 1 and 4096, got {}",
                self.limits.stack_mib
            )));
        }
        if self.output.extensions.is_empty() {
            return Err(RewriteError::InvalidConfig(
                "output.extensions must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a new Config for testing
    #[cfg(test)]
    pub fn for_testing() -> Self {
        Self {
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: "compact".to_string(),
            },
            ..Self::default()
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs::write;
    use std::sync::Mutex;
    use tempfile::TempDir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "INVARIANT_CODES__PATTERNS__ASSERTION",
        "INVARIANT_CODES__PATTERNS__DIAGNOSTIC_METHODS",
        "INVARIANT_CODES__OUTPUT__TAB_WIDTH",
        "INVARIANT_CODES__OUTPUT__DIST_DIR",
        "INVARIANT_CODES__BUILD_MODE__PRODUCTION",
    ];

    // Helper to create isolated environment for testing
    fn with_isolated_env<T>(f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let saved_vars: Vec<_> = ENV_KEYS.iter().map(|key| (*key, env::var(key).ok())).collect();

        unsafe {
            for key in ENV_KEYS {
                env::remove_var(key);
            }
        }

        let result = f();

        unsafe {
            for (key, value) in saved_vars {
                if let Some(val) = value {
                    env::set_var(key, val);
                } else {
                    env::remove_var(key);
                }
            }
        }

        result
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();

        assert_eq!(config.patterns.assertion, "invariant");
        assert_eq!(config.patterns.diagnostic_object, "invariant");
        assert_eq!(config.patterns.diagnostic_methods, vec!["warn", "error"]);
        assert_eq!(config.patterns.error_type, "InvariantError");
        assert_eq!(config.build_mode.field, "process.env.NODE_ENV");
        assert_eq!(config.build_mode.production, "production");
        assert_eq!(config.output.dist_dir, PathBuf::from("dist"));
        assert_eq!(config.output.manifest, "invariantErrorCodes.js");
        assert_eq!(config.output.tab_width, 2);
        assert_eq!(config.limits.max_nesting, 1000);
        assert_eq!(config.limits.stack_mib, 256);
        assert_eq!(config.limits.parse_limits(), ParseLimits::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_prefilter_pattern() {
        let patterns = PatternConfig::default();
        assert_eq!(patterns.prefilter_pattern(), "InvariantError|invariant");

        let custom = PatternConfig {
            prefilter: Some("assert".to_string()),
            ..PatternConfig::default()
        };
        assert_eq!(custom.prefilter_pattern(), "assert");
    }

    #[test]
    fn test_load_from_toml_file() -> Result<()> {
        with_isolated_env(|| -> Result<()> {
            let temp_dir = TempDir::new()?;
            let config_content = r#"
[patterns]
assertion = "assertThat"
diagnostic_object = "diagnostics"
error_type = "DiagnosticError"

[build_mode]
field = "globalThis.__MODE__"

[output]
dist_dir = "build"
tab_width = 4

[limits]
max_nesting = 200
"#;
            write(temp_dir.path().join(CONFIG_FILE_NAME), config_content)?;

            let config = Config::load_from_dir(temp_dir.path())?;

            assert_eq!(config.patterns.assertion, "assertThat");
            assert_eq!(config.patterns.diagnostic_object, "diagnostics");
            assert_eq!(config.patterns.error_type, "DiagnosticError");
            // Unset keys keep their defaults
            assert_eq!(config.patterns.diagnostic_methods, vec!["warn", "error"]);
            assert_eq!(config.build_mode.field, "globalThis.__MODE__");
            assert_eq!(config.build_mode.production, "production");
            assert_eq!(config.output.dist_dir, PathBuf::from("build"));
            assert_eq!(config.output.tab_width, 4);
            assert_eq!(config.output.manifest, "invariantErrorCodes.js");
            assert_eq!(config.limits.max_nesting, 200);
            assert_eq!(config.limits.stack_mib, 256);

            Ok(())
        })
    }

    #[test]
    fn test_precedence_env_over_file() -> Result<()> {
        with_isolated_env(|| -> Result<()> {
            let temp_dir = TempDir::new()?;
            write(
                temp_dir.path().join(CONFIG_FILE_NAME),
                "[output]\ntab_width = 4\ndist_dir = \"lib\"\n",
            )?;

            unsafe {
                env::set_var("INVARIANT_CODES__OUTPUT__TAB_WIDTH", "8");
                env::set_var("INVARIANT_CODES__PATTERNS__DIAGNOSTIC_METHODS", "warn,log");
            }

            let config = Config::load_from_dir(temp_dir.path())?;

            // Environment should override file
            assert_eq!(config.output.tab_width, 8);
            assert_eq!(config.patterns.diagnostic_methods, vec!["warn", "log"]);
            // But file value should be preserved where no env var exists
            assert_eq!(config.output.dist_dir, PathBuf::from("lib"));

            Ok(())
        })
    }

    #[test]
    fn test_load_no_config_file() -> Result<()> {
        with_isolated_env(|| -> Result<()> {
            let temp_dir = TempDir::new()?;
            let config = Config::load_from_dir(temp_dir.path())?;
            assert_eq!(config, Config::default());
            Ok(())
        })
    }

    #[test]
    fn test_explicit_config_file_must_exist() {
        let temp_dir = TempDir::new().unwrap();
        let result = Config::load_from_file(&temp_dir.path().join("missing.toml"));
        assert!(matches!(result, Err(RewriteError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        let mut config = Config::for_testing();
        config.patterns.assertion = "not an ident".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::for_testing();
        config.build_mode.field = "process..env".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::for_testing();
        config.output.tab_width = 0;
        assert!(config.validate().is_err());

        let mut config = Config::for_testing();
        config.limits.max_nesting = 0;
        assert!(config.validate().is_err());

        let mut config = Config::for_testing();
        config.limits.stack_mib = 0;
        assert!(config.validate().is_err());
    }
}
