//! Diagnostic call rewriting for a single source file.
//!
//! [`Transformer`] bundles the configured matcher, the build-mode fragment and
//! the prefilter. A file goes through [`Transformer::parse_unit`], which can
//! run in parallel, and then [`Transformer::rewrite_unit`], which must run in
//! a fixed order against the one [`CodeAllocator`] of the run.

pub mod allocator;
pub mod build_mode;
pub mod matcher;
pub mod rewriter;
pub mod walker;

pub use allocator::{CodeAllocator, ErrorCode, ErrorCodeEntry};
pub use build_mode::BuildModeTest;
pub use matcher::{Guard, MatchResult, PatternMatcher};
pub use rewriter::Rewriter;
pub use walker::TreeWalker;

use regex::{Regex, RegexBuilder};
use swc_core::ecma::ast::Program;
use tracing::debug;

use crate::config::Config;
use crate::error::{Result, RewriteError};
use crate::syntax::{parse_program_with, ParseLimits};

/// One input file, parsed unless the prefilter ruled it out.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    /// Path relative to the scanned directory, with forward slashes.
    pub path: String,
    pub text: String,
    pub program: Option<Program>,
}

/// Result of rewriting one [`SourceUnit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenUnit {
    pub path: String,
    pub original: String,
    pub output: String,
    /// Codes allocated while rewriting this file.
    pub codes: usize,
}

impl RewrittenUnit {
    pub fn changed(&self) -> bool {
        self.output != self.original
    }
}

#[derive(Debug, Clone)]
pub struct Transformer {
    matcher: PatternMatcher,
    build_mode: BuildModeTest,
    prefilter: Regex,
    limits: ParseLimits,
}

impl Transformer {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let prefilter = RegexBuilder::new(&config.patterns.prefilter_pattern())
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            matcher: PatternMatcher::new(&config.patterns),
            build_mode: BuildModeTest::from_config(&config.build_mode),
            prefilter,
            limits: config.limits.parse_limits(),
        })
    }

    /// Cheap textual check; files that fail it are never parsed.
    pub fn may_contain_sites(&self, text: &str) -> bool {
        self.prefilter.is_match(text)
    }

    /// Applies the prefilter and parses the file if it passes.
    pub fn parse_unit(&self, path: String, text: String) -> Result<SourceUnit> {
        let program = if self.may_contain_sites(&text) {
            let program =
                parse_program_with(&text, self.limits).map_err(|err| RewriteError::parse(path.as_str(), err))?;
            Some(program)
        } else {
            debug!(file = %path, "skipped by prefilter");
            None
        };
        Ok(SourceUnit { path, text, program })
    }

    /// Rewrites every unguarded site of `unit`, allocating codes from
    /// `allocator` in traversal order.
    pub fn rewrite_unit(&self, unit: SourceUnit, allocator: &mut CodeAllocator) -> RewrittenUnit {
        let SourceUnit { path, text, program } = unit;

        let Some(program) = program else {
            return RewrittenUnit {
                path,
                output: text.clone(),
                original: text,
                codes: 0,
            };
        };

        let before = allocator.len();
        // Walking and dropping the tree recurse as deep as parsing did.
        let output = stacker::grow(self.limits.stack_size, || {
            let rewriter = Rewriter::new(&path, &text, &self.build_mode);
            let walker = TreeWalker::new(&self.matcher, &self.build_mode, rewriter, &text, &mut *allocator);
            let output = walker.run(&program);
            drop(program);
            output
        });
        let codes = allocator.len() - before;
        debug!(file = %path, codes, "rewrote file");

        RewrittenUnit {
            path,
            original: text,
            output,
            codes,
        }
    }

    /// Parses and rewrites a single file in one step.
    pub fn transform(&self, path: &str, text: &str, allocator: &mut CodeAllocator) -> Result<RewrittenUnit> {
        let unit = self.parse_unit(path.to_string(), text.to_string())?;
        Ok(self.rewrite_unit(unit, allocator))
    }
}
