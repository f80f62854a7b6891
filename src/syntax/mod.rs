//! JavaScript syntax layer on top of swc.
//!
//! Files are parsed as scripts or modules, whichever they turn out to be.
//! Anything swc rejects, including recoverable errors, is reported as a
//! [`ParseError`] since a partially understood file could hide call sites from
//! the rewriter. Output is produced by splicing replacement text over the
//! spans swc reports, so unedited text is never reprinted.

pub mod nesting;
pub mod splice;

pub use splice::Splices;

use std::ops::Range;

use swc_core::common::{BytePos, Span, Spanned};
use swc_core::ecma::ast::{EsVersion, Expr, Program};
use swc_core::ecma::parser::lexer::Lexer;
use swc_core::ecma::parser::{error::Error as SwcError, Parser, StringInput, Syntax};

/// Position of the first byte of every parsed text. swc reserves
/// `BytePos(0)` for dummy spans.
pub const START: BytePos = BytePos(1);

/// Guards applied before and during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLimits {
    /// Largest accepted [`nesting::check`] estimate.
    pub max_nesting: usize,
    /// Bytes of stack the parser runs on.
    pub stack_size: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_nesting: 1000,
            stack_size: 256 * 1024 * 1024,
        }
    }
}

/// Parse failure with a 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at line {line}, column {column}")]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = LineIndex::new(source).line_col(source, offset);
        Self {
            message: message.into(),
            offset,
            line,
            column,
        }
    }

    fn from_swc(source: &str, err: SwcError) -> Self {
        let at = offset(err.span().lo);
        Self::at(source, at, err.into_kind().msg())
    }
}

pub fn parse_program(source: &str) -> Result<Program, ParseError> {
    parse_program_with(source, ParseLimits::default())
}

/// Parses a whole file on a stack of `limits.stack_size` bytes, after the
/// nesting estimate has accepted it.
pub fn parse_program_with(source: &str, limits: ParseLimits) -> Result<Program, ParseError> {
    nesting::check(source, limits.max_nesting)?;
    let input = input(source)?;
    stacker::grow(limits.stack_size, || {
        let lexer = Lexer::new(Syntax::Es(Default::default()), EsVersion::latest(), input, None);
        let mut parser = Parser::new_from(lexer);
        let program = parser
            .parse_program()
            .map_err(|err| ParseError::from_swc(source, err))?;
        match parser.take_errors().into_iter().next() {
            Some(err) => Err(ParseError::from_swc(source, err)),
            None => Ok(program),
        }
    })
}

/// Parses a single expression that must span the whole input, apart from
/// surrounding whitespace and leading comments.
pub fn parse_expression(source: &str) -> Result<Box<Expr>, ParseError> {
    let limits = ParseLimits::default();
    nesting::check(source, limits.max_nesting)?;
    let input = input(source)?;
    stacker::grow(limits.stack_size, || {
        let lexer = Lexer::new(Syntax::Es(Default::default()), EsVersion::latest(), input, None);
        let mut parser = Parser::new_from(lexer);
        let expr = parser
            .parse_expr()
            .map_err(|err| ParseError::from_swc(source, err))?;
        if let Some(err) = parser.take_errors().into_iter().next() {
            return Err(ParseError::from_swc(source, err));
        }
        let end = offset(expr.span().hi);
        if !source[end..].trim().is_empty() {
            return Err(ParseError::at(source, end, "unexpected input after expression"));
        }
        Ok(expr)
    })
}

/// swc input over the whole of `source`, starting at [`START`].
pub(crate) fn input(source: &str) -> Result<StringInput<'_>, ParseError> {
    let len = u32::try_from(source.len())
        .ok()
        .and_then(|len| len.checked_add(START.0))
        .ok_or_else(|| ParseError::at(source, 0, "file too large"))?;
    Ok(StringInput::new(source, START, BytePos(len)))
}

/// Byte offset of `pos` in the parsed text.
pub fn offset(pos: BytePos) -> usize {
    pos.0.saturating_sub(START.0) as usize
}

/// Byte range of `span` in the parsed text.
pub fn range(span: Span) -> Range<usize> {
    offset(span.lo)..offset(span.hi)
}

/// Source text of `node`.
pub fn text<'a>(source: &'a str, node: &impl Spanned) -> &'a str {
    &source[range(node.span())]
}

/// JavaScript string literal for `value`.
pub fn quote(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

/// Start offsets of every line, for position lookups in O(log n).
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    /// 1-based line containing `offset`.
    pub fn line(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset)
    }

    /// 1-based line and column (in characters) of `offset` in `source`.
    pub fn line_col(&self, source: &str, offset: usize) -> (usize, usize) {
        let offset = offset.min(source.len());
        let line = self.line(offset);
        let start = self.starts[line - 1];
        let column = source.get(start..offset).map_or(0, |s| s.chars().count()) + 1;
        (line, column)
    }
}
