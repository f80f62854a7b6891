use swc_core::common::Spanned;
use swc_core::ecma::ast::{CallExpr, Callee, Expr, ExprOrSpread, NewExpr};

use super::allocator::{CodeAllocator, ErrorCode, ErrorCodeEntry};
use super::build_mode::BuildModeTest;
use super::matcher::MatchResult;
use crate::syntax::{offset, range, LineIndex, Splices};

/// Builds the two-branch replacement text for a matched call site.
pub struct Rewriter<'a> {
    file: &'a str,
    lines: LineIndex,
    mode: String,
}

impl<'a> Rewriter<'a> {
    /// `source` is the text the site was parsed from; lines are counted in it.
    pub fn new(file: &'a str, source: &str, build_mode: &BuildModeTest) -> Self {
        Self {
            file,
            lines: LineIndex::new(source),
            mode: build_mode.text(),
        }
    }

    /// Returns the replacement text for `site`, allocating exactly one code for
    /// any match, or `None` for `NoMatch`.
    ///
    /// Message and original text are rendered through `splices`, so sites
    /// already rewritten inside this one appear in their rewritten form.
    pub fn rewrite(
        &self,
        result: MatchResult,
        site: &Expr,
        splices: &Splices<'_>,
        allocator: &mut CodeAllocator,
    ) -> Option<String> {
        if !result.is_match() {
            return None;
        }
        let original = splices.render(range(site.span()));
        let replacement = match (result, site) {
            (
                MatchResult::AssertionCall { retained },
                Expr::Call(CallExpr {
                    callee: Callee::Expr(callee),
                    args,
                    ..
                }),
            ) if args.len() > retained => {
                let code = self.allocate(allocator, site, splices, &args[retained..]);
                let mut stripped: Vec<String> = args[..retained]
                    .iter()
                    .map(|arg| splices.render(range(arg.span())))
                    .collect();
                stripped.push(code.to_string());
                let callee = splices.render(range(callee.span()));
                format!("{} ? {}({}) : {}", self.mode, callee, stripped.join(", "), original)
            }
            (MatchResult::ErrorConstruction, Expr::New(NewExpr { callee, args: Some(args), .. }))
                if !args.is_empty() =>
            {
                let code = self.allocate(allocator, site, splices, args);
                let callee = splices.render(range(callee.span()));
                format!("{} ? new {}({}) : {}", self.mode, callee, code, original)
            }
            (MatchResult::WarnOrErrorCall, Expr::Call(CallExpr { args, .. })) => {
                if args.is_empty() {
                    let code = allocator.next();
                    allocator.record(self.entry(code, site, original.clone(), Vec::new()));
                } else {
                    self.allocate(allocator, site, splices, args);
                }
                format!("{} || {}", self.mode, original)
            }
            _ => return None,
        };
        Some(replacement)
    }

    /// Allocates a code for `site` whose message is `message[0]`, followed by
    /// any format arguments.
    fn allocate(
        &self,
        allocator: &mut CodeAllocator,
        site: &Expr,
        splices: &Splices<'_>,
        message: &[ExprOrSpread],
    ) -> ErrorCode {
        let code = allocator.next();
        let node = splices.render(range(message[0].span()));
        let args = message[1..]
            .iter()
            .map(|arg| splices.render(range(arg.span())))
            .collect();
        allocator.record(self.entry(code, site, node, args));
        code
    }

    fn entry(&self, code: ErrorCode, site: &Expr, node: String, args: Vec<String>) -> ErrorCodeEntry {
        ErrorCodeEntry {
            code,
            file: self.file.to_string(),
            line: self.lines.line(offset(site.span().lo)),
            node,
            args,
        }
    }
}

/// Wraps a replacement placed in an operand slot.
pub fn parenthesize(replacement: &str) -> String {
    format!("({replacement})")
}
