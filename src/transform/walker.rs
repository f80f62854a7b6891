use std::mem;

use swc_core::common::{BytePos, Spanned};
use swc_core::ecma::ast::{
    AwaitExpr, BinExpr, BinaryOp, CallExpr, Callee, Class, CondExpr, Expr, ExprStmt, MemberExpr, MemberProp,
    ModuleItem, NewExpr, OptCall, Program, Stmt, TaggedTpl, UnaryExpr, UpdateExpr,
};
use swc_core::ecma::visit::{Visit, VisitWith};
use tracing::trace;

use super::allocator::CodeAllocator;
use super::build_mode::BuildModeTest;
use super::matcher::{Guard, PatternMatcher};
use super::rewriter::{parenthesize, Rewriter};
use crate::syntax::{offset, range, Splices};

/// What the parent of the expression being visited implies for it.
#[derive(Debug, Clone, Copy, Default)]
struct Context {
    guard: Guard,
    /// The slot binds tighter than `?:` and `||`, so a replacement placed
    /// there needs parentheses.
    tight: bool,
}

impl Context {
    const TIGHT: Context = Context {
        guard: Guard::None,
        tight: true,
    };
}

/// Post-order traversal of one file: children are rewritten first, then the
/// node itself is classified and, on a match, its span is replaced.
pub struct TreeWalker<'a, 'c> {
    matcher: &'c PatternMatcher,
    build_mode: &'c BuildModeTest,
    rewriter: Rewriter<'a>,
    splices: Splices<'a>,
    allocator: &'c mut CodeAllocator,
    ctx: Context,
    /// Start of the expression statement being visited, when that statement
    /// is an element of a statement list.
    statement_start: Option<BytePos>,
}

impl<'a, 'c> TreeWalker<'a, 'c> {
    /// `source` is the text `program` was parsed from.
    pub fn new(
        matcher: &'c PatternMatcher,
        build_mode: &'c BuildModeTest,
        rewriter: Rewriter<'a>,
        source: &'a str,
        allocator: &'c mut CodeAllocator,
    ) -> Self {
        Self {
            matcher,
            build_mode,
            rewriter,
            splices: Splices::new(source),
            allocator,
            ctx: Context::default(),
            statement_start: None,
        }
    }

    /// Rewrites every unguarded match in `program` and returns the new text.
    pub fn run(mut self, program: &Program) -> String {
        program.visit_with(&mut self);
        trace!(edits = self.splices.len(), "walk complete");
        self.splices.finish()
    }

    fn visit_in(&mut self, ctx: Context, expr: &Expr) {
        self.ctx = ctx;
        self.visit_expr(expr);
    }

    fn visit_listed_stmt(&mut self, stmt: &Stmt) {
        let start = match stmt {
            Stmt::Expr(ExprStmt { expr, .. }) => Some(expr.span().lo),
            _ => None,
        };
        let outer = mem::replace(&mut self.statement_start, start);
        stmt.visit_with(self);
        self.statement_start = outer;
    }
}

impl Visit for TreeWalker<'_, '_> {
    fn visit_expr(&mut self, expr: &Expr) {
        let ctx = mem::take(&mut self.ctx);
        match expr {
            Expr::Paren(paren) => self.visit_in(
                Context {
                    guard: ctx.guard,
                    tight: false,
                },
                &paren.expr,
            ),
            _ => expr.visit_children_with(self),
        }
        self.ctx = Context::default();

        let result = self.matcher.classify(expr, ctx.guard);
        let Some(mut replacement) = self.rewriter.rewrite(result, expr, &self.splices, self.allocator) else {
            return;
        };
        let span = expr.span();
        trace!(?result, start = offset(span.lo), "rewriting call site");
        if ctx.tight {
            replacement = parenthesize(&replacement);
            // A statement opening with `(` would continue a previous line that relies on ASI.
            if self.statement_start == Some(span.lo) {
                replacement.insert(0, ';');
            }
        }
        self.splices.replace(range(span), replacement);
    }

    fn visit_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.visit_listed_stmt(stmt);
        }
    }

    fn visit_module_items(&mut self, items: &[ModuleItem]) {
        for item in items {
            match item {
                ModuleItem::Stmt(stmt) => self.visit_listed_stmt(stmt),
                ModuleItem::ModuleDecl(decl) => decl.visit_with(self),
            }
        }
    }

    fn visit_cond_expr(&mut self, node: &CondExpr) {
        let guard = if self.build_mode.matches(&node.test) {
            Guard::Conditional
        } else {
            Guard::None
        };
        self.visit_in(Context::TIGHT, &node.test);
        self.visit_in(Context { guard, tight: false }, &node.cons);
        self.visit_in(Context { guard, tight: false }, &node.alt);
    }

    fn visit_bin_expr(&mut self, node: &BinExpr) {
        let guard = if node.op == BinaryOp::LogicalOr && self.build_mode.matches(&node.left) {
            Guard::LogicalOr
        } else {
            Guard::None
        };
        self.visit_in(Context::TIGHT, &node.left);
        self.visit_in(Context { guard, tight: true }, &node.right);
    }

    fn visit_unary_expr(&mut self, node: &UnaryExpr) {
        self.visit_in(Context::TIGHT, &node.arg);
    }

    fn visit_update_expr(&mut self, node: &UpdateExpr) {
        self.visit_in(Context::TIGHT, &node.arg);
    }

    fn visit_await_expr(&mut self, node: &AwaitExpr) {
        self.visit_in(Context::TIGHT, &node.arg);
    }

    fn visit_member_expr(&mut self, node: &MemberExpr) {
        self.visit_in(Context::TIGHT, &node.obj);
        if let MemberProp::Computed(prop) = &node.prop {
            self.visit_in(Context::default(), &prop.expr);
        }
    }

    fn visit_call_expr(&mut self, node: &CallExpr) {
        if let Callee::Expr(callee) = &node.callee {
            self.visit_in(Context::TIGHT, callee);
        }
        for arg in &node.args {
            self.visit_in(Context::default(), &arg.expr);
        }
    }

    fn visit_opt_call(&mut self, node: &OptCall) {
        self.visit_in(Context::TIGHT, &node.callee);
        for arg in &node.args {
            self.visit_in(Context::default(), &arg.expr);
        }
    }

    fn visit_new_expr(&mut self, node: &NewExpr) {
        self.visit_in(Context::TIGHT, &node.callee);
        for arg in node.args.iter().flatten() {
            self.visit_in(Context::default(), &arg.expr);
        }
    }

    fn visit_tagged_tpl(&mut self, node: &TaggedTpl) {
        self.visit_in(Context::TIGHT, &node.tag);
        node.tpl.visit_with(self);
    }

    fn visit_class(&mut self, class: &Class) {
        // The heritage clause is a left-hand-side expression.
        if let Some(super_class) = &class.super_class {
            self.visit_in(Context::TIGHT, super_class);
        }
        class.decorators.visit_with(self);
        class.body.visit_with(self);
    }
}
