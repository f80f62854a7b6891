use swc_core::ecma::ast::{CallExpr, Callee, Expr, ExprOrSpread, MemberExpr, MemberProp, NewExpr};

use crate::config::PatternConfig;

/// The build-mode guard, if any, that directly encloses a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Guard {
    #[default]
    None,
    /// A branch of `BuildModeTest ? ... : ...`.
    Conditional,
    /// The right operand of `BuildModeTest || ...`.
    LogicalOr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// `invariant(condition, message, ...args)`. The stripped branch keeps the
    /// first `retained` arguments.
    AssertionCall { retained: usize },
    /// `invariant.warn(...)` or `invariant.error(...)`.
    WarnOrErrorCall,
    /// `new InvariantError(message, ...args)`.
    ErrorConstruction,
    NoMatch,
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        *self != MatchResult::NoMatch
    }
}

/// Classifies call and construction nodes against the configured names.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    assertion: String,
    diagnostic_object: String,
    diagnostic_methods: Vec<String>,
    error_type: String,
}

impl PatternMatcher {
    pub fn new(config: &PatternConfig) -> Self {
        Self {
            assertion: config.assertion.clone(),
            diagnostic_object: config.diagnostic_object.clone(),
            diagnostic_methods: config.diagnostic_methods.clone(),
            error_type: config.error_type.clone(),
        }
    }

    /// Never fails: anything unrecognized, malformed or already guarded is
    /// `NoMatch`. Optional calls are `OptChain` nodes and never get here as
    /// calls.
    pub fn classify(&self, node: &Expr, parent: Guard) -> MatchResult {
        match node {
            Expr::Call(CallExpr {
                callee: Callee::Expr(callee),
                args,
                ..
            }) => match &**callee {
                Expr::Ident(ident) if *ident.sym == *self.assertion => {
                    if args.len() > 1 && !is_spread(&args[1]) && parent != Guard::Conditional {
                        MatchResult::AssertionCall { retained: 1 }
                    } else {
                        MatchResult::NoMatch
                    }
                }
                Expr::Member(MemberExpr {
                    obj,
                    prop: MemberProp::Ident(method),
                    ..
                }) if is_ident(obj, &self.diagnostic_object)
                    && self.diagnostic_methods.iter().any(|m| *m == *method.sym) =>
                {
                    if parent != Guard::LogicalOr {
                        MatchResult::WarnOrErrorCall
                    } else {
                        MatchResult::NoMatch
                    }
                }
                _ => MatchResult::NoMatch,
            },
            Expr::New(NewExpr { callee, args, .. }) if is_ident(callee, &self.error_type) => {
                let message = args.as_deref().and_then(<[ExprOrSpread]>::first);
                if message.is_some_and(|message| !is_spread(message)) && parent != Guard::Conditional {
                    MatchResult::ErrorConstruction
                } else {
                    MatchResult::NoMatch
                }
            }
            _ => MatchResult::NoMatch,
        }
    }
}

fn is_ident(expr: &Expr, name: &str) -> bool {
    matches!(expr, Expr::Ident(ident) if *ident.sym == *name)
}

/// A spread message cannot be reproduced as a single manifest value.
fn is_spread(arg: &ExprOrSpread) -> bool {
    arg.spread.is_some()
}
