//! The `process.env.NODE_ENV === "production"` fragment.

use swc_core::ecma::ast::{BinExpr, BinaryOp, Expr, Lit, MemberExpr, MemberProp};

use crate::config::BuildModeConfig;
use crate::syntax::quote;

/// Comparison of a member chain against the production flag.
///
/// Recognition is deliberately narrow: only a strict equality with the chain on
/// the left and a string literal on the right counts, with any quote style and
/// any amount of enclosing parentheses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildModeTest {
    path: Vec<String>,
    production: String,
}

impl Default for BuildModeTest {
    fn default() -> Self {
        Self::from_config(&BuildModeConfig::default())
    }
}

impl BuildModeTest {
    /// `field` is a dotted chain such as `process.env.NODE_ENV`; validated by
    /// [`crate::config::Config::validate`].
    pub fn new(field: &str, production: &str) -> Self {
        Self {
            path: field.split('.').map(str::to_string).collect(),
            production: production.to_string(),
        }
    }

    pub fn from_config(config: &BuildModeConfig) -> Self {
        Self::new(&config.field, &config.production)
    }

    /// Canonical source text of the fragment.
    pub fn text(&self) -> String {
        format!("{} === {}", self.path.join("."), quote(&self.production))
    }

    pub fn matches(&self, expr: &Expr) -> bool {
        let Expr::Bin(BinExpr {
            op: BinaryOp::EqEqEq,
            left,
            right,
            ..
        }) = unparenthesized(expr)
        else {
            return false;
        };
        let Expr::Lit(Lit::Str(flag)) = unparenthesized(right) else {
            return false;
        };
        *flag.value == *self.production && self.matches_chain(unparenthesized(left), self.path.len())
    }

    /// Whether `expr` is exactly the first `len` segments of the chain.
    fn matches_chain(&self, expr: &Expr, len: usize) -> bool {
        match (expr, len) {
            (Expr::Ident(ident), 1) => *ident.sym == *self.path[0],
            (
                Expr::Member(MemberExpr {
                    obj,
                    prop: MemberProp::Ident(name),
                    ..
                }),
                len,
            ) if len > 1 => *name.sym == *self.path[len - 1] && self.matches_chain(obj, len - 1),
            _ => false,
        }
    }
}

pub(crate) fn unparenthesized(mut expr: &Expr) -> &Expr {
    while let Expr::Paren(paren) = expr {
        expr = &paren.expr;
    }
    expr
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_expression;

    fn matches(source: &str) -> bool {
        BuildModeTest::default().matches(&parse_expression(source).unwrap())
    }

    #[test]
    fn test_canonical_text() {
        let test = BuildModeTest::default();
        assert_eq!(test.text(), r#"process.env.NODE_ENV === "production""#);
        assert!(test.matches(&parse_expression(&test.text()).unwrap()));
    }

    #[test]
    fn test_recognizes_equivalent_spellings() {
        assert!(matches(r#"process.env.NODE_ENV === "production""#));
        assert!(matches(r#"process.env.NODE_ENV==='production'"#));
        assert!(matches(r#"(process.env.NODE_ENV === "production")"#));
        assert!(matches(r#"process . env . NODE_ENV /* mode */ === "production""#));
    }

    #[test]
    fn test_rejects_other_shapes() {
        assert!(!matches(r#"process.env.NODE_ENV == "production""#));
        assert!(!matches(r#"process.env.NODE_ENV !== "production""#));
        assert!(!matches(r#""production" === process.env.NODE_ENV"#));
        assert!(!matches(r#"process.env.NODE_ENV === "development""#));
        assert!(!matches(r#"process.env["NODE_ENV"] === "production""#));
        assert!(!matches(r#"process?.env.NODE_ENV === "production""#));
        assert!(!matches(r#"env.NODE_ENV === "production""#));
        assert!(!matches(r#"globalThis.process.env.NODE_ENV === "production""#));
    }

    #[test]
    fn test_custom_field() {
        let test = BuildModeTest::new("__DEV_MODE__", "prod");
        assert_eq!(test.text(), r#"__DEV_MODE__ === "prod""#);
        assert!(test.matches(&parse_expression("__DEV_MODE__ === 'prod'").unwrap()));
        assert!(!test.matches(&parse_expression("x.__DEV_MODE__ === 'prod'").unwrap()));
    }
}
