//! Resolving production error codes back to their messages.

use std::fs;
use std::path::Path;

use swc_core::ecma::ast::{Expr, KeyValueProp, Lit, Prop, PropName, PropOrSpread};

use crate::error::{Result, RewriteError};
use crate::syntax::{parse_expression, text};
use crate::transform::build_mode::unparenthesized;
use crate::transform::ErrorCode;

/// One manifest entry, as source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeInfo {
    pub code: ErrorCode,
    pub file: String,
    /// Absent in manifests written before lines were recorded.
    pub line: Option<usize>,
    pub node: String,
    pub args: Vec<String>,
}

/// A parsed manifest.
#[derive(Debug, Clone)]
pub struct ManifestIndex {
    /// Key of the metadata property, e.g. `"pkg version"`.
    pub version_key: Option<String>,
    pub version: Option<String>,
    entries: Vec<CodeInfo>,
}

impl ManifestIndex {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(source: &str) -> Result<Self> {
        let expr = parse_expression(source).map_err(|err| RewriteError::InvalidManifest(err.to_string()))?;
        let Expr::Object(object) = unparenthesized(&expr) else {
            return Err(RewriteError::InvalidManifest(
                "expected an object literal".to_string(),
            ));
        };

        let mut index = ManifestIndex {
            version_key: None,
            version: None,
            entries: Vec::new(),
        };

        for prop in &object.props {
            let KeyValueProp { key, value } = key_value(prop)
                .ok_or_else(|| RewriteError::InvalidManifest("unexpected property form".to_string()))?;
            let name = key_name(key).ok_or_else(|| RewriteError::InvalidManifest("computed key".to_string()))?;

            match (name.parse::<ErrorCode>(), &**value) {
                (Ok(code), Expr::Object(fields)) => {
                    index.entries.push(read_entry(source, code, &fields.props)?);
                }
                (Err(_), Expr::Lit(Lit::Str(version))) if name.ends_with(" version") => {
                    index.version = Some(version.value.to_string());
                    index.version_key = Some(name);
                }
                _ => {
                    return Err(RewriteError::InvalidManifest(format!(
                        "unexpected property {name:?}"
                    )));
                }
            }
        }

        Ok(index)
    }

    pub fn get(&self, code: ErrorCode) -> Result<&CodeInfo> {
        self.entries
            .iter()
            .find(|entry| entry.code == code)
            .ok_or(RewriteError::CodeNotFound(code))
    }

    pub fn entries(&self) -> &[CodeInfo] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn key_value(prop: &PropOrSpread) -> Option<&KeyValueProp> {
    match prop {
        PropOrSpread::Prop(prop) => match &**prop {
            Prop::KeyValue(key_value) => Some(key_value),
            _ => None,
        },
        PropOrSpread::Spread(_) => None,
    }
}

fn key_name(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(lit) => Some(lit.value.to_string()),
        PropName::Num(num) => Some(num.value.to_string()),
        _ => None,
    }
}

fn read_entry(source: &str, code: ErrorCode, fields: &[PropOrSpread]) -> Result<CodeInfo> {
    let mut file = None;
    let mut line = None;
    let mut node = None;
    let mut args = Vec::new();

    for field in fields.iter().filter_map(key_value) {
        match (key_name(&field.key).as_deref(), &*field.value) {
            (Some("file"), Expr::Lit(Lit::Str(lit))) => file = Some(lit.value.to_string()),
            (Some("line"), Expr::Lit(Lit::Num(num))) => line = Some(num.value as usize),
            (Some("node"), value) => node = Some(text(source, value).to_string()),
            (Some("args"), Expr::Array(array)) => {
                args = array
                    .elems
                    .iter()
                    .flatten()
                    .map(|item| text(source, item).to_string())
                    .collect();
            }
            _ => {}
        }
    }

    match (file, node) {
        (Some(file), Some(node)) => Ok(CodeInfo {
            code,
            file,
            line,
            node,
            args,
        }),
        _ => Err(RewriteError::InvalidManifest(format!(
            "entry {code} needs both file and node"
        ))),
    }
}
