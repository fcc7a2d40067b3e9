//! Declared user-defined functions

use crate::{DbType, DbTypeKind, LanguageFeature, TYPE_UDF};
use adql_diagnostics::{ADQL0301, ErrorCode};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

static SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z][A-Za-z0-9_]*)\s*\((.*)\)\s*(?:->\s*(.+?))?\s*$")
        .expect("valid signature regex")
});

static PARAMETER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z][A-Za-z0-9_]*)\s+(.+?)\s*$").expect("valid parameter regex")
});

/// Malformed function signature
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid function signature \"{signature}\": {reason}")]
pub struct SignatureError {
    pub signature: String,
    pub reason: String,
}

impl SignatureError {
    fn new(signature: &str, reason: impl Into<String>) -> Self {
        Self {
            signature: signature.to_string(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        ADQL0301
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionParam {
    pub name: String,
    pub datatype: DbType,
}

/// Signature of a user-defined function, e.g.
/// `gavo_match(pattern VARCHAR, string VARCHAR) -> INTEGER`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<FunctionParam>,
    pub return_type: DbType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FunctionDef {
    pub fn new(name: impl Into<String>, return_type: DbType) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type,
            description: None,
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, datatype: DbType) -> Self {
        self.params.push(FunctionParam {
            name: name.into(),
            datatype,
        });
        self
    }

    /// Parse `name([param TYPE {, param TYPE}]) [-> TYPE]`.
    ///
    /// Without a return type the function returns an unknown type.
    pub fn parse(signature: &str) -> Result<Self, SignatureError> {
        let captures = SIGNATURE
            .captures(signature)
            .ok_or_else(|| SignatureError::new(signature, "expected name(params) -> type"))?;
        let name = captures[1].to_string();

        let mut params = Vec::new();
        let list = captures[2].trim();
        if !list.is_empty() {
            for param in top_level_items(list) {
                let parts = PARAMETER.captures(param).ok_or_else(|| {
                    SignatureError::new(signature, format!("invalid parameter \"{}\"", param.trim()))
                })?;
                let datatype = DbType::from_sql(&parts[2]).ok_or_else(|| {
                    SignatureError::new(signature, format!("unknown type \"{}\"", &parts[2]))
                })?;
                if params.iter().any(|p: &FunctionParam| p.name.eq_ignore_ascii_case(&parts[1])) {
                    return Err(SignatureError::new(
                        signature,
                        format!("duplicate parameter \"{}\"", &parts[1]),
                    ));
                }
                params.push(FunctionParam {
                    name: parts[1].to_string(),
                    datatype,
                });
            }
        }

        let return_type = match captures.get(3) {
            Some(ty) => DbType::from_sql(ty.as_str()).ok_or_else(|| {
                SignatureError::new(signature, format!("unknown return type \"{}\"", ty.as_str()))
            })?,
            None => DbType::new(DbTypeKind::Unknown),
        };

        Ok(Self {
            name,
            params,
            return_type,
            description: None,
        })
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Canonical signature text
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|p| format!("{} {}", p.name, p.datatype))
            .collect::<Vec<_>>()
            .join(", ");
        if self.return_type.is_unknown() {
            format!("{}({params})", self.name)
        } else {
            format!("{}({params}) -> {}", self.name, self.return_type)
        }
    }

    /// Whether a call `name(args...)` with `arity` arguments designates this function
    pub fn matches_call(&self, name: &str, arity: usize) -> bool {
        self.name.eq_ignore_ascii_case(name) && self.params.len() == arity
    }

    pub fn feature(&self) -> LanguageFeature {
        LanguageFeature {
            feature_type: Some(Cow::Borrowed(TYPE_UDF)),
            form: Cow::Owned(self.signature()),
            optional: true,
            description: self.description.clone().map(Cow::Owned),
            since: crate::AdqlVersion::V2_0,
        }
    }
}

impl fmt::Display for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

/// Split on the commas that are not inside parentheses
fn top_level_items(list: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&list[start..]);
    items
}
