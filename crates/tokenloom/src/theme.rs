//! Theme diffing.
//!
//! A theme is the base layers plus one theme layer, merged and resolved like
//! the base store. Only the tokens whose resolved value actually changes are
//! emitted as overrides, so a theme file that restates a base value produces
//! nothing.
//!
//! By default the diff is limited to semantic colors (`sys` tier, `color`
//! type): structural tokens such as spacing stay out of theme blocks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::store::TokenStore;
use crate::token::{Token, TokenType};
use crate::util::values_equal;

/// Which tokens a theme may override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffScope {
    /// Leading path segments a token must match, such as `sys` or
    /// `sys.color`. `None` matches every path.
    #[serde(rename = "prefix")]
    pub path_prefix: Option<String>,
    /// Allowed token types. Empty allows every type.
    #[serde(rename = "types")]
    pub token_types: Vec<TokenType>,
}

impl Default for DiffScope {
    fn default() -> Self {
        Self {
            path_prefix: Some("sys".to_string()),
            token_types: vec![TokenType::Color],
        }
    }
}

impl DiffScope {
    /// A scope that admits every token.
    pub fn everything() -> Self {
        Self {
            path_prefix: None,
            token_types: Vec::new(),
        }
    }

    pub fn contains(&self, token: &Token) -> bool {
        let prefix_ok = match &self.path_prefix {
            None => true,
            Some(prefix) => {
                token.path == *prefix
                    || token
                        .path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('.'))
            }
        };
        prefix_ok && (self.token_types.is_empty() || self.token_types.contains(&token.token_type))
    }
}

/// Theme tokens within `scope` whose resolved value differs from the base.
///
/// Tokens the base does not define are additions and always part of the
/// result, whatever the scope.
pub fn diff(base: &TokenStore, theme: &TokenStore, scope: &DiffScope) -> BTreeMap<String, Token> {
    theme
        .iter()
        .filter(|token| match base.get(&token.path) {
            Some(original) => {
                scope.contains(token) && !values_equal(original.resolved(), token.resolved())
            }
            None => true,
        })
        .map(|token| (token.path.clone(), token.clone()))
        .collect()
}

/// The overrides of one theme, ready for emission.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeOverrides {
    pub name: String,
    /// Selector of the override block, e.g. `[data-theme="dark"]`.
    pub selector: String,
    /// Optional media query mirroring the block, e.g.
    /// `(prefers-color-scheme: dark)`.
    pub media: Option<String>,
    pub tokens: BTreeMap<String, Token>,
}

impl ThemeOverrides {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
