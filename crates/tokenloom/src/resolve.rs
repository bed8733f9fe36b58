//! Reference resolution.
//!
//! A reference is a `{dotted.path}` inside a string value. A string that is
//! exactly one reference takes the target's resolved value, whatever its
//! shape:
//!
//! ```text
//! sys.color.text      = "{ref.color.neutral.10}"   -> "#1a1a1a"
//! cmp.card.padding    = "{sys.spacing.md}"         -> {"value": 12, "unit": "px"}
//! cmp.card.border     = "1px solid {sys.color.line}" -> "1px solid #d0d0d0"
//! ```
//!
//! Strings, arrays and object properties are scanned recursively, so
//! references inside composite values (typography, shadow layers) resolve
//! too. Targets are substituted with their *resolved* value, which makes
//! chains resolve transitively. Each token is resolved once and memoized.
//!
//! A stack of paths currently being resolved detects cycles: requesting a
//! path that is already on the stack fails with
//! [`BuildError::CyclicReference`] carrying the cycle.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::error::{BuildError, Result};
use crate::store::TokenStore;
use crate::token::ReferenceHop;
use crate::util::format_number;

static REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}\s]+)\}").expect("reference pattern is valid"));

/// Paths referenced anywhere in `value`, deduplicated, in scan order.
pub fn references_in(value: &Value) -> Vec<String> {
    let mut found = Vec::new();
    collect_references(value, &mut found);
    found
}

fn collect_references(value: &Value, found: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            for caps in REFERENCE.captures_iter(s) {
                let path = &caps[1];
                if !found.iter().any(|p| p == path) {
                    found.push(path.to_string());
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_references(v, found)),
        Value::Object(map) => map.values().for_each(|v| collect_references(v, found)),
        _ => {}
    }
}

/// Returns the target path when `s` consists of exactly one reference.
pub fn whole_reference(s: &str) -> Option<&str> {
    let caps = REFERENCE.captures(s)?;
    let whole = caps.get(0)?;
    if whole.start() == 0 && whole.end() == s.len() {
        caps.get(1).map(|m| m.as_str())
    } else {
        None
    }
}

/// Whether any string inside `value` contains reference syntax.
pub fn has_reference_syntax(value: &Value) -> bool {
    match value {
        Value::String(s) => REFERENCE.is_match(s),
        Value::Array(items) => items.iter().any(has_reference_syntax),
        Value::Object(map) => map.values().any(has_reference_syntax),
        _ => false,
    }
}

/// Renames reference targets in place. Returns whether anything changed.
pub fn rewrite_references(value: &mut Value, renames: &HashMap<String, String>) -> bool {
    match value {
        Value::String(s) => {
            let rewritten = REFERENCE.replace_all(s, |caps: &Captures| match renames.get(&caps[1]) {
                Some(new) => format!("{{{}}}", new),
                None => caps[0].to_string(),
            });
            if rewritten != s.as_str() {
                *s = rewritten.into_owned();
                true
            } else {
                false
            }
        }
        Value::Array(items) => items
            .iter_mut()
            .fold(false, |changed, v| rewrite_references(v, renames) || changed),
        Value::Object(map) => map
            .values_mut()
            .fold(false, |changed, v| rewrite_references(v, renames) || changed),
        _ => false,
    }
}

/// Renders a resolved value for interpolation into a longer string.
pub fn interpolate(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        Value::Object(map) => match (map.get("value"), map.get("unit")) {
            (Some(Value::Number(n)), Some(Value::String(unit))) => {
                let n = n.as_f64().map(format_number).unwrap_or_else(|| n.to_string());
                format!("{}{}", n, unit)
            }
            _ => value.to_string(),
        },
        other => other.to_string(),
    }
}

struct Resolution {
    value: Value,
    references: Vec<String>,
    chain: Vec<ReferenceHop>,
}

struct Resolver<'a> {
    store: &'a TokenStore,
    memo: HashMap<String, Resolution>,
    in_progress: Vec<String>,
}

impl<'a> Resolver<'a> {
    fn new(store: &'a TokenStore) -> Self {
        Self {
            store,
            memo: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    fn resolve_path(&mut self, path: &str) -> Result<()> {
        if self.memo.contains_key(path) {
            return Ok(());
        }
        if let Some(start) = self.in_progress.iter().position(|p| p == path) {
            let mut cycle = self.in_progress[start..].to_vec();
            cycle.push(path.to_string());
            return Err(BuildError::CyclicReference { cycle });
        }

        let store = self.store;
        let Some(token) = store.get(path) else {
            return Ok(());
        };

        self.in_progress.push(path.to_string());
        let mut chain = Vec::new();
        let value = self.substitute(path, &token.value, &mut chain)?;
        self.in_progress.pop();

        self.memo.insert(
            path.to_string(),
            Resolution {
                value,
                references: references_in(&token.value),
                chain,
            },
        );
        Ok(())
    }

    fn substitute(
        &mut self,
        from: &str,
        value: &Value,
        chain: &mut Vec<ReferenceHop>,
    ) -> Result<Value> {
        match value {
            Value::String(s) => {
                if let Some(target) = whole_reference(s) {
                    return self.follow(from, target, chain);
                }
                if !REFERENCE.is_match(s) {
                    return Ok(value.clone());
                }

                let mut out = String::with_capacity(s.len());
                let mut last = 0;
                for caps in REFERENCE.captures_iter(s) {
                    let Some(whole) = caps.get(0) else { continue };
                    out.push_str(&s[last..whole.start()]);
                    let target = self.follow(from, &caps[1], chain)?;
                    out.push_str(&interpolate(&target));
                    last = whole.end();
                }
                out.push_str(&s[last..]);
                Ok(Value::String(out))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.substitute(from, item, chain))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Value::Object(map) => {
                let mut out = Map::new();
                for (key, item) in map {
                    out.insert(key.clone(), self.substitute(from, item, chain)?);
                }
                Ok(Value::Object(out))
            }
            other => Ok(other.clone()),
        }
    }

    /// Resolves `target` on behalf of `from` and records the hops.
    fn follow(&mut self, from: &str, target: &str, chain: &mut Vec<ReferenceHop>) -> Result<Value> {
        let unresolved = || BuildError::UnresolvedReference {
            from: from.to_string(),
            reference: target.to_string(),
        };
        if !self.store.contains(target) {
            return Err(unresolved());
        }
        self.resolve_path(target)?;
        let resolution = self.memo.get(target).ok_or_else(unresolved)?;

        push_hop(
            chain,
            ReferenceHop {
                from: from.to_string(),
                to: target.to_string(),
                value: resolution.value.clone(),
            },
        );
        for hop in &resolution.chain {
            push_hop(chain, hop.clone());
        }
        Ok(resolution.value.clone())
    }
}

fn push_hop(chain: &mut Vec<ReferenceHop>, hop: ReferenceHop) {
    if !chain.iter().any(|h| h.from == hop.from && h.to == hop.to) {
        chain.push(hop);
    }
}

/// Resolves every token of the store.
///
/// Fails on the first missing target or cycle. A store without reference
/// syntax comes back with `resolved_value == value` on every token.
pub fn resolve(mut store: TokenStore) -> Result<TokenStore> {
    let resolutions = {
        let mut resolver = Resolver::new(&store);
        for path in store.paths() {
            resolver.resolve_path(path)?;
        }
        resolver.memo
    };

    for (path, resolution) in resolutions {
        if let Some(token) = store.get_mut(&path) {
            token.resolved_value = Some(resolution.value);
            token.references = resolution.references;
            token.reference_chain = resolution.chain;
        }
    }

    tracing::debug!(tokens = store.len(), "resolved references");
    Ok(store)
}
