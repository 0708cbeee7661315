//! # Placeholder Resolver
//!
//! Substitutes `<args:N>` and `<env:NAME>` tokens in every string leaf of
//! a document before any provider is resolved, so provider parameters can
//! themselves be parameterized from the command line or the environment.
//!
//! Substituted text is not re-scanned and mapping keys are left alone.
//! The result stays a string leaf: `"<args:0>"` with `args[0] = "3"` is
//! the string `"3"`, not the integer 3.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::model::{ConfigNode, KeyPath};
use crate::{Error, Result};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(args|env):([^<>]*)>").expect("placeholder pattern is valid")
});

static ENV_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("env name pattern is valid")
});

/// External parameters available to placeholders.
#[derive(Debug, Clone, Default)]
pub struct Placeholders {
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

impl Placeholders {
    pub fn new(args: Vec<String>, env: HashMap<String, String>) -> Self {
        Self { args, env }
    }

    /// Positional arguments plus the current process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped; a
    /// placeholder naming one reports it as undefined.
    pub fn from_process(args: Vec<String>) -> Self {
        let env = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { args, env }
    }

    /// Substitute every placeholder in the tree.
    pub fn substitute(&self, node: &ConfigNode) -> Result<ConfigNode> {
        let mut path = KeyPath::root();
        self.walk(node, &mut path)
    }

    fn walk(&self, node: &ConfigNode, path: &mut KeyPath) -> Result<ConfigNode> {
        match node {
            ConfigNode::String(s) => Ok(ConfigNode::String(self.substitute_str(s, path)?)),
            ConfigNode::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    path.push_index(i);
                    out.push(self.walk(item, path)?);
                    path.pop();
                }
                Ok(ConfigNode::List(out))
            }
            ConfigNode::Map(map) => {
                let mut out = map.clone();
                for (key, value) in out.iter_mut() {
                    path.push_key(key.as_str());
                    *value = self.walk(value, path)?;
                    path.pop();
                }
                Ok(ConfigNode::Map(out))
            }
            literal => Ok(literal.clone()),
        }
    }

    fn substitute_str(&self, s: &str, path: &KeyPath) -> Result<String> {
        if !s.contains('<') {
            return Ok(s.to_string());
        }

        let mut out = String::with_capacity(s.len());
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(s) {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            let source = caps.get(1).map_or("", |m| m.as_str());
            let name = caps.get(2).map_or("", |m| m.as_str());

            out.push_str(&s[last..whole.start]);
            let replacement = match source {
                "args" => self.lookup_arg(name, path)?,
                _ => self.lookup_env(name, path)?,
            };
            debug!(path = %path, token = &s[whole.clone()], "substituted placeholder");
            out.push_str(replacement);
            last = whole.end;
        }
        out.push_str(&s[last..]);
        Ok(out)
    }

    fn lookup_arg(&self, index: &str, path: &KeyPath) -> Result<&str> {
        let invalid = || Error::PlaceholderError {
            path: path.to_string(),
            message: format!("'<args:{index}>' needs a non-negative integer index"),
        };
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let n: usize = index.parse().map_err(|_| invalid())?;
        self.args.get(n).map(String::as_str).ok_or_else(|| Error::PlaceholderError {
            path: path.to_string(),
            message: format!(
                "'<args:{n}>' is out of bounds: {} argument(s) given",
                self.args.len()
            ),
        })
    }

    fn lookup_env(&self, name: &str, path: &KeyPath) -> Result<&str> {
        if !ENV_NAME.is_match(name) {
            return Err(Error::PlaceholderError {
                path: path.to_string(),
                message: format!("'<env:{name}>' is not a valid variable name"),
            });
        }
        self.env.get(name).map(String::as_str).ok_or_else(|| Error::PlaceholderError {
            path: path.to_string(),
            message: format!("environment variable '{name}' is not defined"),
        })
    }
}

/// Substitute `<args:N>` / `<env:NAME>` throughout `node`.
pub fn substitute_placeholders(
    node: &ConfigNode,
    args: &[String],
    env: &HashMap<String, String>,
) -> Result<ConfigNode> {
    Placeholders::new(args.to_vec(), env.clone()).substitute(node)
}

/// True when `s` still contains an `<args:…>` or `<env:…>` token.
pub fn contains_placeholder(s: &str) -> bool {
    PLACEHOLDER.is_match(s)
}
