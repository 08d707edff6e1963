//! Glob patterns over cache keys (Redis `KEYS`/`SCAN MATCH` dialect)

use regex::Regex;

use crate::domain::DomainError;

/// Compiled glob pattern supporting `*`, `?`, `[...]` classes and `\` escapes
#[derive(Debug, Clone)]
pub struct GlobPattern {
    regex: Regex,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self, DomainError> {
        let mut expr = String::with_capacity(pattern.len() + 8);
        expr.push('^');

        let mut chars = pattern.chars();

        while let Some(c) = chars.next() {
            match c {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                '[' => {
                    expr.push('[');

                    for inner in chars.by_ref() {
                        if inner == ']' {
                            break;
                        }

                        match inner {
                            '^' => expr.push('^'),
                            '\\' | '[' => {
                                expr.push('\\');
                                expr.push(inner);
                            }
                            other => expr.push(other),
                        }
                    }

                    expr.push(']');
                }
                '\\' => match chars.next() {
                    Some(escaped) => expr.push_str(&regex::escape(&escaped.to_string())),
                    None => expr.push_str(&regex::escape("\\")),
                },
                other => expr.push_str(&regex::escape(&other.to_string())),
            }
        }

        expr.push('$');

        let regex = Regex::new(&expr)
            .map_err(|e| DomainError::cache(format!("Invalid pattern '{}': {}", pattern, e)))?;

        Ok(Self { regex })
    }

    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }
}
