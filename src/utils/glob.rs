//! # Filename Globs
//!
//! Minimal glob matching for directory listings: `*` matches any run of
//! characters, `?` a single character and `{a,b}` one of the alternatives.
//! Matching applies to a bare entry name, never to a path.

use regex::Regex;

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct Glob {
    regex: Regex,
}

impl Glob {
    /// Compiles `pattern`. Unbalanced braces match literally.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let mut expr = String::from("^");
        let mut in_group = false;

        for c in pattern.chars() {
            match c {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                '{' if !in_group => {
                    in_group = true;
                    expr.push_str("(?:");
                }
                '}' if in_group => {
                    in_group = false;
                    expr.push(')');
                }
                ',' if in_group => expr.push('|'),
                other => expr.push_str(&regex::escape(&other.to_string())),
            }
        }

        if in_group {
            // unterminated group: treat the whole pattern literally
            return Regex::new(&format!("^{}$", regex::escape(pattern))).map(|regex| Self { regex });
        }

        expr.push('$');
        Regex::new(&expr).map(|regex| Self { regex })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}
