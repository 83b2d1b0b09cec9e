//! Naming strategies for collections, fields and discriminator values.

use serde::{Deserialize, Serialize};

/// A pure string transform applied to type and property names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NamingStrategy {
    /// Leave the name unchanged.
    #[default]
    None,
    /// Lowercase the first character: `FirstName` becomes `firstName`.
    CamelCase,
    /// Uppercase the first character: `firstName` becomes `FirstName`.
    PascalCase,
    /// Lowercase everything.
    LowerCase,
    /// Uppercase everything.
    UpperCase,
    /// Lowercase words joined by underscores: `FirstName` becomes `first_name`.
    SnakeCase,
}

impl NamingStrategy {
    /// Apply the strategy to a name.
    pub fn apply(&self, name: &str) -> String {
        match self {
            NamingStrategy::None => name.to_string(),
            NamingStrategy::CamelCase => map_first(name, char::to_lowercase),
            NamingStrategy::PascalCase => map_first(name, char::to_uppercase),
            NamingStrategy::LowerCase => name.to_lowercase(),
            NamingStrategy::UpperCase => name.to_uppercase(),
            NamingStrategy::SnakeCase => snake_case(name),
        }
    }
}

fn map_first<I>(name: &str, f: impl Fn(char) -> I) -> String
where
    I: Iterator<Item = char>,
{
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => f(first).chain(chars).collect(),
        None => String::new(),
    }
}

fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            // word boundary: "aB", "1B", or the last capital of an acronym "HTTPServer"
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                if !out.ends_with('_') {
                    out.push('_');
                }
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}
