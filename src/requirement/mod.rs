//! Requirement token parsing.
//!
//! A unit's `requires_plugins` declaration is a comma-separated list of tokens.
//! Each token is either a bare identifier (`woocommerce`) or an identifier with
//! an explicit metadata endpoint (`my-addon|https://example.com/my-addon.json`).
//!
//! Parsing never fails. A token that cannot be split unambiguously is kept
//! whole as an opaque identifier:
//!
//! | token                 | identifier         | endpoint     |
//! |-----------------------|--------------------|--------------|
//! | `slug`                | `slug`             | -            |
//! | `slug\|endpoint`      | `slug`             | `endpoint`   |
//! | `  slug  \|  end  `   | `slug`             | `end`        |
//! | `\|endpoint`          | `\|endpoint`       | -            |
//! | `slug\|`              | `slug\|`           | -            |
//! | `slug\|\|endpoint`    | `slug\|\|endpoint` | -            |
//! | `a\|b\|c`             | `a\|b\|c`          | -            |
//!
//! Downstream code must therefore tolerate identifiers containing `|`.

use serde::{Deserialize, Serialize};

/// Separator between identifier and endpoint inside one token.
pub const ENDPOINT_SEPARATOR: char = '|';

/// Separator between tokens in a declaration.
pub const TOKEN_SEPARATOR: char = ',';

/// A parsed requirement token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requirement {
    /// Normalized dependency identifier.
    pub identifier: String,
    /// Explicit metadata endpoint, when the token carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Requirement {
    fn opaque(token: &str) -> Self {
        Self {
            identifier: token.to_string(),
            endpoint: None,
        }
    }
}

/// Parse one requirement token into an identifier and optional endpoint.
///
/// The whole token is trimmed first. It is split only when it contains exactly
/// one `|`, that pipe is neither the first nor the last character, and both
/// trimmed halves are non-empty. In every other case the trimmed token is
/// returned unchanged with no endpoint.
pub fn parse(token: &str) -> Requirement {
    let token = token.trim();

    if !token.contains(ENDPOINT_SEPARATOR)
        || token.starts_with(ENDPOINT_SEPARATOR)
        || token.ends_with(ENDPOINT_SEPARATOR)
    {
        return Requirement::opaque(token);
    }

    if token.matches(ENDPOINT_SEPARATOR).count() > 1 {
        return Requirement::opaque(token);
    }

    let Some((identifier, endpoint)) = token.split_once(ENDPOINT_SEPARATOR) else {
        return Requirement::opaque(token);
    };
    let (identifier, endpoint) = (identifier.trim(), endpoint.trim());

    if identifier.is_empty() || endpoint.is_empty() {
        return Requirement::opaque(token);
    }

    Requirement {
        identifier: identifier.to_string(),
        endpoint: Some(endpoint.to_string()),
    }
}

/// Split a raw declaration into trimmed, non-empty tokens.
pub fn split_declaration(declaration: &str) -> impl Iterator<Item = &str> {
    declaration.split(TOKEN_SEPARATOR).map(str::trim).filter(|token| !token.is_empty())
}

/// Parse every token of a declaration, in declaration order.
pub fn parse_declaration(declaration: &str) -> Vec<Requirement> {
    split_declaration(declaration).map(parse).collect()
}
