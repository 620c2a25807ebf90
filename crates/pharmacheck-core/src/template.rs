//! `{name}` placeholder substitution for paths, query values, and expected values

use std::collections::BTreeMap;

/// Request parameters keyed by placeholder name.
pub type Params = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unresolved placeholder {{{name}}}")]
pub struct UnresolvedPlaceholder {
    pub name: String,
}

/// Substitute every `{name}` in `template` from `params`.
///
/// An unterminated `{` is kept literally.
///
/// # Errors
///
/// Returns the first placeholder with no value in `params`.
pub fn render(template: &str, params: &Params) -> Result<String, UnresolvedPlaceholder> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        let name = &rest[open + 1..open + close];
        out.push_str(&rest[..open]);
        match params.get(name) {
            Some(value) => out.push_str(value),
            None => {
                return Err(UnresolvedPlaceholder {
                    name: name.to_string(),
                });
            }
        }
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Placeholder names in order of appearance (duplicates kept).
#[must_use]
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        names.push(rest[open + 1..open + close].to_string());
        rest = &rest[open + close + 1..];
    }
    names
}

/// Merge parameter layers; later layers override earlier ones.
#[must_use]
pub fn layered<'a>(layers: impl IntoIterator<Item = &'a Params>) -> Params {
    let mut merged = Params::new();
    for layer in layers {
        merged.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}
