//! Input spec resolution: `path[:name]` into a provider identifier and
//! binding name.
//!
//! Resolution is a pure function of the spec string; nothing here touches
//! the filesystem.

use crate::error::{GoplateError, Result};
use std::path::{Path, PathBuf};

/// A resolved input, before staging.
///
/// `identifier` names both the provider's Go type and its field in the
/// aggregate render record; `var_name` is the lowercase local binding used
/// by the synthesized program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInput {
    pub path: PathBuf,
    pub identifier: String,
    pub var_name: String,
}

/// Parse one `path[:name]` specifier.
///
/// An explicit `:name` override is used verbatim (it must still be a valid
/// Go identifier, since it names a type in synthesized code). Without an
/// override the identifier is derived from the base filename: text before
/// the first `.`, split on non-alphanumeric separators, each segment
/// capitalized, concatenated.
pub fn parse_input_spec(spec: &str) -> Result<ProviderInput> {
    let (path, explicit) = match spec.split_once(':') {
        Some((path, name)) => (path, Some(name)),
        None => (spec, None),
    };

    if path.trim().is_empty() {
        return Err(GoplateError::InputSpecInvalid(format!(
            "empty path component in input '{}'",
            spec
        )));
    }

    let identifier = match explicit {
        Some(name) => {
            if !is_go_identifier(name) {
                return Err(GoplateError::InputSpecInvalid(format!(
                    "override '{}' in input '{}' is not a valid identifier",
                    name, spec
                )));
            }
            name.to_string()
        }
        None => derive_identifier(Path::new(path)).ok_or_else(|| {
            GoplateError::InputSpecInvalid(format!(
                "cannot derive an identifier from input '{}'",
                spec
            ))
        })?,
    };

    let var_name = binding_name(&identifier);
    Ok(ProviderInput {
        path: PathBuf::from(path),
        identifier,
        var_name,
    })
}

/// Resolve an ordered list of specifiers, enforcing identifier uniqueness.
///
/// Uniqueness is judged on the lowercased binding name, not the identifier
/// itself: identifiers differing only in case would declare the same local
/// in the synthesized program. Order is preserved: it fixes both staging
/// order and the synthesized program's provider invocation order.
pub fn resolve_inputs<S: AsRef<str>>(specs: &[S]) -> Result<Vec<ProviderInput>> {
    let mut inputs: Vec<ProviderInput> = Vec::with_capacity(specs.len());
    for spec in specs {
        let input = parse_input_spec(spec.as_ref())?;
        if let Some(prev) = inputs.iter().find(|p| p.var_name == input.var_name) {
            return Err(GoplateError::IdentifierCollision {
                identifier: input.identifier,
                first: prev.path.clone(),
                second: input.path,
            });
        }
        inputs.push(input);
    }
    Ok(inputs)
}

/// The lowercase local binding for an identifier, nudged off Go keywords.
///
/// `Map` would bind as `map`, which cannot appear on the left of `:=`; a
/// trailing underscore keeps the binding a legal identifier.
fn binding_name(identifier: &str) -> String {
    let name = identifier.to_lowercase();
    if GO_KEYWORDS.contains(&name.as_str()) {
        format!("{name}_")
    } else {
        name
    }
}

const GO_KEYWORDS: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else",
    "fallthrough", "for", "func", "go", "goto", "if", "import", "interface",
    "map", "package", "range", "return", "select", "struct", "switch",
    "type", "var",
];

/// Derive an identifier from a file path's base name.
///
/// `my-provider_file.go` becomes `MyProviderFile`. Returns `None` when no
/// alphanumeric characters survive.
fn derive_identifier(path: &Path) -> Option<String> {
    let base = path.file_name()?.to_string_lossy().into_owned();
    let stem = base.split('.').next().unwrap_or_default();

    let mut out = String::new();
    for segment in stem.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }

    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        None
    } else {
        Some(out)
    }
}

fn is_go_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
