//! Minimal placeholder engine for expanding the bootstrap template.
//!
//! Supports `{{ key }}` with dotted resolution, `{{each key |var|}}` blocks,
//! and `{{if key}}` blocks over a TOML context. Every `{{` is a directive;
//! the bootstrap template has no need for literal braces.

use super::error::BootstrapError;
use toml::Value;

type Result<T> = std::result::Result<T, BootstrapError>;

/// Render `template` against `data`.
pub(crate) fn render(template: &str, data: &Value) -> Result<String> {
    render_at(template, data, 1)
}

fn render_at(template: &str, data: &Value, start_line: usize) -> Result<String> {
    let mut output = String::new();
    let mut pos = 0;
    let mut line = start_line;

    while pos < template.len() {
        let remaining = &template[pos..];
        let Some(open) = remaining.find("{{") else {
            output.push_str(remaining);
            break;
        };

        let text = &remaining[..open];
        output.push_str(text);
        line += count_newlines(text);
        pos += open;

        let close = template[pos + 2..]
            .find("}}")
            .ok_or_else(|| BootstrapError::MalformedSyntax {
                message: "unclosed placeholder".to_string(),
                line,
            })?;
        let expr = template[pos + 2..pos + 2 + close].trim();
        let directive_len = 2 + close + 2;

        if let Some(rest) = expr.strip_prefix("each ") {
            let (key, var) = parse_each(rest, line)?;
            let body_start = pos + directive_len;
            let (body_len, end_len) = find_block_end(&template[body_start..], "each")
                .ok_or_else(|| BootstrapError::MalformedSyntax {
                    message: format!("unclosed each block for key '{key}'"),
                    line,
                })?;
            let body = &template[body_start..body_start + body_len];

            let value = resolve(data, key).ok_or_else(|| BootstrapError::UndefinedKey {
                key: key.to_string(),
                line,
            })?;
            let items = value
                .as_array()
                .ok_or_else(|| BootstrapError::MalformedSyntax {
                    message: format!("key '{key}' is not an array"),
                    line,
                })?;
            for item in items {
                let scope = bind(data, var, item.clone());
                output.push_str(&render_at(body, &scope, line)?);
            }

            let skip = directive_len + body_len + end_len;
            line += count_newlines(&template[pos..pos + skip]);
            pos += skip;
        } else if let Some(key) = expr.strip_prefix("if ") {
            let key = key.trim();
            let body_start = pos + directive_len;
            let (body_len, end_len) = find_block_end(&template[body_start..], "if")
                .ok_or_else(|| BootstrapError::MalformedSyntax {
                    message: format!("unclosed if block for key '{key}'"),
                    line,
                })?;
            let body = &template[body_start..body_start + body_len];

            // a missing key is simply falsy
            if resolve(data, key).is_some_and(truthy) {
                output.push_str(&render_at(body, data, line)?);
            }

            let skip = directive_len + body_len + end_len;
            line += count_newlines(&template[pos..pos + skip]);
            pos += skip;
        } else if expr.starts_with('/') {
            return Err(BootstrapError::MalformedSyntax {
                message: format!("unexpected {{{{{expr}}}}} without a matching opener"),
                line,
            });
        } else {
            let value = resolve(data, expr).ok_or_else(|| BootstrapError::UndefinedKey {
                key: expr.to_string(),
                line,
            })?;
            output.push_str(&stringify(value, expr)?);
            pos += directive_len;
        }
    }

    Ok(output)
}

/// Parse `items |var|` into (key, var name).
fn parse_each<'a>(rest: &'a str, line: usize) -> Result<(&'a str, &'a str)> {
    let malformed = |message: String| BootstrapError::MalformedSyntax { message, line };
    let pipe = rest
        .find('|')
        .ok_or_else(|| malformed(format!("expected |var| in 'each {rest}'")))?;
    let key = rest[..pipe].trim();
    let var_end = rest[pipe + 1..]
        .find('|')
        .ok_or_else(|| malformed(format!("unclosed |var| in 'each {rest}'")))?;
    let var = rest[pipe + 1..pipe + 1 + var_end].trim();
    if key.is_empty() || var.is_empty() {
        return Err(malformed(format!("empty key or var in 'each {rest}'")));
    }
    Ok((key, var))
}

/// Find the matching `{{/kind}}` for an already-consumed opener, honoring
/// nesting. Returns (body length, closing directive length).
fn find_block_end(text: &str, kind: &str) -> Option<(usize, usize)> {
    let open_prefix = format!("{kind} ");
    let close_tag = format!("/{kind}");
    let mut depth = 0usize;
    let mut pos = 0;

    while let Some(open) = text[pos..].find("{{") {
        let start = pos + open;
        let close = text[start + 2..].find("}}")?;
        let expr = text[start + 2..start + 2 + close].trim();
        if expr.starts_with(&open_prefix) {
            depth += 1;
        } else if expr == close_tag {
            if depth == 0 {
                return Some((start, 2 + close + 2));
            }
            depth -= 1;
        }
        pos = start + 2 + close + 2;
    }
    None
}

/// Resolve a dotted key against TOML data.
fn resolve<'a>(data: &'a Value, key: &str) -> Option<&'a Value> {
    let mut current = data;
    for part in key.split('.') {
        current = match current {
            Value::Table(table) => table.get(part)?,
            _ => return None,
        };
    }
    Some(current)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Boolean(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Integer(i) => *i != 0,
        Value::Array(a) => !a.is_empty(),
        _ => true,
    }
}

fn stringify(value: &Value, key: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::Datetime(dt) => Ok(dt.to_string()),
        Value::Array(_) => Err(BootstrapError::ArrayOutsideEach {
            key: key.to_string(),
        }),
        Value::Table(_) => Err(BootstrapError::TableInPlaceholder {
            key: key.to_string(),
        }),
    }
}

/// Clone the base table with one extra variable binding for a loop body.
fn bind(base: &Value, var: &str, item: Value) -> Value {
    let mut table = match base {
        Value::Table(t) => t.clone(),
        _ => toml::map::Map::new(),
    };
    table.insert(var.to_string(), item);
    Value::Table(table)
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, Value)]) -> Value {
        let mut map = toml::map::Map::new();
        for (key, value) in pairs {
            map.insert(key.to_string(), value.clone());
        }
        Value::Table(map)
    }

    #[test]
    fn renders_plain_text_unchanged() {
        let data = table(&[]);
        assert_eq!(render("no directives", &data).unwrap(), "no directives");
    }

    #[test]
    fn substitutes_placeholders() {
        let data = table(&[("name", Value::String("goplate".to_string()))]);
        assert_eq!(
            render("hello {{ name }}!", &data).unwrap(),
            "hello goplate!"
        );
    }

    #[test]
    fn resolves_dotted_keys() {
        let inner = table(&[("version", Value::String("1.0".to_string()))]);
        let data = table(&[("meta", inner)]);
        assert_eq!(render("v{{ meta.version }}", &data).unwrap(), "v1.0");
    }

    #[test]
    fn undefined_key_carries_the_line_number() {
        let data = table(&[]);
        let err = render("a\nb\n{{ missing }}", &data).unwrap_err();
        assert_eq!(
            err,
            BootstrapError::UndefinedKey {
                key: "missing".to_string(),
                line: 3
            }
        );
    }

    #[test]
    fn each_iterates_in_order_with_binding() {
        let items = Value::Array(vec![
            table(&[("id", Value::String("A".to_string()))]),
            table(&[("id", Value::String("B".to_string()))]),
        ]);
        let data = table(&[("items", items)]);
        let out = render("{{each items |it|}}[{{it.id}}]{{/each}}", &data).unwrap();
        assert_eq!(out, "[A][B]");
    }

    #[test]
    fn each_over_empty_array_renders_nothing() {
        let data = table(&[("items", Value::Array(vec![]))]);
        assert_eq!(
            render("x{{each items |it|}}never{{/each}}y", &data).unwrap(),
            "xy"
        );
    }

    #[test]
    fn if_block_follows_truthiness() {
        let data = table(&[("on", Value::Boolean(true)), ("off", Value::Boolean(false))]);
        assert_eq!(render("{{if on}}yes{{/if}}", &data).unwrap(), "yes");
        assert_eq!(render("{{if off}}yes{{/if}}", &data).unwrap(), "");
        // missing keys are falsy rather than an error
        assert_eq!(render("{{if absent}}yes{{/if}}", &data).unwrap(), "");
    }

    #[test]
    fn nested_each_blocks_match_their_own_closers() {
        let inner = Value::Array(vec![Value::String("x".to_string())]);
        let outer = Value::Array(vec![table(&[("sub", inner)])]);
        let data = table(&[("rows", outer)]);
        let out = render(
            "{{each rows |row|}}({{each row.sub |s|}}{{s}}{{/each}}){{/each}}",
            &data,
        )
        .unwrap();
        assert_eq!(out, "(x)");
    }

    #[test]
    fn unclosed_constructs_are_malformed() {
        let data = table(&[]);
        assert!(matches!(
            render("{{ name ", &data).unwrap_err(),
            BootstrapError::MalformedSyntax { .. }
        ));
        assert!(matches!(
            render("{{each items |i|}}body", &data).unwrap_err(),
            BootstrapError::MalformedSyntax { .. }
        ));
        assert!(matches!(
            render("{{/each}}", &data).unwrap_err(),
            BootstrapError::MalformedSyntax { .. }
        ));
    }
}
