//! Hosting-program synthesis.
//!
//! Expands the embedded bootstrap template into the `main.go` source that
//! glues staged providers, the pipe registry, and the output template
//! together. The bootstrap text is fixed by goplate itself, so an expansion
//! failure is an internal defect, never a user input error.

mod engine;
mod error;

pub use error::BootstrapError;

use crate::error::{GoplateError, Result};
use crate::workspace::Provider;
use std::path::Path;
use toml::Value;

/// The hosting program, one meta-level up: a template whose expansion is
/// itself a Go program. When executed, that program reads the output
/// template, merges pipes, invokes each provider in input order, renders,
/// and writes the result to stdout exactly once with no added framing. Any
/// failure exits non-zero after a single stderr diagnostic naming the stage.
const BOOTSTRAP: &str = r#"package main

import (
	"bytes"
	"fmt"
	"os"
	"text/template"
)

func fatal(stage string, err error) {
	if err != nil {
		fmt.Fprintf(os.Stderr, "goplate: %s: %s\n", stage, err.Error())
		os.Exit(1)
	}
}

func main() {
	data, err := os.ReadFile("{{template_path}}")
	fatal("reading template file", err)
	pipes := NewPipes()
{{if has_custom_pipes}}	pipes.Extend(CustomPipes())
{{/if}}	tmpl, err := template.New("output").Funcs(pipes.Map).Parse(string(data))
	fatal("parsing template file", err)
	var result struct {
{{each providers |p|}}		{{p.identifier}} {{p.identifier}}
{{/each}}	}
{{each providers |p|}}	{{p.var_name}} := New{{p.identifier}}()
	result.{{p.identifier}} = {{p.var_name}}
{{/each}}	var out bytes.Buffer
	err = tmpl.Execute(&out, result)
	fatal("rendering template output", err)
	_, err = os.Stdout.Write(out.Bytes())
	fatal("writing rendered output", err)
}
"#;

/// Synthesize the hosting program source.
///
/// `providers` must already be staged; their order here is their invocation
/// order in the synthesized program.
pub fn synthesize_program(
    template_path: &Path,
    providers: &[Provider],
    has_custom_pipes: bool,
) -> Result<String> {
    let context = program_context(template_path, providers, has_custom_pipes);
    engine::render(BOOTSTRAP, &context).map_err(|e| GoplateError::Synthesis(e.to_string()))
}

fn program_context(
    template_path: &Path,
    providers: &[Provider],
    has_custom_pipes: bool,
) -> Value {
    let mut root = toml::map::Map::new();
    root.insert(
        "template_path".to_string(),
        Value::String(go_quote(template_path)),
    );
    root.insert(
        "has_custom_pipes".to_string(),
        Value::Boolean(has_custom_pipes),
    );
    let items = providers
        .iter()
        .map(|p| {
            let mut table = toml::map::Map::new();
            table.insert(
                "identifier".to_string(),
                Value::String(p.identifier.clone()),
            );
            table.insert("var_name".to_string(), Value::String(p.var_name.clone()));
            Value::Table(table)
        })
        .collect();
    root.insert("providers".to_string(), Value::Array(items));
    Value::Table(root)
}

/// Escape a path for embedding in a double-quoted Go string literal.
fn go_quote(path: &Path) -> String {
    let mut out = String::new();
    for c in path.to_string_lossy().chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}
