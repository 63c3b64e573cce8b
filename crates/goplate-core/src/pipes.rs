//! Render-time pipe registry: named Go function literals with
//! override-by-name merge semantics.
//!
//! The registry is a capability table keyed by pipe name. Merging never
//! fails and never removes: overrides replace entries of the same name in
//! place and unmatched overrides are appended, so base order stays stable
//! for deterministic source emission.

use std::collections::BTreeSet;

/// One named render-time function: a Go function literal plus the imports
/// its body needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipe {
    pub name: String,
    pub imports: Vec<String>,
    pub body: String,
}

impl Pipe {
    pub fn new(name: &str, imports: &[&str], body: &str) -> Self {
        Self {
            name: name.to_string(),
            imports: imports.iter().map(|i| i.to_string()).collect(),
            body: body.to_string(),
        }
    }
}

/// An ordered name-to-pipe mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipeRegistry {
    entries: Vec<Pipe>,
}

impl PipeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixed default pipe set: `join`, `map`, `replace`, `split`,
    /// `toUpper`, `toLower`.
    pub fn default_set() -> Self {
        let mut registry = Self::new();
        registry.insert(Pipe::new(
            "join",
            &["strings"],
            "func(sep string, a []string) (string, error) {\n\
             \treturn strings.Join(a, sep), nil\n\
             }",
        ));
        // e.g. map "Name,Age,Job" "|" => "[John|25|Painter Jane|21|Teacher]"
        registry.insert(Pipe::new(
            "map",
            &["reflect", "strings"],
            "func(f, sep string, a interface{}) ([]string, error) {\n\
             \tfields := strings.Split(f, \",\")\n\
             \treflected := reflect.ValueOf(a)\n\
             \tout := make([]string, reflected.Len())\n\
             \tfor i := range out {\n\
             \t\tv := reflected.Index(i)\n\
             \t\trow := make([]string, len(fields))\n\
             \t\tfor k, field := range fields {\n\
             \t\t\trow[k] = v.FieldByName(field).String()\n\
             \t\t}\n\
             \t\tout[i] = strings.Join(row, sep)\n\
             \t}\n\
             \treturn out, nil\n\
             }",
        ));
        // replaces all occurrences of a value
        registry.insert(Pipe::new(
            "replace",
            &["strings"],
            "func(old, new, s string) (string, error) {\n\
             \treturn strings.Replace(s, old, new, -1), nil\n\
             }",
        ));
        registry.insert(Pipe::new(
            "split",
            &["strings"],
            "func(sep, s string) ([]string, error) {\n\
             \ts = strings.TrimSpace(s)\n\
             \tif s == \"\" {\n\
             \t\treturn []string{}, nil\n\
             \t}\n\
             \treturn strings.Split(s, sep), nil\n\
             }",
        ));
        registry.insert(Pipe::new(
            "toUpper",
            &["strings"],
            "func(s string) (string, error) {\n\
             \treturn strings.ToUpper(s), nil\n\
             }",
        ));
        registry.insert(Pipe::new(
            "toLower",
            &["strings"],
            "func(s string) (string, error) {\n\
             \treturn strings.ToLower(s), nil\n\
             }",
        ));
        registry
    }

    pub fn get(&self, name: &str) -> Option<&Pipe> {
        self.entries.iter().find(|p| p.name == name)
    }

    /// Replace the entry of the same name in place, or append.
    pub fn insert(&mut self, pipe: Pipe) {
        match self.entries.iter_mut().find(|p| p.name == pipe.name) {
            Some(existing) => *existing = pipe,
            None => self.entries.push(pipe),
        }
    }

    /// Produce a new registry with every override applied by name.
    ///
    /// Names absent from `overrides` are copied unchanged; names present
    /// only in `overrides` are added. Idempotent: applying the same
    /// overrides twice equals applying them once. There is no removal.
    pub fn extend(&self, overrides: &PipeRegistry) -> PipeRegistry {
        let mut merged = self.clone();
        for pipe in &overrides.entries {
            merged.insert(pipe.clone());
        }
        merged
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Emit the runtime registry as a Go source file.
    ///
    /// The import block is the deduplicated union of every entry's imports
    /// plus `text/template`, so replacing a pipe drops the imports only it
    /// needed.
    pub fn to_go_source(&self) -> String {
        let mut imports: BTreeSet<&str> = BTreeSet::new();
        imports.insert("text/template");
        for pipe in &self.entries {
            for import in &pipe.imports {
                imports.insert(import);
            }
        }

        let mut out = String::from("package main\n\nimport (\n");
        for import in &imports {
            out.push_str("\t\"");
            out.push_str(import);
            out.push_str("\"\n");
        }
        out.push_str(")\n\n");

        out.push_str(
            "type Pipes struct {\n\
             \tMap template.FuncMap\n\
             }\n\n\
             func (p *Pipes) Extend(fm template.FuncMap) {\n\
             \tfor k, v := range fm {\n\
             \t\tp.Map[k] = v\n\
             \t}\n\
             }\n\n\
             func NewPipes() *Pipes {\n\
             \treturn &Pipes{\n\
             \t\tMap: template.FuncMap{\n",
        );
        for pipe in &self.entries {
            out.push_str("\t\t\t\"");
            out.push_str(&pipe.name);
            out.push_str("\": ");
            out.push_str(&indent_continuation(&pipe.body, 3));
            out.push_str(",\n");
        }
        out.push_str("\t\t},\n\t}\n}\n");
        out
    }
}

/// Indent every line of a Go snippet after the first by `depth` tabs, so a
/// function literal written at the top level nests inside a map literal.
fn indent_continuation(snippet: &str, depth: usize) -> String {
    let prefix = "\t".repeat(depth);
    let mut lines = snippet.lines();
    let mut out = String::new();
    if let Some(first) = lines.next() {
        out.push_str(first);
    }
    for line in lines {
        out.push('\n');
        if !line.is_empty() {
            out.push_str(&prefix);
        }
        out.push_str(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_only_replace() -> Pipe {
        Pipe::new(
            "replace",
            &["strings"],
            "func(old, new, s string) (string, error) {\n\
             \treturn strings.Replace(s, old, new, 1), nil\n\
             }",
        )
    }

    #[test]
    fn default_set_has_the_fixed_pipes() {
        let registry = PipeRegistry::default_set();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(
            names,
            vec!["join", "map", "replace", "split", "toUpper", "toLower"]
        );
    }

    #[test]
    fn extend_overrides_by_name_in_place() {
        let base = PipeRegistry::default_set();
        let mut overrides = PipeRegistry::new();
        overrides.insert(first_only_replace());

        let merged = base.extend(&overrides);
        assert_eq!(merged.len(), base.len());
        assert!(merged
            .get("replace")
            .unwrap()
            .body
            .contains("strings.Replace(s, old, new, 1)"));
        // base order is preserved
        let names: Vec<&str> = merged.names().collect();
        assert_eq!(
            names,
            vec!["join", "map", "replace", "split", "toUpper", "toLower"]
        );
    }

    #[test]
    fn extend_appends_unmatched_overrides() {
        let base = PipeRegistry::default_set();
        let mut overrides = PipeRegistry::new();
        overrides.insert(Pipe::new(
            "shout",
            &["strings"],
            "func(s string) (string, error) {\n\
             \treturn strings.ToUpper(s) + \"!\", nil\n\
             }",
        ));

        let merged = base.extend(&overrides);
        assert_eq!(merged.len(), base.len() + 1);
        assert!(merged.get("shout").is_some());
        assert!(merged.get("join").is_some());
    }

    #[test]
    fn extend_is_idempotent() {
        let base = PipeRegistry::default_set();
        let mut overrides = PipeRegistry::new();
        overrides.insert(first_only_replace());

        let once = base.extend(&overrides);
        let twice = once.extend(&overrides);
        assert_eq!(once, twice);
    }

    #[test]
    fn go_source_has_registry_surface() {
        let source = PipeRegistry::default_set().to_go_source();
        assert!(source.starts_with("package main\n"));
        assert!(source.contains("func NewPipes() *Pipes"));
        assert!(source.contains("func (p *Pipes) Extend(fm template.FuncMap)"));
        assert!(source.contains("\"toUpper\": func(s string) (string, error)"));
    }

    #[test]
    fn go_source_imports_are_the_union_of_pipe_imports() {
        let source = PipeRegistry::default_set().to_go_source();
        assert!(source.contains("\t\"reflect\"\n"));
        assert!(source.contains("\t\"strings\"\n"));
        assert!(source.contains("\t\"text/template\"\n"));

        // a registry whose pipes need nothing imports only text/template
        let mut minimal = PipeRegistry::new();
        minimal.insert(Pipe::new(
            "id",
            &[],
            "func(s string) (string, error) {\n\treturn s, nil\n}",
        ));
        let source = minimal.to_go_source();
        assert!(!source.contains("\"reflect\""));
        assert!(!source.contains("\"strings\""));
        assert!(source.contains("\"text/template\""));
    }
}
