//! Go source fixtures for integration tests.

use std::fs;
use std::path::{Path, PathBuf};

/// Write a provider carrying a single string field.
///
/// The generated record then exposes `{{ .<identifier>.Value }}` as a plain
/// string, so it pipes cleanly into string-typed render functions.
pub fn write_string_provider(
    dir: &Path,
    file_name: &str,
    identifier: &str,
    value: &str,
) -> PathBuf {
    let source = format!(
        "package main\n\n\
         type {id} struct {{\n\
         \tValue string\n\
         }}\n\n\
         func New{id}() {id} {{\n\
         \treturn {id}{{Value: {value:?}}}\n\
         }}\n",
        id = identifier,
        value = value,
    );
    let path = dir.join(file_name);
    fs::write(&path, source).expect("Failed to write provider fixture");
    path
}

/// Write a provider that appends its identifier to `order.log` in the
/// current working directory when invoked, for observing invocation order.
pub fn write_logging_provider(
    dir: &Path,
    file_name: &str,
    identifier: &str,
) -> PathBuf {
    let source = format!(
        "package main\n\n\
         import \"os\"\n\n\
         type {id} string\n\n\
         func New{id}() {id} {{\n\
         \tf, err := os.OpenFile(\"order.log\", os.O_APPEND|os.O_CREATE|os.O_WRONLY, 0o644)\n\
         \tif err == nil {{\n\
         \t\tf.WriteString(\"{id};\")\n\
         \t\tf.Close()\n\
         \t}}\n\
         \treturn {id}(\"{lower}\")\n\
         }}\n",
        id = identifier,
        lower = identifier.to_lowercase(),
    );
    let path = dir.join(file_name);
    fs::write(&path, source).expect("Failed to write provider fixture");
    path
}

/// Write a custom pipes file overriding `replace` to only replace the
/// first occurrence.
pub fn write_custom_pipes(dir: &Path) -> PathBuf {
    let source = "package main\n\n\
                  import (\n\
                  \t\"strings\"\n\
                  \t\"text/template\"\n\
                  )\n\n\
                  func CustomPipes() template.FuncMap {\n\
                  \treturn template.FuncMap{\n\
                  \t\t\"replace\": func(old, new, s string) (string, error) {\n\
                  \t\t\treturn strings.Replace(s, old, new, 1), nil\n\
                  \t\t},\n\
                  \t}\n\
                  }\n";
    let path = dir.join("pipes.go");
    fs::write(&path, source).expect("Failed to write pipes fixture");
    path
}

/// Write an executable shell script standing in for the `go` binary.
///
/// The script body runs under `/bin/sh` with the usual `go` arguments in
/// `$@`, letting executor tests observe invocations without a real Go
/// toolchain.
#[cfg(unix)]
pub fn write_fake_go(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("go");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write fake go");
    let mut perms = fs::metadata(&path)
        .expect("Failed to stat fake go")
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("Failed to chmod fake go");
    path
}
