//! CLI flag structure using clap

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "goplate")]
#[command(version, about = "Render a Go text/template against Go data providers", long_about = None)]
pub struct Cli {
    /// Template path, e.g. /PATH/TO/file.{yml,json}
    #[arg(short, long)]
    pub template: PathBuf,

    /// Provider file `PATH/TO/file.go[:Name]`; repeatable, order fixes
    /// invocation order
    #[arg(short, long = "input", value_name = "PATH[:NAME]")]
    pub inputs: Vec<String>,

    /// User-defined pipes file declaring `func CustomPipes() template.FuncMap`
    #[arg(short, long)]
    pub pipes: Option<PathBuf>,

    /// Write the rendered document here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Run `go get ./...` in the workspace before rendering
    #[arg(long)]
    pub fetch_deps: bool,

    #[arg(short, long)]
    pub verbose: bool,
}
