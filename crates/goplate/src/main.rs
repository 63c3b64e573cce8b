mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use colored::Colorize;
use goplate_core::plan::PlanBuilder;
use goplate_gotool::{resolve_go, run_plan, CancelToken, RunOptions};
use std::fs;
use std::io;
use tempfile::TempDir;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // the workspace lives exactly as long as this run; TempDir removes it
    // on drop whether the run succeeded or failed
    let workspace = TempDir::new().context("cannot create workspace directory")?;
    if cli.verbose {
        println!(
            "{} Staging workspace '{}'",
            "→".cyan(),
            workspace.path().display()
        );
    }

    let mut builder = PlanBuilder::new(workspace.path())?.inputs(cli.inputs.iter().cloned());
    if let Some(pipes) = &cli.pipes {
        builder = builder.custom_pipes(pipes);
    }
    let plan = builder.finish(&cli.template)?;

    if cli.verbose {
        for provider in &plan.providers {
            println!(
                "{} Staged '{}' as {}",
                "→".cyan(),
                provider.source.display(),
                provider.identifier
            );
        }
        println!(
            "{} Synthesized hosting program '{}'",
            "✓".green().bold(),
            plan.program.display()
        );
    }

    let go = resolve_go()?;
    if cli.verbose {
        println!("{} Using go binary '{}'", "→".cyan(), go.display());
    }
    let options = RunOptions {
        go_binary: go,
        fetch_deps: cli.fetch_deps,
    };
    let cancel = CancelToken::new();

    match &cli.output {
        None => {
            run_plan(&plan, &options, io::stdout(), io::stderr(), &cancel)?;
        }
        Some(path) => {
            let mut rendered = Vec::new();
            run_plan(&plan, &options, &mut rendered, io::stderr(), &cancel)?;
            fs::write(path, &rendered)
                .with_context(|| format!("cannot write output '{}'", path.display()))?;
            if cli.verbose {
                println!("{} Wrote '{}'", "✓".green().bold(), path.display());
            }
        }
    }

    Ok(())
}
