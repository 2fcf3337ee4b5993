use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ssa_jasmin::ir::Module;
use ssa_jasmin::{CompileOptions, ErrorPolicy};

const COMPILER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "ssa-jasmin")]
#[command(about = "SSA IR to Jasmin (JVM assembly) code generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Compile {
        #[arg(help = "Input module in JSON form")]
        input: PathBuf,

        #[arg(short, long, help = "Output Jasmin file")]
        output: PathBuf,

        #[arg(short, long, help = "Class that owns internal functions and globals")]
        class: Option<String>,

        #[arg(long, help = "Skip functions that fail to lower instead of aborting")]
        collect: bool,

        #[arg(long, help = "Always use the operand form of slot loads and stores")]
        no_compact: bool,

        #[arg(long, help = "Append value names as comments to slot accesses")]
        annotate: bool,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            input,
            output,
            class,
            collect,
            no_compact,
            annotate,
        } => {
            let module = read_module(&input)?;

            let mut options = CompileOptions {
                compact_slot_forms: !no_compact,
                annotate_values: annotate,
                error_policy: if collect {
                    ErrorPolicy::Collect
                } else {
                    ErrorPolicy::Abort
                },
                ..CompileOptions::default()
            };
            if let Some(class) = class {
                options.class_name = class;
            }

            let compiled =
                ssa_jasmin::compile_module(&module, &options).context("Compilation failed")?;

            let filename = input
                .file_name()
                .map_or_else(|| input.to_string_lossy(), |f| f.to_string_lossy());
            let text = format!(
                "; generated from {filename} (ssa-jasmin {COMPILER_VERSION})\n{}",
                compiled.text()
            );
            fs::write(&output, &text)
                .with_context(|| format!("Failed to write output to {}", output.display()))?;

            for failure in &compiled.failures {
                tracing::error!(%failure, "function not lowered");
            }
            println!(
                "Compiled {} -> {} ({} methods, {} failed)",
                input.display(),
                output.display(),
                compiled.functions.len(),
                compiled.failures.len()
            );
            if !compiled.failures.is_empty() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn read_module(path: &Path) -> Result<Module> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse IR module {}", path.display()))
}
