//! esbc CLI
//!
//! Compiles ESTree JSON syntax trees into VM bytecode.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use esbc::{compile, load_program, CompilerOptions, VERSION};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::filter::EnvFilter;

#[derive(Parser)]
#[command(name = "esbc")]
#[command(author, version, about = "Compile ESTree syntax trees into stack-machine bytecode", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(clap::Args)]
struct ModeArgs {
    /// Compile the root as eval code
    #[arg(long)]
    eval: bool,

    /// Compile the function expression in the first statement as the root
    #[arg(long)]
    function: bool,

    /// Do not mark the root as global code
    #[arg(long)]
    scoped: bool,

    /// Allow privileged native references in the root
    #[arg(long)]
    natives: bool,

    /// Read compiler options from a JSON file; flags are merged on top
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a syntax tree and write the encoded unit forest
    Compile {
        /// ESTree JSON file
        input: PathBuf,

        #[command(flatten)]
        mode: ModeArgs,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,

        /// Output file (stdout when absent)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Compile a syntax tree and print a human-readable listing
    Disasm {
        /// ESTree JSON file
        input: PathBuf,

        #[command(flatten)]
        mode: ModeArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Compile {
            input,
            mode,
            pretty,
            output,
        } => run_compile(&input, &mode, pretty, output.as_deref()),
        Commands::Disasm { input, mode } => run_disasm(&input, &mode),
    }
}

fn setup_logging(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();
    Ok(())
}

fn compiler_options(mode: &ModeArgs) -> Result<CompilerOptions> {
    let base = match &mode.options {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read options '{}'", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid options in '{}'", path.display()))?
        }
        None => CompilerOptions::new(),
    };
    Ok(base
        .with_eval(base.eval || mode.eval)
        .with_function(base.function || mode.function)
        .with_scoped(base.scoped || mode.scoped)
        .with_natives(base.natives || mode.natives))
}

fn compile_file(input: &Path, mode: &ModeArgs) -> Result<esbc::CompiledProgram> {
    let options = compiler_options(mode)?;
    let program = load_program(input)
        .with_context(|| format!("failed to load syntax tree '{}'", input.display()))?;
    info!(version = VERSION, file = %input.display(), ?options, "compiling");
    let compiled = compile(&program, options)
        .with_context(|| format!("failed to compile '{}'", input.display()))?;
    info!(units = compiled.units().len(), identifiers = compiled.identifiers().len(), "compiled");
    Ok(compiled)
}

fn run_compile(input: &Path, mode: &ModeArgs, pretty: bool, output: Option<&Path>) -> Result<()> {
    let compiled = compile_file(input, mode)?;
    let json = compiled.to_json_string(pretty)?;
    match output {
        Some(path) => fs::write(path, json + "\n")
            .with_context(|| format!("failed to write '{}'", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}

fn run_disasm(input: &Path, mode: &ModeArgs) -> Result<()> {
    let compiled = compile_file(input, mode)?;
    print!("{}", compiled.disassemble());
    Ok(())
}
