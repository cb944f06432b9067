//! µC compiler front-end
//!
//! Usage: ucc [OPTIONS] <input> [-o <output>]

use anyhow::Context;
use clap::Parser as ClapParser;
use std::io;
use std::path::PathBuf;
use std::process;
use uc_compiler::common::DiagnosticReporter;
use uc_compiler::driver::{default_output_path, write_ir, Pipeline};
use uc_compiler::frontend::FrontendConfig;
use uc_compiler::ir::{Interpreter, IoRuntime};

#[derive(ClapParser, Debug)]
#[command(name = "ucc")]
#[command(version)]
#[command(about = "Front-end compiler for the µC teaching language", long_about = None)]
struct Args {
    /// Input source file (.c)
    #[arg(required = true)]
    input: PathBuf,

    /// Output IR file (defaults to the input with an .ir extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Dump tokens (for debugging)
    #[arg(long)]
    dump_tokens: bool,

    /// Dump AST (for debugging)
    #[arg(long)]
    dump_ast: bool,

    /// Dump IR (for debugging)
    #[arg(long)]
    dump_ir: bool,

    /// Execute the IR with the reference runtime on stdin/stdout
    #[arg(long)]
    run: bool,

    /// Do not pre-declare putint, putstring and getstring
    #[arg(long)]
    no_prelude: bool,

    /// Accept programs without `int main(void)`
    #[arg(long)]
    allow_missing_main: bool,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));

    if args.verbose {
        eprintln!("Compiling {} -> {}", args.input.display(), output_path.display());
    }

    let config = FrontendConfig {
        dump_tokens: args.dump_tokens,
        dump_ast: args.dump_ast,
        dump_ir: args.dump_ir,
        verbose: args.verbose,
        runtime_prelude: !args.no_prelude,
        require_main: !args.allow_missing_main,
    };
    let pipeline = Pipeline::new(config);

    let mut reporter = DiagnosticReporter::new();
    let module = pipeline
        .compile_file(&args.input, &mut reporter)
        .with_context(|| format!("cannot compile {}", args.input.display()))?;

    write_ir(&module, &output_path)
        .with_context(|| format!("cannot write {}", output_path.display()))?;

    if args.verbose {
        eprintln!("Successfully compiled to {}", output_path.display());
    }

    if args.run {
        let stdin = io::stdin();
        let stdout = io::stdout();
        let mut runtime = IoRuntime::new(stdin.lock(), stdout.lock());
        let status = Interpreter::new(&module).run_main(&mut runtime);
        runtime.flush()?;
        let status = status.context("program failed")?;
        if args.verbose {
            eprintln!("main returned {}", status);
        }
    }

    Ok(())
}
