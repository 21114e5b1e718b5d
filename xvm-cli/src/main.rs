//! XVM CLI: run, debug, assemble and disassemble programs.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Input/load/assembly error
//! - 2: Invalid command line
//! - 3: Runtime error
//! - 4: Step limit reached

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use xvm_cli::commands;
use xvm_vm::machine::{DEFAULT_MAX_CALL_DEPTH, DEFAULT_MAX_STACK_DEPTH};
use xvm_vm::Limits;

#[derive(Parser, Debug)]
#[command(name = "xvm", version)]
#[command(about = "Run, debug and assemble XVM stack-machine programs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a .json or .xasm program to completion
    Run {
        program: PathBuf,

        #[command(flatten)]
        limits: LimitArgs,

        /// Stop after this many instructions
        #[arg(long)]
        step_limit: Option<usize>,
    },

    /// Start the interactive debugger
    Debug {
        /// Program to load before the first prompt
        program: Option<PathBuf>,

        #[command(flatten)]
        limits: LimitArgs,
    },

    /// Assemble text into a JSON function table
    Assemble {
        input: PathBuf,

        /// Output path (default: input with a .json extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a program as canonical assembly text
    Disassemble { input: PathBuf },
}

#[derive(Args, Debug)]
struct LimitArgs {
    /// Maximum operand stack depth
    #[arg(long, default_value_t = DEFAULT_MAX_STACK_DEPTH)]
    max_stack_depth: usize,

    /// Maximum number of nested calls
    #[arg(long, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,
}

impl From<LimitArgs> for Limits {
    fn from(args: LimitArgs) -> Self {
        Limits {
            max_stack_depth: args.max_stack_depth,
            max_call_depth: args.max_call_depth,
        }
    }
}

fn main() {
    xvm_cli::init_logging();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run {
            program,
            limits,
            step_limit,
        } => commands::run(&program, limits.into(), step_limit),
        Command::Debug { program, limits } => commands::debug(program.as_deref(), limits.into()),
        Command::Assemble { input, output } => commands::assemble(&input, output.as_deref()),
        Command::Disassemble { input } => commands::disassemble(&input),
    };

    if let Err(code) = result {
        process::exit(code);
    }
}
