use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use zthrift_compiler::error::ThriftError;
use zthrift_compiler::types::pretty_print;
use zthrift_compiler::{compile_idl, parse_idl, render_source_context};

#[derive(Parser)]
#[command(name = "zthrift")]
#[command(about = "Compile Thrift IDL subset schemas to Zig compact-protocol code", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Zig encode/decode code from a `.thrift` schema
    Gen {
        /// Input `.thrift` file
        input: PathBuf,

        /// Output `.zig` file (if omitted, prints to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a `.thrift` schema and dump its AST as JSON
    Ast {
        /// Input `.thrift` file
        input: PathBuf,
    },

    /// Parse a `.thrift` schema and print it back as canonical IDL text
    Fmt {
        /// Input `.thrift` file
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), ThriftError> {
    match &cli.command {
        Commands::Gen { input, output } => {
            let text = fs::read_to_string(input).map_err(ThriftError::Io)?;
            let code = compile_idl(&text).map_err(|err| diagnose(&text, err))?;
            if let Some(out_path) = output {
                fs::write(out_path, &code).map_err(ThriftError::Io)?;
                println!("Generated Zig code written to {}", out_path.display());
            } else {
                println!("{code}");
            }
            Ok(())
        }

        Commands::Ast { input } => {
            let text = fs::read_to_string(input).map_err(ThriftError::Io)?;
            let idl = parse_idl(&text).map_err(|err| diagnose(&text, err))?;
            let json = serde_json::to_string_pretty(&idl).expect("AST serializes to JSON");
            println!("{json}");
            Ok(())
        }

        Commands::Fmt { input } => {
            let text = fs::read_to_string(input).map_err(ThriftError::Io)?;
            let idl = parse_idl(&text).map_err(|err| diagnose(&text, err))?;
            print!("{}", pretty_print(&idl));
            Ok(())
        }
    }
}

/// Print caret context for positioned errors before handing the error back.
fn diagnose(text: &str, err: ThriftError) -> ThriftError {
    if let Some((row, col)) = err.position() {
        eprint!("{}", render_source_context(text, row, col));
    }
    err
}
