use std::{path::PathBuf, process::ExitCode};

use adacc::{compile_file, error::CompileError, output_paths, tac::Instruction};
use clap::Parser;

/// Compiles a source file to three address code and 16-bit assembly.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Source file; the .tac and .asm files are written next to it
    input: PathBuf,

    /// Print the symbol table of each scope right before it is closed
    #[arg(long)]
    dump_scopes: bool,

    /// Only print diagnostics
    #[arg(short, long)]
    quiet: bool,
}

fn run(cli: &Cli) -> Result<(), CompileError> {
    let (tac_path, asm_path) = output_paths(&cli.input);
    let build = compile_file(&cli.input, &tac_path, &asm_path, cli.dump_scopes)?;
    let translation = build.translation;

    for dump in &translation.scope_dumps {
        eprintln!("{dump}");
    }

    if translation.has_errors() {
        let file = cli.input.display();
        for diagnostic in &translation.diagnostics {
            eprintln!("{file}: {diagnostic}");
        }
        return Err(CompileError::Rejected(translation.diagnostics));
    }

    if !cli.quiet {
        for instruction in &translation.tac {
            if let Instruction::Endp(name) = instruction {
                println!("Exiting procedure {name}");
            }
        }
        println!("Parsing and semantic analysis completed successfully!");
        println!("Three Address Code written to: {}", build.tac_path.display());
        if let Some(asm_path) = &build.asm_path {
            println!("Assembly Code written to: {}", asm_path.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
