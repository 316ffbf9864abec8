pub mod analyzer;
pub mod codegen;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod tac;

use std::{
    fs,
    path::{Path, PathBuf},
};

use codegen::Codegen;
use error::{CompileError, TacError};
use parser::{Parser, Translation};

/// Pass one: recognizes `source` and translates it to three address code.
pub fn translate(source: &str) -> Translation {
    Parser::new(source).parse()
}

/// Pass two: lowers the textual three address code of `translation`.
pub fn generate_assembly(translation: &Translation, tac: &str) -> Result<String, TacError> {
    Codegen::new(translation).generate(tac)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Compiled {
    pub tac: String,
    pub asm: String,
}

pub fn compile(source: &str) -> Result<Compiled, CompileError> {
    let translation = translate(source);
    if translation.has_errors() {
        return Err(CompileError::Rejected(translation.diagnostics));
    }

    let tac = translation.tac_text();
    let asm = generate_assembly(&translation, &tac)?;
    Ok(Compiled { tac, asm })
}

/// `<input>.tac` and `<input>.asm`, next to the input file.
pub fn output_paths(input: &Path) -> (PathBuf, PathBuf) {
    (input.with_extension("tac"), input.with_extension("asm"))
}

/// Outcome of [`compile_file`].
#[derive(Debug)]
pub struct Build {
    pub translation: Translation,
    pub tac_path: PathBuf,
    /// `None` when the program was rejected.
    pub asm_path: Option<PathBuf>,
}

fn read(path: &Path) -> Result<String, CompileError> {
    fs::read_to_string(path).map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, contents: &str) -> Result<(), CompileError> {
    fs::write(path, contents).map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Compiles the file at `input`. The three address code is always written to
/// `tac_path`; the assembly is generated from that file and written to
/// `asm_path` only when translation produced no diagnostics.
pub fn compile_file(
    input: &Path,
    tac_path: &Path,
    asm_path: &Path,
    dump_scopes: bool,
) -> Result<Build, CompileError> {
    let source = read(input)?;

    let mut parser = Parser::new(&source);
    if dump_scopes {
        parser = parser.with_scope_dumps();
    }
    let translation = parser.parse();

    write(tac_path, &translation.tac_text())?;
    let mut build = Build {
        translation,
        tac_path: tac_path.to_path_buf(),
        asm_path: None,
    };
    if build.translation.has_errors() {
        return Ok(build);
    }

    let tac = read(tac_path)?;
    let asm = generate_assembly(&build.translation, &tac)?;
    write(asm_path, &asm)?;
    build.asm_path = Some(asm_path.to_path_buf());
    Ok(build)
}
