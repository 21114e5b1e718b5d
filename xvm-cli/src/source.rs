//! Reading programs from disk in either of their two forms.

use std::fs;
use std::path::Path;

use thiserror::Error;
use xvm_assembler::AsmError;
use xvm_common::{LoadError, Program};

/// Why a program file could not be turned into a function table.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot read '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Asm(#[from] AsmError),
}

/// True for files holding assembly text rather than JSON.
pub fn is_assembly(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "xasm")
}

/// Read a `.xasm` assembly file or a JSON function table.
pub fn read_program(path: &Path) -> Result<Program, SourceError> {
    let text = fs::read_to_string(path).map_err(|source| SourceError::Read {
        path: path.display().to_string(),
        source,
    })?;
    if is_assembly(path) {
        Ok(xvm_assembler::assemble(&text)?)
    } else {
        Ok(Program::from_json(&text)?)
    }
}
