use std::fmt;
use std::path::PathBuf;

/// Everything that can go wrong while assembling a source file, plus the I/O
/// failures that can surface while the driver reads or writes the files
/// around it. One fatal error ends the run; there is no partial-output path.
#[derive(Debug)]
pub enum AssemblerError {
    /// Wrong argument count, wrong extension, unrecognised mode flag.
    Input(String),
    /// Malformed line, bad `BYTE` literal, indexed + immediate/indirect.
    LineFields { line: u32, message: String },
    /// A label was inserted into the symbol table twice.
    DuplicateSymbol { line: u32, symbol: String },
    /// A mnemonic is neither in the opcode table nor a known directive.
    OpcodeLookup { line: u32, mnemonic: String },
    /// An operand referenced a symbol absent from the symbol table.
    UndefinedSymbol { line: u32, symbol: String },
    /// Displacement could not be resolved PC-relative or base-relative.
    Instruction { line: u32, message: String },
    /// Failure to read or write one of the files the driver touches.
    Io(std::io::Error, PathBuf),
}

impl fmt::Display for AssemblerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblerError::Input(message) => write!(f, "{}", message),
            AssemblerError::LineFields { line, message } => {
                write!(f, "line {}: {}", line, message)
            }
            AssemblerError::DuplicateSymbol { line, symbol } => write!(
                f,
                "line {}: a duplicate symbol was found: {}",
                line, symbol
            ),
            AssemblerError::OpcodeLookup { line, mnemonic } => {
                write!(f, "line {}: the mnemonic \"{}\" is invalid", line, mnemonic)
            }
            AssemblerError::UndefinedSymbol { line, symbol } => {
                write!(f, "line {}: undefined symbol: {}", line, symbol)
            }
            AssemblerError::Instruction { line, message } => {
                write!(f, "line {}: {}", line, message)
            }
            AssemblerError::Io(err, path) => {
                write!(f, "I/O error on \"{}\": {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for AssemblerError {}
