//! Classifies a source line's mnemonic into the closed set of shapes pass
//! one and pass two both dispatch on. A single classification function over
//! a tagged variant, rather than a `Format1..Format4`-style class
//! hierarchy, keeps both passes matching the same enum instead of each
//! re-deriving the mnemonic's shape from scratch.

use crate::error::AssemblerError;
use crate::opcodes::OpcodeEntry;
use crate::source::SourceLine;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug)]
pub enum MnemonicClass<'a> {
    Start,
    End,
    Opcode(&'a OpcodeEntry),
    Word,
    ResW,
    ResB,
    Byte,
    Base,
    NoBase,
}

pub fn classify<'a>(
    line: &SourceLine,
    opcodes: &'a HashMap<&'static str, OpcodeEntry>,
) -> Result<MnemonicClass<'a>, AssemblerError> {
    let mnemonic = line.base_mnemonic();
    match mnemonic {
        "START" => Ok(MnemonicClass::Start),
        "END" => Ok(MnemonicClass::End),
        "WORD" => Ok(MnemonicClass::Word),
        "RESW" => Ok(MnemonicClass::ResW),
        "RESB" => Ok(MnemonicClass::ResB),
        "BYTE" => Ok(MnemonicClass::Byte),
        "BASE" => Ok(MnemonicClass::Base),
        "NOBASE" => Ok(MnemonicClass::NoBase),
        _ => opcodes
            .get(mnemonic)
            .map(MnemonicClass::Opcode)
            .ok_or_else(|| AssemblerError::OpcodeLookup {
                line: line.line_number,
                mnemonic: line.mnemonic.clone(),
            }),
    }
}

/// The directive mnemonics that never produce object code; used by the
/// listing writer to decide whether to show an empty object-code column.
pub fn is_directive(mnemonic: &str) -> bool {
    matches!(
        mnemonic,
        "START" | "END" | "RESB" | "RESW" | "BASE" | "NOBASE"
    )
}
