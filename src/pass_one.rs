//! Pass one: walks the parsed source in order, assigning each line an
//! absolute location and populating the symbol table. The very first line
//! is only ever inspected for a `START` directive, never itself assigned a
//! location or added to the symbol table — the listing writer falls back
//! to `start_addr` for it.

use crate::byte_literal::parse_byte_literal;
use crate::error::AssemblerError;
use crate::mnemonic::{classify, MnemonicClass};
use crate::numeric::{parse_decimal_u32, parse_hex_u32};
use crate::opcodes::OpcodeEntry;
use crate::source::SourceLine;
use crate::symbol::SymbolTable;
use std::collections::HashMap;

/// Process-wide assembler state threaded explicitly through pass one, pass
/// two, and the record emitter rather than kept in mutable globals.
#[derive(Debug, Default)]
pub struct AssemblerState {
    pub start_addr: u32,
    pub program_name: String,
    pub base: Option<u32>,
    /// `locctr`'s value at `END`. Defaults to `start_addr` for a program
    /// with no instructions, which is what makes a one-byte program length
    /// for an empty body fall out of the `end_addr - start_addr + 1` formula
    /// below rather than needing a special case.
    pub end_addr: u32,
}

fn require_single_operand<'a>(line: &'a SourceLine) -> Result<&'a str, AssemblerError> {
    line.operand
        .as_single()
        .ok_or_else(|| AssemblerError::LineFields {
            line: line.line_number,
            message: format!("{} requires a single operand", line.mnemonic),
        })
}

pub fn assign_addresses(
    lines: &mut [SourceLine],
    opcodes: &HashMap<&'static str, OpcodeEntry>,
) -> Result<(AssemblerState, SymbolTable), AssemblerError> {
    let mut state = AssemblerState::default();
    let mut symtab = SymbolTable::new();

    let mut locctr = 0u32;
    if let Some(first) = lines.first() {
        if first.mnemonic == "START" {
            let operand = require_single_operand(first)?;
            let start_addr = parse_hex_u32(operand, first.line_number)?;
            state.start_addr = start_addr;
            state.program_name = first.label.clone().unwrap_or_default();
            locctr = start_addr;
        }
    }
    state.end_addr = locctr;

    for line in lines.iter_mut().skip(1) {
        line.set_location(locctr);

        if let Some(label) = line.label.clone() {
            symtab.insert(&label, locctr, line.line_number)?;
        }

        match classify(line, opcodes)? {
            MnemonicClass::Opcode(entry) => {
                let mut size = entry.format.size();
                if line.is_extended() {
                    size += 1;
                }
                locctr += size;
            }
            MnemonicClass::Word => locctr += 3,
            MnemonicClass::ResW => {
                let operand = require_single_operand(line)?;
                locctr += 3 * parse_decimal_u32(operand, line.line_number)?;
            }
            MnemonicClass::ResB => {
                let operand = require_single_operand(line)?;
                locctr += parse_decimal_u32(operand, line.line_number)?;
            }
            MnemonicClass::Byte => {
                let operand = require_single_operand(line)?;
                let literal = parse_byte_literal(operand, line.line_number)?;
                locctr += literal.byte_len();
            }
            MnemonicClass::Base | MnemonicClass::NoBase => {}
            MnemonicClass::Start => {}
            MnemonicClass::End => {
                state.end_addr = locctr;
                break;
            }
        }
        state.end_addr = locctr;
    }

    Ok((state, symtab))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::opcodes::opcode_table;
    use crate::source::parse;

    #[test]
    fn start_end_with_no_instructions() {
        let mut lines = parse("PROG START 1000\nEND PROG").unwrap();
        let (state, _symtab) = assign_addresses(&mut lines, &opcode_table()).unwrap();
        assert_eq!(state.start_addr, 0x1000);
        assert_eq!(state.program_name, "PROG");
    }

    #[test]
    fn locations_are_strictly_increasing_across_non_res_lines() {
        let mut lines = parse(
            "PROG START 1000\nFIRST LDA THREE\nTHREE WORD 3\nSECOND STA THREE\nEND PROG",
        )
        .unwrap();
        let opcodes = opcode_table();
        assign_addresses(&mut lines, &opcodes).unwrap();

        assert_eq!(lines[1].location(), 0x1000);
        assert_eq!(lines[2].location(), 0x1003);
        assert_eq!(lines[3].location(), 0x1006);
    }

    #[test]
    fn duplicate_label_is_an_error() {
        let mut lines = parse("PROG START 1000\nLOOP FIX\nLOOP FIX\nEND PROG").unwrap();
        let err = assign_addresses(&mut lines, &opcode_table()).unwrap_err();
        assert!(matches!(err, AssemblerError::DuplicateSymbol { .. }));
    }

    #[test]
    fn unknown_mnemonic_is_an_opcode_lookup_error() {
        let mut lines = parse("PROG START 1000\nBOGUS THREE\nEND PROG").unwrap();
        let err = assign_addresses(&mut lines, &opcode_table()).unwrap_err();
        assert!(matches!(err, AssemblerError::OpcodeLookup { .. }));
    }

    #[test]
    fn resw_and_resb_scale_locctr() {
        let mut lines =
            parse("PROG START 1000\nBUF RESB 4\nVALS RESW 2\nEND PROG").unwrap();
        let opcodes = opcode_table();
        assign_addresses(&mut lines, &opcodes).unwrap();
        assert_eq!(lines[1].location(), 0x1000);
        assert_eq!(lines[2].location(), 0x1004);
    }
}
