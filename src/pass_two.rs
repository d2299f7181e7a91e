//! Pass two: resolves each line's operand against the symbol table, selects
//! an addressing mode and displacement strategy, and produces the hex
//! object-code field. One dispatch function over a closed tagged variant
//! (`MnemonicClass`), not a `Format1..Format4` class hierarchy.

use crate::byte_literal::{parse_byte_literal, ByteLiteral};
use crate::error::AssemblerError;
use crate::mnemonic::{classify, MnemonicClass};
use crate::numeric::{parse_decimal_u32, parse_hex_u32};
use crate::opcodes::{register_number, Flags, OpcodeEntry, OperandShape};
use crate::pass_one::AssemblerState;
use crate::source::{Operand, SourceLine};
use crate::symbol::SymbolTable;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Sic,
    SicXe,
}

/// One assembled line: the hex object-code field plus everything the
/// listing writer and record emitter need to place it.
#[derive(Clone, Debug)]
pub struct ObjectCode {
    pub location: u32,
    pub mnemonic: String,
    pub display: String,
    pub hex: String,
    /// True exactly when a format-4 address field referenced a symbol
    /// rather than an immediate numeric literal (needs a modification record).
    pub relocatable: bool,
}

fn require_single_operand<'a>(line: &'a SourceLine) -> Result<&'a str, AssemblerError> {
    line.operand
        .as_single()
        .ok_or_else(|| AssemblerError::LineFields {
            line: line.line_number,
            message: format!("{} requires a single operand", line.mnemonic),
        })
}

fn register_lookup(name: &str, line_number: u32) -> Result<u8, AssemblerError> {
    register_number(name).ok_or_else(|| AssemblerError::LineFields {
        line: line_number,
        message: format!("unknown register: {}", name),
    })
}

pub fn display_operand(operand: &Operand) -> String {
    match operand {
        Operand::None => String::new(),
        Operand::Single(token) => token.clone(),
        Operand::Pair(a, b) => format!("{},{}", a, b),
    }
}

/// Encodes one line, returning `None` for lines that produce no object
/// code (`START`, `END`, `RESW`, `RESB`, `BASE`, `NOBASE`).
pub fn encode_line(
    state: &mut AssemblerState,
    symtab: &SymbolTable,
    line: &SourceLine,
    opcodes: &HashMap<&'static str, OpcodeEntry>,
    mode: Mode,
) -> Result<Option<ObjectCode>, AssemblerError> {
    match classify(line, opcodes)? {
        MnemonicClass::Opcode(entry) => {
            let hex = match mode {
                Mode::SicXe => encode_xe(entry, line, state, symtab)?,
                Mode::Sic => encode_sic(entry, line, symtab)?,
            };
            Ok(Some(ObjectCode {
                location: line.location(),
                mnemonic: line.mnemonic.clone(),
                display: display_operand(&line.operand),
                hex: hex.hex,
                relocatable: hex.relocatable,
            }))
        }
        MnemonicClass::Word => {
            let operand = require_single_operand(line)?;
            let value = parse_hex_u32(operand, line.line_number)?;
            Ok(Some(ObjectCode {
                location: line.location(),
                mnemonic: line.mnemonic.clone(),
                display: operand.to_owned(),
                hex: format!("{:06X}", value),
                relocatable: false,
            }))
        }
        MnemonicClass::Byte => {
            let operand = require_single_operand(line)?;
            let literal = parse_byte_literal(operand, line.line_number)?;
            Ok(Some(ObjectCode {
                location: line.location(),
                mnemonic: line.mnemonic.clone(),
                display: operand.to_owned(),
                hex: literal.object_hex(),
                relocatable: false,
            }))
        }
        MnemonicClass::Base => {
            let operand = require_single_operand(line)?;
            let location = symtab.resolve(operand, line.line_number)?;
            state.base = Some(location);
            Ok(None)
        }
        MnemonicClass::NoBase => {
            state.base = None;
            Ok(None)
        }
        MnemonicClass::Start | MnemonicClass::End | MnemonicClass::ResW | MnemonicClass::ResB => {
            Ok(None)
        }
    }
}

struct Encoded {
    hex: String,
    relocatable: bool,
}

fn encode_xe(
    entry: &OpcodeEntry,
    line: &SourceLine,
    state: &AssemblerState,
    symtab: &SymbolTable,
) -> Result<Encoded, AssemblerError> {
    use crate::opcodes::Format;
    match entry.format {
        Format::One => Ok(Encoded {
            hex: format!("{:02X}", entry.opcode),
            relocatable: false,
        }),
        Format::Two => {
            let (r1, r2) = format2_nibbles(entry, &line.operand, line.line_number)?;
            Ok(Encoded {
                hex: format!("{:02X}{:X}{:X}", entry.opcode, r1 & 0xF, r2 & 0xF),
                relocatable: false,
            })
        }
        Format::Three if line.is_extended() => encode_format4(entry, line, symtab),
        Format::Three => encode_format3(entry, line, state, symtab),
    }
}

fn format2_nibbles(
    entry: &OpcodeEntry,
    operand: &Operand,
    line_number: u32,
) -> Result<(u8, u8), AssemblerError> {
    match entry.operands {
        OperandShape::TwoRegisters => {
            let (r1, r2) = operand.as_pair().ok_or_else(|| AssemblerError::LineFields {
                line: line_number,
                message: "expected two comma-separated registers".to_owned(),
            })?;
            Ok((register_lookup(r1, line_number)?, register_lookup(r2, line_number)?))
        }
        OperandShape::OneRegister => {
            let r1 = operand.as_single().ok_or_else(|| AssemblerError::LineFields {
                line: line_number,
                message: "expected a single register".to_owned(),
            })?;
            Ok((register_lookup(r1, line_number)?, 0))
        }
        OperandShape::RegisterAndNumeric => {
            let (r1, n) = operand.as_pair().ok_or_else(|| AssemblerError::LineFields {
                line: line_number,
                message: "expected a register and a numeric count".to_owned(),
            })?;
            let reg = register_lookup(r1, line_number)?;
            let count = parse_decimal_u32(n, line_number)? as u8;
            Ok((reg, count))
        }
        OperandShape::Numeric => {
            let n = operand.as_single().ok_or_else(|| AssemblerError::LineFields {
                line: line_number,
                message: "expected a numeric operand".to_owned(),
            })?;
            let value = parse_decimal_u32(n, line_number)? as u8;
            Ok((value, 0))
        }
        OperandShape::None | OperandShape::Memory => unreachable!("not a format-2 operand shape"),
    }
}

/// The classified addressing mode of a format-3/4 operand, before
/// resolving it against the symbol table.
enum AddressMode {
    None,
    Immediate(String),
    Indirect(String),
    Literal(ByteLiteral),
    Simple(String),
    Indexed(String),
}

fn classify_address_operand(
    operand: &Operand,
    line_number: u32,
) -> Result<(AddressMode, Flags), AssemblerError> {
    match operand {
        Operand::None => Ok((AddressMode::None, Flags::default())),
        Operand::Single(token) => {
            if let Some(rest) = token.strip_prefix('#') {
                Ok((
                    AddressMode::Immediate(rest.to_owned()),
                    Flags {
                        i: true,
                        ..Flags::default()
                    },
                ))
            } else if let Some(rest) = token.strip_prefix('@') {
                Ok((
                    AddressMode::Indirect(rest.to_owned()),
                    Flags {
                        n: true,
                        ..Flags::default()
                    },
                ))
            } else if let Some(rest) = token.strip_prefix('=') {
                let literal = parse_byte_literal(rest, line_number)?;
                Ok((
                    AddressMode::Literal(literal),
                    Flags {
                        n: true,
                        i: true,
                        ..Flags::default()
                    },
                ))
            } else {
                Ok((
                    AddressMode::Simple(token.clone()),
                    Flags {
                        n: true,
                        i: true,
                        ..Flags::default()
                    },
                ))
            }
        }
        Operand::Pair(first, second) if second == "X" => {
            if first.starts_with('#') || first.starts_with('@') {
                return Err(AssemblerError::LineFields {
                    line: line_number,
                    message:
                        "indexed addressing cannot be used with immediate or indirect addressing modes"
                            .to_owned(),
                });
            }
            Ok((
                AddressMode::Indexed(first.clone()),
                Flags {
                    n: true,
                    i: true,
                    x: true,
                    ..Flags::default()
                },
            ))
        }
        Operand::Pair(_, _) => Err(AssemblerError::LineFields {
            line: line_number,
            message: "format 3/4 operand must be a single token or an indexed symbol".to_owned(),
        }),
    }
}

enum ResolvedTarget {
    /// An immediate decimal literal: encoded directly, no relative addressing.
    ImmediateNumeric(u32),
    /// A resolved absolute address: subject to PC-relative/base-relative
    /// selection (format 3) or used as-is (format 4).
    Address(u32),
}

fn resolve_target(
    mode: &AddressMode,
    symtab: &SymbolTable,
    line_number: u32,
) -> Result<Option<ResolvedTarget>, AssemblerError> {
    match mode {
        AddressMode::None => Ok(None),
        AddressMode::Immediate(token) => {
            if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
                Ok(Some(ResolvedTarget::ImmediateNumeric(
                    token.parse::<u32>().expect("validated all-digit token"),
                )))
            } else {
                Ok(Some(ResolvedTarget::Address(symtab.resolve(token, line_number)?)))
            }
        }
        AddressMode::Indirect(symbol) | AddressMode::Simple(symbol) | AddressMode::Indexed(symbol) => {
            Ok(Some(ResolvedTarget::Address(symtab.resolve(symbol, line_number)?)))
        }
        AddressMode::Literal(literal) => {
            let value = u32::from_str_radix(&literal.object_hex(), 16).map_err(|err| {
                AssemblerError::LineFields {
                    line: line_number,
                    message: format!("invalid inline literal: {}", err),
                }
            })?;
            Ok(Some(ResolvedTarget::Address(value)))
        }
    }
}

/// The 6-bit base opcode OR'd with `n` (+2) and `i` (+1), exactly as the
/// table's opcode byte already reserves its low two bits for them.
fn opcode_byte(entry: &OpcodeEntry, flags: &Flags) -> u8 {
    entry.opcode | if flags.n { 0x02 } else { 0 } | if flags.i { 0x01 } else { 0 }
}

fn encode_format3(
    entry: &OpcodeEntry,
    line: &SourceLine,
    state: &AssemblerState,
    symtab: &SymbolTable,
) -> Result<Encoded, AssemblerError> {
    let (mode, mut flags) = classify_address_operand(&line.operand, line.line_number)?;
    let target = resolve_target(&mode, symtab, line.line_number)?;

    let disp: u32 = match target {
        None => 0,
        Some(ResolvedTarget::ImmediateNumeric(value)) => value & 0xFFF,
        Some(ResolvedTarget::Address(addr)) => {
            let pc = line.location() as i64 + 3;
            let disp_pc = addr as i64 - pc;
            if (-2048..=2047).contains(&disp_pc) {
                flags.p = true;
                (disp_pc & 0xFFF) as u32
            } else if let Some(base) = state.base {
                let disp_base = addr as i64 - base as i64;
                if (0..=4095).contains(&disp_base) {
                    flags.b = true;
                    disp_base as u32
                } else {
                    return Err(AssemblerError::Instruction {
                        line: line.line_number,
                        message: "neither PC-relative nor base-relative addressing could be used"
                            .to_owned(),
                    });
                }
            } else {
                return Err(AssemblerError::Instruction {
                    line: line.line_number,
                    message: "the BASE directive has not been set".to_owned(),
                });
            }
        }
    };

    let op = opcode_byte(entry, &flags) as u32;
    let xbpe = flags.bits() as u32 & 0x0F;
    let value = (op << 16) | (xbpe << 12) | disp;

    Ok(Encoded {
        hex: format!("{:06X}", value),
        relocatable: false,
    })
}

fn encode_format4(
    entry: &OpcodeEntry,
    line: &SourceLine,
    symtab: &SymbolTable,
) -> Result<Encoded, AssemblerError> {
    let (mode, mut flags) = classify_address_operand(&line.operand, line.line_number)?;
    flags.e = true;
    let target = resolve_target(&mode, symtab, line.line_number)?;

    let (addr, relocatable) = match target {
        None => (0u32, false),
        Some(ResolvedTarget::ImmediateNumeric(value)) => (value & 0xFFFFF, false),
        Some(ResolvedTarget::Address(addr)) => (addr & 0xFFFFF, true),
    };

    let op = opcode_byte(entry, &flags) as u32;
    let xbpe = flags.bits() as u32 & 0x0F;
    let value = (op << 24) | (xbpe << 20) | addr;

    Ok(Encoded {
        hex: format!("{:08X}", value),
        relocatable,
    })
}

fn encode_sic(
    entry: &OpcodeEntry,
    line: &SourceLine,
    symtab: &SymbolTable,
) -> Result<Encoded, AssemblerError> {
    let addr = match &line.operand {
        Operand::None => 0u32,
        Operand::Pair(symbol, modifier) if modifier == "X" => {
            let value = symtab.resolve(symbol, line.line_number)?;
            (value & 0x7FFF) | 0x8000
        }
        Operand::Single(symbol) => symtab.resolve(symbol, line.line_number)?,
        Operand::Pair(_, _) => {
            return Err(AssemblerError::LineFields {
                line: line.line_number,
                message: "SIC mode operand must be a symbol or an indexed symbol".to_owned(),
            })
        }
    };

    Ok(Encoded {
        hex: format!("{:02X}{:04X}", entry.opcode, addr & 0xFFFF),
        relocatable: false,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::opcodes::opcode_table;
    use crate::pass_one::assign_addresses;
    use crate::source::parse;

    fn assemble(source: &str, mode: Mode) -> (AssemblerState, SymbolTable, Vec<Option<ObjectCode>>) {
        let opcodes = opcode_table();
        let mut lines = parse(source).unwrap();
        let (mut state, symtab) = assign_addresses(&mut lines, &opcodes).unwrap();
        let mut results = Vec::new();
        for line in &lines {
            results.push(encode_line(&mut state, &symtab, line, &opcodes, mode).unwrap());
        }
        (state, symtab, results)
    }

    #[test]
    fn format2_two_register() {
        let (_, _, results) = assemble("PROG START 1000\nADDR A,X\nEND PROG", Mode::SicXe);
        assert_eq!(results[1].as_ref().unwrap().hex, "9001");
    }

    #[test]
    fn format3_pc_relative() {
        // FILL pads locctr to 0x1027, so JEQ lands there; PAD then pads to
        // 0x1030, where LOOP is defined - a +6 PC-relative displacement.
        let source = "PROG  START 1000\nFILL  RESB  39\n      JEQ   LOOP\nPAD   RESB  6\nLOOP  RESB  1\n      END   PROG";
        let (_, symtab, results) = assemble(source, Mode::SicXe);
        assert_eq!(symtab.get("LOOP"), Some(0x1030));
        let jeq = results[2].as_ref().unwrap();
        assert_eq!(jeq.location, 0x1027);
        assert_eq!(jeq.hex, "332006");
    }

    #[test]
    fn format4_absolute_with_relocation() {
        // RESB's operand is decimal, so 48 bytes of filler puts RDREC at
        // 0x1000 + 48 = 0x1030.
        let source = "PROG  START 1000\n      RESB  48\nRDREC RESB  1\n      +JSUB RDREC\n      END   PROG";
        let (state, symtab, results) = assemble(source, Mode::SicXe);
        assert_eq!(state.start_addr, 0x1000);
        let rdrec = symtab.get("RDREC").unwrap();
        assert_eq!(rdrec, 0x1030);
        let jsub = results[3].as_ref().unwrap();
        assert!(jsub.relocatable);
    }

    #[test]
    fn immediate_numeric_skips_relative_addressing() {
        let (_, _, results) = assemble("PROG START 1000\nLDA #3\nEND PROG", Mode::SicXe);
        assert_eq!(results[1].as_ref().unwrap().hex, "010003");
    }

    #[test]
    fn indexed_with_immediate_is_a_line_fields_error() {
        let err = classify_address_operand(
            &Operand::Pair("#5".to_owned(), "X".to_owned()),
            1,
        )
        .unwrap_err();
        assert!(matches!(err, AssemblerError::LineFields { .. }));
    }

    #[test]
    fn base_relative_is_used_when_pc_relative_is_out_of_range() {
        let mut source = String::from("PROG  START 1000\n      BASE  FAR\n");
        source.push_str("      LDA   FAR\n");
        source.push_str("      RESB  5000\n");
        source.push_str("FAR   RESB  1\n");
        source.push_str("      END   PROG\n");
        let (_, _symtab, results) = assemble(&source, Mode::SicXe);
        let lda = results[2].as_ref().unwrap();
        // b flag (0x04) set in the xbpe nibble, p flag (0x02) clear.
        let xbpe = u32::from_str_radix(&lda.hex[2..3], 16).unwrap();
        assert_eq!(xbpe & 0x0C, 0x04);
    }

    #[test]
    fn format1_has_no_operand_field() {
        let (_, _, results) = assemble("PROG START 1000\nFIX\nEND PROG", Mode::SicXe);
        assert_eq!(results[1].as_ref().unwrap().hex, "C4");
    }
}
