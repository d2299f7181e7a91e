//! The immutable opcode catalogue and the fixed register table.
//!
//! Format 4 is not a distinct entry here: it is format 3 with the `e` flag
//! set, derived from a leading `+` on the mnemonic (see [`crate::pass_two`]).

use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    One,
    Two,
    Three,
}

impl Format {
    pub fn size(&self) -> u32 {
        match self {
            Format::One => 1,
            Format::Two => 2,
            Format::Three => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandShape {
    None,
    Memory,
    OneRegister,
    TwoRegisters,
    RegisterAndNumeric,
    Numeric,
}

#[derive(Clone, Copy, Debug)]
pub struct OpcodeEntry {
    pub opcode: u8,
    pub format: Format,
    pub operands: OperandShape,
}

macro_rules! optable {
    ($( $mnemonic:expr => ($opcode:expr, $format:expr, $operands:expr) ),* $(,)?) => {{
        let mut table = HashMap::new();
        $( table.insert($mnemonic, OpcodeEntry { opcode: $opcode, format: $format, operands: $operands }); )*
        table
    }};
}

/// Builds the opcode table fresh on each call. The assembler only ever
/// builds one per run, so there is no need for lazy-static machinery.
pub fn opcode_table() -> HashMap<&'static str, OpcodeEntry> {
    use Format::*;
    use OperandShape::*;
    optable! {
        "ADD" => (0x18, Three, Memory),
        "ADDF" => (0x58, Three, Memory),
        "ADDR" => (0x90, Two, TwoRegisters),
        "AND" => (0x40, Three, Memory),
        "CLEAR" => (0xB4, Two, OneRegister),
        "COMP" => (0x28, Three, Memory),
        "COMPF" => (0x88, Three, Memory),
        "COMPR" => (0xA0, Two, TwoRegisters),
        "DIV" => (0x24, Three, Memory),
        "DIVF" => (0x64, Three, Memory),
        "DIVR" => (0x9C, Two, TwoRegisters),
        "FIX" => (0xC4, One, None),
        "FLOAT" => (0xC0, One, None),
        "HIO" => (0xF4, One, None),
        "J" => (0x3C, Three, Memory),
        "JEQ" => (0x30, Three, Memory),
        "JGT" => (0x34, Three, Memory),
        "JLT" => (0x38, Three, Memory),
        "JSUB" => (0x48, Three, Memory),
        "LDA" => (0x00, Three, Memory),
        "LDB" => (0x68, Three, Memory),
        "LDCH" => (0x50, Three, Memory),
        "LDF" => (0x70, Three, Memory),
        "LDL" => (0x08, Three, Memory),
        "LDS" => (0x6C, Three, Memory),
        "LDT" => (0x74, Three, Memory),
        "LDX" => (0x04, Three, Memory),
        "LPS" => (0xD0, Three, Memory),
        "MULF" => (0x60, Three, Memory),
        "MULR" => (0x98, Two, TwoRegisters),
        "NORM" => (0xC8, One, None),
        "OR" => (0x44, Three, Memory),
        "RD" => (0xD8, Three, Memory),
        "RMO" => (0xAC, Two, TwoRegisters),
        "RSUB" => (0x4C, Three, None),
        "SHIFTL" => (0xA4, Two, RegisterAndNumeric),
        "SHIFTR" => (0xA8, Two, RegisterAndNumeric),
        "SIO" => (0xF0, One, None),
        "SSK" => (0xEC, Three, Memory),
        "STA" => (0x0C, Three, Memory),
        "STB" => (0x78, Three, Memory),
        "STCH" => (0x54, Three, Memory),
        "STF" => (0x80, Three, Memory),
        "STI" => (0xD4, Three, Memory),
        "STL" => (0x14, Three, Memory),
        "STS" => (0x7C, Three, Memory),
        "STSW" => (0xE8, Three, Memory),
        "STT" => (0x84, Three, Memory),
        "STX" => (0x10, Three, Memory),
        "SUB" => (0x1C, Three, Memory),
        "SUBF" => (0x5C, Three, Memory),
        "SUBR" => (0x94, Two, TwoRegisters),
        "SVC" => (0xB0, Two, Numeric),
        "TD" => (0xE0, Three, Memory),
        "TIO" => (0xF8, One, None),
        "TIX" => (0x2C, Three, Memory),
        "TIXR" => (0xB8, Two, OneRegister),
        "WD" => (0xDC, Three, Memory),
    }
}

/// The fixed SIC/XE register table: `A=0, X=1, L=2, B=3, S=4, T=5, F=6, PC=8, SW=9`.
pub fn register_number(name: &str) -> Option<u8> {
    match name {
        "A" => Some(0),
        "X" => Some(1),
        "L" => Some(2),
        "B" => Some(3),
        "S" => Some(4),
        "T" => Some(5),
        "F" => Some(6),
        "PC" => Some(8),
        "SW" => Some(9),
        _ => None,
    }
}

/// Six boolean addressing-mode/format flags packed into the nixbpe nibble.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flags {
    pub n: bool,
    pub i: bool,
    pub x: bool,
    pub b: bool,
    pub p: bool,
    pub e: bool,
}

impl Flags {
    /// Packs the six flags into their canonical bit positions:
    /// `{0x20, 0x10, 0x08, 0x04, 0x02, 0x01}` for `{n, i, x, b, p, e}`.
    pub fn bits(&self) -> u8 {
        let mut bits = 0u8;
        if self.n {
            bits |= 0x20;
        }
        if self.i {
            bits |= 0x10;
        }
        if self.x {
            bits |= 0x08;
        }
        if self.b {
            bits |= 0x04;
        }
        if self.p {
            bits |= 0x02;
        }
        if self.e {
            bits |= 0x01;
        }
        bits
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flags_pack_into_canonical_bit_positions() {
        let flags = Flags {
            n: true,
            i: true,
            x: false,
            b: false,
            p: true,
            e: false,
        };
        assert_eq!(flags.bits(), 0x20 | 0x10 | 0x02);
    }

    #[test]
    fn every_table_entry_has_format_1_2_or_3() {
        for (_, entry) in opcode_table() {
            assert!(matches!(entry.format, Format::One | Format::Two | Format::Three));
        }
    }

    #[test]
    fn register_table_has_fixed_register_numbers() {
        assert_eq!(register_number("A"), Some(0));
        assert_eq!(register_number("PC"), Some(8));
        assert_eq!(register_number("SW"), Some(9));
        assert_eq!(register_number("ZZ"), None);
    }
}
