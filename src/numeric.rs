//! Small numeric-literal helpers shared by pass one and pass two: parsing
//! the hex/decimal tokens that appear in `START`, `WORD`, `RESW`, and
//! `RESB` operands.

use crate::error::AssemblerError;

pub fn parse_hex_u32(text: &str, line: u32) -> Result<u32, AssemblerError> {
    u32::from_str_radix(text, 16).map_err(|err| AssemblerError::LineFields {
        line,
        message: format!("invalid hexadecimal value \"{}\": {}", text, err),
    })
}

pub fn parse_decimal_u32(text: &str, line: u32) -> Result<u32, AssemblerError> {
    text.parse::<u32>().map_err(|err| AssemblerError::LineFields {
        line,
        message: format!("invalid decimal value \"{}\": {}", text, err),
    })
}
