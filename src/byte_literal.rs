//! Parses the `BYTE X'..'` / `BYTE C'..'` inline literal forms shared by
//! pass one (for sizing) and pass two (for object-code generation). There
//! is no literal pool: each use site encodes its own literal in place.

use crate::error::AssemblerError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ByteLiteral {
    Hex(String),
    Chars(String),
}

impl ByteLiteral {
    /// `⌈hex-digit-count / 2⌉` for a hex literal; character count for a
    /// character literal.
    pub fn byte_len(&self) -> u32 {
        match self {
            ByteLiteral::Hex(digits) => (digits.len() as u32 + 1) / 2,
            ByteLiteral::Chars(chars) => chars.len() as u32,
        }
    }

    /// The object-code hex field: the literal hex digits as written for
    /// `X'..'`, or each character's 2-digit uppercase ASCII code for `C'..'`.
    pub fn object_hex(&self) -> String {
        match self {
            ByteLiteral::Hex(digits) => digits.to_uppercase(),
            ByteLiteral::Chars(chars) => chars.bytes().map(|b| format!("{:02X}", b)).collect(),
        }
    }
}

pub fn parse_byte_literal(operand: &str, line: u32) -> Result<ByteLiteral, AssemblerError> {
    if let Some(body) = strip_quoted(operand, "X") {
        if body.is_empty() || !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AssemblerError::LineFields {
                line,
                message: format!("invalid value for BYTE: {}", operand),
            });
        }
        Ok(ByteLiteral::Hex(body.to_owned()))
    } else if let Some(body) = strip_quoted(operand, "C") {
        Ok(ByteLiteral::Chars(body.to_owned()))
    } else {
        Err(AssemblerError::LineFields {
            line,
            message: format!("invalid value for BYTE: {}", operand),
        })
    }
}

fn strip_quoted<'a>(operand: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = operand.strip_prefix(prefix)?;
    let rest = rest.strip_prefix('\'')?;
    rest.strip_suffix('\'')
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hex_literal_byte_len_rounds_up() {
        let literal = parse_byte_literal("X'F1'", 1).unwrap();
        assert_eq!(literal.byte_len(), 1);
        assert_eq!(literal.object_hex(), "F1");
    }

    #[test]
    fn char_literal_encodes_ascii_hex() {
        let literal = parse_byte_literal("C'EOF'", 1).unwrap();
        assert_eq!(literal.byte_len(), 3);
        assert_eq!(literal.object_hex(), "454F46");
    }

    #[test]
    fn char_literal_round_trips_through_ascii() {
        let payload = "Hello!";
        let literal = ByteLiteral::Chars(payload.to_owned());
        let hex = literal.object_hex();
        let decoded: String = hex
            .as_bytes()
            .chunks(2)
            .map(|pair| {
                let byte = u8::from_str_radix(std::str::from_utf8(pair).unwrap(), 16).unwrap();
                byte as char
            })
            .collect();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn malformed_literal_is_an_error() {
        assert!(parse_byte_literal("Z'AB'", 1).is_err());
        assert!(parse_byte_literal("X'ZZ'", 1).is_err());
    }
}
