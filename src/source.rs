//! Turns raw source text into a vector of structured lines.
//!
//! The source language has no nested structure worth a grammar engine: every
//! line is independent, and its shape is fully determined by whitespace
//! field count plus a single comma-split on the last field. So there is no
//! parser-combinator dependency here — see DESIGN.md for that call.

use crate::error::AssemblerError;

/// An operand is absent, a single token, or an ordered pair of tokens when
/// the source line's last field contained a comma. This is the only place
/// a raw `Vec<String>`-or-`String` shape from the source gets classified;
/// everything downstream works with this enum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    None,
    Single(String),
    Pair(String, String),
}

impl Operand {
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Operand::Single(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_pair(&self) -> Option<(&str, &str)> {
        match self {
            Operand::Pair(a, b) => Some((a, b)),
            _ => None,
        }
    }
}

/// A parsed source line. `location` is filled exactly once by pass one and
/// is immutable thereafter; reading it before that is a programmer error.
#[derive(Clone, Debug)]
pub struct SourceLine {
    pub line_number: u32,
    pub label: Option<String>,
    pub mnemonic: String,
    pub operand: Operand,
    location: Option<u32>,
}

impl SourceLine {
    pub fn location(&self) -> u32 {
        self.location
            .expect("pass one has not assigned a location to this line yet")
    }

    pub fn set_location(&mut self, location: u32) {
        debug_assert!(
            self.location.is_none(),
            "a source line's location must only be assigned once"
        );
        self.location = Some(location);
    }

    pub fn is_extended(&self) -> bool {
        self.mnemonic.starts_with('+')
    }

    /// The mnemonic with any leading `+` format-4 marker stripped.
    pub fn base_mnemonic(&self) -> &str {
        if self.is_extended() {
            &self.mnemonic[1..]
        } else {
            &self.mnemonic
        }
    }
}

/// Strips everything from the first `.` onward (the comment marker), then
/// whitespace-splits. Empty lines are discarded. Fails with `LineFields` if
/// the remaining field count is not 1, 2, or 3.
pub fn parse(source: &str) -> Result<Vec<SourceLine>, AssemblerError> {
    let mut lines = Vec::new();

    for (index, raw_line) in source.lines().enumerate() {
        let line_number = (index + 1) as u32;
        let code = match raw_line.find('.') {
            Some(pos) => &raw_line[..pos],
            None => raw_line,
        };
        let fields: Vec<&str> = code.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        lines.push(parse_fields(&fields, line_number)?);
    }

    Ok(lines)
}

fn parse_fields(fields: &[&str], line_number: u32) -> Result<SourceLine, AssemblerError> {
    let (label, mnemonic, operand_field) = match fields.len() {
        1 => (None, fields[0], None),
        2 => (None, fields[0], Some(fields[1])),
        3 => (Some(fields[0]), fields[1], Some(fields[2])),
        _ => {
            return Err(AssemblerError::LineFields {
                line: line_number,
                message: format!("invalid number of fields on line: {:?}", fields),
            })
        }
    };

    let operand = match operand_field {
        None => Operand::None,
        Some(token) if token.contains(',') => {
            let mut parts = token.splitn(2, ',');
            let first = parts.next().unwrap().to_owned();
            let second = parts.next().unwrap().to_owned();
            Operand::Pair(first, second)
        }
        Some(token) => Operand::Single(token.to_owned()),
    };

    Ok(SourceLine {
        line_number,
        label: label.map(str::to_owned),
        mnemonic: mnemonic.to_owned(),
        operand,
        location: None,
    })
}
