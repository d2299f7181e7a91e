//! Renders the `.lst` listing: one fixed-width row per parsed source line,
//! interleaving its resolved location with its assembled object code.

use crate::mnemonic::is_directive;
use crate::pass_one::AssemblerState;
use crate::pass_two::{display_operand, ObjectCode};
use crate::source::SourceLine;

const COLUMN_WIDTH: usize = 10;
const OBJECT_WIDTH: usize = 8;

/// One listing row: every column already rendered as the string it will
/// appear as, ready for fixed-width padding.
struct Row {
    location: String,
    label: String,
    mnemonic: String,
    operand: String,
    object: String,
}

fn render_row(row: &Row) -> String {
    format!(
        "{:width$}{:width$}{:width$}{:width$}{:owidth$}",
        row.location,
        row.label,
        row.mnemonic,
        row.operand,
        row.object,
        width = COLUMN_WIDTH,
        owidth = OBJECT_WIDTH,
    )
}

/// Builds the listing text. `codes` holds one entry per line that produced
/// object code, in line order; lines that did not (directives, `RESW`,
/// `RESB`) are paired with an empty object-code column instead.
pub fn render(state: &AssemblerState, lines: &[SourceLine], codes: &[ObjectCode]) -> String {
    let mut out = String::new();
    let mut codes = codes.iter();

    for (index, line) in lines.iter().enumerate() {
        // Pass one never assigns a location to the very first line; the
        // listing falls back to the program's start address for it.
        let location = if line.base_mnemonic() == "END" {
            String::new()
        } else if index == 0 {
            format!("{:04X}", state.start_addr)
        } else {
            format!("{:04X}", line.location())
        };

        let object = if is_directive(line.base_mnemonic()) {
            String::new()
        } else {
            codes.next().map(|code| code.hex.clone()).unwrap_or_default()
        };

        let row = Row {
            location,
            label: line.label.clone().unwrap_or_default(),
            mnemonic: line.mnemonic.clone(),
            operand: display_operand(&line.operand),
            object,
        };
        out.push_str(&render_row(&row));
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::opcodes::opcode_table;
    use crate::pass_one::assign_addresses;
    use crate::pass_two::{encode_line, Mode};
    use crate::source::parse;

    fn build(source: &str) -> (AssemblerState, Vec<SourceLine>, Vec<ObjectCode>) {
        let opcodes = opcode_table();
        let mut lines = parse(source).unwrap();
        let (mut state, symtab) = assign_addresses(&mut lines, &opcodes).unwrap();
        let mut codes = Vec::new();
        for line in &lines {
            if let Some(code) = encode_line(&mut state, &symtab, line, &opcodes, Mode::SicXe).unwrap() {
                codes.push(code);
            }
        }
        (state, lines, codes)
    }

    #[test]
    fn start_line_falls_back_to_start_addr_for_its_location() {
        let (state, lines, codes) = build("PROG START 1000\nEND PROG");
        let listing = render(&state, &lines, &codes);
        let first_line = listing.lines().next().unwrap();
        assert!(first_line.starts_with("1000"));
    }

    #[test]
    fn end_line_has_an_empty_location_column() {
        let (state, lines, codes) = build("PROG START 1000\nEND PROG");
        let listing = render(&state, &lines, &codes);
        let end_line = listing.lines().nth(1).unwrap();
        assert!(end_line.starts_with(&" ".repeat(COLUMN_WIDTH)));
    }

    #[test]
    fn directive_lines_have_an_empty_object_code_column() {
        let (state, lines, codes) = build("PROG START 1000\nBUF RESB 4\nEND PROG");
        let listing = render(&state, &lines, &codes);
        let resb_line = listing.lines().nth(1).unwrap();
        assert!(resb_line.contains("RESB"));
        // The operand ("4") is the last non-blank token: no object code follows it.
        assert!(resb_line.trim_end().ends_with('4'));
    }

    #[test]
    fn instruction_line_shows_its_object_code() {
        let (state, lines, codes) = build("PROG START 1000\nFIX\nEND PROG");
        let listing = render(&state, &lines, &codes);
        let fix_line = listing.lines().nth(1).unwrap();
        assert!(fix_line.trim_end().ends_with("C4"));
    }
}
