//! Groups assembled object code into the loader's four record kinds and
//! renders the finished `.obj` text. Grounded on the reference assembler's
//! record generator, with the strict 60-hex-character text record ceiling
//! this repository settled on (see DESIGN.md) in place of the source's
//! greedy-then-overflow packing.

use crate::pass_one::AssemblerState;
use crate::pass_two::ObjectCode;

const TEXT_RECORD_HEX_BUDGET: usize = 60;
const MODIFICATION_FIELD_LENGTH: &str = "05";

#[derive(Debug)]
pub struct Records {
    pub header: String,
    pub text: Vec<String>,
    pub modifications: Vec<String>,
    pub end: String,
}

pub fn generate_records(state: &AssemblerState, codes: &[ObjectCode]) -> Records {
    Records {
        header: header_record(state),
        text: text_records(codes),
        modifications: modification_records(state, codes),
        end: end_record(state),
    }
}

/// `H | program name (6 chars, space-padded) | start address (6 hex) |
/// program length (6 hex)`. Program length is `end_addr - start_addr + 1`,
/// which gives a one-byte length for a program with no instructions rather
/// than zero — preserved from the reference implementation's formula.
fn header_record(state: &AssemblerState) -> String {
    let length = state.end_addr - state.start_addr + 1;
    format!(
        "H{:<6}{:06X}{:06X}",
        state.program_name, state.start_addr, length
    )
}

/// Packs object-code entries, in emission order, into records of at most
/// 60 hex characters each. A `RESW`/`RESB` between two entries emits no
/// `ObjectCode`, so it shows up here as an address discontinuity — the next
/// entry's location no longer immediately follows the previous entry's end
/// — and that discontinuity always forces a new record, independent of the
/// byte budget.
fn text_records(codes: &[ObjectCode]) -> Vec<String> {
    let mut records = Vec::new();
    let mut iter = codes.iter().peekable();

    while let Some(first) = iter.next() {
        let start_addr = first.location;
        let mut chunk = first.hex.clone();
        let mut next_expected = first.location + (first.hex.len() as u32 / 2);

        while let Some(next) = iter.peek() {
            if next.location != next_expected || chunk.len() + next.hex.len() > TEXT_RECORD_HEX_BUDGET {
                break;
            }
            let next = iter.next().unwrap();
            chunk.push_str(&next.hex);
            next_expected = next.location + (next.hex.len() as u32 / 2);
        }

        let byte_len = chunk.len() / 2;
        records.push(format!("T{:06X}{:02X}{}", start_addr, byte_len, chunk));
    }

    records
}

/// One entry per format-4 instruction whose address field referenced a
/// symbol. `relative_addr` is the instruction's location offset from
/// `start_addr`, plus one (the modified field starts one byte into the
/// four-byte instruction, skipping the opcode/flags byte).
fn modification_records(state: &AssemblerState, codes: &[ObjectCode]) -> Vec<String> {
    codes
        .iter()
        .filter(|code| code.relocatable)
        .map(|code| {
            let relative_addr = code.location - state.start_addr + 1;
            format!("M{:06X}{}", relative_addr, MODIFICATION_FIELD_LENGTH)
        })
        .collect()
}

fn end_record(state: &AssemblerState) -> String {
    format!("E{:06X}", state.start_addr)
}

/// Renders the finished object program: header, all text records, all
/// modification records, then end — one per line.
pub fn render(records: &Records) -> String {
    let mut out = String::new();
    out.push_str(&records.header);
    out.push('\n');
    for line in &records.text {
        out.push_str(line);
        out.push('\n');
    }
    for line in &records.modifications {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(&records.end);
    out.push('\n');
    out
}

#[cfg(test)]
mod test {
    use super::*;

    fn state(start_addr: u32, end_addr: u32, program_name: &str) -> AssemblerState {
        AssemblerState {
            start_addr,
            program_name: program_name.to_owned(),
            base: None,
            end_addr,
        }
    }

    fn code(location: u32, hex: &str, relocatable: bool) -> ObjectCode {
        ObjectCode {
            location,
            mnemonic: "LDA".to_owned(),
            display: String::new(),
            hex: hex.to_owned(),
            relocatable,
        }
    }

    #[test]
    fn empty_program_has_length_one_and_no_text_records() {
        let state = state(0x1000, 0x1000, "PROG");
        let records = generate_records(&state, &[]);
        assert_eq!(records.header, "HPROG  001000000001");
        assert!(records.text.is_empty());
        assert_eq!(records.end, "E001000");
    }

    #[test]
    fn format4_modification_uses_location_offset_plus_one() {
        let state = state(0x1000, 0x1025, "PROG");
        let codes = vec![code(0x1020, "4B101036", true)];
        let records = generate_records(&state, &codes);
        assert_eq!(records.modifications, vec!["M00002105".to_owned()]);
    }

    #[test]
    fn non_relocatable_entries_produce_no_modification_record() {
        let state = state(0x1000, 0x1003, "PROG");
        let codes = vec![code(0x1000, "010003", false)];
        let records = generate_records(&state, &codes);
        assert!(records.modifications.is_empty());
    }

    #[test]
    fn text_record_splits_before_exceeding_sixty_hex_characters() {
        let state = state(0x1000, 0x1000 + 40 * 3, "PROG");
        let codes: Vec<ObjectCode> = (0..40)
            .map(|i| code(0x1000 + i * 3, "332006", false))
            .collect();
        let records = generate_records(&state, &codes);

        // 60 / 6 = 10 entries of 6 hex chars exactly fill one record, so
        // 40 entries split evenly into 4 records.
        assert_eq!(records.text.len(), 4);
        for line in &records.text {
            let payload = &line[9..];
            assert!(payload.len() <= 60);
        }
        assert_eq!(records.text[0].len(), 9 + 10 * 6);
    }

    #[test]
    fn a_gap_from_a_reservation_directive_forces_a_new_record() {
        let state = state(0x1000, 0x1011, "PROG");
        let codes = vec![code(0x1000, "C4", false), code(0x1010, "C4", false)];
        let records = generate_records(&state, &codes);
        assert_eq!(records.text, vec!["T00100001C4".to_owned(), "T00101001C4".to_owned()]);
    }
}
