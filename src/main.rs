//! Command-line driver: argument parsing, file I/O, and the stdout traces
//! around the library pipeline in `lib.rs`. `main` itself only ever prints
//! and sets the exit code; all of the real work happens in `run`, which
//! returns a `Result` so every error path, including file I/O, surfaces
//! through one `Display` impl instead of a panic.

#[macro_use]
extern crate clap;

use clap::Arg;
use sicxe_asm::pass_two::{display_operand, Mode};
use sicxe_asm::{opcodes, pass_one, pass_two, records, source, AssemblerError};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    if let Err(err) = run() {
        eprintln!("{}", err);
        process::exit(1);
    }
}

fn run() -> Result<(), AssemblerError> {
    // The mode flag is a single-dash token (`-sic` / `-sicxe`), a second
    // positional argument rather than a GNU-style `--long`/`-short` clap
    // flag, so it is declared and validated like `INPUT` below instead of
    // via `Arg::long`/`Arg::short`.
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("INPUT")
                .help("The .asm source file to assemble")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("MODE")
                .help("The addressing mode: -sic or -sicxe")
                .required(true)
                .allow_hyphen_values(true)
                .index(2),
        )
        .arg(
            Arg::with_name("listing")
                .long("listing")
                .takes_value(true)
                .value_name("PATH")
                .help("Overrides the default <basename>.lst listing path"),
        )
        .arg(
            Arg::with_name("object")
                .long("object")
                .takes_value(true)
                .value_name("PATH")
                .help("Overrides the default <basename>.obj object-program path"),
        )
        .get_matches();

    let input = matches.value_of("INPUT").unwrap();
    let mode = match matches.value_of("MODE").unwrap() {
        "-sic" => Mode::Sic,
        "-sicxe" => Mode::SicXe,
        other => {
            return Err(AssemblerError::Input(format!(
                "usage: sicxe-asm <source>.asm (-sic | -sicxe): unrecognised mode flag \"{}\"",
                other
            )))
        }
    };

    let input_path = Path::new(input);
    match input_path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("asm") => {}
        _ => {
            return Err(AssemblerError::Input(format!(
                "usage: sicxe-asm <source>.asm (-sic | -sicxe): \"{}\" is not a .asm file",
                input
            )))
        }
    }

    let text = fs::read_to_string(input_path)
        .map_err(|err| AssemblerError::Io(err, input_path.to_owned()))?;

    let listing_path: PathBuf = matches
        .value_of("listing")
        .map(PathBuf::from)
        .unwrap_or_else(|| input_path.with_extension("lst"));
    let object_path: PathBuf = matches
        .value_of("object")
        .map(PathBuf::from)
        .unwrap_or_else(|| input_path.with_extension("obj"));

    assemble_and_report(&text, mode, &listing_path, &object_path)
}

/// Runs the pipeline one stage at a time (rather than through the library's
/// single [`sicxe_asm::assemble`] entry point) so this driver can echo the
/// pass-one trace and the symbol table dump to stdout along the way, per
/// the external-interfaces design (not a stable interface; for interactive
/// use only).
fn assemble_and_report(
    text: &str,
    mode: Mode,
    listing_path: &Path,
    object_path: &Path,
) -> Result<(), AssemblerError> {
    let opcode_table = opcodes::opcode_table();
    let mut lines = source::parse(text)?;
    let (mut state, symtab) = pass_one::assign_addresses(&mut lines, &opcode_table)?;

    println!("{:>6}  {:<10}{:<10}{:<10}", "LOC", "LABEL", "MNEMONIC", "OPERAND");
    for line in lines.iter().skip(1) {
        println!(
            "{:06X}  {:<10}{:<10}{:<10}",
            line.location(),
            line.label.as_deref().unwrap_or(""),
            line.mnemonic,
            display_operand(&line.operand),
        );
    }

    println!("\nSYMBOL TABLE");
    let mut symbols: Vec<(&str, u32)> = symtab.iter().collect();
    symbols.sort_by(|a, b| a.0.cmp(b.0));
    for (symbol, location) in symbols {
        println!("{:<10}{:06x}", symbol, location);
    }

    let mut codes = Vec::new();
    for line in &lines {
        if let Some(code) = pass_two::encode_line(&mut state, &symtab, line, &opcode_table, mode)? {
            codes.push(code);
        }
    }

    let listing_text = sicxe_asm::listing::render(&state, &lines, &codes);
    println!("\nLISTING");
    print!("{}", listing_text);

    let object_records = records::generate_records(&state, &codes);
    let object_text = records::render(&object_records);

    write_output(listing_path, &listing_text)?;
    write_output(object_path, &object_text)?;

    Ok(())
}

fn write_output(path: &Path, contents: &str) -> Result<(), AssemblerError> {
    let mut file =
        fs::File::create(path).map_err(|err| AssemblerError::Io(err, path.to_owned()))?;
    file.write_all(contents.as_bytes())
        .map_err(|err| AssemblerError::Io(err, path.to_owned()))?;
    file.flush()
        .map_err(|err| AssemblerError::Io(err, path.to_owned()))
}
