#![no_main]

use libfuzzer_sys::fuzz_target;
use tinylisp::{Reader, SymbolTable};

fuzz_target!(|input: &str| {
    let mut symbols = SymbolTable::new();
    let mut reader = Reader::new(input);

    // Read until the input is exhausted or malformed; each step consumes input
    while let Ok(Some(expression)) = reader.parse_expression(&mut symbols) {
        let _ = expression.to_string();
    }
});
