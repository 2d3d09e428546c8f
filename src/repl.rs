//! Read-eval-print loop over any buffered input.
//!
//! Expressions may span several lines; input is buffered until it holds at
//! least one complete expression. Language errors are reported and the loop
//! carries on; only I/O failures end it early.

use std::io::{self, BufRead, Write};

use log::debug;

use crate::{context::EvaluationContext, expression::Expression, parser::Reader};

const BANNER: &str = "tinylisp\nType expressions to evaluate them, Ctrl+D to exit.";
const FAREWELL: &str = "Goodbye!";


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplOptions {
    pub banner: bool,
    pub prompt: bool,
}

impl ReplOptions {
    pub fn interactive() -> Self {
        Self { banner: true, prompt: true }
    }

    /// Results and errors only, for scripted input.
    pub fn quiet() -> Self {
        Self { banner: false, prompt: false }
    }
}

impl Default for ReplOptions {
    fn default() -> Self {
        Self::interactive()
    }
}

// A top-level PRINT already produced its own output line
fn is_print_call(expression: &Expression) -> bool {
    expression.as_pair()
        .and_then(|pair| pair.head().as_symbol())
        .is_some_and(|symbol| symbol.name() == "PRINT")
}

fn report<W: Write>(context: &mut EvaluationContext, expression: &Expression, output: &mut W) -> io::Result<()> {
    match context.evaluate(expression) {
        Ok(_) if is_print_call(expression) => Ok(()),
        Ok(value) => writeln!(output, "=> {}", value),
        Err(err) => writeln!(output, "Error: {}", err),
    }
}

/// Evaluates every complete expression in `buffer` and returns how many
/// bytes were consumed. An incomplete trailing expression is left in place.
fn evaluate_buffer<W: Write>(context: &mut EvaluationContext, buffer: &str, output: &mut W) -> io::Result<usize> {
    let mut reader = Reader::new(buffer);
    let mut consumed = 0;

    loop {
        match context.read(&mut reader) {
            Ok(Some(expression)) => {
                consumed = reader.offset();
                report(context, &expression, output)?;
            },
            Ok(None) => return Ok(buffer.len()),
            Err(err) if err.is_incomplete() => return Ok(consumed),
            Err(err) => {
                consumed = reader.offset();
                writeln!(output, "Error: {}", err)?;
            },
        }
    }
}

pub fn run<R: BufRead, W: Write>(context: &mut EvaluationContext, mut input: R, output: &mut W, options: ReplOptions) -> io::Result<()> {
    if options.banner {
        writeln!(output, "{}", BANNER)?;
    }

    let mut buffer = String::new();
    loop {
        if options.prompt {
            write!(output, "{}", if buffer.trim().is_empty() { "> " } else { "... " })?;
            output.flush()?;
        }

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        buffer.push_str(&line);
        let consumed = evaluate_buffer(context, &buffer, output)?;
        buffer.drain(..consumed);
        debug!("{} byte(s) of input pending", buffer.len());
    }

    // Input ended inside an expression
    if let Err(err) = context.read(&mut Reader::new(&buffer)) {
        if options.prompt {
            writeln!(output)?;
        }
        writeln!(output, "Error: {}", err)?;
    }

    if options.banner {
        writeln!(output, "{}", FAREWELL)?;
    }
    output.flush()
}
