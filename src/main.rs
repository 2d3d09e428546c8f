use std::{fs::File, io::{self, BufReader}, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use log::info;
use tinylisp::{repl::{self, ReplOptions}, EvaluationContext};


/// Interactive evaluator for a small Lisp dialect.
#[derive(Debug, Parser)]
#[command(name = "tinylisp", version, about)]
struct ReplArgs {
    /// Evaluate the expressions in this file instead of reading standard input.
    file: Option<PathBuf>,

    /// Suppress the banner, prompts and farewell.
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = ReplArgs::parse();

    let mut context = EvaluationContext::new();
    let mut stdout = io::stdout();

    match args.file {
        Some(path) => {
            info!("evaluating {}", path.display());
            let file = File::open(&path)
                .with_context(|| format!("cannot open {}", path.display()))?;
            repl::run(&mut context, BufReader::new(file), &mut stdout, ReplOptions::quiet())?;
        },
        None => {
            let options = if args.quiet { ReplOptions::quiet() } else { ReplOptions::interactive() };
            info!("starting interactive session");
            repl::run(&mut context, io::stdin().lock(), &mut stdout, options)?;
        }
    }

    info!("session finished");
    Ok(())
}
