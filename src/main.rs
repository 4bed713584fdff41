use std::io;
use std::process;

use clap::Parser;
use jdlint::cli::Cli;
use jdlint::lint::{self, exit_code_for};
use owo_colors::OwoColorize;

fn main() {
    let cli = Cli::parse();

    // Build a context once, pass everywhere
    let ctx = cli.context();
    jdlint::infra::logging::init(&ctx);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let code = match lint::run(&cli, &ctx, &mut out) {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            let label = if ctx.no_color {
                "error:".to_string()
            } else {
                "error:".red().bold().to_string()
            };
            eprintln!("{label} {e}");
            exit_code_for(&e)
        }
    };

    process::exit(code);
}
