use anyhow::Result;
use clap::Parser;
use posttime::cli::{self, Cli};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    cli::run(cli)
}
