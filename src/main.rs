// transformers-logging - Library-scoped verbosity control from the command line
use clap::Parser;
use transformers_logging::cli::{execute_command, Args};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    execute_command(args)?;
    Ok(())
}
