use clap::Parser;
use trendy::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
