use clap::Parser;
use qroute::cli::{execute, Cli};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    std::process::exit(execute(cli));
}
