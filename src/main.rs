mod cli;
mod config;
mod core;
mod error;
mod mirror;
mod models;
mod pipeline;
mod session;
mod sources;

#[cfg(test)]
mod test_server;

use clap::Parser;

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "warn"),
    )
    .init();

    let cli = cli::Cli::parse();

    if let Err(e) = cli::run(cli) {
        eprintln!("오류: {:#}", e);
        std::process::exit(1);
    }
}
