mod args;
mod poll;

use clap::Parser;
use log::{debug, info};

fn main() {
    let args = args::Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    debug!("args: {:?}", args);

    match poll::run(&args) {
        Ok(()) => info!("Poll tabulated"),
        Err(e) => {
            poll::report_error(&e);
            std::process::exit(1);
        }
    }
}
