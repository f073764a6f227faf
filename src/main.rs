use clap::Parser;
use log::warn;
use snafu::ErrorCompat;

mod args;
mod sampler;

fn main() {
    let parsed = args::Args::parse();
    if parsed.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    if let Err(e) = sampler::run_plan(&parsed) {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
