use clap::Parser;
use std::process::ExitCode;

use hookforge::{Cli, Output};

#[tokio::main]
async fn main() -> ExitCode {
    // git must never see an unhandled crash; report and fail the hook
    std::panic::set_hook(Box::new(|info| {
        eprintln!("hookforge crashed: {info}");
        std::process::exit(1);
    }));

    let cli = Cli::parse();
    let debug = cli.debug_enabled();

    match cli.run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            let output = Output::default();
            if debug {
                output.error(&format!("{e:?}"));
            } else {
                output.error(&e.to_string());
            }
            ExitCode::FAILURE
        }
    }
}
