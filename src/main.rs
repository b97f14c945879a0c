use std::process::ExitCode;

use kube_podtime::{cli::Cli, config::Config};

#[tokio::main]
async fn main() -> ExitCode {
    kube_podtime::logging::init();

    let cli = <Cli as clap::Parser>::parse();
    let config = match Config::try_from(cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid arguments");
            return ExitCode::from(2);
        }
    };

    match kube_podtime::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "session failed");
            ExitCode::FAILURE
        }
    }
}
