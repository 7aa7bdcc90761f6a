use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use thankyou_site::config::Config;
use thankyou_site::logging::{self, TracingActionLog};
use thankyou_site::server;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();
    logging::init(&config);

    match server::run(&config, Arc::new(TracingActionLog)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
