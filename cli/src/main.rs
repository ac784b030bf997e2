use std::process::exit;
use std::time::Instant;

use clap::Parser;
use jdg_cli::{cmd::GlobalArgs, logger};
use jdg_core::Scratch;

const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    let app = GlobalArgs::parse();
    logger::init(app.debug);
    let started_at = Instant::now();

    let scratch = Scratch::new().unwrap_or_else(|e| fail(&app, e));

    let res = tokio::select! {
        res = app.exec_subcmd(&scratch) => Some(res),
        _ = interrupted() => None,
    };
    if let Err(e) = scratch.close() {
        log::warn!("{:#}", e);
    }

    match res {
        Some(Ok(())) => log::info!("Finished in {:.3} s", started_at.elapsed().as_secs_f64()),
        Some(Err(e)) => fail(&app, e),
        None => {
            log::warn!("Interrupted");
            exit(EXIT_INTERRUPTED);
        }
    }
}

async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::debug!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await
    }
}

fn fail(app: &GlobalArgs, e: anyhow::Error) -> ! {
    if app.debug {
        eprintln!("Error: {:?}", e);
    } else {
        eprintln!("Error: {:#}", e);
    }
    exit(1);
}
