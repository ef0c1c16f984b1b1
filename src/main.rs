//! spectro: a live scrolling spectrogram in the terminal.

mod analysis;
mod app;
mod commands;
mod config;
mod logging;
mod spectrogram;
mod ui;

#[tokio::main]
async fn main() {
    if let Err(e) = app::run().await {
        tracing::error!("Fatal error: {e:#}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
