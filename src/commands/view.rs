//! Live spectrogram view.
//!
//! Samples the configured input device every 10 ms and redraws the terminal
//! spectrogram every third sample. Space or SIGUSR1 pauses and resumes.
//!
//! The loop blocks on terminal input between ticks, so it runs on tokio's
//! blocking pool rather than on an async worker.

use anyhow::anyhow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::analysis::MicrophoneAnalyser;
use crate::config::SpectroConfig;
use crate::spectrogram::axis::format_timestamp;
use crate::spectrogram::{
    AxisMargins, AxisStyle, Controller, PlotGeometry, SpectrumSource, TickOutcome,
};
use crate::ui::{ErrorScreen, FooterStatus, SpectrogramTui, ViewCommand};

/// How long to wait for input while paused, when no tick is scheduled.
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Frames between periodic progress log lines.
const LOG_EVERY_FRAMES: u64 = 200;

/// Runs the spectrogram until the user quits.
///
/// # Errors
/// - If the configuration is invalid
/// - If the terminal is too small for the plot
/// - If the input device cannot be opened
/// - If terminal input or rendering fails
pub fn handle_view() -> anyhow::Result<()> {
    tracing::info!("=== spectro started ===");

    let config = match SpectroConfig::load_or_create() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            return Err(report_fatal(format!(
                "Configuration error:\n\n{e}\n\nCheck ~/.config/spectro/spectro.toml and try again."
            )));
        }
    };
    tracing::info!(
        "Configuration loaded: device={}, smoothing={}, decibels={}..{}",
        config.audio.device,
        config.audio.smoothing_time_constant,
        config.audio.min_decibels,
        config.audio.max_decibels
    );

    let mut tui = SpectrogramTui::new()?;
    let (width, height) = tui.canvas_size();

    let geometry = match PlotGeometry::new(width, height, AxisMargins::TERMINAL) {
        Ok(geometry) => geometry,
        Err(e) => {
            tracing::error!("Terminal too small: {e}");
            tui.cleanup()?;
            return Err(report_fatal(format!(
                "{e}.\n\nEnlarge the terminal window and try again."
            )));
        }
    };

    tracing::debug!(
        "Canvas {}x{}px: {} time steps, FFT size {} for {} bins",
        width,
        height,
        geometry.time_steps(),
        geometry.fft_size(),
        geometry.frequency_bins()
    );

    let source = match MicrophoneAnalyser::open(
        &config.audio.device,
        geometry.fft_size(),
        config.audio.analyser_settings(),
    ) {
        Ok(source) => source,
        Err(e) => {
            tracing::error!("Failed to open input device: {e}");
            tui.cleanup()?;
            return Err(report_fatal(format!(
                "Audio input error:\n\n{e}\n\nRun 'spectro list-devices' to check your device."
            )));
        }
    };

    let mut controller = Controller::new(source).with_axis_style(AxisStyle::TERMINAL);
    controller.start(geometry, Instant::now())?;

    let toggle_requested = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&toggle_requested))
        .map_err(|e| anyhow!("Failed to register signal handler: {e}"))?;

    let sample_rate = controller.source().sample_rate();
    let frequency_bins = controller.source().resolution();
    let mut frames = 0u64;
    let mut needs_draw = true;

    loop {
        if toggle_requested.swap(false, Ordering::Relaxed) {
            tracing::info!("Received SIGUSR1: toggling pause");
            controller.toggle(Instant::now())?;
            needs_draw = true;
        }

        let timeout = controller
            .next_due()
            .map(|due| due.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_POLL);

        match tui.handle_input(timeout)? {
            ViewCommand::Quit => break,
            ViewCommand::TogglePause => {
                controller.toggle(Instant::now())?;
                needs_draw = true;
            }
            ViewCommand::Continue => {}
        }

        if controller.poll(Instant::now(), tui.canvas_mut()) == TickOutcome::Rendered {
            frames += 1;
            needs_draw = true;
            if frames % LOG_EVERY_FRAMES == 0 {
                if let Some(newest) = controller.history().and_then(|h| h.timestamp(0).ok()) {
                    tracing::debug!(
                        "Rendered {} frames, newest sample at {}",
                        frames,
                        format_timestamp(newest)
                    );
                }
            }
        }

        if needs_draw {
            tui.draw(&FooterStatus {
                state: controller.state(),
                toggle_label: controller.toggle_label(),
                sample_rate,
                frequency_bins,
            })?;
            needs_draw = false;
        }
    }

    controller.stop();
    tui.cleanup()?;
    tracing::info!("=== spectro exited after {} frames ===", frames);
    Ok(())
}

/// Shows `message` on the error screen and turns it into the returned error.
fn report_fatal(message: String) -> anyhow::Error {
    let shown = ErrorScreen::new().and_then(|mut screen| {
        screen.show(&message)?;
        screen.cleanup()
    });
    if let Err(e) = shown {
        tracing::warn!("Could not display error screen: {e}");
    }
    anyhow!(message)
}
