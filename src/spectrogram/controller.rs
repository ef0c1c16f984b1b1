//! Session lifecycle: start, pause, resume and stop around the sampling loop.

use std::fmt;
use std::time::Instant;

use super::error::SpectrogramError;
use super::geometry::PlotGeometry;
use super::history::SpectrumHistory;
use super::render::{AxisStyle, Renderer};
use super::scheduler::{Clock, SampleScheduler, SystemClock, REDRAW_INTERVAL, SAMPLE_INTERVAL};
use super::source::SpectrumSource;
use super::surface::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Stopped,
    Running,
    Paused,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
        }
    }
}

/// What a call to [`Controller::poll`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No tick was due
    Idle,
    /// A sample was taken without redrawing
    Sampled,
    /// A sample was taken and the frame redrawn
    Rendered,
}

/// Per-session state created by [`Controller::start`].
#[derive(Debug)]
struct Session {
    history: SpectrumHistory,
    renderer: Renderer,
}

/// Owns the spectrum source, history, scheduler and renderer for one session.
///
/// All mutation happens inside [`Self::poll`] or the lifecycle methods, from a
/// single thread. Pausing keeps the history and redraw counter exactly as they
/// were.
pub struct Controller<S, C = SystemClock> {
    source: S,
    clock: C,
    state: SessionState,
    ended: bool,
    scheduler: SampleScheduler,
    style: AxisStyle,
    session: Option<Session>,
}

impl<S: SpectrumSource> Controller<S, SystemClock> {
    pub fn new(source: S) -> Self {
        Self::with_clock(source, SystemClock)
    }
}

impl<S: SpectrumSource, C: Clock> Controller<S, C> {
    pub fn with_clock(source: S, clock: C) -> Self {
        Self {
            source,
            clock,
            state: SessionState::Stopped,
            ended: false,
            scheduler: SampleScheduler::new(SAMPLE_INTERVAL, REDRAW_INTERVAL),
            style: AxisStyle::default(),
            session: None,
        }
    }

    pub fn with_axis_style(mut self, style: AxisStyle) -> Self {
        self.style = style;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Label for the pause/resume control.
    pub fn toggle_label(&self) -> &'static str {
        match self.state {
            SessionState::Paused => "Resume",
            _ => "Pause",
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn history(&self) -> Option<&SpectrumHistory> {
        self.session.as_ref().map(|s| &s.history)
    }

    /// When the next tick is due, or `None` while not running.
    pub fn next_due(&self) -> Option<Instant> {
        self.scheduler.next_due()
    }

    fn check(&self, action: &'static str, expected: SessionState) -> Result<(), SpectrogramError> {
        if self.ended {
            return Err(SpectrogramError::SessionEnded);
        }
        if self.state != expected {
            return Err(SpectrogramError::InvalidTransition {
                action,
                state: self.state,
            });
        }
        Ok(())
    }

    /// Allocates the history for `geometry` and begins ticking.
    ///
    /// # Errors
    /// - If the session was already started or has ended
    /// - If the source reports no frequency bins
    pub fn start(&mut self, geometry: PlotGeometry, now: Instant) -> Result<(), SpectrogramError> {
        self.check("start", SessionState::Stopped)?;

        let frequency_bins = self.source.resolution();
        let sample_rate = self.source.sample_rate();
        let history = SpectrumHistory::prefilled(
            geometry.time_steps(),
            frequency_bins,
            self.clock.now(),
            self.scheduler.interval(),
        )?;

        tracing::info!(
            "Spectrogram started: {} time steps x {} bins at {}Hz, plot {}x{}px",
            history.capacity(),
            history.frequency_bins(),
            sample_rate,
            geometry.plot_width(),
            geometry.plot_height()
        );

        self.session = Some(Session {
            history,
            renderer: Renderer::new(geometry, sample_rate, frequency_bins, self.style),
        });
        self.scheduler.start(now);
        self.state = SessionState::Running;
        Ok(())
    }

    /// Stops ticking. History and redraw counter are left untouched.
    pub fn pause(&mut self) -> Result<(), SpectrogramError> {
        self.check("pause", SessionState::Running)?;
        self.scheduler.cancel();
        self.state = SessionState::Paused;
        tracing::debug!(
            "Spectrogram paused with redraw counter at {}",
            self.scheduler.redraw_counter()
        );
        Ok(())
    }

    /// Restarts ticking; the first tick after resuming always redraws.
    pub fn resume(&mut self, now: Instant) -> Result<(), SpectrogramError> {
        self.check("resume", SessionState::Paused)?;
        self.scheduler.resume(now);
        self.state = SessionState::Running;
        tracing::debug!("Spectrogram resumed");
        Ok(())
    }

    /// Pauses when running, resumes when paused. Returns the new state.
    pub fn toggle(&mut self, now: Instant) -> Result<SessionState, SpectrogramError> {
        match self.state {
            SessionState::Running => self.pause()?,
            _ => self.resume(now)?,
        }
        Ok(self.state)
    }

    /// Ends the session and releases the history. Calling it again is a no-op.
    pub fn stop(&mut self) {
        if self.ended {
            return;
        }
        self.scheduler.cancel();
        self.session = None;
        self.state = SessionState::Stopped;
        self.ended = true;
        tracing::info!("Spectrogram stopped");
    }

    /// Runs the tick due at `now`, if any.
    ///
    /// A tick samples the source into the history and, every few ticks, redraws
    /// the full frame onto `surface`.
    pub fn poll<D: Surface + ?Sized>(&mut self, now: Instant, surface: &mut D) -> TickOutcome {
        if self.state != SessionState::Running || !self.scheduler.poll_due(now) {
            return TickOutcome::Idle;
        }
        let Some(session) = self.session.as_mut() else {
            return TickOutcome::Idle;
        };

        if self
            .scheduler
            .sample(&mut self.source, &self.clock, &mut session.history)
        {
            session.renderer.render(surface, &session.history);
            TickOutcome::Rendered
        } else {
            TickOutcome::Sampled
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrogram::geometry::AxisMargins;
    use crate::spectrogram::surface::recording::RecordingSurface;
    use chrono::{DateTime, Local, TimeZone};
    use std::cell::Cell;
    use std::time::Duration;

    /// Fills every bin with the number of reads so far.
    struct CountingSource {
        bins: usize,
        reads: u32,
    }

    impl SpectrumSource for CountingSource {
        fn resolution(&self) -> usize {
            self.bins
        }

        fn sample_rate(&self) -> u32 {
            44_100
        }

        fn read_frequency_data(&mut self, out: &mut [u8]) {
            self.reads += 1;
            out.fill(self.reads as u8);
        }
    }

    /// Advances 10 ms on every reading, starting at `base`.
    struct SteppingClock {
        base: DateTime<Local>,
        calls: Cell<i64>,
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Local> {
            let n = self.calls.get();
            self.calls.set(n + 1);
            self.base + chrono::Duration::milliseconds(10 * n)
        }
    }

    fn base_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    fn controller(bins: usize) -> Controller<CountingSource, SteppingClock> {
        Controller::with_clock(
            CountingSource { bins, reads: 0 },
            SteppingClock {
                base: base_time(),
                calls: Cell::new(0),
            },
        )
    }

    fn geometry() -> PlotGeometry {
        let margins = AxisMargins {
            y_axis_width: 10,
            x_axis_height: 10,
        };
        // 20 columns
        PlotGeometry::new(50, 40, margins).unwrap()
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn snapshot(controller: &Controller<CountingSource, SteppingClock>) -> Vec<(DateTime<Local>, Vec<u8>)> {
        controller
            .history()
            .unwrap()
            .iter()
            .map(|(t, s)| (*t, s.to_vec()))
            .collect()
    }

    #[test]
    fn test_start_prefills_history() {
        let mut controller = controller(4);
        controller.start(geometry(), Instant::now()).unwrap();

        let history = controller.history().unwrap();
        assert_eq!(history.capacity(), 20);
        assert_eq!(history.frequency_bins(), 4);
        assert_eq!(*history.timestamp(0).unwrap(), base_time());
        assert_eq!(controller.state(), SessionState::Running);
        assert_eq!(controller.toggle_label(), "Pause");
    }

    #[test]
    fn test_renders_every_third_tick() {
        let t0 = Instant::now();
        let mut controller = controller(4);
        let mut surface = RecordingSurface::new(50, 40);
        controller.start(geometry(), t0).unwrap();

        let rendered: Vec<u64> = (1..=12)
            .filter(|k| controller.poll(t0 + ms(10 * k), &mut surface) == TickOutcome::Rendered)
            .collect();
        assert_eq!(rendered, vec![3, 6, 9, 12]);
        assert_eq!(controller.source().reads, 12);
    }

    #[test]
    fn test_no_tick_before_due() {
        let t0 = Instant::now();
        let mut controller = controller(4);
        let mut surface = RecordingSurface::new(50, 40);
        controller.start(geometry(), t0).unwrap();

        assert_eq!(controller.poll(t0 + ms(5), &mut surface), TickOutcome::Idle);
        assert_eq!(controller.source().reads, 0);
        assert!(surface.calls.is_empty());
    }

    #[test]
    fn test_first_tick_after_resume_renders() {
        let t0 = Instant::now();
        let mut controller = controller(4);
        let mut surface = RecordingSurface::new(50, 40);
        controller.start(geometry(), t0).unwrap();

        assert_eq!(controller.poll(t0 + ms(10), &mut surface), TickOutcome::Sampled);
        controller.pause().unwrap();
        assert_eq!(controller.toggle_label(), "Resume");

        let t1 = t0 + ms(500);
        controller.resume(t1).unwrap();
        assert_eq!(controller.poll(t1 + ms(10), &mut surface), TickOutcome::Rendered);
        assert_eq!(controller.poll(t1 + ms(20), &mut surface), TickOutcome::Sampled);
        assert_eq!(controller.poll(t1 + ms(30), &mut surface), TickOutcome::Sampled);
        assert_eq!(controller.poll(t1 + ms(40), &mut surface), TickOutcome::Rendered);
    }

    #[test]
    fn test_pause_freezes_history() {
        let t0 = Instant::now();
        let mut controller = controller(3);
        let mut surface = RecordingSurface::new(50, 40);
        controller.start(geometry(), t0).unwrap();
        for k in 1..=5 {
            controller.poll(t0 + ms(10 * k), &mut surface);
        }

        controller.pause().unwrap();
        let before = snapshot(&controller);
        let counter = controller.scheduler.redraw_counter();
        assert_eq!(controller.next_due(), None);

        for k in 6..=500 {
            assert_eq!(controller.poll(t0 + ms(10 * k), &mut surface), TickOutcome::Idle);
        }
        assert_eq!(snapshot(&controller), before);
        assert_eq!(controller.scheduler.redraw_counter(), counter);
        assert_eq!(controller.source().reads, 5);
    }

    #[test]
    fn test_timestamps_and_spectra_stay_aligned() {
        let t0 = Instant::now();
        let mut controller = controller(2);
        let mut surface = RecordingSurface::new(50, 40);
        controller.start(geometry(), t0).unwrap();

        for k in 1..=57 {
            controller.poll(t0 + ms(10 * k), &mut surface);
            if k % 13 == 0 {
                controller.toggle(t0 + ms(10 * k)).unwrap();
                controller.toggle(t0 + ms(10 * k)).unwrap();
            }

            for (timestamp, spectrum) in controller.history().unwrap().iter() {
                let elapsed_ms = (*timestamp - base_time()).num_milliseconds();
                let expected = if elapsed_ms > 0 { (elapsed_ms / 10) as u8 } else { 0 };
                assert!(spectrum.iter().all(|v| *v == expected));
            }
        }
    }

    #[test]
    fn test_invalid_transitions() {
        let mut controller = controller(2);
        assert!(matches!(
            controller.pause(),
            Err(SpectrogramError::InvalidTransition {
                action: "pause",
                state: SessionState::Stopped
            })
        ));

        let t0 = Instant::now();
        controller.start(geometry(), t0).unwrap();
        assert!(controller.start(geometry(), t0).is_err());
        assert!(controller.resume(t0).is_err());

        controller.stop();
        controller.stop();
        assert_eq!(controller.state(), SessionState::Stopped);
        assert!(controller.history().is_none());
        assert_eq!(
            controller.start(geometry(), t0),
            Err(SpectrogramError::SessionEnded)
        );
        assert!(controller.toggle(t0).is_err());
    }

    #[test]
    fn test_stop_while_paused_ends_session() {
        let t0 = Instant::now();
        let mut controller = controller(2);
        let mut surface = RecordingSurface::new(50, 40);
        controller.start(geometry(), t0).unwrap();
        controller.poll(t0 + ms(10), &mut surface);
        controller.pause().unwrap();
        assert_eq!(controller.toggle_label(), "Resume");

        controller.stop();
        assert_eq!(controller.state(), SessionState::Stopped);
        assert_eq!(controller.toggle_label(), "Pause");
        assert!(controller.history().is_none());
        assert_eq!(controller.next_due(), None);
        assert_eq!(controller.resume(t0), Err(SpectrogramError::SessionEnded));

        let calls = surface.calls.len();
        for k in 2..=50 {
            assert_eq!(controller.poll(t0 + ms(10 * k), &mut surface), TickOutcome::Idle);
        }
        assert_eq!(surface.calls.len(), calls);
        assert_eq!(controller.source().reads, 1);
    }

    #[test]
    fn test_start_fails_without_bins() {
        let mut controller = controller(0);
        assert_eq!(
            controller.start(geometry(), Instant::now()),
            Err(SpectrogramError::NoFrequencyBins)
        );
        assert_eq!(controller.state(), SessionState::Stopped);
    }
}
