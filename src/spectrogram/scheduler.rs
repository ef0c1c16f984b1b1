//! Fixed-interval sampling with throttled redraws.

use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

use super::history::SpectrumHistory;
use super::source::SpectrumSource;

/// Time between two samples.
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(10);

/// A redraw happens once every this many samples.
pub const REDRAW_INTERVAL: u32 = 3;

/// Wall-clock source for sample timestamps.
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Identifies one scheduling of a [`PeriodicTimer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken(u64);

#[derive(Debug, Clone, Copy)]
struct Schedule {
    token: TimerToken,
    next_due: Instant,
}

/// Cancellable periodic deadline.
///
/// The timer never fires on its own; the event loop asks it whether a tick is
/// due. A tick that overruns pushes the next deadline back from the moment it
/// was observed, so late ticks are delayed rather than bunched together.
#[derive(Debug)]
pub struct PeriodicTimer {
    interval: Duration,
    schedule: Option<Schedule>,
    issued: u64,
}

impl PeriodicTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            schedule: None,
            issued: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts ticking one interval from `now`, replacing any earlier schedule.
    pub fn schedule(&mut self, now: Instant) -> TimerToken {
        self.issued += 1;
        let token = TimerToken(self.issued);
        self.schedule = Some(Schedule {
            token,
            next_due: now + self.interval,
        });
        token
    }

    /// Stops the schedule identified by `token`.
    ///
    /// Returns whether anything was cancelled. Cancelling twice, or with a token
    /// from an earlier schedule, does nothing.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        match self.schedule {
            Some(schedule) if schedule.token == token => {
                self.schedule = None;
                true
            }
            _ => false,
        }
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.schedule.map(|s| s.next_due)
    }

    /// Consumes one due tick, if any, and arms the next deadline.
    pub fn poll(&mut self, now: Instant) -> bool {
        let interval = self.interval;
        let Some(schedule) = self.schedule.as_mut() else {
            return false;
        };
        if now < schedule.next_due {
            return false;
        }

        schedule.next_due += interval;
        if schedule.next_due <= now {
            schedule.next_due = now + interval;
        }
        true
    }
}

/// Counts samples and decides which of them also redraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedrawThrottle {
    counter: u32,
    threshold: u32,
}

impl RedrawThrottle {
    pub fn new(threshold: u32) -> Self {
        Self {
            counter: 0,
            threshold: threshold.max(1),
        }
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Records one sample; true when this sample should redraw.
    pub fn step(&mut self) -> bool {
        self.counter += 1;
        if self.counter >= self.threshold {
            self.counter = 0;
            true
        } else {
            false
        }
    }

    /// Makes the next [`Self::step`] redraw regardless of history.
    pub fn force_next(&mut self) {
        self.counter = self.threshold;
    }
}

/// Owns the tick timer and redraw throttle, and performs the sampling step.
#[derive(Debug)]
pub struct SampleScheduler {
    timer: PeriodicTimer,
    token: Option<TimerToken>,
    throttle: RedrawThrottle,
}

impl SampleScheduler {
    pub fn new(interval: Duration, redraw_interval: u32) -> Self {
        Self {
            timer: PeriodicTimer::new(interval),
            token: None,
            throttle: RedrawThrottle::new(redraw_interval),
        }
    }

    pub fn interval(&self) -> Duration {
        self.timer.interval()
    }

    pub fn start(&mut self, now: Instant) {
        self.token = Some(self.timer.schedule(now));
    }

    /// Cancels future ticks. Safe to call when nothing is scheduled.
    pub fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            self.timer.cancel(token);
        }
    }

    /// Reschedules ticks and arranges for the first one to redraw.
    pub fn resume(&mut self, now: Instant) {
        self.throttle.force_next();
        self.start(now);
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.timer.next_due()
    }

    pub fn redraw_counter(&self) -> u32 {
        self.throttle.counter()
    }

    /// Whether a tick is due at `now`. Consumes the deadline when it is.
    pub fn poll_due(&mut self, now: Instant) -> bool {
        self.timer.poll(now)
    }

    /// One sampling step: pull a spectrum and a timestamp into the history,
    /// then report whether this step should redraw.
    pub fn sample<S, C>(&mut self, source: &mut S, clock: &C, history: &mut SpectrumHistory) -> bool
    where
        S: SpectrumSource + ?Sized,
        C: Clock + ?Sized,
    {
        history.advance(clock.now(), |bins| source.read_frequency_data(bins));
        self.throttle.step()
    }
}
