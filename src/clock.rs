//! Frame clock.
//!
//! [`Clock`] separates *actual* wall time from *game* time: game time only advances
//! while the clock is running, so pausing freezes every time-driven animation.
//! Frame statistics (min/max/average seconds per frame) are gathered once a start-up
//! delay has passed so loading hitches do not skew them. A fixed-step accumulator
//! is available for updates that need a constant rate.

use instant::{Duration, Instant};

/// Aggregated frame timing, reported by [`Clock::timing_report`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimingReport {
    pub frames: u64,
    pub min_spf: f64,
    pub max_spf: f64,
    pub average_spf: f64,
}

impl TimingReport {
    pub fn average_fps(&self) -> f64 {
        if self.average_spf > 0.0 {
            1.0 / self.average_spf
        } else {
            0.0
        }
    }
}

#[derive(Debug)]
pub struct Clock {
    name: String,
    created: Instant,
    last_tick: Instant,
    running: bool,
    game_time: Duration,
    frame_delta: Duration,
    stats_delay: Duration,
    stats: Option<TimingReport>,
    fixed_step: Duration,
    accumulator: Duration,
}

impl Clock {
    /// Creates a stopped clock. Statistics start `stats_delay` after creation.
    pub fn new(name: impl Into<String>, stats_delay: Duration) -> Self {
        Self::new_at(name, stats_delay, Instant::now())
    }

    fn new_at(name: impl Into<String>, stats_delay: Duration, now: Instant) -> Self {
        Self {
            name: name.into(),
            created: now,
            last_tick: now,
            running: false,
            game_time: Duration::ZERO,
            frame_delta: Duration::ZERO,
            stats_delay,
            stats: None,
            fixed_step: Duration::from_secs_f64(1.0 / 60.0),
            accumulator: Duration::ZERO,
        }
    }

    pub fn with_fixed_step(mut self, step: Duration) -> Self {
        if step.is_zero() {
            log::warn!("clock {}: zero fixed step ignored", self.name);
        } else {
            self.fixed_step = step;
        }
        self
    }

    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    fn start_at(&mut self, now: Instant) {
        if !self.running {
            self.running = true;
            self.last_tick = now;
        }
    }

    pub fn stop(&mut self) {
        self.stop_at(Instant::now());
    }

    fn stop_at(&mut self, now: Instant) {
        if self.running {
            self.advance(now);
            self.running = false;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn toggle(&mut self) {
        if self.running {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Advances the clock to now and returns the frame delta.
    pub fn tick(&mut self) -> Duration {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> Duration {
        if !self.running {
            self.frame_delta = Duration::ZERO;
            return self.frame_delta;
        }
        self.advance(now);
        self.record(now);
        self.frame_delta
    }

    fn advance(&mut self, now: Instant) {
        let delta = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        self.frame_delta = delta;
        self.game_time += delta;
        self.accumulator += delta;
    }

    fn record(&mut self, now: Instant) {
        if now.saturating_duration_since(self.created) < self.stats_delay {
            return;
        }
        let spf = self.frame_delta.as_secs_f64();
        let stats = self.stats.get_or_insert(TimingReport {
            frames: 0,
            min_spf: f64::MAX,
            max_spf: 0.0,
            average_spf: 0.0,
        });
        stats.frames += 1;
        stats.min_spf = stats.min_spf.min(spf);
        stats.max_spf = stats.max_spf.max(spf);
        stats.average_spf += (spf - stats.average_spf) / stats.frames as f64;
    }

    /// Drains the accumulator and returns how many fixed steps fit into it.
    pub fn fixed_steps(&mut self) -> u32 {
        let mut steps = 0;
        while self.accumulator >= self.fixed_step {
            self.accumulator -= self.fixed_step;
            steps += 1;
        }
        steps
    }

    pub fn frame_delta(&self) -> Duration {
        self.frame_delta
    }

    /// Time the clock has spent running.
    pub fn game_time_elapsed(&self) -> Duration {
        self.game_time
    }

    /// Wall time since the clock was created.
    pub fn actual_time_elapsed(&self) -> Duration {
        self.created.elapsed()
    }

    pub fn timing_report(&self) -> Option<TimingReport> {
        self.stats
    }

    pub fn report_timing_data(&self) {
        log::info!(
            "{}: actual time elapsed = {:.3}s, game time elapsed = {:.3}s",
            self.name,
            self.actual_time_elapsed().as_secs_f64(),
            self.game_time.as_secs_f64()
        );
        match self.stats {
            Some(stats) => log::info!(
                "{}: {} frames, min spf = {:.5}, max spf = {:.5}, average fps = {:.1}",
                self.name,
                stats.frames,
                stats.min_spf,
                stats.max_spf,
                stats.average_fps()
            ),
            None => log::info!("{}: no frames recorded yet", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn stopped_clock_does_not_advance() {
        let t0 = Instant::now();
        let mut clock = Clock::new_at("test", Duration::ZERO, t0);
        assert_eq!(clock.tick_at(t0 + ms(100)), Duration::ZERO);
        assert_eq!(clock.game_time_elapsed(), Duration::ZERO);
    }

    #[test]
    fn game_time_excludes_paused_time() {
        let t0 = Instant::now();
        let mut clock = Clock::new_at("test", Duration::ZERO, t0);
        clock.start_at(t0);
        clock.tick_at(t0 + ms(100));
        clock.stop_at(t0 + ms(150));
        clock.tick_at(t0 + ms(500));
        clock.start_at(t0 + ms(1000));
        clock.tick_at(t0 + ms(1020));
        assert_eq!(clock.game_time_elapsed(), ms(170));
        assert_eq!(clock.frame_delta(), ms(20));
    }

    #[test]
    fn statistics_wait_for_the_start_delay() {
        let t0 = Instant::now();
        let mut clock = Clock::new_at("test", ms(300), t0);
        clock.start_at(t0);
        clock.tick_at(t0 + ms(100));
        clock.tick_at(t0 + ms(200));
        assert!(clock.timing_report().is_none());

        clock.tick_at(t0 + ms(310));
        clock.tick_at(t0 + ms(330));
        let report = clock.timing_report().expect("report after delay");
        assert_eq!(report.frames, 2);
        assert!((report.min_spf - 0.020).abs() < 1e-9);
        assert!((report.max_spf - 0.110).abs() < 1e-9);
        assert!((report.average_spf - 0.065).abs() < 1e-9);
    }

    #[test]
    fn fixed_steps_consume_whole_steps_only() {
        let t0 = Instant::now();
        let mut clock = Clock::new_at("test", Duration::ZERO, t0).with_fixed_step(ms(10));
        clock.start_at(t0);
        clock.tick_at(t0 + ms(35));
        assert_eq!(clock.fixed_steps(), 3);
        clock.tick_at(t0 + ms(40));
        assert_eq!(clock.fixed_steps(), 1);
        assert_eq!(clock.fixed_steps(), 0);
    }
}
