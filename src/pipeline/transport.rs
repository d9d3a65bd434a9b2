use std::time::Duration;

use crate::shared::STEPS_PER_ROW;

/// How long one tick lasts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickInterval {
    /// A sixteenth note at the current tempo.
    Tempo,
    /// Constant wall-clock interval, independent of tempo.
    Fixed(Duration),
}

impl TickInterval {
    pub fn seconds(self, bpm: f32) -> f64 {
        match self {
            TickInterval::Tempo => 60.0 / bpm.max(1.0) as f64 / 4.0,
            TickInterval::Fixed(d) => d.as_secs_f64().max(0.001),
        }
    }
}

/// The playback clock: advances the active step once per tick while playing.
#[derive(Clone, Debug)]
pub struct Transport {
    playing: bool,
    step: Option<u8>, // last step that fired; drives the highlight
    next_step: u8,
    accumulator: f64,
    interval: TickInterval,
}

impl Transport {
    pub fn new(interval: TickInterval) -> Self {
        Self {
            playing: false,
            step: None,
            next_step: 0,
            accumulator: 0.0,
            interval,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn active_step(&self) -> Option<u8> {
        self.step
    }

    pub fn start(&mut self) {
        self.playing = true;
        self.next_step = 0;
        self.step = None;
        self.accumulator = f64::INFINITY; // first tick fires on the next advance
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.step = None;
        self.next_step = 0;
        self.accumulator = 0.0;
    }

    /// Feed elapsed wall time; returns every step that fired, in order.
    pub fn advance(&mut self, elapsed: f64, bpm: f32) -> Vec<u8> {
        if !self.playing {
            return Vec::new();
        }
        let interval = self.interval.seconds(bpm);
        let mut fired = Vec::new();

        if self.accumulator.is_infinite() {
            self.accumulator = interval;
        } else {
            self.accumulator += elapsed.max(0.0);
        }

        while self.accumulator >= interval {
            fired.push(self.fire());
            if fired.len() == STEPS_PER_ROW {
                // stalled for a whole loop; drop the backlog
                self.accumulator = 0.0;
                break;
            }
            self.accumulator -= interval;
        }
        fired
    }

    fn fire(&mut self) -> u8 {
        let step = self.next_step;
        self.step = Some(step);
        self.next_step = ((step as usize + 1) % STEPS_PER_ROW) as u8;
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tempo_interval_is_a_sixteenth() {
        assert_eq!(TickInterval::Tempo.seconds(120.0), 0.125);
        assert_eq!(TickInterval::Tempo.seconds(60.0), 0.25);
        assert_eq!(TickInterval::Fixed(Duration::from_millis(125)).seconds(240.0), 0.125);
    }

    #[test]
    fn idle_transport_never_fires() {
        let mut t = Transport::new(TickInterval::Tempo);
        assert!(t.advance(10.0, 120.0).is_empty());
        assert_eq!(t.active_step(), None);
    }

    #[test]
    fn first_step_fires_immediately_on_start() {
        let mut t = Transport::new(TickInterval::Tempo);
        t.start();
        assert_eq!(t.advance(0.0, 120.0), vec![0]);
        assert_eq!(t.active_step(), Some(0));
        assert!(t.advance(0.1, 120.0).is_empty());
        assert_eq!(t.advance(0.03, 120.0), vec![1]);
    }

    #[test]
    fn wraps_after_sixteen_steps() {
        let mut t = Transport::new(TickInterval::Fixed(Duration::from_millis(100)));
        t.start();
        t.advance(0.0, 120.0);
        let mut seen = vec![0];
        for _ in 0..16 {
            seen.extend(t.advance(0.1, 120.0));
        }
        assert_eq!(seen.len(), 17);
        assert_eq!(seen[15], 15);
        assert_eq!(seen[16], 0);
    }

    #[test]
    fn stop_resets_highlight_and_position() {
        let mut t = Transport::new(TickInterval::Tempo);
        t.start();
        t.advance(0.0, 120.0);
        t.advance(0.25, 120.0);
        t.stop();
        assert!(!t.is_playing());
        assert_eq!(t.active_step(), None);
        t.start();
        assert_eq!(t.advance(0.0, 120.0), vec![0]);
    }

    #[test]
    fn long_stall_is_capped_at_one_loop() {
        let mut t = Transport::new(TickInterval::Tempo);
        t.start();
        t.advance(0.0, 120.0);
        let fired = t.advance(60.0, 120.0);
        assert_eq!(fired.len(), STEPS_PER_ROW);
    }
}
