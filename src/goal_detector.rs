//! Goal detection from two IR break-beam sensors
//!
//! Each sensor line is pulled up and reads low while the beam is broken.
//! A goal is confirmed after enough consecutive blocked samples; the channel
//! then latches until the beam has been clear long enough, so a ball resting
//! in the goal mouth counts once.

use crate::BoardError;
use crate::config;
use crate::game_state::Team;
use embedded_hal::digital::InputPin;
use heapless::Vec;
use log::{debug, info, warn};

/// A confirmed goal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalEvent {
    pub team: Team,
    pub timestamp_ms: u64,
}

/// Goals found in one sampling step, at most one per channel
pub type GoalEvents = Vec<GoalEvent, 2>;

/// Debounce state of one goal sensor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorChannel {
    pin: u8,
    team: Team,
    triggered: bool,
    consecutive: u16,
    blocked: bool,
    last_trigger_ms: Option<u64>,
}

impl SensorChannel {
    pub fn new(pin: u8, team: Team) -> Self {
        Self {
            pin,
            team,
            triggered: false,
            consecutive: 0,
            blocked: false,
            last_trigger_ms: None,
        }
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn team(&self) -> Team {
        self.team
    }

    /// Raw level of the last sample (beam broken)
    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    pub fn consecutive_triggers(&self) -> u16 {
        self.consecutive
    }

    /// Whether the channel already fired for the object currently in the beam
    pub fn is_latched(&self) -> bool {
        self.blocked
    }

    pub fn last_trigger_ms(&self) -> Option<u64> {
        self.last_trigger_ms
    }

    /// Forget counters, latch and trigger history
    pub fn reset(&mut self) {
        self.triggered = false;
        self.consecutive = 0;
        self.blocked = false;
        self.last_trigger_ms = None;
    }

    /// Feed one sample into the channel
    pub fn sample(&mut self, triggered: bool, now_ms: u64) -> Option<GoalEvent> {
        self.triggered = triggered;

        if !triggered {
            self.consecutive = 0;
            if self.blocked && self.elapsed_since_trigger(now_ms) > config::GOAL_LATCH_CLEAR_MS {
                debug!("[GOAL] Sensor on GPIO{} re-armed", self.pin);
                self.blocked = false;
            }
            return None;
        }

        self.consecutive = self.consecutive.saturating_add(1);
        if self.consecutive < config::GOAL_TRIGGER_THRESHOLD || self.blocked {
            return None;
        }

        let debounced = self
            .last_trigger_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= config::GOAL_DEBOUNCE_MS);
        if !debounced {
            return None;
        }

        self.blocked = true;
        self.last_trigger_ms = Some(now_ms);
        Some(GoalEvent {
            team: self.team,
            timestamp_ms: now_ms,
        })
    }

    fn elapsed_since_trigger(&self, now_ms: u64) -> u64 {
        match self.last_trigger_ms {
            Some(last) => now_ms.saturating_sub(last),
            None => u64::MAX,
        }
    }
}

/// Samples both goal sensors at a fixed cadence
pub struct GoalDetector<A, B> {
    sensor_a: A,
    sensor_b: B,
    channel_a: SensorChannel,
    channel_b: SensorChannel,
    last_sample_ms: Option<u64>,
}

impl<A, B> GoalDetector<A, B>
where
    A: InputPin,
    B: InputPin,
{
    /// Create a detector for goal 1 (team A) and goal 2 (team B)
    pub fn new(sensor_a: A, sensor_b: B) -> Self {
        info!(
            "[GOAL] Goal sensors: team A on GPIO{}, team B on GPIO{}",
            config::GOAL_SENSOR_A_PIN,
            config::GOAL_SENSOR_B_PIN
        );
        Self {
            sensor_a,
            sensor_b,
            channel_a: SensorChannel::new(config::GOAL_SENSOR_A_PIN, Team::A),
            channel_b: SensorChannel::new(config::GOAL_SENSOR_B_PIN, Team::B),
            last_sample_ms: None,
        }
    }

    pub fn channel(&self, team: Team) -> &SensorChannel {
        match team {
            Team::A => &self.channel_a,
            Team::B => &self.channel_b,
        }
    }

    /// Clear both channels
    pub fn reset(&mut self) {
        self.channel_a.reset();
        self.channel_b.reset();
    }

    /// Read both sensor lines and run one sampling step.
    ///
    /// A line that cannot be read counts as a clear beam for this sample.
    pub fn poll(&mut self, now_ms: u64) -> GoalEvents {
        if !self.sample_due(now_ms) {
            return GoalEvents::new();
        }

        let a_triggered = read_beam(&mut self.sensor_a).unwrap_or_else(|e| {
            warn!("[GOAL] Sensor on GPIO{} unreadable: {:?}", self.channel_a.pin, e);
            false
        });
        let b_triggered = read_beam(&mut self.sensor_b).unwrap_or_else(|e| {
            warn!("[GOAL] Sensor on GPIO{} unreadable: {:?}", self.channel_b.pin, e);
            false
        });

        self.sample(now_ms, a_triggered, b_triggered)
    }

    /// Run one sampling step with already-read levels.
    ///
    /// Steps closer than the sampling interval to the previous one are
    /// ignored and return no events.
    pub fn sample(&mut self, now_ms: u64, a_triggered: bool, b_triggered: bool) -> GoalEvents {
        let mut events = GoalEvents::new();
        if !self.sample_due(now_ms) {
            return events;
        }
        self.last_sample_ms = Some(now_ms);

        for (channel, triggered) in [
            (&mut self.channel_a, a_triggered),
            (&mut self.channel_b, b_triggered),
        ] {
            if let Some(event) = channel.sample(triggered, now_ms) {
                info!(
                    "[GOAL] Goal event - Team: {}, Time: {}",
                    event.team.label(),
                    event.timestamp_ms
                );
                // capacity matches the channel count
                let _ = events.push(event);
            }
        }

        events
    }

    fn sample_due(&self, now_ms: u64) -> bool {
        self.last_sample_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= config::SENSOR_SAMPLE_INTERVAL_MS)
    }
}

/// Beam broken = line pulled low
fn read_beam<P: InputPin>(pin: &mut P) -> Result<bool, BoardError> {
    pin.is_low().map_err(|_| BoardError::SensorError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    /// Pulled-up line: high = clear, low = blocked
    struct Line(bool);

    impl ErrorType for Line {
        type Error = Infallible;
    }

    impl InputPin for Line {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.0)
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.0)
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl embedded_hal::digital::Error for Broken {
        fn kind(&self) -> embedded_hal::digital::ErrorKind {
            embedded_hal::digital::ErrorKind::Other
        }
    }

    struct FaultyLine;

    impl ErrorType for FaultyLine {
        type Error = Broken;
    }

    impl InputPin for FaultyLine {
        fn is_high(&mut self) -> Result<bool, Broken> {
            Err(Broken)
        }

        fn is_low(&mut self) -> Result<bool, Broken> {
            Err(Broken)
        }
    }

    /// Feed `count` samples 10 ms apart starting at `start`. Returns the
    /// number of events and the time of the next sample.
    fn feed(channel: &mut SensorChannel, triggered: bool, start: u64, count: u32) -> (u32, u64) {
        let mut fired = 0;
        let mut now = start;
        for _ in 0..count {
            if channel.sample(triggered, now).is_some() {
                fired += 1;
            }
            now += 10;
        }
        (fired, now)
    }

    #[test]
    fn fires_on_tenth_consecutive_sample() {
        let mut channel = SensorChannel::new(18, Team::A);
        for i in 0..9 {
            assert_eq!(channel.sample(true, 1000 + i * 10), None);
        }
        let event = channel.sample(true, 1090).expect("tenth sample fires");
        assert_eq!(event.team, Team::A);
        assert_eq!(event.timestamp_ms, 1090);
        assert!(channel.is_latched());
    }

    #[test]
    fn interrupted_run_starts_over() {
        let mut channel = SensorChannel::new(18, Team::A);
        let (fired, now) = feed(&mut channel, true, 0, 9);
        assert_eq!(fired, 0);
        channel.sample(false, now);
        assert_eq!(channel.consecutive_triggers(), 0);
        let (fired, now) = feed(&mut channel, true, now + 10, 9);
        assert_eq!(fired, 0);
        assert!(channel.sample(true, now).is_some());
    }

    #[test]
    fn latched_channel_does_not_refire_while_blocked() {
        let mut channel = SensorChannel::new(19, Team::B);
        let (fired, _) = feed(&mut channel, true, 0, 500);
        assert_eq!(fired, 1);
    }

    #[test]
    fn latch_clears_only_after_one_second_of_clear_beam() {
        let mut channel = SensorChannel::new(18, Team::A);
        let (fired, _) = feed(&mut channel, true, 0, 10);
        assert_eq!(fired, 1);
        assert_eq!(channel.last_trigger_ms(), Some(90));

        channel.sample(false, 1000);
        assert!(channel.is_latched());
        channel.sample(false, 1091);
        assert!(!channel.is_latched());

        let (fired, _) = feed(&mut channel, true, 1100, 10);
        assert_eq!(fired, 1);
    }

    #[test]
    fn debounce_blocks_a_second_goal_within_500ms() {
        let mut channel = SensorChannel::new(18, Team::A);
        channel.last_trigger_ms = Some(1000);
        channel.consecutive = config::GOAL_TRIGGER_THRESHOLD - 1;

        assert_eq!(channel.sample(true, 1499), None);
        // still triggered, debounce now satisfied
        assert!(channel.sample(true, 1500).is_some());
    }

    #[test]
    fn detector_ignores_samples_inside_interval() {
        let mut detector = GoalDetector::new(Line(false), Line(true));
        for i in 0..9u64 {
            assert!(detector.poll(i * 10).is_empty());
            // extra call 5 ms later must not count
            assert!(detector.poll(i * 10 + 5).is_empty());
        }
        assert_eq!(detector.channel(Team::A).consecutive_triggers(), 9);

        let events = detector.poll(90);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].team, Team::A);
    }

    #[test]
    fn both_channels_can_fire_in_one_step() {
        let mut detector = GoalDetector::new(Line(true), Line(true));
        for i in 0..9u64 {
            assert!(detector.sample(i * 10, true, true).is_empty());
        }
        let events = detector.sample(90, true, true);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].team, Team::A);
        assert_eq!(events[1].team, Team::B);
    }

    #[test]
    fn unreadable_line_counts_as_clear() {
        let mut detector = GoalDetector::new(FaultyLine, Line(true));
        for i in 0..20u64 {
            assert!(detector.poll(i * 10).is_empty());
        }
        assert_eq!(detector.channel(Team::A).consecutive_triggers(), 0);
    }

    #[test]
    fn reset_clears_latches_and_counters() {
        let mut detector = GoalDetector::new(Line(false), Line(false));
        for i in 0..10u64 {
            detector.poll(i * 10);
        }
        assert!(detector.channel(Team::A).is_latched());

        detector.reset();
        for team in [Team::A, Team::B] {
            let channel = detector.channel(team);
            assert!(!channel.is_latched());
            assert_eq!(channel.consecutive_triggers(), 0);
            assert_eq!(channel.last_trigger_ms(), None);
        }
    }
}
