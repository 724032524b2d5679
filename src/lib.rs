#![cfg_attr(not(test), no_std)]

//! ESP32-C3 Table Soccer Scoreboard Library
//!
//! This library provides the goal detection, score keeping and LED effect
//! scheduling for a table soccer cabinet: two IR break-beam sensors count
//! goals, and a 300 pixel WS2812 strip shows ambient effects and team
//! celebrations.
//!
//! Everything here is hardware-agnostic. Sensor lines come in through
//! [`embedded_hal::digital::InputPin`] and frames go out through
//! [`smart_leds::SmartLedsWrite`], so the firmware binary only wires
//! peripherals together and feeds a millisecond clock into
//! [`scoreboard::Scoreboard::tick`].

pub mod effects;
pub mod game_state;
pub mod goal_detector;
pub mod led_control;
pub mod scoreboard;

/// Project version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration constants
#[deny(missing_docs)]
pub mod config {
    use smart_leds::RGB8;

    /// GPIO of the goal 1 (team A) break-beam sensor
    pub const GOAL_SENSOR_A_PIN: u8 = 18;

    /// GPIO of the goal 2 (team B) break-beam sensor
    pub const GOAL_SENSOR_B_PIN: u8 = 19;

    /// Default LED data GPIO pin
    pub const LED_DATA_PIN: u8 = 2;

    /// Pixels on the strip (5 m at 60 LEDs/m)
    pub const NUM_LEDS: usize = 300;

    /// Minimum time between two sensor samples in milliseconds
    pub const SENSOR_SAMPLE_INTERVAL_MS: u64 = 10;

    /// Consecutive blocked samples needed to confirm a goal
    pub const GOAL_TRIGGER_THRESHOLD: u16 = 10;

    /// Minimum time between two goals on the same sensor in milliseconds
    pub const GOAL_DEBOUNCE_MS: u64 = 500;

    /// Time after a goal before a clear beam re-arms the sensor
    pub const GOAL_LATCH_CLEAR_MS: u64 = 1000;

    /// Points needed to win a game
    pub const POINTS_TO_WIN: u8 = 10;

    /// Global strip brightness outside celebrations
    pub const DEFAULT_BRIGHTNESS: u8 = 150;

    /// Global strip brightness during celebrations
    pub const CELEBRATION_BRIGHTNESS: u8 = 255;

    /// Lowest brightness the breathing effect dims to
    pub const BREATHING_MIN_BRIGHTNESS: u8 = 20;

    /// Breathing brightness change per frame
    pub const BREATHING_STEP: u8 = 2;

    /// Frame interval of the ambient color and rainbow waves in milliseconds
    pub const WAVE_FRAME_MS: u64 = 50;

    /// Frame interval of the breathing effect in milliseconds
    pub const BREATHING_FRAME_MS: u64 = 20;

    /// Frame interval of the goal celebration in milliseconds
    pub const GOAL_CELEBRATION_FRAME_MS: u64 = 30;

    /// Frame interval of the game win celebration in milliseconds
    pub const GAME_WIN_CELEBRATION_FRAME_MS: u64 = 20;

    /// Width in pixels of one travelling wave
    pub const WAVE_WIDTH: usize = 20;

    /// Goal celebration duration in milliseconds
    pub const GOAL_CELEBRATION_MS: u64 = 3000;

    /// Game win celebration duration in milliseconds
    pub const GAME_WIN_CELEBRATION_MS: u64 = 10_000;

    /// Team A = yellow
    pub const TEAM_A_COLOR: RGB8 = RGB8 { r: 255, g: 255, b: 0 };

    /// Team B = orange
    pub const TEAM_B_COLOR: RGB8 = RGB8 { r: 255, g: 165, b: 0 };

    /// Color of the ambient color wave until changed at runtime
    pub const DEFAULT_WAVE_COLOR: RGB8 = RGB8 { r: 255, g: 0, b: 0 };

    /// Polling loop period of the firmware in milliseconds
    pub const LOOP_TICK_MS: u64 = 5;
}

/// Error types for the scoreboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    /// A goal sensor line could not be read
    SensorError,
    /// The LED strip rejected a frame
    LedError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_matches_manifest() {
        let manifest = include_str!("../Cargo.toml");
        let package_line = std::format!("version = \"{}\"", VERSION);
        assert!(manifest.lines().any(|line| line.trim() == package_line));
    }
}
