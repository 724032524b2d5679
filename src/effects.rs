//! Effect scheduler
//!
//! Owns the strip and decides what it shows. Ambient effects run until
//! replaced; celebrations take over the strip for a fixed time and then hand
//! it back to the ambient effect that was showing before.

use crate::config;
use crate::game_state::Team;
use crate::led_control::{LedStrip, SECTIONS, USED_LEDS, WHITE, scale_color, wave_intensity};
use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use smart_leds::RGB8;
use smart_leds::hsv::{Hsv, hsv2rgb};

/// Wave phase wraps back to zero past this value
const WAVE_PHASE_LIMIT: u32 = 300;

/// Per-section phase offsets so the four runs do not move in lockstep
const COLOR_WAVE_SECTION_OFFSET: u32 = 30;
const RAINBOW_SECTION_OFFSET: u32 = 20;

/// Everything the strip can show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Off,
    FullWhite,
    ColorWave,
    RainbowWave,
    Breathing,
    GoalCelebration(Team),
    GameWinCelebration(Team),
}

impl Effect {
    pub fn is_celebration(self) -> bool {
        matches!(
            self,
            Effect::GoalCelebration(_) | Effect::GameWinCelebration(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CelebrationKind {
    Goal,
    GameWin,
}

/// Timing and look of a celebration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CelebrationProfile {
    pub duration_ms: u64,
    pub frame_interval_ms: u64,
    /// Wave phase advance per frame
    pub phase_step: u32,
    /// Number of waves running around the strip at once
    pub wave_count: u32,
    /// Phase distance between consecutive waves
    pub wave_spacing: u32,
    /// Chance in percent of one white sparkle per frame
    pub sparkle_percent: u8,
}

impl CelebrationKind {
    pub const fn profile(self) -> CelebrationProfile {
        match self {
            CelebrationKind::Goal => CelebrationProfile {
                duration_ms: config::GOAL_CELEBRATION_MS,
                frame_interval_ms: config::GOAL_CELEBRATION_FRAME_MS,
                phase_step: 3,
                wave_count: 3,
                wave_spacing: 50,
                sparkle_percent: 30,
            },
            CelebrationKind::GameWin => CelebrationProfile {
                duration_ms: config::GAME_WIN_CELEBRATION_MS,
                frame_interval_ms: config::GAME_WIN_CELEBRATION_FRAME_MS,
                phase_step: 4,
                wave_count: 4,
                wave_spacing: 75,
                sparkle_percent: 50,
            },
        }
    }

    fn effect(self, team: Team) -> Effect {
        match self {
            CelebrationKind::Goal => Effect::GoalCelebration(team),
            CelebrationKind::GameWin => Effect::GameWinCelebration(team),
        }
    }
}

/// Reported by [`EffectScheduler::render`] when a celebration finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CelebrationEnded {
    pub kind: CelebrationKind,
    pub team: Team,
}

#[derive(Debug, Clone, Copy)]
struct Celebration {
    kind: CelebrationKind,
    team: Team,
    color: RGB8,
    started_ms: u64,
    profile: CelebrationProfile,
}

/// Logical LED state and the frame scheduler driving it
pub struct EffectScheduler {
    strip: LedStrip,
    current: Effect,
    previous: Effect,
    wave_color: RGB8,
    normal_brightness: u8,
    wave_phase: u32,
    breathing_level: u8,
    breathing_rising: bool,
    celebration: Option<Celebration>,
    last_frame_ms: Option<u64>,
    rng: SmallRng,
}

impl EffectScheduler {
    /// Create a dark scheduler; `seed` drives the celebration sparkles
    pub fn new(seed: u64) -> Self {
        info!(
            "[LED] Strip: {} LEDs, sections 72 + 42 + 72 + 42 + {} unused",
            config::NUM_LEDS,
            config::NUM_LEDS - USED_LEDS
        );
        let mut strip = LedStrip::new();
        strip.show();
        Self {
            strip,
            current: Effect::Off,
            previous: Effect::FullWhite,
            wave_color: config::DEFAULT_WAVE_COLOR,
            normal_brightness: config::DEFAULT_BRIGHTNESS,
            wave_phase: 0,
            breathing_level: 0,
            breathing_rising: true,
            celebration: None,
            last_frame_ms: None,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn strip(&self) -> &LedStrip {
        &self.strip
    }

    pub fn strip_mut(&mut self) -> &mut LedStrip {
        &mut self.strip
    }

    pub fn current_effect(&self) -> Effect {
        self.current
    }

    /// The effect that was showing before the current one
    pub fn previous_effect(&self) -> Effect {
        self.previous
    }

    pub fn is_celebrating(&self) -> bool {
        self.celebration.is_some()
    }

    pub fn wave_phase(&self) -> u32 {
        self.wave_phase
    }

    /// Switch the ambient effect.
    ///
    /// Ignored while a celebration is running, and for celebration variants
    /// (those start through the trigger methods). Returns whether the effect
    /// changed.
    pub fn set_effect(&mut self, effect: Effect) -> bool {
        if effect.is_celebration() {
            warn!("[LED] {:?} can only be started as a celebration", effect);
            return false;
        }
        if self.is_celebrating() || effect == self.current {
            return false;
        }

        info!("[LED] Effect changed to: {:?}", effect);
        self.previous = self.current;
        self.current = effect;
        self.enter_current();
        true
    }

    pub fn set_wave_color(&mut self, color: RGB8) {
        info!(
            "[LED] Wave color set to RGB({}, {}, {})",
            color.r, color.g, color.b
        );
        self.wave_color = color;
    }

    /// Set the brightness used outside celebrations and breathing
    pub fn set_brightness(&mut self, level: u8) {
        info!("[LED] Brightness set to: {}", level);
        self.normal_brightness = level;
        if !self.is_celebrating() && self.current != Effect::Breathing {
            self.strip.set_brightness(level);
        }
    }

    pub fn trigger_goal_celebration(&mut self, team: Team, now_ms: u64) -> bool {
        self.start_celebration(CelebrationKind::Goal, team, now_ms)
    }

    pub fn trigger_game_win_celebration(&mut self, team: Team, now_ms: u64) -> bool {
        self.start_celebration(CelebrationKind::GameWin, team, now_ms)
    }

    /// Stop the running celebration and restore the effect it interrupted
    pub fn end_celebration(&mut self) -> Option<CelebrationEnded> {
        let celebration = self.celebration.take()?;
        info!(
            "[LED] {:?} celebration for team {} ended",
            celebration.kind,
            celebration.team.label()
        );

        self.current = self.previous;
        self.enter_current();

        Some(CelebrationEnded {
            kind: celebration.kind,
            team: celebration.team,
        })
    }

    /// Advance the strip to `now_ms`.
    ///
    /// An expired celebration is ended first and reported; the restored
    /// effect is then rendered in the same call.
    pub fn render(&mut self, now_ms: u64) -> Option<CelebrationEnded> {
        let mut ended = None;

        if let Some(celebration) = self.celebration {
            if now_ms.saturating_sub(celebration.started_ms) >= celebration.profile.duration_ms {
                ended = self.end_celebration();
            } else {
                if self.frame_due(now_ms, celebration.profile.frame_interval_ms) {
                    self.draw_celebration(&celebration);
                }
                return None;
            }
        }

        match self.current {
            Effect::ColorWave => {
                if self.frame_due(now_ms, config::WAVE_FRAME_MS) {
                    self.draw_color_wave();
                }
            }
            Effect::RainbowWave => {
                if self.frame_due(now_ms, config::WAVE_FRAME_MS) {
                    self.draw_rainbow_wave();
                }
            }
            Effect::Breathing => {
                if self.frame_due(now_ms, config::BREATHING_FRAME_MS) {
                    self.draw_breathing();
                }
            }
            // static, drawn on entry
            Effect::Off | Effect::FullWhite => {}
            Effect::GoalCelebration(_) | Effect::GameWinCelebration(_) => {}
        }

        ended
    }

    fn start_celebration(&mut self, kind: CelebrationKind, team: Team, now_ms: u64) -> bool {
        if let Some(running) = &self.celebration {
            debug!(
                "[LED] {:?} celebration ignored, {:?} celebration still running",
                kind, running.kind
            );
            return false;
        }

        info!(
            "[LED] Starting {:?} celebration for team {}",
            kind,
            team.label()
        );
        let profile = kind.profile();
        self.previous = self.current;
        self.current = kind.effect(team);
        self.celebration = Some(Celebration {
            kind,
            team,
            color: team.color(),
            started_ms: now_ms,
            profile,
        });
        self.wave_phase = 0;
        self.last_frame_ms = None;
        self.strip.set_brightness(config::CELEBRATION_BRIGHTNESS);
        true
    }

    /// Clear the strip and reset the state of the current effect
    fn enter_current(&mut self) {
        self.strip.clear();
        self.last_frame_ms = None;
        self.strip.set_brightness(self.normal_brightness);

        match self.current {
            Effect::FullWhite => self.strip.fill_sections(WHITE),
            Effect::ColorWave | Effect::RainbowWave => self.wave_phase = 0,
            Effect::Breathing => {
                self.breathing_level = 0;
                self.breathing_rising = true;
            }
            Effect::Off => {}
            Effect::GoalCelebration(_) | Effect::GameWinCelebration(_) => {}
        }
        self.strip.show();
    }

    fn frame_due(&mut self, now_ms: u64, interval_ms: u64) -> bool {
        let due = self
            .last_frame_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= interval_ms);
        if due {
            self.last_frame_ms = Some(now_ms);
        }
        due
    }

    fn advance_ambient_phase(&mut self) {
        self.wave_phase += 1;
        if self.wave_phase > WAVE_PHASE_LIMIT {
            self.wave_phase = 0;
        }
    }

    fn draw_color_wave(&mut self) {
        self.strip.clear();
        for (index, section) in SECTIONS.iter().enumerate() {
            let center = section_wave_center(self.wave_phase, index, COLOR_WAVE_SECTION_OFFSET, section.len);
            for offset in 0..section.len {
                let intensity = wave_intensity(offset, center, config::WAVE_WIDTH);
                if intensity > 0 {
                    self.strip
                        .set_pixel(section.start + offset, scale_color(self.wave_color, intensity));
                }
            }
        }
        self.advance_ambient_phase();
        self.strip.show();
    }

    fn draw_rainbow_wave(&mut self) {
        self.strip.clear();
        for (index, section) in SECTIONS.iter().enumerate() {
            let center = section_wave_center(self.wave_phase, index, RAINBOW_SECTION_OFFSET, section.len);
            for offset in 0..section.len {
                let intensity = wave_intensity(offset, center, config::WAVE_WIDTH);
                if intensity > 0 {
                    let pixel = section.start + offset;
                    let hue = ((pixel * 255 / config::NUM_LEDS) as u32 + self.wave_phase * 2) % 255;
                    let color = hsv2rgb(Hsv {
                        hue: hue as u8,
                        sat: 255,
                        val: intensity,
                    });
                    self.strip.set_pixel(pixel, color);
                }
            }
        }
        self.advance_ambient_phase();
        self.strip.show();
    }

    fn draw_breathing(&mut self) {
        self.strip.fill_sections(WHITE);

        if self.breathing_rising {
            self.breathing_level = self.breathing_level.saturating_add(config::BREATHING_STEP);
            if self.breathing_level == u8::MAX {
                self.breathing_rising = false;
            }
        } else {
            self.breathing_level = self
                .breathing_level
                .saturating_sub(config::BREATHING_STEP)
                .max(config::BREATHING_MIN_BRIGHTNESS);
            if self.breathing_level == config::BREATHING_MIN_BRIGHTNESS {
                self.breathing_rising = true;
            }
        }

        self.strip.set_brightness(self.breathing_level);
        self.strip.show();
    }

    fn draw_celebration(&mut self, celebration: &Celebration) {
        let profile = &celebration.profile;
        self.strip.clear();

        for wave in 0..profile.wave_count {
            let phase = (self.wave_phase + wave * profile.wave_spacing) % config::NUM_LEDS as u32;
            for (index, section) in SECTIONS.iter().enumerate() {
                let center = section_wave_center(phase, index, COLOR_WAVE_SECTION_OFFSET, section.len);
                for offset in 0..section.len {
                    let intensity = wave_intensity(offset, center, config::WAVE_WIDTH);
                    if intensity > 0 {
                        self.strip
                            .overlay_pixel(section.start + offset, scale_color(celebration.color, intensity));
                    }
                }
            }
        }

        if self.rng.gen_range(0..100u8) < profile.sparkle_percent {
            let sparkle = self.rng.gen_range(0..USED_LEDS);
            self.strip.set_pixel(sparkle, WHITE);
        }

        self.wave_phase = self.wave_phase.wrapping_add(profile.phase_step);
        self.strip.show();
    }
}

/// Wave center inside a section for the shared `phase`
fn section_wave_center(phase: u32, section: usize, section_offset: u32, section_len: usize) -> usize {
    let span = (section_len + config::WAVE_WIDTH) as u32;
    ((phase + section as u32 * section_offset) % span) as usize
}
