//! Polling loop body
//!
//! One [`Scoreboard::tick`] per loop iteration: sample the goal sensors,
//! update the game, pick the ambient effect, render, flush. All steps see
//! the same `now`.

use crate::BoardError;
use crate::effects::{CelebrationEnded, CelebrationKind, Effect, EffectScheduler};
use crate::game_state::{Action, GamePhase, GameTracker, Team};
use crate::goal_detector::GoalDetector;
use embedded_hal::digital::InputPin;
use log::info;
use smart_leds::{RGB8, SmartLedsWrite};

/// Ambient effect for a game phase when nothing is being celebrated
pub fn ambient_effect(phase: GamePhase) -> Effect {
    match phase {
        GamePhase::Active => Effect::FullWhite,
        GamePhase::Won(_) | GamePhase::Celebrating => Effect::Off,
    }
}

/// Goal detector, game tracker and effect scheduler wired together
pub struct Scoreboard<A, B> {
    detector: GoalDetector<A, B>,
    tracker: GameTracker,
    scheduler: EffectScheduler,
    pending_win: Option<Team>,
}

impl<A, B> Scoreboard<A, B>
where
    A: InputPin,
    B: InputPin,
{
    /// `seed` feeds the celebration sparkles
    pub fn new(sensor_a: A, sensor_b: B, seed: u64) -> Self {
        Self {
            detector: GoalDetector::new(sensor_a, sensor_b),
            tracker: GameTracker::new(),
            scheduler: EffectScheduler::new(seed),
            pending_win: None,
        }
    }

    pub fn detector(&self) -> &GoalDetector<A, B> {
        &self.detector
    }

    pub fn tracker(&self) -> &GameTracker {
        &self.tracker
    }

    pub fn scheduler(&self) -> &EffectScheduler {
        &self.scheduler
    }

    /// Begin the first game with the strip dark
    pub fn start(&mut self, now_ms: u64) {
        info!("[MAIN] Table soccer ready for {}-point games!", crate::config::POINTS_TO_WIN);
        self.scheduler.set_effect(Effect::Off);
        let action = self.tracker.start_new_game();
        self.execute(action, now_ms);
    }

    /// Run one loop iteration and push the frame, if any, to `leds`
    pub fn tick<W>(&mut self, now_ms: u64, leds: &mut W) -> Result<(), BoardError>
    where
        W: SmartLedsWrite<Color = RGB8>,
        W::Error: core::fmt::Debug,
    {
        for event in self.detector.poll(now_ms) {
            if let Some(action) = self.tracker.on_goal_scored(event.team) {
                self.execute(action, now_ms);
            }
        }

        if !self.scheduler.is_celebrating() {
            if let Some(phase) = self.tracker.take_phase_change() {
                self.scheduler.set_effect(ambient_effect(phase));
            }
        }

        if let Some(ended) = self.scheduler.render(now_ms) {
            self.on_celebration_ended(ended, now_ms);
            // a queued celebration takes over this frame
            if self.scheduler.is_celebrating() {
                self.scheduler.render(now_ms);
            }
        }

        self.scheduler.strip_mut().flush(leds).map(|_| ())
    }

    fn on_celebration_ended(&mut self, ended: CelebrationEnded, now_ms: u64) {
        match ended.kind {
            CelebrationKind::GameWin => {
                let action = self.tracker.on_celebration_end();
                self.execute(action, now_ms);
            }
            CelebrationKind::Goal => {
                if let Some(team) = self.pending_win.take() {
                    self.execute(Action::CelebrateGameWin(team), now_ms);
                }
            }
        }
    }

    fn execute(&mut self, action: Action, now_ms: u64) {
        match action {
            Action::CelebrateGoal(team) => {
                self.scheduler.trigger_goal_celebration(team, now_ms);
            }
            Action::CelebrateGameWin(team) => {
                // a goal celebration still running hands over when it ends
                if !self.scheduler.trigger_game_win_celebration(team, now_ms) {
                    info!("[MAIN] Game win celebration queued behind running celebration");
                    self.pending_win = Some(team);
                }
            }
            Action::ResetGoalDetection => {
                self.detector.reset();
                self.pending_win = None;
            }
        }
    }
}
