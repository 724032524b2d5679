//! Game state module
//!
//! Keeps the score of both teams and the phase of the current game. The
//! tracker never touches the LED strip or the sensors itself: every method
//! that needs something done elsewhere returns an [`Action`] for the polling
//! loop to execute.

use crate::config;
use log::{info, warn};
use smart_leds::RGB8;

/// The two sides of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Team {
    /// Goal 1, yellow
    A,
    /// Goal 2, orange
    B,
}

impl Team {
    /// Celebration color of the team
    pub const fn color(self) -> RGB8 {
        match self {
            Team::A => config::TEAM_A_COLOR,
            Team::B => config::TEAM_B_COLOR,
        }
    }

    /// Human readable name used in status lines
    pub const fn label(self) -> &'static str {
        match self {
            Team::A => "A (YELLOW)",
            Team::B => "B (ORANGE)",
        }
    }
}

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Goals are counted
    Active,
    /// The team reached the winning score; goals are discarded until the
    /// win celebration ends
    Won(Team),
    /// Scoring is paused without a winner. The tracker never enters this
    /// phase on its own.
    Celebrating,
}

/// Work the tracker asks the polling loop to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Start the short goal celebration in the team color
    CelebrateGoal(Team),
    /// Start the long game win celebration in the team color
    CelebrateGameWin(Team),
    /// Clear all sensor latches and counters
    ResetGoalDetection,
}

/// Score and phase of the running game
pub struct GameTracker {
    score_a: u8,
    score_b: u8,
    phase: GamePhase,
    reported_phase: Option<GamePhase>,
    games_started: u32,
}

impl Default for GameTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl GameTracker {
    /// Create a tracker with an active 0-0 game. The first call to
    /// [`take_phase_change`](Self::take_phase_change) reports `Active`.
    pub fn new() -> Self {
        Self {
            score_a: 0,
            score_b: 0,
            phase: GamePhase::Active,
            reported_phase: None,
            games_started: 0,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == GamePhase::Active
    }

    /// Current score as `(team A, team B)`
    pub fn score(&self) -> (u8, u8) {
        (self.score_a, self.score_b)
    }

    pub fn score_of(&self, team: Team) -> u8 {
        match team {
            Team::A => self.score_a,
            Team::B => self.score_b,
        }
    }

    /// Number of games started since boot
    pub fn games_started(&self) -> u32 {
        self.games_started
    }

    /// Reset the score and make the game active.
    ///
    /// Safe to call at any time and any number of times. The returned action
    /// must be executed so stale sensor state cannot count into the new game.
    #[must_use]
    pub fn start_new_game(&mut self) -> Action {
        self.games_started = self.games_started.wrapping_add(1);
        info!(
            "[GAME] Starting game #{}! First to {} points wins!",
            self.games_started,
            config::POINTS_TO_WIN
        );
        self.score_a = 0;
        self.score_b = 0;
        self.transition_to(GamePhase::Active);
        self.log_status();
        Action::ResetGoalDetection
    }

    /// Count a goal for `team`.
    ///
    /// Goals outside an active game are discarded and logged. Otherwise the
    /// goal is counted and the returned action is the celebration to run:
    /// a game win exactly once when the team reaches the winning score, a
    /// goal celebration otherwise.
    pub fn on_goal_scored(&mut self, team: Team) -> Option<Action> {
        if !self.is_active() {
            warn!(
                "[GAME] Goal for team {} discarded: game is not active ({:?})",
                team.label(),
                self.phase
            );
            return None;
        }

        let score = match team {
            Team::A => &mut self.score_a,
            Team::B => &mut self.score_b,
        };
        *score = score.saturating_add(1);

        info!("[GAME] GOAL! Team {} scored", team.label());
        self.log_score();

        if self.score_of(team) >= config::POINTS_TO_WIN {
            self.transition_to(GamePhase::Won(team));
            info!("[GAME] Team {} wins the game!", team.label());
            info!("[GAME] New game will start automatically after the celebration");
            Some(Action::CelebrateGameWin(team))
        } else {
            Some(Action::CelebrateGoal(team))
        }
    }

    /// The win celebration has finished: start the next game.
    ///
    /// This is the only way out of a won phase.
    #[must_use]
    pub fn on_celebration_end(&mut self) -> Action {
        info!("[GAME] Game win celebration ended - starting new game");
        self.start_new_game()
    }

    /// Edge-triggered phase signal.
    ///
    /// Returns the current phase once after every change (and once after
    /// construction), `None` otherwise.
    pub fn take_phase_change(&mut self) -> Option<GamePhase> {
        if self.reported_phase == Some(self.phase) {
            return None;
        }
        self.reported_phase = Some(self.phase);
        Some(self.phase)
    }

    pub fn log_score(&self) {
        info!(
            "[GAME] Current Score - Team A: {} | Team B: {}",
            self.score_a, self.score_b
        );
    }

    pub fn log_status(&self) {
        info!("[GAME] Target: {} points to win", config::POINTS_TO_WIN);
        self.log_score();
        match self.phase {
            GamePhase::Active => info!("[GAME] Game is ACTIVE - play on!"),
            GamePhase::Won(team) => info!("[GAME] Team {} has WON the game!", team.label()),
            GamePhase::Celebrating => info!("[GAME] Celebration in progress..."),
        }
    }

    fn transition_to(&mut self, new_phase: GamePhase) {
        if new_phase != self.phase {
            info!("[GAME] Phase {:?} -> {:?}", self.phase, new_phase);
            self.phase = new_phase;
        }
    }
}
