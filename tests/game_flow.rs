//! Full games played through the scoreboard loop with simulated sensors

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin};
use scoreboard_rs::config;
use scoreboard_rs::effects::Effect;
use scoreboard_rs::game_state::{GamePhase, Team};
use scoreboard_rs::led_control::{BLACK, UNUSED, WHITE, scale_color};
use scoreboard_rs::scoreboard::Scoreboard;
use smart_leds::{RGB8, SmartLedsWrite};

/// Beam the test can break from the outside
#[derive(Clone, Default)]
struct Beam(Rc<Cell<bool>>);

impl Beam {
    fn set_broken(&self, broken: bool) {
        self.0.set(broken);
    }
}

impl ErrorType for Beam {
    type Error = Infallible;
}

impl InputPin for Beam {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.get())
    }
}

#[derive(Default)]
struct Frames {
    last: Vec<RGB8>,
    count: usize,
}

impl SmartLedsWrite for Frames {
    type Error = Infallible;
    type Color = RGB8;

    fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        self.last = iterator.into_iter().map(Into::into).collect();
        self.count += 1;
        Ok(())
    }
}

struct Table {
    board: Scoreboard<Beam, Beam>,
    beam_a: Beam,
    beam_b: Beam,
    leds: Frames,
    now: u64,
}

impl Table {
    fn new() -> Self {
        let beam_a = Beam::default();
        let beam_b = Beam::default();
        let mut board = Scoreboard::new(beam_a.clone(), beam_b.clone(), 42);
        board.start(0);
        let mut table = Self {
            board,
            beam_a,
            beam_b,
            leds: Frames::default(),
            now: 0,
        };
        table.tick();
        table
    }

    fn beam(&self, team: Team) -> &Beam {
        match team {
            Team::A => &self.beam_a,
            Team::B => &self.beam_b,
        }
    }

    fn tick(&mut self) {
        self.board.tick(self.now, &mut self.leds).unwrap();
    }

    fn run_for(&mut self, ms: u64) {
        let end = self.now + ms;
        while self.now < end {
            self.now += config::LOOP_TICK_MS;
            self.tick();
        }
    }

    /// Ball passes through the goal: beam broken for `ms`, then clear long
    /// enough for the sensor to re-arm
    fn score(&mut self, team: Team, ms: u64) {
        self.beam(team).set_broken(true);
        self.run_for(ms);
        self.beam(team).set_broken(false);
        self.run_for(config::GOAL_LATCH_CLEAR_MS + 100);
    }
}

#[test]
fn first_frame_lights_sections_white() {
    let table = Table::new();
    assert_eq!(table.board.scheduler().current_effect(), Effect::FullWhite);
    assert_eq!(table.leds.count, 1);
    assert_eq!(table.leds.last.len(), config::NUM_LEDS);
    assert_ne!(table.leds.last[0], BLACK);
    assert!(table.leds.last[UNUSED].iter().all(|p| *p == BLACK));
}

#[test]
fn hundred_ms_break_scores_one_goal() {
    let mut table = Table::new();
    table.score(Team::A, 100);

    let tracker = table.board.tracker();
    assert_eq!(tracker.score(), (1, 0));
    assert_eq!(tracker.phase(), GamePhase::Active);
}

#[test]
fn brief_break_is_not_a_goal() {
    let mut table = Table::new();
    table.score(Team::B, 50);
    assert_eq!(table.board.tracker().score(), (0, 0));
    assert!(!table.board.scheduler().is_celebrating());
}

#[test]
fn ball_resting_in_goal_counts_once() {
    let mut table = Table::new();
    table.score(Team::B, 5000);
    assert_eq!(table.board.tracker().score(), (0, 1));
}

#[test]
fn goal_celebration_runs_then_returns_to_white() {
    let mut table = Table::new();
    table.beam_a.set_broken(true);
    table.run_for(100);
    table.beam_a.set_broken(false);

    assert_eq!(
        table.board.scheduler().current_effect(),
        Effect::GoalCelebration(Team::A)
    );
    table.run_for(config::GOAL_CELEBRATION_MS);
    assert_eq!(table.board.scheduler().current_effect(), Effect::FullWhite);
    assert_eq!(
        table.leds.last[0],
        scale_color(WHITE, config::DEFAULT_BRIGHTNESS)
    );
}

#[test]
fn tenth_goal_wins_and_next_game_starts_after_celebration() {
    let mut table = Table::new();
    for _ in 0..config::POINTS_TO_WIN - 1 {
        table.score(Team::A, 100);
        // goal celebration over before the next goal
        table.run_for(config::GOAL_CELEBRATION_MS);
    }
    assert_eq!(table.board.tracker().score(), (9, 0));

    table.beam_a.set_broken(true);
    table.run_for(100);
    table.beam_a.set_broken(false);

    assert_eq!(table.board.tracker().phase(), GamePhase::Won(Team::A));
    assert_eq!(
        table.board.scheduler().current_effect(),
        Effect::GameWinCelebration(Team::A)
    );
    // yellow waves: red and green in step, no blue
    assert!(
        table.leds.last[..UNUSED.start]
            .iter()
            .any(|p| p.r > 0 && p.r == p.g && p.b == 0)
    );

    // goals during the celebration are discarded
    table.score(Team::B, 100);
    assert_eq!(table.board.tracker().score(), (10, 0));

    table.run_for(config::GAME_WIN_CELEBRATION_MS);
    let tracker = table.board.tracker();
    assert_eq!(tracker.phase(), GamePhase::Active);
    assert_eq!(tracker.score(), (0, 0));
    assert_eq!(tracker.games_started(), 2);
    assert_eq!(table.board.scheduler().current_effect(), Effect::FullWhite);
    assert!(!table.board.detector().channel(Team::A).is_latched());
}

#[test]
fn win_scored_during_goal_celebration_still_celebrates() {
    let mut table = Table::new();
    for _ in 0..config::POINTS_TO_WIN - 2 {
        table.score(Team::B, 100);
    }
    table.run_for(config::GOAL_CELEBRATION_MS);
    assert!(!table.board.scheduler().is_celebrating());

    // ninth goal starts a celebration, tenth lands inside it
    table.score(Team::B, 100);
    table.beam_b.set_broken(true);
    table.run_for(100);
    table.beam_b.set_broken(false);

    assert_eq!(table.board.tracker().score(), (0, 10));
    assert_eq!(table.board.tracker().phase(), GamePhase::Won(Team::B));
    assert_eq!(
        table.board.scheduler().current_effect(),
        Effect::GoalCelebration(Team::B)
    );

    table.run_for(config::GOAL_CELEBRATION_MS);
    assert_eq!(
        table.board.scheduler().current_effect(),
        Effect::GameWinCelebration(Team::B)
    );

    table.run_for(config::GAME_WIN_CELEBRATION_MS);
    assert_eq!(table.board.tracker().phase(), GamePhase::Active);
    assert_eq!(table.board.tracker().score(), (0, 0));
    assert_eq!(table.board.scheduler().current_effect(), Effect::FullWhite);
}

#[test]
fn beam_cleared_for_over_a_second_counts_again() {
    let mut table = Table::new();
    table.score(Team::A, 100);
    table.score(Team::A, 100);
    assert_eq!(table.board.tracker().score(), (2, 0));
}
