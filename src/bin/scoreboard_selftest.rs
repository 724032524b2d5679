//! On-device scoreboard self test
//!
//! Plays a scripted game with synthetic timestamps: confirms the goal
//! debounce, counts a full game to the win and checks the reset afterwards.
//! Celebration frames are pushed to the real strip along the way.

#![no_std]
#![no_main]

use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Input, InputConfig, Pull};
use esp_hal::rmt::Rmt;
use esp_hal::time::Rate;
use esp_hal_smartled::{SmartLedsAdapter, smartLedBuffer};
use esp_println::println;

use scoreboard_rs::config;
use scoreboard_rs::effects::{Effect, EffectScheduler};
use scoreboard_rs::game_state::{Action, GamePhase, GameTracker, Team};
use scoreboard_rs::goal_detector::GoalDetector;

esp_bootloader_esp_idf::esp_app_desc!();

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    println!("❌ Self test failed: {}", info);
    loop {}
}

/// Hold the beam of `team` broken until one goal is confirmed.
/// Returns the time of the goal.
fn break_beam<A, B>(detector: &mut GoalDetector<A, B>, team: Team, start_ms: u64) -> u64
where
    A: embedded_hal::digital::InputPin,
    B: embedded_hal::digital::InputPin,
{
    let mut now = start_ms;
    loop {
        let events = detector.sample(now, team == Team::A, team == Team::B);
        if let Some(event) = events.first() {
            assert_eq!(event.team, team);
            return now;
        }
        now += config::SENSOR_SAMPLE_INTERVAL_MS;
        assert!(now - start_ms < 1000, "goal never confirmed");
    }
}

/// Let both beams stay clear long enough to re-arm the sensors
fn clear_beams<A, B>(detector: &mut GoalDetector<A, B>, start_ms: u64) -> u64
where
    A: embedded_hal::digital::InputPin,
    B: embedded_hal::digital::InputPin,
{
    let end = start_ms + config::GOAL_LATCH_CLEAR_MS + 100;
    let mut now = start_ms;
    while now <= end {
        assert!(detector.sample(now, false, false).is_empty());
        now += config::SENSOR_SAMPLE_INTERVAL_MS;
    }
    now
}

#[esp_hal::main]
fn main() -> ! {
    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    println!("=== Scoreboard self test ===");

    let sensor_config = InputConfig::default().with_pull(Pull::Up);
    let mut detector = GoalDetector::new(
        Input::new(peripherals.GPIO18, sensor_config),
        Input::new(peripherals.GPIO19, sensor_config),
    );
    let mut tracker = GameTracker::new();
    let mut scheduler = EffectScheduler::new(0x5C0E_B0A2);

    let rmt = match Rmt::new(peripherals.RMT, Rate::from_mhz(80)) {
        Ok(rmt) => rmt,
        Err(e) => panic!("RMT initialization failed: {:?}", e),
    };
    let mut leds = SmartLedsAdapter::new(
        rmt.channel0,
        peripherals.GPIO2,
        smartLedBuffer!(config::NUM_LEDS),
    );

    println!("\n1. Initial state");
    assert_eq!(tracker.phase(), GamePhase::Active);
    assert_eq!(tracker.score(), (0, 0));
    assert_eq!(scheduler.current_effect(), Effect::Off);
    println!("✅ Active game at 0-0, strip off");

    println!("\n2. Goal debounce");
    let mut now = 1000;
    for _ in 0..config::GOAL_TRIGGER_THRESHOLD - 1 {
        assert!(detector.sample(now, true, false).is_empty());
        now += config::SENSOR_SAMPLE_INTERVAL_MS;
    }
    assert!(detector.sample(now, false, false).is_empty());
    assert_eq!(detector.channel(Team::A).consecutive_triggers(), 0);
    println!("✅ Short beam break ignored");

    let goal_at = break_beam(&mut detector, Team::A, now + config::SENSOR_SAMPLE_INTERVAL_MS);
    assert!(detector.channel(Team::A).is_latched());
    assert_eq!(
        tracker.on_goal_scored(Team::A),
        Some(Action::CelebrateGoal(Team::A))
    );
    println!("✅ Goal confirmed at {} ms, score {:?}", goal_at, tracker.score());

    println!("\n3. Goal celebration");
    scheduler.set_effect(Effect::FullWhite);
    assert!(scheduler.trigger_goal_celebration(Team::A, goal_at));
    let mut t = goal_at;
    while scheduler.render(t).is_none() {
        if let Err(e) = scheduler.strip_mut().flush(&mut leds) {
            println!("⚠️ Frame dropped: {:?}", e);
        }
        t += config::LOOP_TICK_MS;
    }
    assert_eq!(scheduler.current_effect(), Effect::FullWhite);
    println!("✅ Celebration ended after {} ms", t - goal_at);

    println!("\n4. Play to the win");
    now = clear_beams(&mut detector, t);
    for _ in 1..config::POINTS_TO_WIN - 1 {
        now = break_beam(&mut detector, Team::A, now);
        assert!(tracker.on_goal_scored(Team::A).is_some());
        now = clear_beams(&mut detector, now);
    }
    assert_eq!(tracker.score(), (9, 0));
    now = break_beam(&mut detector, Team::A, now);
    assert_eq!(
        tracker.on_goal_scored(Team::A),
        Some(Action::CelebrateGameWin(Team::A))
    );
    assert_eq!(tracker.phase(), GamePhase::Won(Team::A));
    println!("✅ Team {} won {:?}", Team::A.label(), tracker.score());

    println!("\n5. Goals after the win are discarded");
    now = clear_beams(&mut detector, now);
    now = break_beam(&mut detector, Team::B, now);
    assert_eq!(tracker.on_goal_scored(Team::B), None);
    assert_eq!(tracker.score(), (10, 0));
    println!("✅ Score unchanged while won");

    println!("\n6. Win celebration and new game");
    assert!(scheduler.trigger_game_win_celebration(Team::A, now));
    let mut t = now;
    while scheduler.render(t).is_none() {
        if let Err(e) = scheduler.strip_mut().flush(&mut leds) {
            println!("⚠️ Frame dropped: {:?}", e);
        }
        t += config::LOOP_TICK_MS;
    }
    assert!(t - now >= config::GAME_WIN_CELEBRATION_MS);
    assert_eq!(tracker.on_celebration_end(), Action::ResetGoalDetection);
    detector.reset();
    assert_eq!(tracker.phase(), GamePhase::Active);
    assert_eq!(tracker.score(), (0, 0));
    assert!(!detector.channel(Team::A).is_latched());
    assert!(!detector.channel(Team::B).is_latched());
    println!("✅ New game started at 0-0");

    scheduler.set_effect(Effect::Off);
    let _ = scheduler.strip_mut().flush(&mut leds);

    println!("\n=== All self tests passed ===");
    loop {}
}
