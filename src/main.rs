#![no_std]
#![no_main]

use embassy_time::{Duration, Instant, Ticker};
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Input, InputConfig, Pull};
use esp_hal::rmt::Rmt;
use esp_hal::rng::Rng;
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use esp_hal_embassy::Executor;
use esp_hal_smartled::{SmartLedsAdapter, smartLedBuffer};
use esp_println::println;
use log::{error, info};
use static_cell::StaticCell;

use scoreboard_rs::config;
use scoreboard_rs::scoreboard::Scoreboard;

esp_bootloader_esp_idf::esp_app_desc!();

/// 24 RMT pulses per pixel plus the end marker
const LED_BUFFER_SIZE: usize = config::NUM_LEDS * 24 + 1;

type LedDriver = SmartLedsAdapter<esp_hal::rmt::Channel<esp_hal::Blocking, 0>, LED_BUFFER_SIZE>;
type Board = Scoreboard<Input<'static>, Input<'static>>;

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    println!("[MAIN] PANIC: {}", info);
    loop {}
}

/// Sensors, game and LEDs in one cooperative loop
#[embassy_executor::task]
async fn game_task(mut board: Board, mut leds: LedDriver) -> ! {
    let mut ticker = Ticker::every(Duration::from_millis(config::LOOP_TICK_MS));

    board.start(Instant::now().as_millis());

    loop {
        if let Err(e) = board.tick(Instant::now().as_millis(), &mut leds) {
            error!("[MAIN] Tick failed: {:?}", e);
        }
        ticker.next().await;
    }
}

#[esp_hal::main]
fn main() -> ! {
    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    esp_println::logger::init_logger(log::LevelFilter::Info);
    info!("[MAIN] Scoreboard v{} booting", scoreboard_rs::VERSION);

    let timer_group0 = TimerGroup::new(peripherals.TIMG0);
    esp_hal_embassy::init(timer_group0.timer0);

    // Beam receivers pull the line low while the beam is broken
    let sensor_config = InputConfig::default().with_pull(Pull::Up);
    let sensor_a = Input::new(peripherals.GPIO18, sensor_config);
    let sensor_b = Input::new(peripherals.GPIO19, sensor_config);
    info!(
        "[MAIN] Goal sensors on GPIO{} and GPIO{}",
        config::GOAL_SENSOR_A_PIN,
        config::GOAL_SENSOR_B_PIN
    );

    let rmt = match Rmt::new(peripherals.RMT, Rate::from_mhz(80)) {
        Ok(rmt) => rmt,
        Err(e) => {
            error!("[LED] Failed to initialize RMT: {:?}", e);
            panic!("RMT initialization failed");
        }
    };
    let leds: LedDriver = SmartLedsAdapter::new(
        rmt.channel0,
        peripherals.GPIO2,
        smartLedBuffer!(config::NUM_LEDS),
    );
    info!(
        "[LED] {} pixel strip on GPIO{}",
        config::NUM_LEDS,
        config::LED_DATA_PIN
    );

    let mut rng = Rng::new(peripherals.RNG);
    let seed = (u64::from(rng.random()) << 32) | u64::from(rng.random());

    let board = Scoreboard::new(sensor_a, sensor_b, seed);

    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        info!("[MAIN] Spawning game task...");
        if let Err(e) = spawner.spawn(game_task(board, leds)) {
            error!("[MAIN] Failed to spawn game task: {:?}", e);
        }
    });
}
