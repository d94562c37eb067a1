//! ESP32-C3 SuperMini DCC command station.
//!
//! This is the main entry point for the physical hardware. It:
//! - Drives the DCC signal on GPIO2/3 into an H-bridge
//! - Ticks the signal from the timer 0 alarm interrupt
//! - Runs a short demo sequence for locomotive 3 from the foreground
//!
//! # Build
//!
//! ```bash
//! cargo build --release --features esp32 --bin esp32_main
//! espflash flash --monitor target/riscv32imc-esp-espidf/release/esp32_main
//! ```

use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::log::EspLogger;
use rs_dcc::hal::esp32::{pins, Esp32SignalTimer, Esp32TrackPin};
use rs_dcc::queue::QueueStore;
use rs_dcc::{Address, CommandSender, DccCommand, DccConfig, DccStation, Direction, PinConfig};
use std::thread;
use std::time::Duration;

/// Delay before retrying a command the queue rejected.
const RETRY_MS: u64 = 10;

/// Resets sent at power-on so decoders start from a known state.
const POWER_ON_RESETS: usize = 10;

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    EspLogger::initialize_default();

    log::info!("rs-dcc SuperMini command station");

    let config = DccConfig::default().with_pins(PinConfig::new(pins::DCC_A, pins::DCC_B));
    config.validate()?;

    let peripherals = Peripherals::take()?;

    // =========================================================================
    // Track output (GPIO2/3) and half-bit timer
    // =========================================================================
    let pin_a = Esp32TrackPin::new(peripherals.pins.gpio2)?;
    let pin_b = Esp32TrackPin::new(peripherals.pins.gpio3)?;
    let mut timer = Esp32SignalTimer::new(peripherals.timer00)?;
    log::info!("[OK] Track pins GPIO{}/GPIO{} low", pins::DCC_A, pins::DCC_B);

    // Queues outlive both halves for the rest of the program
    let store: &'static mut QueueStore = Box::leak(Box::new(QueueStore::new()));
    let (mut sender, scheduler) = store.split();

    // =========================================================================
    // Signal: the station moves into the alarm ISR, one tick per alarm
    // =========================================================================
    let mut station = DccStation::new(pin_a, pin_b, scheduler, timer.alarm(), config)?;
    station.start()?;
    timer.on_alarm(move || {
        // Reloading the alarm cannot fail in the ISR; pin faults are counted
        let _ = station.on_interrupt();
    })?;
    log::info!("[OK] DCC signal running");

    // =========================================================================
    // Foreground: power-on resets, then a demo run for loco 3
    // =========================================================================
    for _ in 0..POWER_ON_RESETS {
        send(&mut sender, DccCommand::reset());
    }

    let loco = Address::new(3)?;
    send(&mut sender, DccCommand::function_group_one(loco, true, [false; 4]));

    loop {
        for step in (0..=60).step_by(5) {
            send(&mut sender, DccCommand::speed_128(loco, Direction::Forward, step)?);
            thread::sleep(Duration::from_millis(250));
        }
        thread::sleep(Duration::from_secs(3));
        send(&mut sender, DccCommand::emergency_stop(loco));
        thread::sleep(Duration::from_secs(2));
        send(&mut sender, DccCommand::speed_128(loco, Direction::Reverse, 20)?);
        thread::sleep(Duration::from_secs(3));
        send(&mut sender, DccCommand::speed_128(loco, Direction::Reverse, 0)?);
        thread::sleep(Duration::from_secs(2));
    }
}

/// Queues `cmd`, waiting for room if its tier is full.
fn send(sender: &mut CommandSender<'static>, mut cmd: DccCommand) {
    while let Err(full) = sender.send(cmd) {
        cmd = full.into_command();
        thread::sleep(Duration::from_millis(RETRY_MS));
    }
}
