//! Desktop signal demo with mock hardware.
//!
//! Runs a [`DccStation`] on mock pins and a mock timer, queues a few
//! commands, fires the "interrupt" by hand, and feeds every programmed timer
//! period through the reference decoder to show what a locomotive would see.
//!
//! # Usage
//!
//! ```sh
//! cargo run --example desktop_signal
//! ```

use rs_dcc::hal::{MockPin, MockTimer};
use rs_dcc::queue::QueueStore;
use rs_dcc::{
    Address, DccCommand, DccConfig, DccStation, Direction, PacketDecoder, QueueTier,
};

/// Interrupts to simulate (roughly 0.15 s of track time).
const TICKS: usize = 2_000;

fn main() -> anyhow::Result<()> {
    println!("=================================");
    println!("  rs-dcc Desktop Signal");
    println!("=================================");
    println!();

    let config = DccConfig::default();
    let mut store: QueueStore = QueueStore::new();
    let (mut sender, scheduler) = store.split();

    let (pin_a, pin_b) = MockPin::pair(config.pins.pin_a, config.pins.pin_b);
    let track = pin_a.probe();
    let timer = MockTimer::new();
    let timer_log = timer.probe();

    let mut station = DccStation::new(pin_a, pin_b, scheduler, timer, config)?;

    let loco = Address::new(3)?;
    sender.send(DccCommand::reset().with_repeats(2))?;
    sender.send(DccCommand::speed_128(loco, Direction::Forward, 40)?)?;
    sender.send(DccCommand::function_group_one(loco, true, [true, false, false, false]))?;
    sender.send(DccCommand::accessory(5, 1, true, true)?)?;
    sender.send(DccCommand::emergency_stop(loco))?;

    println!(
        "Queued: {} priority, {} standard",
        sender.pending(QueueTier::Priority),
        sender.pending(QueueTier::Standard)
    );

    station.start()?;
    for _ in 0..TICKS {
        station.on_interrupt()?;
    }
    station.stop()?;

    // periods()[0] is the arm delay, the rest are half-bits
    let periods = timer_log.periods();
    let mut decoder = PacketDecoder::new();
    let packets = decoder.decode(periods.iter().skip(1).copied());

    println!();
    println!("Decoded {} packets:", packets.len());
    for packet in &packets {
        let kind = match packet.to_command() {
            Ok(cmd) if cmd.is_idle() => "idle",
            Ok(cmd) if cmd.is_emergency_stop() => "e-stop",
            Ok(cmd) if cmd == DccCommand::reset() => "reset",
            Ok(_) => "command",
            Err(_) => "invalid",
        };
        println!("  {:02X?} check {:02X}  ({})", packet.payload(), packet.checksum(), kind);
    }

    let tx = station.transmitter();
    println!();
    println!("Frames sent:       {}", tx.packets_sent());
    println!("Commands finished: {}", tx.commands_completed());
    println!("Idle fills:        {}", tx.source().idle_served());
    println!("Checksum errors:   {}", decoder.checksum_errors());
    println!("Pin overlap seen:  {}", track.overlap_seen());

    Ok(())
}
