//! Edge case and boundary condition tests for packets, timing, and stations

use rs_dcc::config::{MAX_PREAMBLE_BITS, MIN_PREAMBLE_BITS};
use rs_dcc::decoder::PacketDecoder;
use rs_dcc::encoder::HalfBits;
use rs_dcc::hal::{MockPin, MockTimer};
use rs_dcc::queue::QueueStore;
use rs_dcc::{
    Address, DccCommand, DccConfig, DccError, DccStation, Direction, PacketError, PinFault,
    QueueTier, SignalTiming, TimingFault,
};

fn round_trip(cmd: &DccCommand, timing: SignalTiming) -> Vec<u8> {
    let halves = HalfBits::new(cmd, timing, false).map(|(_, us)| us);
    let packets = PacketDecoder::new().decode(halves);
    assert_eq!(packets.len(), 1, "expected one packet for {:02X?}", cmd.payload());
    packets[0].payload().to_vec()
}

// ============================================================================
// Address Boundaries
// ============================================================================

#[test]
fn short_address_boundaries() {
    assert!(Address::new(0).is_err());
    assert_eq!(Address::new(1), Ok(Address::Short(1)));
    assert_eq!(Address::new(127), Ok(Address::Short(127)));
    assert_eq!(Address::new(128), Ok(Address::Long(128)));
}

#[test]
fn long_address_boundaries() {
    assert_eq!(Address::new(10239), Ok(Address::Long(10239)));
    assert_eq!(Address::new(10240), Err(PacketError::InvalidAddress(10240)));
    assert!(Address::long(0).is_err());
    assert!(Address::short(128).is_err());
}

#[test]
fn highest_long_address_round_trips() {
    let cmd = DccCommand::speed_128(Address::Long(10239), Direction::Forward, 1).unwrap();
    assert_eq!(cmd.payload()[0], 0xC0 | 0x27);
    assert_eq!(cmd.payload()[1], 0xFF);
    assert_eq!(round_trip(&cmd, SignalTiming::default()), cmd.payload());
}

// ============================================================================
// Speed Boundaries
// ============================================================================

#[test]
fn speed_128_boundaries() {
    let addr = Address::Short(3);
    assert!(DccCommand::speed_128(addr, Direction::Forward, 126).is_ok());
    assert_eq!(
        DccCommand::speed_128(addr, Direction::Forward, 127),
        Err(PacketError::InvalidSpeed(127))
    );

    let stop = DccCommand::speed_128(addr, Direction::Forward, 0).unwrap();
    assert!(!stop.is_emergency_stop());
    let top = DccCommand::speed_128(addr, Direction::Forward, 126).unwrap();
    assert_eq!(top.data_bytes(), &[0x3F, 0xFF]);
}

#[test]
fn speed_28_boundaries() {
    let addr = Address::Short(3);
    assert!(DccCommand::speed_28(addr, Direction::Reverse, 28).is_ok());
    assert_eq!(
        DccCommand::speed_28(addr, Direction::Reverse, 29),
        Err(PacketError::InvalidSpeed(29))
    );
}

// ============================================================================
// Payload Boundaries
// ============================================================================

#[test]
fn empty_and_oversized_payloads() {
    assert_eq!(DccCommand::new(&[]), Err(PacketError::Empty));
    assert_eq!(DccCommand::new(&[0; 6]), Err(PacketError::TooLong { len: 6 }));
}

#[test]
fn longest_payload_round_trips() {
    let cmd = DccCommand::new(&[0xC4, 0xD2, 0x3F, 0x8A, 0x55]).unwrap();
    assert_eq!(cmd.len(), 6);
    assert_eq!(round_trip(&cmd, SignalTiming::default()), cmd.payload());
}

#[test]
fn single_byte_payload_checksum_equals_byte() {
    let cmd = DccCommand::new(&[0x5A]).unwrap();
    assert_eq!(cmd.checksum(), 0x5A);
    assert_eq!(round_trip(&cmd, SignalTiming::default()), vec![0x5A]);
}

#[test]
fn accessory_address_boundary() {
    assert!(DccCommand::accessory(511, 3, true, true).is_ok());
    assert_eq!(
        DccCommand::accessory(512, 0, false, false),
        Err(PacketError::InvalidAddress(512))
    );
}

#[test]
fn accessory_port_boundary() {
    let top = DccCommand::accessory(5, 3, true, true).unwrap();
    assert_eq!(round_trip(&top, SignalTiming::default()), top.payload());

    // Port 4 would alias port 0 if masked
    assert_eq!(DccCommand::accessory(5, 4, true, true), Err(PacketError::InvalidPort(4)));
    assert_ne!(
        DccCommand::accessory(5, 0, true, true).ok(),
        DccCommand::accessory(5, 4, true, true).ok()
    );
}

#[test]
fn max_repeats_preserved() {
    let cmd = DccCommand::reset().with_repeats(u8::MAX);
    assert_eq!(cmd.repeats(), 255);
    assert_eq!(cmd.payload(), DccCommand::reset().payload());
}

// ============================================================================
// Timing Boundaries
// ============================================================================

#[test]
fn timing_limits_are_inclusive() {
    let base = SignalTiming::default();
    assert!(base.with_one_half_us(55).validate().is_ok());
    assert!(base.with_one_half_us(61).validate().is_ok());
    assert_eq!(base.with_one_half_us(54).validate(), Err(TimingFault::OneHalfPeriod(54)));
    assert_eq!(base.with_one_half_us(62).validate(), Err(TimingFault::OneHalfPeriod(62)));

    assert!(base.with_zero_half_us(95).validate().is_ok());
    assert!(base.with_zero_half_us(9900).validate().is_ok());
    assert_eq!(base.with_zero_half_us(94).validate(), Err(TimingFault::ZeroHalfPeriod(94)));

    assert!(base.with_preamble_bits(MIN_PREAMBLE_BITS).validate().is_ok());
    assert!(base.with_preamble_bits(MAX_PREAMBLE_BITS).validate().is_ok());
    assert_eq!(
        base.with_preamble_bits(MIN_PREAMBLE_BITS - 1).validate(),
        Err(TimingFault::PreambleLength(13))
    );
}

#[test]
fn extreme_legal_timings_decode() {
    let cmd = DccCommand::speed_28(Address::Short(40), Direction::Forward, 7).unwrap();
    let fast = SignalTiming::default()
        .with_one_half_us(55)
        .with_zero_half_us(95)
        .with_preamble_bits(MIN_PREAMBLE_BITS);
    let slow = SignalTiming::default()
        .with_one_half_us(61)
        .with_zero_half_us(9900)
        .with_preamble_bits(MAX_PREAMBLE_BITS);

    assert_eq!(round_trip(&cmd, fast), cmd.payload());
    assert_eq!(round_trip(&cmd, slow), cmd.payload());
}

// ============================================================================
// Station Lifecycle
// ============================================================================

#[test]
fn station_restart_resends_interrupted_command() {
    let mut store: QueueStore = QueueStore::new();
    let (mut sender, scheduler) = store.split();
    sender.queue_standard(DccCommand::reset()).unwrap();

    let (a, b) = MockPin::pair(2, 3);
    let timer = MockTimer::new();
    let timer_log = timer.probe();
    let mut station = DccStation::new(a, b, scheduler, timer, DccConfig::default()).unwrap();

    station.start().unwrap();
    for _ in 0..40 {
        station.on_interrupt().unwrap();
    }
    station.stop().unwrap();
    assert!(!station.is_running());
    assert_eq!(station.transmitter().current_command(), Some(&DccCommand::reset()));

    // The restart opens a fresh frame of the same reset
    station.start().unwrap();
    assert_eq!(station.on_interrupt(), Ok(58));
    assert_eq!(station.transmitter().current_command(), Some(&DccCommand::reset()));
    assert_eq!(station.transmitter().source().pending(QueueTier::Standard), 0);
    assert_eq!(timer_log.arm_count(), 2);
    assert_eq!(timer_log.disarm_count(), 1);
}

#[test]
fn emergency_stop_survives_station_restart() {
    let mut store: QueueStore = QueueStore::new();
    let (mut sender, scheduler) = store.split();
    let estop = DccCommand::emergency_stop(Address::Short(3)).with_repeats(2);
    sender.queue_command(estop, QueueTier::Priority).unwrap();

    let (a, b) = MockPin::pair(2, 3);
    let timer = MockTimer::new();
    let timer_log = timer.probe();
    let mut station = DccStation::new(a, b, scheduler, timer, DccConfig::default()).unwrap();

    station.start().unwrap();
    for _ in 0..10 {
        station.on_interrupt().unwrap();
    }
    station.stop().unwrap();

    station.start().unwrap();
    for _ in 0..2000 {
        station.on_interrupt().unwrap();
    }

    // Drop the arm delays; the partial frame before the stop never decodes
    let mut periods = timer_log.periods();
    periods.remove(11);
    periods.remove(0);
    let stops = PacketDecoder::new()
        .decode(periods)
        .iter()
        .filter(|p| p.payload() == estop.payload())
        .count();
    assert_eq!(stops, 3);
}

#[test]
fn stop_before_start_is_harmless() {
    let mut store: QueueStore = QueueStore::new();
    let (_sender, scheduler) = store.split();
    let (a, b) = MockPin::pair(2, 3);
    let mut station = DccStation::new(a, b, scheduler, MockTimer::new(), DccConfig::default()).unwrap();
    assert!(station.stop().is_ok());
    assert!(!station.is_running());
}

#[test]
fn interrupt_without_start_still_ticks() {
    let mut store: QueueStore = QueueStore::new();
    let (_sender, scheduler) = store.split();
    let (a, b) = MockPin::pair(2, 3);
    let mut station = DccStation::new(a, b, scheduler, MockTimer::new(), DccConfig::default()).unwrap();
    assert_eq!(station.on_interrupt(), Ok(58));
}

#[test]
fn undrivable_pin_rejected_with_its_id() {
    let mut store: QueueStore = QueueStore::new();
    let (_sender, scheduler) = store.split();
    let a = MockPin::new(2).failing();
    let b = MockPin::new(3);
    assert_eq!(
        DccStation::new(a, b, scheduler, MockTimer::new(), DccConfig::default()).err(),
        Some(DccError::InvalidPinConfiguration(PinFault::NotDrivable(2)))
    );
}

#[test]
fn bad_timing_rejected_before_pins_touched() {
    let mut store: QueueStore = QueueStore::new();
    let (_sender, scheduler) = store.split();
    let (a, b) = MockPin::pair(2, 3);
    let track = a.probe();
    let config = DccConfig::default().with_timing(SignalTiming::default().with_one_half_us(40));

    assert_eq!(
        DccStation::new(a, b, scheduler, MockTimer::new(), config).err(),
        Some(DccError::InvalidTiming(TimingFault::OneHalfPeriod(40)))
    );
    assert!(track.events().is_empty());
}
