//! Frame-level contract of each catalogue operation, driven over a scripted
//! transport standing in for the instrument.

use monochromator::{ControlMode, MockTransport, MonoError, Monochromator};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_millis(25);

fn device(mock: &MockTransport) -> Monochromator {
    Monochromator::with_transport(Box::new(mock.clone()), TIMEOUT)
}

#[test]
fn set_control_sends_exactly_one_frame_per_mode() {
    let mock = MockTransport::new();
    let mut mono = device(&mock);

    mono.set_control(ControlMode::Computer).unwrap();
    assert_eq!(mock.take_written(), b"<set_control,COMPUTER>");

    mono.set_control(ControlMode::FrontPanel).unwrap();
    assert_eq!(mock.take_written(), b"<set_control,FRONT_PANEL>");
}

#[test]
fn set_direction_encodes_booleans_as_digits() {
    let mock = MockTransport::new();
    let mut mono = device(&mock);

    mono.set_direction(true).unwrap();
    assert_eq!(mock.take_written(), b"<set_direction,1>");

    mono.set_direction(false).unwrap();
    assert_eq!(mock.take_written(), b"<set_direction,0>");
}

#[test]
fn home_is_true_only_for_the_exact_homing_reply() {
    let mock = MockTransport::new();
    let mut mono = device(&mock);

    mock.push_line("HOMING");
    assert!(mono.home().unwrap());
    assert_eq!(mock.take_written(), b"<home>");

    mock.push_line("READY");
    assert!(!mono.home().unwrap());

    mock.push_line("homing");
    assert!(!mono.home().unwrap());

    mock.push_line("");
    assert!(!mono.home().unwrap());

    // No reply at all (read times out) also reads as "not homing".
    assert!(!mono.home().unwrap());
}

#[test]
fn get_position_parses_signed_integers() {
    let mock = MockTransport::new();
    let mut mono = device(&mock);

    mock.push_line("1234");
    assert_eq!(mono.get_position().unwrap(), 1_234);
    assert_eq!(mock.take_written(), b"<get_position>");

    mock.push_line("-25");
    assert_eq!(mono.get_position().unwrap(), -25);
}

#[test]
fn get_position_rejects_non_numeric_replies() {
    let mock = MockTransport::new();
    let mut mono = device(&mock);

    mock.push_line("whoops");
    assert!(matches!(
        mono.get_position(),
        Err(MonoError::Parse { .. })
    ));

    // An empty-but-terminated reply is a parse failure, not a zero.
    mock.push_line("");
    assert!(matches!(
        mono.get_position(),
        Err(MonoError::Parse { .. })
    ));
}

#[test]
fn get_position_with_no_reply_is_a_timeout_error() {
    let mock = MockTransport::new();
    let mut mono = device(&mock);

    assert!(matches!(
        mono.get_position(),
        Err(MonoError::Timeout { .. })
    ));
}

#[test]
fn get_pmt_parses_the_digitized_reading() {
    let mock = MockTransport::new();
    let mut mono = device(&mock);

    mock.push_line("4095");
    assert_eq!(mono.get_pmt().unwrap(), 4_095);
    assert_eq!(mock.take_written(), b"<get_pmt>");

    mock.push_line("-1");
    assert!(matches!(mono.get_pmt(), Err(MonoError::Parse { .. })));
}

#[test]
fn get_calibration_returns_the_raw_status_line() {
    let mock = MockTransport::new();
    let mut mono = device(&mock);

    mock.push_line("Completed");
    assert_eq!(mono.get_calibration().unwrap(), "Completed");
    assert_eq!(mock.take_written(), b"<get_calibration>");
}

#[test]
fn get_calibration_timeout_reads_as_busy_not_error() {
    let mock = MockTransport::new();
    let mut mono = device(&mock);

    // Nothing scripted: the device is busy homing and stays silent.
    assert_eq!(mono.get_calibration().unwrap(), "");

    // A partial, unterminated reply is surfaced as-is.
    mock.push_reply(b"Hom");
    assert_eq!(mono.get_calibration().unwrap(), "Hom");
}

#[test]
fn get_direction_parses_the_flag_strictly() {
    let mock = MockTransport::new();
    let mut mono = device(&mock);

    mock.push_line("1");
    assert!(mono.get_direction().unwrap());
    assert_eq!(mock.take_written(), b"<get_direction>");

    mock.push_line("0");
    assert!(!mono.get_direction().unwrap());

    mock.push_line("2");
    assert!(matches!(
        mono.get_direction(),
        Err(MonoError::Parse { .. })
    ));
}

#[test]
fn a_failed_parse_does_not_corrupt_the_next_exchange() {
    let mock = MockTransport::new();
    let mut mono = device(&mock);

    mock.push_line("bad");
    assert!(mono.get_position().is_err());

    mock.push_line("77");
    assert_eq!(mono.get_position().unwrap(), 77);
}

#[test]
fn drain_input_discards_stale_bytes_before_polling() {
    let mock = MockTransport::new();
    let mut mono = device(&mock);

    mock.push_line("stale-from-last-exchange");
    mono.drain_input().unwrap();

    mock.push_line("5");
    assert_eq!(mono.get_position().unwrap(), 5);
}

#[test]
fn a_reply_split_across_reads_is_reassembled() {
    let mock = MockTransport::new();
    let mut mono = device(&mock);

    mock.push_reply(b"12");
    mock.push_reply(b"34\r");
    mock.push_reply(b"\n");
    assert_eq!(mono.get_position().unwrap(), 1_234);
}

#[test]
fn bytes_after_the_terminator_stay_queued_for_the_next_reply() {
    let mock = MockTransport::new();
    let mut mono = device(&mock);

    mock.push_reply(b"10\r\n20\r\n");
    assert_eq!(mono.get_position().unwrap(), 10);
    assert_eq!(mono.get_position().unwrap(), 20);
}
