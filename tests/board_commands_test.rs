//! Drives every board operation against the scripted mock port, checking
//! the exact bytes on the wire and the reply handling.

use b15f::protocol::{
    DISCARD_BURST_LEN, MSG_OK, RQ_ANALOG_READ, RQ_ANALOG_WRITE_1, RQ_DIGITAL_READ_1,
    RQ_DIGITAL_WRITE_0, RQ_DISCARD, RQ_PWM_SET_FREQ, RQ_PWM_SET_VALUE, RQ_READ_DIP_SWITCH,
    RQ_SELF_TEST, RQ_SERVO_DISABLE, RQ_SERVO_ENABLE, RQ_SERVO_SET_POS, RQ_TEST,
};
use b15f::testing::{attach, MockPort};
use b15f::{AnalogPort, B15F, B15FError, DigitalPort};
use std::io;

#[test]
fn test_digital_write_frame_and_ack() {
    let mock = MockPort::new();
    mock.enqueue_reply(&[MSG_OK]);
    let mut board = attach(mock.clone());

    board.digital_write(DigitalPort::Port0, 0xA5).unwrap();

    assert_eq!(mock.written(), vec![RQ_DIGITAL_WRITE_0, 0xA5]);
    assert_eq!(mock.pending_replies(), 0);
}

#[test]
fn test_digital_write_nak_carries_request_and_response() {
    let mock = MockPort::new();
    mock.enqueue_reply(&[0x17]);
    let mut board = attach(mock.clone());

    let err = board.digital_write(DigitalPort::Port0, 1).unwrap_err();

    match err {
        B15FError::Nak { request, response } => {
            assert_eq!(request, RQ_DIGITAL_WRITE_0);
            assert_eq!(response, 0x17);
        }
        other => panic!("expected Nak, got {:?}", other),
    }
}

#[test]
fn test_digital_read_restores_bit_order() {
    let mock = MockPort::new();
    mock.enqueue_reply(&[0b1000_0000]);
    let mut board = attach(mock.clone());

    let value = board.digital_read(DigitalPort::Port1).unwrap();

    assert_eq!(mock.written(), vec![RQ_DIGITAL_READ_1]);
    assert_eq!(value, 0b0000_0001);
}

#[test]
fn test_dip_switch_read_is_reversed_and_active_low() {
    let mock = MockPort::new();
    mock.enqueue_reply(&[0b1111_1110]);
    let mut board = attach(mock.clone());

    let value = board.read_dip_switch().unwrap();

    assert_eq!(mock.written(), vec![RQ_READ_DIP_SWITCH]);
    assert_eq!(value, 0b1000_0000);
}

#[test]
fn test_analog_write_sends_little_endian_value() {
    let mock = MockPort::new();
    mock.enqueue_reply(&[MSG_OK]);
    let mut board = attach(mock.clone());

    board.analog_write(AnalogPort::Port1, 1023).unwrap();

    assert_eq!(mock.written(), vec![RQ_ANALOG_WRITE_1, 0xFF, 0x03]);
}

#[test]
fn test_analog_read_returns_little_endian_sample() {
    let mock = MockPort::new();
    mock.enqueue_reply(&[0x34, 0x02]);
    let mut board = attach(mock.clone());

    let value = board.analog_read(7).unwrap();

    assert_eq!(mock.written(), vec![RQ_ANALOG_READ, 7]);
    assert_eq!(value, 0x0234);
}

#[test]
fn test_pwm_frequency_reply_byte_is_returned_verbatim() {
    let mock = MockPort::new();
    mock.enqueue_reply(&[0x03]);
    let mut board = attach(mock.clone());

    let prescaler = board.set_pwm_frequency(1000.0).unwrap();

    let hz = 1000.0f32.to_le_bytes();
    assert_eq!(
        mock.written(),
        vec![RQ_PWM_SET_FREQ, hz[0], hz[1], hz[2], hz[3]]
    );
    assert_eq!(prescaler, 0x03);
}

#[test]
fn test_pwm_value_is_acknowledged() {
    let mock = MockPort::new();
    mock.enqueue_reply(&[MSG_OK]);
    let mut board = attach(mock.clone());

    board.set_pwm_value(128).unwrap();

    assert_eq!(mock.written(), vec![RQ_PWM_SET_VALUE, 128]);
}

#[test]
fn test_servo_command_frames() {
    let mock = MockPort::new();
    let mut board = attach(mock.clone());

    mock.enqueue_reply(&[MSG_OK]);
    board.servo_enable().unwrap();
    assert_eq!(mock.written(), vec![RQ_SERVO_ENABLE]);

    mock.clear_written();
    mock.enqueue_reply(&[MSG_OK]);
    board.servo_set_position(1500).unwrap();
    assert_eq!(mock.written(), vec![RQ_SERVO_SET_POS, 0xDC, 0x05]);

    mock.clear_written();
    mock.enqueue_reply(&[MSG_OK]);
    board.servo_disable().unwrap();
    assert_eq!(mock.written(), vec![RQ_SERVO_DISABLE]);
}

#[test]
fn test_self_test_is_acknowledged() {
    let mock = MockPort::new();
    mock.enqueue_reply(&[MSG_OK]);
    let mut board = attach(mock.clone());

    board.self_test().unwrap();

    assert_eq!(mock.written(), vec![RQ_SELF_TEST]);
}

#[test]
fn test_discard_sends_burst_and_clears_input() {
    let mock = MockPort::new();
    // stale bytes left over from a desynchronised exchange
    mock.enqueue_reply(&[0xAA, 0xBB]);
    let mut board = attach(mock.clone());

    board.discard().unwrap();

    assert_eq!(mock.written(), vec![RQ_DISCARD; DISCARD_BURST_LEN]);
    assert_eq!(mock.input_clears(), 1);
    assert_eq!(mock.pending_replies(), 0);
}

#[test]
fn test_missing_reply_surfaces_as_timeout() {
    let mock = MockPort::new();
    let mut board = attach(mock.clone());

    let err = board.digital_read(DigitalPort::Port0).unwrap_err();

    match err {
        B15FError::Io(io_err) => assert_eq!(io_err.kind(), io::ErrorKind::TimedOut),
        other => panic!("expected Io, got {:?}", other),
    }
}

#[test]
fn test_write_failure_propagates_as_io_error() {
    let mock = MockPort::new();
    mock.fail_writes(io::ErrorKind::BrokenPipe);
    let mut board = attach(mock.clone());

    let err = board.set_pwm_value(1).unwrap_err();

    match err {
        B15FError::Io(io_err) => assert_eq!(io_err.kind(), io::ErrorKind::BrokenPipe),
        other => panic!("expected Io, got {:?}", other),
    }
}

#[test]
fn test_handshake_accepts_matching_echo() {
    let mock = MockPort::new();
    mock.arm_echo_handshake();

    let board = B15F::with_port(mock.clone()).unwrap();

    assert_eq!(board.port_name().as_deref(), Some("mock"));
    let written = mock.written();
    assert_eq!(written.len(), 2);
    assert_eq!(written[0], RQ_TEST);
}

#[test]
fn test_handshake_rejects_wrong_echo() {
    let mock = MockPort::new();
    mock.arm_corrupt_echo_handshake();

    let err = B15F::with_port(mock.clone()).unwrap_err();

    match err {
        B15FError::DeviceNotSupported { port } => assert_eq!(port, "mock"),
        other => panic!("expected DeviceNotSupported, got {:?}", other),
    }
}

#[test]
fn test_handshake_rejects_nak() {
    let mock = MockPort::new();
    mock.enqueue_reply(&[0xFE, 0x00]);

    let err = B15F::with_port(mock.clone()).unwrap_err();

    match err {
        B15FError::Nak { request, response } => {
            assert_eq!(request, RQ_TEST);
            assert_eq!(response, 0xFE);
        }
        other => panic!("expected Nak, got {:?}", other),
    }
}

#[test]
#[should_panic]
fn test_analog_write_rejects_out_of_range_value() {
    let mock = MockPort::new();
    let mut board = attach(mock);
    let _ = board.analog_write(AnalogPort::Port0, 1024);
}

#[test]
#[should_panic]
fn test_analog_read_rejects_out_of_range_channel() {
    let mock = MockPort::new();
    let mut board = attach(mock);
    let _ = board.analog_read(8);
}
