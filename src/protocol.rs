//! Wire protocol of the B15F board: request codes, framing constants and
//! the bit-order transforms applied to samples coming back from the board.
//!
//! Every exchange is client-initiated: one request code byte, a fixed-size
//! payload determined by the code, then a fixed-size reply. There is no
//! length prefix, checksum or escaping.

use std::time::Duration;

/// Baud rate of the board's USB serial link.
pub const BAUD_RATE: u32 = 57_600;

/// Read/write timeout applied to freshly opened ports.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Acknowledgement byte. Anything else where an ack is expected is a NAK.
pub const MSG_OK: u8 = 0xFF;

// Request codes. Payload and reply sizes are fixed per code.
pub const RQ_DISCARD: u8 = 0;
pub const RQ_TEST: u8 = 1;
pub const RQ_SELF_TEST: u8 = 4;
pub const RQ_DIGITAL_WRITE_0: u8 = 5;
pub const RQ_DIGITAL_WRITE_1: u8 = 6;
pub const RQ_DIGITAL_READ_0: u8 = 7;
pub const RQ_DIGITAL_READ_1: u8 = 8;
pub const RQ_READ_DIP_SWITCH: u8 = 9;
pub const RQ_ANALOG_WRITE_0: u8 = 10;
pub const RQ_ANALOG_WRITE_1: u8 = 11;
pub const RQ_ANALOG_READ: u8 = 12;
pub const RQ_PWM_SET_FREQ: u8 = 14;
pub const RQ_PWM_SET_VALUE: u8 = 15;
pub const RQ_SERVO_ENABLE: u8 = 21;
pub const RQ_SERVO_DISABLE: u8 = 22;
pub const RQ_SERVO_SET_POS: u8 = 23;

/// Number of `RQ_DISCARD` bytes sent to resynchronise the stream.
pub const DISCARD_BURST_LEN: usize = 16;
/// Pause between discard bytes so the board drains them one at a time.
pub const DISCARD_PACING: Duration = Duration::from_millis(4);

/// Largest value accepted by the 10-bit DAC outputs.
pub const MAX_DAC_VALUE: u16 = 1023;
/// Highest ADC channel index.
pub const MAX_ADC_CHANNEL: u8 = 7;
/// Longest accepted servo pulse width in microseconds.
pub const MAX_SERVO_PULSE_US: u16 = 19_000;

/// One of the two 8-bit digital ports.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DigitalPort {
    Port0,
    Port1,
}

impl DigitalPort {
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(DigitalPort::Port0),
            1 => Some(DigitalPort::Port1),
            _ => None,
        }
    }

    pub(crate) fn write_request(self) -> u8 {
        match self {
            DigitalPort::Port0 => RQ_DIGITAL_WRITE_0,
            DigitalPort::Port1 => RQ_DIGITAL_WRITE_1,
        }
    }

    pub(crate) fn read_request(self) -> u8 {
        match self {
            DigitalPort::Port0 => RQ_DIGITAL_READ_0,
            DigitalPort::Port1 => RQ_DIGITAL_READ_1,
        }
    }
}

/// One of the two 10-bit DAC outputs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AnalogPort {
    Port0,
    Port1,
}

impl AnalogPort {
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(AnalogPort::Port0),
            1 => Some(AnalogPort::Port1),
            _ => None,
        }
    }

    pub(crate) fn write_request(self) -> u8 {
        match self {
            AnalogPort::Port0 => RQ_ANALOG_WRITE_0,
            AnalogPort::Port1 => RQ_ANALOG_WRITE_1,
        }
    }
}

/// The board transmits digital port samples LSB-first.
pub fn decode_digital_sample(raw: u8) -> u8 {
    raw.reverse_bits()
}

/// DIP switch samples are LSB-first like digital ports, and the bank is
/// wired active-low, so the byte is complemented after the bit reversal.
pub fn decode_dip_sample(raw: u8) -> u8 {
    !raw.reverse_bits()
}
