//! The board handle and its request/reply operations.

use crate::error::{B15FError, Result};
use crate::protocol::{
    self, AnalogPort, DigitalPort, BAUD_RATE, DEFAULT_TIMEOUT, DISCARD_BURST_LEN, DISCARD_PACING,
    MAX_ADC_CHANNEL, MAX_DAC_VALUE, MAX_SERVO_PULSE_US, MSG_OK, RQ_ANALOG_READ, RQ_DISCARD,
    RQ_PWM_SET_FREQ, RQ_PWM_SET_VALUE, RQ_READ_DIP_SWITCH, RQ_SELF_TEST, RQ_SERVO_DISABLE,
    RQ_SERVO_ENABLE, RQ_SERVO_SET_POS, RQ_TEST,
};
use rand::random;
#[cfg(windows)]
use serialport::COMPort;
#[cfg(not(windows))]
use serialport::TTYPort;
use serialport::{ClearBuffer, SerialPort};
use std::thread;
use std::time::Duration;

/// Platform serial port type returned by [`B15F::connect`] and discovery.
#[cfg(windows)]
pub type NativePort = COMPort;
#[cfg(not(windows))]
pub type NativePort = TTYPort;

/// Handle to a connected B15F board.
///
/// Every operation is a blocking request/reply exchange. The handle owns its
/// port, so a reply can never interleave with another request.
#[derive(Debug)]
pub struct B15F<P>
where
    P: SerialPort,
{
    port: P,
}

impl B15F<NativePort> {
    /// Opens `port_name` at the protocol settings and validates the device
    /// with the echo handshake.
    pub fn connect(port_name: &str) -> Result<B15F<NativePort>> {
        Self::connect_with_timeout(port_name, DEFAULT_TIMEOUT)
    }

    /// Like [`B15F::connect`] with a caller-chosen I/O timeout.
    pub fn connect_with_timeout(port_name: &str, timeout: Duration) -> Result<B15F<NativePort>> {
        let port = serialport::new(port_name, BAUD_RATE)
            .timeout(timeout)
            .open_native()?;
        B15F::with_port(port)
    }

    /// Scans all serial ports for a board. See [`crate::discover`].
    pub fn discover() -> Result<B15F<NativePort>> {
        crate::discovery::discover()
    }
}

impl<P> B15F<P>
where
    P: SerialPort,
{
    /// Adopts an already-open port and validates it with the echo handshake.
    pub fn with_port(port: P) -> Result<B15F<P>> {
        let name = port.name().unwrap_or_else(|| "<unnamed>".to_string());
        let mut board = B15F { port };
        if !board.test_connection()? {
            return Err(B15FError::DeviceNotSupported { port: name });
        }
        tracing::debug!("connected to B15F board on {}", name);
        Ok(board)
    }

    pub(crate) fn adopt_unchecked(port: P) -> B15F<P> {
        B15F { port }
    }

    /// Sends one random byte and checks the board echoes it back.
    ///
    /// `Ok(false)` means something acknowledged the request but echoed a
    /// wrong byte, so whatever answered is not a B15F board.
    pub fn test_connection(&mut self) -> Result<bool> {
        let nonce = random::<u8>();
        self.send_frame(&[RQ_TEST, nonce])?;
        let mut reply = [0u8; 2];
        self.port.read_exact(&mut reply)?;
        if reply[0] != MSG_OK {
            return Err(B15FError::Nak {
                request: RQ_TEST,
                response: reply[0],
            });
        }
        Ok(reply[1] == nonce)
    }

    /// Writes one byte to a digital output port.
    pub fn digital_write(&mut self, port: DigitalPort, value: u8) -> Result<()> {
        let request = port.write_request();
        self.send_frame(&[request, value])?;
        self.read_ack(request)
    }

    /// Reads one byte from a digital input port.
    ///
    /// The board transmits the sample LSB-first; the returned byte is
    /// already restored to normal bit order.
    pub fn digital_read(&mut self, port: DigitalPort) -> Result<u8> {
        self.queue_digital_read(port)?;
        self.flush_requests()?;
        self.take_digital_sample()
    }

    /// Reads the DIP switch bank. A set bit means the switch is closed.
    pub fn read_dip_switch(&mut self) -> Result<u8> {
        self.send_frame(&[RQ_READ_DIP_SWITCH])?;
        let mut reply = [0u8];
        self.port.read_exact(&mut reply)?;
        Ok(protocol::decode_dip_sample(reply[0]))
    }

    /// Writes a 10-bit value to one of the DAC outputs.
    ///
    /// # Panics
    ///
    /// Panics if `value` exceeds 1023.
    pub fn analog_write(&mut self, port: AnalogPort, value: u16) -> Result<()> {
        assert!(value <= MAX_DAC_VALUE, "DAC value must be 0..=1023");
        let request = port.write_request();
        let [lo, hi] = value.to_le_bytes();
        self.send_frame(&[request, lo, hi])?;
        self.read_ack(request)
    }

    /// Samples one ADC channel, returning the 10-bit conversion result.
    ///
    /// # Panics
    ///
    /// Panics if `channel` exceeds 7.
    pub fn analog_read(&mut self, channel: u8) -> Result<u16> {
        self.queue_analog_read(channel)?;
        self.flush_requests()?;
        self.take_analog_sample()
    }

    /// Requests a PWM base frequency. The board answers with the prescaler
    /// code it settled on, which is returned as-is.
    pub fn set_pwm_frequency(&mut self, hz: f32) -> Result<u8> {
        let bytes = hz.to_le_bytes();
        self.send_frame(&[RQ_PWM_SET_FREQ, bytes[0], bytes[1], bytes[2], bytes[3]])?;
        let mut reply = [0u8];
        self.port.read_exact(&mut reply)?;
        Ok(reply[0])
    }

    /// Sets the PWM duty cycle value.
    pub fn set_pwm_value(&mut self, value: u8) -> Result<()> {
        self.send_frame(&[RQ_PWM_SET_VALUE, value])?;
        self.read_ack(RQ_PWM_SET_VALUE)
    }

    /// Powers the servo output.
    pub fn servo_enable(&mut self) -> Result<()> {
        self.send_frame(&[RQ_SERVO_ENABLE])?;
        self.read_ack(RQ_SERVO_ENABLE)
    }

    /// Cuts power to the servo output.
    pub fn servo_disable(&mut self) -> Result<()> {
        self.send_frame(&[RQ_SERVO_DISABLE])?;
        self.read_ack(RQ_SERVO_DISABLE)
    }

    /// Moves the servo to a pulse width given in microseconds.
    ///
    /// # Panics
    ///
    /// Panics if `pulse_us` exceeds 19000.
    pub fn servo_set_position(&mut self, pulse_us: u16) -> Result<()> {
        assert!(
            pulse_us <= MAX_SERVO_PULSE_US,
            "servo pulse width must be 0..=19000 microseconds"
        );
        let [lo, hi] = pulse_us.to_le_bytes();
        self.send_frame(&[RQ_SERVO_SET_POS, lo, hi])?;
        self.read_ack(RQ_SERVO_SET_POS)
    }

    /// Runs the board's built-in self test program. The test exercises the
    /// LEDs and outputs and takes a few seconds on real hardware.
    pub fn self_test(&mut self) -> Result<()> {
        self.send_frame(&[RQ_SELF_TEST])?;
        self.read_ack(RQ_SELF_TEST)
    }

    /// Resynchronises the request/reply stream after a timeout or NAK.
    ///
    /// Drops pending output, sends a paced burst of discard bytes so the
    /// board falls back to a known state, then empties the input buffer.
    pub fn discard(&mut self) -> Result<()> {
        tracing::debug!("resynchronising the board connection");
        self.port.clear(ClearBuffer::Output)?;
        for _ in 0..DISCARD_BURST_LEN {
            self.port.write_all(&[RQ_DISCARD])?;
            thread::sleep(DISCARD_PACING);
        }
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }

    /// Name of the underlying serial port, when the platform exposes one.
    pub fn port_name(&self) -> Option<String> {
        self.port.name()
    }

    fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        tracing::trace!("sending request 0x{:02X}", frame[0]);
        self.port.write_all(frame)?;
        self.port.flush()?;
        Ok(())
    }

    fn read_ack(&mut self, request: u8) -> Result<()> {
        let mut reply = [0u8];
        self.port.read_exact(&mut reply)?;
        if reply[0] == MSG_OK {
            Ok(())
        } else {
            Err(B15FError::Nak {
                request,
                response: reply[0],
            })
        }
    }

    pub(crate) fn queue_digital_read(&mut self, port: DigitalPort) -> Result<()> {
        self.port.write_all(&[port.read_request()])?;
        Ok(())
    }

    pub(crate) fn take_digital_sample(&mut self) -> Result<u8> {
        let mut reply = [0u8];
        self.port.read_exact(&mut reply)?;
        Ok(protocol::decode_digital_sample(reply[0]))
    }

    pub(crate) fn queue_analog_read(&mut self, channel: u8) -> Result<()> {
        assert!(channel <= MAX_ADC_CHANNEL, "ADC channel must be 0..=7");
        self.port.write_all(&[RQ_ANALOG_READ, channel])?;
        Ok(())
    }

    pub(crate) fn take_analog_sample(&mut self) -> Result<u16> {
        let mut reply = [0u8; 2];
        self.port.read_exact(&mut reply)?;
        Ok(u16::from_le_bytes(reply))
    }

    pub(crate) fn flush_requests(&mut self) -> Result<()> {
        self.port.flush()?;
        Ok(())
    }
}
