//! Test support: an in-memory serial port for driving the board API without
//! hardware.
//!
//! [`MockPort`] shares its state through an [`Arc`], so a test keeps a clone
//! for scripting replies and inspecting traffic after the port has moved
//! into the driver:
//!
//! ```
//! use b15f::protocol::{MSG_OK, RQ_DIGITAL_WRITE_0};
//! use b15f::testing::{attach, MockPort};
//! use b15f::DigitalPort;
//!
//! let mock = MockPort::new();
//! mock.enqueue_reply(&[MSG_OK]);
//!
//! let mut board = attach(mock.clone());
//! board.digital_write(DigitalPort::Port0, 0b0000_0011).unwrap();
//!
//! assert_eq!(mock.written(), vec![RQ_DIGITAL_WRITE_0, 0b0000_0011]);
//! ```

use crate::board::B15F;
use crate::protocol::{BAUD_RATE, DEFAULT_TIMEOUT, MSG_OK, RQ_TEST};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct MockState {
    written: Vec<u8>,
    replies: VecDeque<u8>,
    armed_echoes: usize,
    corrupt_echo: bool,
    read_error: Option<io::ErrorKind>,
    write_error: Option<io::ErrorKind>,
    input_clears: usize,
    baud_rate: u32,
    timeout: Duration,
}

/// In-memory serial port with scripted replies.
///
/// Reads drain a reply queue and fail with [`io::ErrorKind::TimedOut`] when
/// it runs dry, mirroring how a real port behaves when the board stays
/// silent.
#[derive(Debug, Clone)]
pub struct MockPort {
    state: Arc<Mutex<MockState>>,
}

impl MockPort {
    pub fn new() -> Self {
        let state = MockState {
            baud_rate: BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
            ..MockState::default()
        };
        MockPort {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Queues bytes to be served by subsequent reads.
    pub fn enqueue_reply(&self, bytes: &[u8]) {
        self.state
            .lock()
            .unwrap()
            .replies
            .extend(bytes.iter().copied());
    }

    /// Arms one auto-reply for the echo handshake: the next `RQ_TEST` frame
    /// is answered with `MSG_OK` plus the nonce it carried.
    pub fn arm_echo_handshake(&self) {
        self.state.lock().unwrap().armed_echoes += 1;
    }

    /// Arms one auto-reply that acknowledges the handshake but echoes a
    /// wrong byte, for exercising the not-a-board path.
    pub fn arm_corrupt_echo_handshake(&self) {
        let mut state = self.state.lock().unwrap();
        state.armed_echoes += 1;
        state.corrupt_echo = true;
    }

    /// Makes every following read fail with `kind`.
    pub fn fail_reads(&self, kind: io::ErrorKind) {
        self.state.lock().unwrap().read_error = Some(kind);
    }

    /// Makes every following write fail with `kind`.
    pub fn fail_writes(&self, kind: io::ErrorKind) {
        self.state.lock().unwrap().write_error = Some(kind);
    }

    /// Every byte the driver has written so far.
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().unwrap().written.clone()
    }

    /// Forgets recorded writes, for scripting multi-step scenarios.
    pub fn clear_written(&self) {
        self.state.lock().unwrap().written.clear();
    }

    /// Number of times the driver cleared the input buffer.
    pub fn input_clears(&self) -> usize {
        self.state.lock().unwrap().input_clears
    }

    /// Reply bytes not yet consumed.
    pub fn pending_replies(&self) -> usize {
        self.state.lock().unwrap().replies.len()
    }
}

impl Default for MockPort {
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps a port in a board handle without running the echo handshake.
pub fn attach<P>(port: P) -> B15F<P>
where
    P: SerialPort,
{
    B15F::adopt_unchecked(port)
}

impl io::Read for MockPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        if let Some(kind) = state.read_error {
            return Err(io::Error::new(kind, "injected mock read failure"));
        }
        if buf.is_empty() {
            return Ok(0);
        }
        let mut count = 0;
        while count < buf.len() {
            match state.replies.pop_front() {
                Some(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                None => break,
            }
        }
        if count == 0 {
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "mock reply queue is empty",
            ));
        }
        Ok(count)
    }
}

impl io::Write for MockPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        if let Some(kind) = state.write_error {
            return Err(io::Error::new(kind, "injected mock write failure"));
        }
        state.written.extend_from_slice(buf);
        // The handshake nonce is random, so the scripted reply has to be
        // derived from the frame that just arrived.
        if state.armed_echoes > 0 && buf.len() == 2 && buf[0] == RQ_TEST {
            state.armed_echoes -= 1;
            let echo = if state.corrupt_echo { !buf[1] } else { buf[1] };
            state.replies.push_back(MSG_OK);
            state.replies.push_back(echo);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SerialPort for MockPort {
    fn name(&self) -> Option<String> {
        Some("mock".to_string())
    }

    fn baud_rate(&self) -> serialport::Result<u32> {
        Ok(self.state.lock().unwrap().baud_rate)
    }

    fn data_bits(&self) -> serialport::Result<DataBits> {
        Ok(DataBits::Eight)
    }

    fn flow_control(&self) -> serialport::Result<FlowControl> {
        Ok(FlowControl::None)
    }

    fn parity(&self) -> serialport::Result<Parity> {
        Ok(Parity::None)
    }

    fn stop_bits(&self) -> serialport::Result<StopBits> {
        Ok(StopBits::One)
    }

    fn timeout(&self) -> Duration {
        self.state.lock().unwrap().timeout
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> serialport::Result<()> {
        self.state.lock().unwrap().baud_rate = baud_rate;
        Ok(())
    }

    fn set_data_bits(&mut self, _data_bits: DataBits) -> serialport::Result<()> {
        Ok(())
    }

    fn set_flow_control(&mut self, _flow_control: FlowControl) -> serialport::Result<()> {
        Ok(())
    }

    fn set_parity(&mut self, _parity: Parity) -> serialport::Result<()> {
        Ok(())
    }

    fn set_stop_bits(&mut self, _stop_bits: StopBits) -> serialport::Result<()> {
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Duration) -> serialport::Result<()> {
        self.state.lock().unwrap().timeout = timeout;
        Ok(())
    }

    fn write_request_to_send(&mut self, _level: bool) -> serialport::Result<()> {
        Ok(())
    }

    fn write_data_terminal_ready(&mut self, _level: bool) -> serialport::Result<()> {
        Ok(())
    }

    fn read_clear_to_send(&mut self) -> serialport::Result<bool> {
        Ok(true)
    }

    fn read_data_set_ready(&mut self) -> serialport::Result<bool> {
        Ok(true)
    }

    fn read_ring_indicator(&mut self) -> serialport::Result<bool> {
        Ok(false)
    }

    fn read_carrier_detect(&mut self) -> serialport::Result<bool> {
        Ok(true)
    }

    fn bytes_to_read(&self) -> serialport::Result<u32> {
        Ok(self.state.lock().unwrap().replies.len() as u32)
    }

    fn bytes_to_write(&self) -> serialport::Result<u32> {
        Ok(0)
    }

    fn clear(&self, buffer_to_clear: ClearBuffer) -> serialport::Result<()> {
        let mut state = self.state.lock().unwrap();
        match buffer_to_clear {
            ClearBuffer::Input | ClearBuffer::All => {
                state.replies.clear();
                state.input_clears += 1;
            }
            ClearBuffer::Output => {}
        }
        Ok(())
    }

    fn try_clone(&self) -> serialport::Result<Box<dyn SerialPort>> {
        Ok(Box::new(self.clone()))
    }

    fn set_break(&self) -> serialport::Result<()> {
        Ok(())
    }

    fn clear_break(&self) -> serialport::Result<()> {
        Ok(())
    }
}
