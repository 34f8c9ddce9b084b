//! Serial port scanning for a connected board.

use crate::board::{NativePort, B15F};
use crate::error::{B15FError, Result};
use crate::protocol::DEFAULT_TIMEOUT;
use serialport::{SerialPortInfo, SerialPortType};
use std::time::Duration;

/// Candidate serial ports, most promising transport first.
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    let mut ports = serialport::available_ports()?;
    ports.sort_unstable_by_key(transport_priority);
    Ok(ports)
}

/// Scans all serial ports and returns the first one with a board behind it.
pub fn discover() -> Result<B15F<NativePort>> {
    discover_with_timeout(DEFAULT_TIMEOUT)
}

/// Like [`discover`] with a caller-chosen probe timeout per port.
pub fn discover_with_timeout(timeout: Duration) -> Result<B15F<NativePort>> {
    for info in list_ports()? {
        tracing::debug!("probing {} for a B15F board", info.port_name);
        match B15F::connect_with_timeout(&info.port_name, timeout) {
            Ok(board) => {
                tracing::info!("found B15F board on {}", info.port_name);
                return Ok(board);
            }
            Err(err) => {
                tracing::debug!("no board on {}: {}", info.port_name, err);
            }
        }
    }
    Err(B15FError::DeviceNotFound)
}

// The board enumerates as a USB CDC device, so USB ports are probed first.
fn transport_priority(info: &SerialPortInfo) -> u8 {
    match info.port_type {
        SerialPortType::UsbPort(_) => 0,
        SerialPortType::PciPort => 1,
        SerialPortType::BluetoothPort => 2,
        SerialPortType::Unknown => 3,
    }
}
