//! Batched reads: queue several digital/ADC read requests, flush once, then
//! consume the replies in a fixed order. Saves round-trip latency when
//! polling many inputs at once. Firmware support varies, hence the feature
//! gate.

use crate::board::B15F;
use crate::error::Result;
use crate::protocol::{DigitalPort, MAX_ADC_CHANNEL};
use bitflags::bitflags;
use serialport::SerialPort;

bitflags! {
    /// Selection of inputs for one batched read.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ReadSelection: u16 {
        const DIGITAL_0 = 1 << 8;
        const DIGITAL_1 = 1 << 9;

        const ADC_0 = 1 << 0;
        const ADC_1 = 1 << 1;
        const ADC_2 = 1 << 2;
        const ADC_3 = 1 << 3;
        const ADC_4 = 1 << 4;
        const ADC_5 = 1 << 5;
        const ADC_6 = 1 << 6;
        const ADC_7 = 1 << 7;
    }
}

impl ReadSelection {
    /// Flag for a single ADC channel.
    ///
    /// # Panics
    ///
    /// Panics if `channel` exceeds 7.
    pub fn adc(channel: u8) -> Self {
        assert!(channel <= MAX_ADC_CHANNEL, "ADC channel must be 0..=7");
        ReadSelection::from_bits_truncate(1 << channel)
    }
}

/// Result of a batched read. Slots that were not selected stay `None`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReading {
    pub digital: [Option<u8>; 2],
    pub adc: [Option<u16>; 8],
}

impl<P> B15F<P>
where
    P: SerialPort,
{
    /// Issues every selected read request back-to-back, flushes once, then
    /// consumes the replies in a fixed order: digital 0, digital 1, ADC 0
    /// through 7.
    pub fn read_batch(&mut self, selection: ReadSelection) -> Result<BatchReading> {
        if selection.contains(ReadSelection::DIGITAL_0) {
            self.queue_digital_read(DigitalPort::Port0)?;
        }
        if selection.contains(ReadSelection::DIGITAL_1) {
            self.queue_digital_read(DigitalPort::Port1)?;
        }
        for channel in 0..=MAX_ADC_CHANNEL {
            if selection.contains(ReadSelection::adc(channel)) {
                self.queue_analog_read(channel)?;
            }
        }
        self.flush_requests()?;

        let mut reading = BatchReading::default();
        if selection.contains(ReadSelection::DIGITAL_0) {
            reading.digital[0] = Some(self.take_digital_sample()?);
        }
        if selection.contains(ReadSelection::DIGITAL_1) {
            reading.digital[1] = Some(self.take_digital_sample()?);
        }
        for channel in 0..=MAX_ADC_CHANNEL {
            if selection.contains(ReadSelection::adc(channel)) {
                reading.adc[channel as usize] = Some(self.take_analog_sample()?);
            }
        }
        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adc_flags_cover_all_channels() {
        for channel in 0..=7u8 {
            let flag = ReadSelection::adc(channel);
            assert_eq!(flag.bits(), 1 << channel);
            assert!(!flag.is_empty());
        }
    }

    #[test]
    #[should_panic]
    fn test_adc_flag_rejects_out_of_range_channel() {
        let _ = ReadSelection::adc(8);
    }

    #[test]
    fn test_digital_flags_do_not_overlap_adc_flags() {
        let adc_all = ReadSelection::all()
            .difference(ReadSelection::DIGITAL_0 | ReadSelection::DIGITAL_1);
        assert!(!adc_all.intersects(ReadSelection::DIGITAL_0));
        assert!(!adc_all.intersects(ReadSelection::DIGITAL_1));
    }
}
