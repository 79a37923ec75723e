//! Register map and the measurement configuration image.

/// Register addresses used by the driver.
///
/// The VL53L1X exposes a 16-bit register space; multi-byte registers are big-endian and
/// the device auto-increments its pointer within a transaction.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// Soft reset register (0x0000)
    SoftReset = 0x0000,
    /// I2C slave device address register (0x0001), first byte of the configuration image
    I2cSlaveDeviceAddress = 0x0001,
    /// I2C pad voltage configuration register (0x002E)
    PadI2cHvExtsupConfig = 0x002E,
    /// GPIO TIO HV status register (0x0031), used as the data ready flag
    GpioTioHvStatus = 0x0031,
    /// System interrupt clear register (0x0086)
    SystemInterruptClear = 0x0086,
    /// System mode start register (0x0087)
    SystemModeStart = 0x0087,
    /// Result range status register (0x0089)
    ResultRangeStatus = 0x0089,
    /// Final crosstalk corrected range in millimeters (0x0096)
    ResultFinalCrosstalkCorrectedRangeMmSd0 = 0x0096,
    /// Peak signal count rate, crosstalk corrected (0x0098)
    ResultPeakSignalCountRateCrosstalkCorrectedMcpsSd0 = 0x0098,
    /// Firmware system status register (0x00E5)
    FirmwareSystemStatus = 0x00E5,
    /// Identification model ID register (0x010F)
    IdentificationModelId = 0x010F,
}

impl From<Register> for u16 {
    fn from(r: Register) -> Self {
        r as u16
    }
}

/// Register image written on every measurement start, beginning at
/// [`Register::I2cSlaveDeviceAddress`].
///
/// Captured from the ST P-NUCLEO-53L1A1 reference board. The last two bytes land on
/// [`Register::SystemInterruptClear`] and [`Register::SystemModeStart`] and arm the
/// measurement.
pub const CONFIGURATION_BLOCK: [u8; 135] = [
    0x29, 0x02, 0x10, 0x00, 0x28, 0xBC, 0x7A, 0x81, /* 0x01 - 0x08 */
    0x80, 0x07, 0x95, 0x00, 0xED, 0xFF, 0xF7, 0xFD, /* 0x09 - 0x10 */
    0x9E, 0x0E, 0x00, 0x10, 0x01, 0x00, 0x00, 0x00, /* 0x11 - 0x18 */
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x34, 0x00, /* 0x19 - 0x20 */
    0x28, 0x00, 0x0D, 0x0A, 0x00, 0x00, 0x00, 0x00, /* 0x21 - 0x28 */
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x11, /* 0x29 - 0x30 */
    0x02, 0x00, 0x02, 0x08, 0x00, 0x08, 0x10, 0x01, /* 0x31 - 0x38 */
    0x01, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x02, /* 0x39 - 0x40 */
    0x00, 0x00, 0x00, 0x00, 0x00, 0x20, 0x0B, 0x00, /* 0x41 - 0x48 */
    0x00, 0x02, 0x0A, 0x21, 0x00, 0x00, 0x02, 0x00, /* 0x49 - 0x50 */
    0x00, 0x00, 0x00, 0xC8, 0x00, 0x00, 0x38, 0xFF, /* 0x51 - 0x58 */
    0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x91, 0x0F, /* 0x59 - 0x60 */
    0x00, 0xA5, 0x0D, 0x00, 0x80, 0x00, 0x0C, 0x08, /* 0x61 - 0x68 */
    0xB8, 0x00, 0x00, 0x00, 0x00, 0x0E, 0x10, 0x00, /* 0x69 - 0x70 */
    0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x0F, /* 0x71 - 0x78 */
    0x0D, 0x0E, 0x0E, 0x01, 0x00, 0x02, 0xC7, 0xFF, /* 0x79 - 0x80 */
    0x8B, 0x00, 0x00, 0x00, 0x01, 0x01, 0x40, /* 0x81 - 0x87 */
];

/// Size of the largest measurement frame: 2 address bytes plus the full image.
pub const MEASUREMENT_FRAME_LEN: usize = 2 + CONFIGURATION_BLOCK.len();

/// A single-transaction write of the configuration image, optionally starting part way in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementFrame {
    buffer: [u8; MEASUREMENT_FRAME_LEN],
    len: usize,
}

impl MeasurementFrame {
    /// Builds the frame for `offset` bytes into [`CONFIGURATION_BLOCK`].
    ///
    /// Returns `None` when `offset` leaves nothing to write.
    #[must_use]
    pub fn new(offset: u8) -> Option<Self> {
        let payload = CONFIGURATION_BLOCK.get(usize::from(offset)..)?;
        if payload.is_empty() {
            return None;
        }

        let start = u16::from(Register::I2cSlaveDeviceAddress) + u16::from(offset);
        let len = 2 + payload.len();
        let mut buffer = [0u8; MEASUREMENT_FRAME_LEN];
        buffer[0..2].copy_from_slice(&start.to_be_bytes());
        buffer[2..len].copy_from_slice(payload);
        Some(Self { buffer, len })
    }

    /// The bytes to put on the bus.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_frame_layout() {
        let frame = MeasurementFrame::new(0).unwrap();
        let bytes = frame.as_bytes();

        assert_eq!(bytes.len(), 137);
        assert_eq!(bytes[0], 0x00);
        assert_eq!(bytes[1], 0x01);
        assert_eq!(&bytes[2..], &CONFIGURATION_BLOCK[..]);
        assert_eq!(bytes[135], 0x01);
        assert_eq!(bytes[136], 0x40);
    }

    #[test]
    fn configuration_block_image() {
        assert_eq!(CONFIGURATION_BLOCK.len(), 135);
        // first byte is the default slave address
        assert_eq!(CONFIGURATION_BLOCK[0], 0x29);
        // 0x2E and 0x2F pad configuration
        assert_eq!(CONFIGURATION_BLOCK[0x2D], 0x00);
        assert_eq!(CONFIGURATION_BLOCK[0x2E], 0x00);
        // 0x30 gpio mux, 0x31 tio status
        assert_eq!(CONFIGURATION_BLOCK[0x2F], 0x11);
        assert_eq!(CONFIGURATION_BLOCK[0x30], 0x02);
        assert_eq!(CONFIGURATION_BLOCK[0x80], 0x8B);
        assert_eq!(&CONFIGURATION_BLOCK[133..], &[0x01, 0x40]);

        let sum: u32 = CONFIGURATION_BLOCK.iter().map(|&b| u32::from(b)).sum();
        assert_eq!(sum, 0x1164);
    }

    #[test]
    fn offset_frame_starts_part_way() {
        let frame = MeasurementFrame::new(0x2C).unwrap();
        let bytes = frame.as_bytes();

        assert_eq!(bytes.len(), 2 + 135 - 0x2C);
        assert_eq!(&bytes[..2], &[0x00, 0x2D]);
        assert_eq!(&bytes[2..], &CONFIGURATION_BLOCK[0x2C..]);
        assert_eq!(bytes.last(), Some(&0x40));
    }

    #[test]
    fn last_byte_offset_only_arms() {
        let frame = MeasurementFrame::new(134).unwrap();
        assert_eq!(frame.as_bytes(), &[0x00, 0x87, 0x40]);
    }

    #[test]
    fn offset_past_block_is_rejected() {
        assert!(MeasurementFrame::new(135).is_none());
        assert!(MeasurementFrame::new(u8::MAX).is_none());
    }

    #[test]
    fn register_addresses() {
        assert_eq!(u16::from(Register::SoftReset), 0x0000);
        assert_eq!(u16::from(Register::PadI2cHvExtsupConfig), 0x002E);
        assert_eq!(u16::from(Register::GpioTioHvStatus), 0x0031);
        assert_eq!(u16::from(Register::ResultRangeStatus), 0x0089);
        assert_eq!(
            u16::from(Register::ResultFinalCrosstalkCorrectedRangeMmSd0),
            0x0096
        );
        assert_eq!(
            u16::from(Register::ResultPeakSignalCountRateCrosstalkCorrectedMcpsSd0),
            0x0098
        );
        assert_eq!(u16::from(Register::FirmwareSystemStatus), 0x00E5);
        assert_eq!(u16::from(Register::IdentificationModelId), 0x010F);
    }
}
