//! Range status decoding.
//!
//! The sensor reports a device-internal error code in the low five bits of
//! [`Register::ResultRangeStatus`](crate::Register::ResultRangeStatus). ST's API remaps that
//! code into the published [`RangeStatus`] values; this module carries the same table.

/// Device-internal error codes found in the range status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceError {
    /// VCSEL continuity test failure
    VcselContinuityTestFailure,
    /// VCSEL watchdog test failure
    VcselWatchdogTestFailure,
    /// No VHV value found
    NoVhvValueFound,
    /// MSRC found no target
    MsrcNoTarget,
    /// Range phase check failed
    RangePhaseCheck,
    /// Sigma threshold check failed
    SigmaThresholdCheck,
    /// Phase consistency check failed
    PhaseConsistency,
    /// Minimum clip
    MinClip,
    /// Range complete
    RangeComplete,
    /// Algorithm underflow
    AlgoUnderflow,
    /// Algorithm overflow
    AlgoOverflow,
    /// Range ignore threshold
    RangeIgnoreThreshold,
    /// User ROI clip
    UserRoiClip,
    /// Reference SPAD characterisation: not enough SPADs
    RefSpadCharNotEnoughSpads,
    /// Reference SPAD characterisation: more than target
    RefSpadCharMoreThanTarget,
    /// Reference SPAD characterisation: less than target
    RefSpadCharLessThanTarget,
    /// Multiple clip failure
    MultClipFail,
    /// First interrupt after starting back to back ranging
    GphStreamCount0Ready,
    /// Range complete without the wrap around check
    RangeCompleteNoWrapCheck,
    /// Event consistency check failed
    EventConsistency,
    /// Minimum signal event check failed
    MinSignalEventCheck,
    /// Range complete, merged pulse
    RangeCompleteMergedPulse,
    /// Code with no assigned meaning
    Unknown(u8),
}

impl From<u8> for DeviceError {
    fn from(value: u8) -> Self {
        match value {
            1 => DeviceError::VcselContinuityTestFailure,
            2 => DeviceError::VcselWatchdogTestFailure,
            3 => DeviceError::NoVhvValueFound,
            4 => DeviceError::MsrcNoTarget,
            5 => DeviceError::RangePhaseCheck,
            6 => DeviceError::SigmaThresholdCheck,
            7 => DeviceError::PhaseConsistency,
            8 => DeviceError::MinClip,
            9 => DeviceError::RangeComplete,
            10 => DeviceError::AlgoUnderflow,
            11 => DeviceError::AlgoOverflow,
            12 => DeviceError::RangeIgnoreThreshold,
            13 => DeviceError::UserRoiClip,
            14 => DeviceError::RefSpadCharNotEnoughSpads,
            15 => DeviceError::RefSpadCharMoreThanTarget,
            16 => DeviceError::RefSpadCharLessThanTarget,
            17 => DeviceError::MultClipFail,
            18 => DeviceError::GphStreamCount0Ready,
            19 => DeviceError::RangeCompleteNoWrapCheck,
            20 => DeviceError::EventConsistency,
            21 => DeviceError::MinSignalEventCheck,
            22 => DeviceError::RangeCompleteMergedPulse,
            _ => DeviceError::Unknown(value),
        }
    }
}

/// Published measurement status, `RangeValid` meaning the distance can be trusted.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RangeStatus {
    /// The range is valid
    RangeValid = 0,
    /// Sigma fail
    SigmaFail = 1,
    /// Signal fail
    SignalFail = 2,
    /// Target is below the minimum detection threshold
    RangeValidMinRangeClipped = 3,
    /// Phase out of valid limits
    OutOfBoundsFail = 4,
    /// Hardware fail
    HardwareFail = 5,
    /// The range is valid but the wrap around check has not been done
    RangeValidNoWrapCheckFail = 6,
    /// Wrapped target, no matching phase in the other VCSEL period
    WrapTargetFail = 7,
    /// Internal algorithm underflow or overflow
    ProcessingFail = 8,
    /// Crosstalk signal fail
    XtalkSignalFail = 9,
    /// First interrupt when starting back to back ranging, data should be ignored
    SynchronisationInt = 10,
    /// Valid range produced by multiple merged pulses
    RangeValidMergedPulse = 11,
    /// Target present but lacking signal
    TargetPresentLackOfSignal = 12,
    /// Minimum range fail
    MinRangeFail = 13,
    /// Range invalid
    RangeInvalid = 14,
    /// No update
    None = 255,
}

impl RangeStatus {
    /// Decodes a raw [`Register::ResultRangeStatus`](crate::Register::ResultRangeStatus)
    /// reading. Only the low five bits are significant.
    #[must_use]
    pub fn from_device_error(raw: u8) -> Self {
        match DeviceError::from(raw & 0x1F) {
            DeviceError::GphStreamCount0Ready => RangeStatus::SynchronisationInt,
            DeviceError::RangeCompleteNoWrapCheck => RangeStatus::RangeValidNoWrapCheckFail,
            DeviceError::RangePhaseCheck => RangeStatus::OutOfBoundsFail,
            DeviceError::MsrcNoTarget => RangeStatus::SignalFail,
            DeviceError::SigmaThresholdCheck => RangeStatus::SigmaFail,
            DeviceError::PhaseConsistency => RangeStatus::WrapTargetFail,
            DeviceError::RangeIgnoreThreshold => RangeStatus::XtalkSignalFail,
            DeviceError::MinClip => RangeStatus::RangeValidMinRangeClipped,
            DeviceError::RangeComplete => RangeStatus::RangeValid,
            other => {
                trace!("No range status for device error {}", u8::from(other));
                RangeStatus::None
            }
        }
    }

    /// `true` for the statuses whose distance is usable.
    #[must_use]
    pub fn is_valid(self) -> bool {
        matches!(
            self,
            RangeStatus::RangeValid
                | RangeStatus::RangeValidMinRangeClipped
                | RangeStatus::RangeValidNoWrapCheckFail
                | RangeStatus::RangeValidMergedPulse
        )
    }
}

impl From<RangeStatus> for u8 {
    fn from(status: RangeStatus) -> Self {
        status as u8
    }
}

impl From<DeviceError> for u8 {
    fn from(error: DeviceError) -> Self {
        match error {
            DeviceError::VcselContinuityTestFailure => 1,
            DeviceError::VcselWatchdogTestFailure => 2,
            DeviceError::NoVhvValueFound => 3,
            DeviceError::MsrcNoTarget => 4,
            DeviceError::RangePhaseCheck => 5,
            DeviceError::SigmaThresholdCheck => 6,
            DeviceError::PhaseConsistency => 7,
            DeviceError::MinClip => 8,
            DeviceError::RangeComplete => 9,
            DeviceError::AlgoUnderflow => 10,
            DeviceError::AlgoOverflow => 11,
            DeviceError::RangeIgnoreThreshold => 12,
            DeviceError::UserRoiClip => 13,
            DeviceError::RefSpadCharNotEnoughSpads => 14,
            DeviceError::RefSpadCharMoreThanTarget => 15,
            DeviceError::RefSpadCharLessThanTarget => 16,
            DeviceError::MultClipFail => 17,
            DeviceError::GphStreamCount0Ready => 18,
            DeviceError::RangeCompleteNoWrapCheck => 19,
            DeviceError::EventConsistency => 20,
            DeviceError::MinSignalEventCheck => 21,
            DeviceError::RangeCompleteMergedPulse => 22,
            DeviceError::Unknown(value) => value,
        }
    }
}

/// Free-function form of [`RangeStatus::from_device_error`].
#[must_use]
pub fn decode_range_status(raw: u8) -> RangeStatus {
    RangeStatus::from_device_error(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    // index is the masked device code, value the published status
    const EXPECTED: [u8; 32] = [
        255, 255, 255, 255, 2, 4, 1, 7, 3, 0, 255, 255, 9, 255, 255, 255,
        255, 255, 10, 6, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255,
    ];

    #[test]
    fn every_masked_code_matches_table() {
        for code in 0u8..32 {
            let status = decode_range_status(code);
            assert_eq!(
                u8::from(status),
                EXPECTED[usize::from(code)],
                "device code {code}"
            );
        }
    }

    #[test]
    fn upper_bits_are_ignored() {
        for code in 0u8..32 {
            assert_eq!(decode_range_status(code), decode_range_status(code | 0xE0));
            assert_eq!(decode_range_status(code), decode_range_status(code | 0x20));
        }
    }

    #[test]
    fn named_mappings() {
        assert_eq!(decode_range_status(9), RangeStatus::RangeValid);
        assert_eq!(decode_range_status(6), RangeStatus::SigmaFail);
        assert_eq!(decode_range_status(4), RangeStatus::SignalFail);
        assert_eq!(decode_range_status(18), RangeStatus::SynchronisationInt);
        assert_eq!(decode_range_status(22), RangeStatus::None);
        assert_eq!(decode_range_status(0), RangeStatus::None);
    }

    #[test]
    fn device_error_codes_survive_conversion() {
        for code in 0u8..=u8::MAX {
            assert_eq!(u8::from(DeviceError::from(code)), code);
        }
        assert_eq!(DeviceError::from(0), DeviceError::Unknown(0));
        assert_eq!(DeviceError::from(23), DeviceError::Unknown(23));
    }

    #[test]
    fn validity() {
        assert!(RangeStatus::RangeValid.is_valid());
        assert!(RangeStatus::RangeValidNoWrapCheckFail.is_valid());
        assert!(!RangeStatus::SigmaFail.is_valid());
        assert!(!RangeStatus::None.is_valid());
    }
}
