//! Basler feature node names (SFNC and Basler-specific).
//!
//! GigE cameras use the older `…Abs`/`…Raw` names; USB3 Vision cameras use
//! the SFNC 2.x names.

// Shared by both families.
pub const USER_SET_SELECTOR: &str = "UserSetSelector";
pub const USER_SET_LOAD: &str = "UserSetLoad";
pub const TRIGGER_SELECTOR: &str = "TriggerSelector";
pub const TRIGGER_SOURCE: &str = "TriggerSource";
pub const TRIGGER_MODE: &str = "TriggerMode";
pub const EXPOSURE_AUTO: &str = "ExposureAuto";
pub const GAIN_AUTO: &str = "GainAuto";
pub const GAMMA: &str = "Gamma";
pub const BINNING_HORIZONTAL: &str = "BinningHorizontal";
pub const BINNING_VERTICAL: &str = "BinningVertical";

/// Enumeration entries used by the adapter.
pub mod entries {
    pub const DEFAULT: &str = "Default";
    pub const SOFTWARE: &str = "Software";
    pub const FRAME_START: &str = "FrameStart";
    pub const ON: &str = "On";
    pub const OFF: &str = "Off";
    pub const USER: &str = "User";
    pub const AUTO: &str = "Auto";
}

/// GigE Vision camera nodes.
pub mod gige {
    pub const EXPOSURE_TIME_ABS: &str = "ExposureTimeAbs";
    pub const GAIN_RAW: &str = "GainRaw";
    pub const GAMMA_ENABLE: &str = "GammaEnable";
    pub const GAMMA_SELECTOR: &str = "GammaSelector";
    pub const AUTO_EXPOSURE_TIME_ABS_LOWER_LIMIT: &str = "AutoExposureTimeAbsLowerLimit";
    pub const AUTO_EXPOSURE_TIME_ABS_UPPER_LIMIT: &str = "AutoExposureTimeAbsUpperLimit";
    pub const AUTO_GAIN_RAW_LOWER_LIMIT: &str = "AutoGainRawLowerLimit";
    pub const AUTO_GAIN_RAW_UPPER_LIMIT: &str = "AutoGainRawUpperLimit";
    pub const RESULTING_FRAME_RATE_ABS: &str = "ResultingFrameRateAbs";
    pub const AUTO_TARGET_VALUE: &str = "AutoTargetValue";

    /// Stream channel packet size (bytes).
    pub const GEV_SCPS_PACKET_SIZE: &str = "GevSCPSPacketSize";
    /// Stream channel inter-packet delay (ticks).
    pub const GEV_SCPD: &str = "GevSCPD";

    pub const SEQUENCE_ENABLE: &str = "SequenceEnable";
    pub const SEQUENCE_ADVANCE_MODE: &str = "SequenceAdvanceMode";
    pub const SEQUENCE_SET_TOTAL_NUMBER: &str = "SequenceSetTotalNumber";
    pub const SEQUENCE_SET_INDEX: &str = "SequenceSetIndex";
    pub const SEQUENCE_SET_STORE: &str = "SequenceSetStore";
}

/// USB3 Vision camera nodes.
pub mod usb {
    pub const EXPOSURE_TIME: &str = "ExposureTime";
    pub const GAIN: &str = "Gain";
    pub const AUTO_EXPOSURE_TIME_LOWER_LIMIT: &str = "AutoExposureTimeLowerLimit";
    pub const AUTO_EXPOSURE_TIME_UPPER_LIMIT: &str = "AutoExposureTimeUpperLimit";
    pub const AUTO_GAIN_LOWER_LIMIT: &str = "AutoGainLowerLimit";
    pub const AUTO_GAIN_UPPER_LIMIT: &str = "AutoGainUpperLimit";
    pub const RESULTING_FRAME_RATE: &str = "ResultingFrameRate";
    pub const AUTO_TARGET_BRIGHTNESS: &str = "AutoTargetBrightness";

    pub const SEQUENCER_MODE: &str = "SequencerMode";
    pub const SEQUENCER_CONFIGURATION_MODE: &str = "SequencerConfigurationMode";
    pub const SEQUENCER_SET_SELECTOR: &str = "SequencerSetSelector";
    pub const SEQUENCER_SET_NEXT: &str = "SequencerSetNext";
    pub const SEQUENCER_SET_SAVE: &str = "SequencerSetSave";
}
