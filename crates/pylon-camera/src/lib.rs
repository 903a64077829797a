//! pylon-camera: Parameter adapter for Basler cameras.
//!
//! Maps exposure, gain, gamma, auto function limits, sequencer programming
//! and startup settings onto GenICam feature nodes, one implementation per
//! transport family.

pub mod camera;
pub mod gige;
pub mod params;
pub mod usb;

pub use camera::{clamp_target, connect, CameraError, FeatureSet, PylonCamera};
pub use gige::GigECamera;
pub use params::StartupParameters;
pub use usb::UsbCamera;
