//! Camera family capability set and the logic shared by all families.

use crate::gige::GigECamera;
use crate::params::StartupParameters;
use crate::usb::UsbCamera;
use pylon_hw::features::{self, entries};
use pylon_hw::{Device, DeviceInfo, FeatureNode, NodeError, Transport};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("error while accessing {feature} in {family} camera")]
    Access {
        feature: &'static str,
        family: &'static str,
    },
    #[error(transparent)]
    Device(#[from] NodeError),
    #[error("{label} target {value} is not a number")]
    InvalidTarget { label: &'static str, value: f64 },
    #[error("sequencer program has no exposure times")]
    EmptySequence,
    #[error("unsupported transport layer: {0}")]
    UnsupportedTransport(Transport),
}

/// Node names a camera family exposes for the generic accessors.
#[derive(Debug)]
pub struct FeatureSet {
    pub exposure_time: &'static str,
    pub gain: &'static str,
    pub gamma: &'static str,
    pub auto_exposure_time_lower_limit: &'static str,
    pub auto_exposure_time_upper_limit: &'static str,
    pub auto_gain_lower_limit: &'static str,
    pub auto_gain_upper_limit: &'static str,
    pub resulting_frame_rate: &'static str,
    pub auto_target_brightness: &'static str,
    /// Device units per step of the 8-bit (0–255) brightness scale.
    pub brightness_scale: f64,
}

/// Parameter operations of one camera family.
///
/// Families implement the startup, gamma and sequencer operations and name
/// their nodes through [`FeatureSet`]; accessors and the exposure, gain and
/// brightness setters are shared.
pub trait PylonCamera {
    /// Transport family name, e.g. `"GigE"`.
    fn type_name(&self) -> &'static str;

    fn features(&self) -> &'static FeatureSet;

    fn info(&self) -> &DeviceInfo;

    fn device(&mut self) -> &mut dyn Device;

    /// Load factory defaults, re-enable software triggering, open the auto
    /// function limits to the full hardware range and apply transport
    /// settings.
    ///
    /// Not transactional: on error the camera keeps whatever was written
    /// before the failing call.
    fn apply_startup_settings(&mut self, parameters: &StartupParameters) -> Result<(), CameraError>;

    /// Set gamma, clamped to the node range. Returns the value read back.
    fn set_gamma(&mut self, target: f64) -> Result<f64, CameraError>;

    /// Program one sequencer set per exposure time (seconds) and enable the
    /// sequencer. Returns the exposure times actually set, in seconds.
    ///
    /// Sets stored before a failure stay stored.
    fn setup_sequencer(&mut self, exposure_times: &[f64]) -> Result<Vec<f64>, CameraError>;

    fn exposure_time(&mut self) -> Result<FeatureNode<'_>, CameraError> {
        let (family, name) = (self.type_name(), self.features().exposure_time);
        access(self.device(), name, family)
    }

    fn gain(&mut self) -> Result<FeatureNode<'_>, CameraError> {
        let (family, name) = (self.type_name(), self.features().gain);
        access(self.device(), name, family)
    }

    fn gamma(&mut self) -> Result<FeatureNode<'_>, CameraError> {
        let (family, name) = (self.type_name(), self.features().gamma);
        access(self.device(), name, family)
    }

    fn auto_exposure_time_lower_limit(&mut self) -> Result<FeatureNode<'_>, CameraError> {
        let (family, name) = (self.type_name(), self.features().auto_exposure_time_lower_limit);
        access(self.device(), name, family)
    }

    fn auto_exposure_time_upper_limit(&mut self) -> Result<FeatureNode<'_>, CameraError> {
        let (family, name) = (self.type_name(), self.features().auto_exposure_time_upper_limit);
        access(self.device(), name, family)
    }

    fn auto_gain_lower_limit(&mut self) -> Result<FeatureNode<'_>, CameraError> {
        let (family, name) = (self.type_name(), self.features().auto_gain_lower_limit);
        access(self.device(), name, family)
    }

    fn auto_gain_upper_limit(&mut self) -> Result<FeatureNode<'_>, CameraError> {
        let (family, name) = (self.type_name(), self.features().auto_gain_upper_limit);
        access(self.device(), name, family)
    }

    fn resulting_frame_rate(&mut self) -> Result<FeatureNode<'_>, CameraError> {
        let (family, name) = (self.type_name(), self.features().resulting_frame_rate);
        access(self.device(), name, family)
    }

    fn auto_target_brightness(&mut self) -> Result<FeatureNode<'_>, CameraError> {
        let (family, name) = (self.type_name(), self.features().auto_target_brightness);
        access(self.device(), name, family)
    }

    /// Set the exposure time in microseconds, switching auto exposure off.
    /// Returns the exposure time read back.
    fn set_exposure(&mut self, target: f64) -> Result<f64, CameraError> {
        let result = set_exposure_impl(self, target);
        logged(result, self.type_name(), "set exposure")
    }

    /// Set gain as a fraction of the gain range, switching auto gain off.
    /// Returns the fraction read back.
    fn set_gain(&mut self, target: f64) -> Result<f64, CameraError> {
        let result = set_gain_impl(self, target);
        logged(result, self.type_name(), "set gain")
    }

    /// Set the auto function brightness target on the 0–255 scale.
    fn set_auto_target_brightness(&mut self, target: f64) -> Result<f64, CameraError> {
        let scale = self.features().brightness_scale;
        let result = require_finite("auto target brightness", target).and_then(|()| {
            let mut node = self.auto_target_brightness()?;
            write_clamped(&mut node, "auto target brightness", target * scale)
        });
        logged(result, self.type_name(), "set auto target brightness").map(|v| v / scale)
    }

    fn current_exposure(&mut self) -> Result<f64, CameraError> {
        Ok(self.exposure_time()?.value()?)
    }

    fn current_gain(&mut self) -> Result<f64, CameraError> {
        let node = self.gain()?;
        let (min, max) = (node.min()?, node.max()?);
        let value = node.value()?;
        Ok(if max > min { (value - min) / (max - min) } else { 0.0 })
    }

    fn current_gamma(&mut self) -> Result<f64, CameraError> {
        Ok(self.gamma()?.value()?)
    }

    fn current_frame_rate(&mut self) -> Result<f64, CameraError> {
        Ok(self.resulting_frame_rate()?.value()?)
    }
}

/// Wrap `device` in the adapter for its transport family.
pub fn connect<D: Device + 'static>(device: D) -> Result<Box<dyn PylonCamera>, CameraError> {
    let transport = device.info().transport;
    let camera: Box<dyn PylonCamera> = match transport {
        Transport::GigE => Box::new(GigECamera::new(device)),
        Transport::Usb => Box::new(UsbCamera::new(device)),
        other => return Err(CameraError::UnsupportedTransport(other)),
    };
    let info = camera.info();
    tracing::info!(
        model = %info.model_name,
        serial = %info.serial_number,
        family = camera.type_name(),
        "camera connected"
    );
    Ok(camera)
}

/// Unlogged body of [`PylonCamera::set_exposure`], for operations that log
/// at their own boundary.
pub(crate) fn set_exposure_impl<C: PylonCamera + ?Sized>(
    cam: &mut C,
    target: f64,
) -> Result<f64, CameraError> {
    require_finite("exposure", target)?;
    // Resolve the node before touching ExposureAuto.
    cam.exposure_time()?;
    let dev = cam.device();
    if dev.is_writable(features::EXPOSURE_AUTO) {
        dev.set_enum_value(features::EXPOSURE_AUTO, entries::OFF)?;
    }
    let mut node = cam.exposure_time()?;
    write_clamped(&mut node, "exposure", target)
}

fn set_gain_impl<C: PylonCamera + ?Sized>(cam: &mut C, target: f64) -> Result<f64, CameraError> {
    require_finite("gain", target)?;
    let fraction = clamp_target("gain", target, 0.0, 1.0);
    cam.gain()?;
    let dev = cam.device();
    if dev.is_writable(features::GAIN_AUTO) {
        dev.set_enum_value(features::GAIN_AUTO, entries::OFF)?;
    }
    let mut node = cam.gain()?;
    let (min, max) = (node.min()?, node.max()?);
    node.set_value(min + fraction * (max - min))?;
    let reached = node.value()?;
    Ok(if max > min { (reached - min) / (max - min) } else { 0.0 })
}

pub(crate) fn access<'a>(
    device: &'a mut dyn Device,
    feature: &'static str,
    family: &'static str,
) -> Result<FeatureNode<'a>, CameraError> {
    FeatureNode::open(device, feature).map_err(|e| match e {
        NodeError::NotAvailable(_) => CameraError::Access { feature, family },
        other => CameraError::Device(other),
    })
}

/// Reject NaN and infinite targets before anything is written.
pub(crate) fn require_finite(label: &'static str, target: f64) -> Result<(), CameraError> {
    if target.is_finite() {
        Ok(())
    } else {
        Err(CameraError::InvalidTarget { label, value: target })
    }
}

/// Clamp `target` into `[min, max]`, warning when it had to move.
pub fn clamp_target(label: &str, target: f64, min: f64, max: f64) -> f64 {
    if target < min {
        tracing::warn!(requested = target, limit = min, "desired {label} unreachable, setting to lower limit");
        min
    } else if target > max {
        tracing::warn!(requested = target, limit = max, "desired {label} unreachable, setting to upper limit");
        max
    } else {
        target
    }
}

/// Clamp, write and read back a numeric node.
pub(crate) fn write_clamped(
    node: &mut FeatureNode<'_>,
    label: &'static str,
    target: f64,
) -> Result<f64, CameraError> {
    require_finite(label, target)?;
    let (min, max) = (node.min()?, node.max()?);
    let value = clamp_target(label, target, min, max);
    node.set_value(value)?;
    Ok(node.value()?)
}

pub(crate) fn logged<T>(
    result: Result<T, CameraError>,
    family: &str,
    operation: &str,
) -> Result<T, CameraError> {
    result.map_err(|e| {
        tracing::error!(family, operation, error = %e, "camera operation failed");
        e
    })
}

fn require_writable(device: &dyn Device, name: &str) -> Result<(), NodeError> {
    if !device.is_available(name) {
        Err(NodeError::NotAvailable(name.to_string()))
    } else if !device.is_writable(name) {
        Err(NodeError::NotWritable(name.to_string()))
    } else {
        Ok(())
    }
}

pub(crate) fn write_enum(device: &mut dyn Device, name: &str, entry: &str) -> Result<(), NodeError> {
    require_writable(device, name)?;
    device.set_enum_value(name, entry)
}

pub(crate) fn write_int(device: &mut dyn Device, name: &str, value: i64) -> Result<(), NodeError> {
    require_writable(device, name)?;
    device.set_int_value(name, value)
}

pub(crate) fn write_bool(device: &mut dyn Device, name: &str, value: bool) -> Result<(), NodeError> {
    require_writable(device, name)?;
    device.set_bool_value(name, value)
}

/// Write a numeric node of either interface type.
pub(crate) fn write_number(
    device: &mut dyn Device,
    name: &'static str,
    value: f64,
) -> Result<(), NodeError> {
    FeatureNode::open(device, name)?.set_value(value)
}

pub(crate) fn run_command(device: &mut dyn Device, name: &str) -> Result<(), NodeError> {
    require_writable(device, name)?;
    device.execute(name)
}

pub(crate) fn range(device: &mut dyn Device, name: &'static str) -> Result<(f64, f64), NodeError> {
    let node = FeatureNode::open(device, name)?;
    Ok((node.min()?, node.max()?))
}

/// Select the factory default user set and load it.
pub(crate) fn load_default_user_set(device: &mut dyn Device) -> Result<(), NodeError> {
    write_enum(device, features::USER_SET_SELECTOR, entries::DEFAULT)?;
    run_command(device, features::USER_SET_LOAD)
}

/// Log the range of an optional node; unavailable nodes are skipped.
pub(crate) fn log_range(
    device: &mut dyn Device,
    name: &'static str,
    what: &str,
) -> Result<(), NodeError> {
    if !device.is_available(name) {
        tracing::info!(node = name, "cam does not support {what}");
        return Ok(());
    }
    let (min, max) = range(device, name)?;
    tracing::info!(node = name, min, max, "cam has {what} range");
    Ok(())
}

pub(crate) fn log_binning(device: &mut dyn Device) -> Result<(), NodeError> {
    if device.is_available(features::BINNING_HORIZONTAL)
        && device.is_available(features::BINNING_VERTICAL)
    {
        let (x_min, x_max) = range(device, features::BINNING_HORIZONTAL)?;
        let (y_min, y_max) = range(device, features::BINNING_VERTICAL)?;
        tracing::info!(x_min, x_max, y_min, y_max, "cam has binning range");
    } else {
        tracing::info!("cam does not support binning");
    }
    Ok(())
}
