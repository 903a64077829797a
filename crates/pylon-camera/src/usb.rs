//! USB3 Vision cameras (Basler ace USB, SFNC 2.x node names).

use crate::camera::{
    load_default_user_set, log_binning, log_range, logged, range, require_finite, run_command,
    set_exposure_impl, write_clamped, write_enum, write_int, write_number, CameraError,
    FeatureSet, PylonCamera,
};
use crate::params::StartupParameters;
use pylon_hw::features::{self, entries, usb};
use pylon_hw::{Device, DeviceInfo, NodeError};

const TYPE_NAME: &str = "USB";

static USB_FEATURES: FeatureSet = FeatureSet {
    exposure_time: usb::EXPOSURE_TIME,
    gain: usb::GAIN,
    gamma: features::GAMMA,
    auto_exposure_time_lower_limit: usb::AUTO_EXPOSURE_TIME_LOWER_LIMIT,
    auto_exposure_time_upper_limit: usb::AUTO_EXPOSURE_TIME_UPPER_LIMIT,
    auto_gain_lower_limit: usb::AUTO_GAIN_LOWER_LIMIT,
    auto_gain_upper_limit: usb::AUTO_GAIN_UPPER_LIMIT,
    resulting_frame_rate: usb::RESULTING_FRAME_RATE,
    auto_target_brightness: usb::AUTO_TARGET_BRIGHTNESS,
    brightness_scale: 1.0 / 255.0,
};

/// Parameter adapter for a USB3 Vision camera.
pub struct UsbCamera<D> {
    device: D,
}

impl<D: Device> UsbCamera<D> {
    pub fn new(device: D) -> Self {
        Self { device }
    }

    pub fn get_ref(&self) -> &D {
        &self.device
    }

    pub fn get_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn into_inner(self) -> D {
        self.device
    }

    fn startup(&mut self, parameters: &StartupParameters) -> Result<(), NodeError> {
        let dev: &mut dyn Device = &mut self.device;

        load_default_user_set(dev)?;
        write_enum(dev, features::TRIGGER_SELECTOR, entries::FRAME_START)?;
        write_enum(dev, features::TRIGGER_SOURCE, entries::SOFTWARE)?;
        write_enum(dev, features::TRIGGER_MODE, entries::ON)?;

        let (exposure_min, exposure_max) = range(dev, usb::EXPOSURE_TIME)?;
        write_number(dev, usb::AUTO_EXPOSURE_TIME_LOWER_LIMIT, exposure_min)?;
        write_number(dev, usb::AUTO_EXPOSURE_TIME_UPPER_LIMIT, exposure_max)?;

        let (gain_min, gain_max) = range(dev, usb::GAIN)?;
        write_number(dev, usb::AUTO_GAIN_LOWER_LIMIT, gain_min)?;
        write_number(dev, usb::AUTO_GAIN_UPPER_LIMIT, gain_max)?;

        log_binning(dev)?;
        tracing::info!(
            min = exposure_min,
            max = exposure_max,
            "cam has exposure time range, measured in microseconds"
        );
        tracing::info!(min = gain_min, max = gain_max, "cam has gain range, measured in dB");
        log_range(dev, features::GAMMA, "gamma")?;
        log_range(
            dev,
            usb::AUTO_TARGET_BRIGHTNESS,
            "auto brightness (normalized average pixel intensity)",
        )?;

        tracing::debug!(
            mtu_size = parameters.mtu_size,
            inter_package_delay = parameters.inter_package_delay,
            "packet size and inter-packet delay do not apply to USB cameras"
        );
        Ok(())
    }

    fn program_sequencer(&mut self, exposure_times: &[f64]) -> Result<Vec<f64>, CameraError> {
        write_enum(&mut self.device, usb::SEQUENCER_MODE, entries::OFF)?;
        write_enum(&mut self.device, usb::SEQUENCER_CONFIGURATION_MODE, entries::ON)?;

        let count = exposure_times.len() as i64;
        let mut reached = Vec::with_capacity(exposure_times.len());
        for (index, &seconds) in exposure_times.iter().enumerate() {
            let index = index as i64;
            write_int(&mut self.device, usb::SEQUENCER_SET_SELECTOR, index)?;
            write_int(&mut self.device, usb::SEQUENCER_SET_NEXT, (index + 1) % count)?;
            let exposure = set_exposure_impl(self, seconds * 1e6)?;
            reached.push(exposure / 1e6);
            run_command(&mut self.device, usb::SEQUENCER_SET_SAVE)?;
        }

        write_enum(&mut self.device, usb::SEQUENCER_CONFIGURATION_MODE, entries::OFF)?;
        write_enum(&mut self.device, usb::SEQUENCER_MODE, entries::ON)?;
        tracing::debug!(sets = reached.len(), "sequencer programmed");
        Ok(reached)
    }
}

impl<D: Device> PylonCamera for UsbCamera<D> {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn features(&self) -> &'static FeatureSet {
        &USB_FEATURES
    }

    fn info(&self) -> &DeviceInfo {
        self.device.info()
    }

    fn device(&mut self) -> &mut dyn Device {
        &mut self.device
    }

    fn apply_startup_settings(&mut self, parameters: &StartupParameters) -> Result<(), CameraError> {
        let result = self.startup(parameters).map_err(CameraError::from);
        logged(result, TYPE_NAME, "apply startup settings")?;
        tracing::info!("USB startup settings applied");
        Ok(())
    }

    fn set_gamma(&mut self, target: f64) -> Result<f64, CameraError> {
        if !self.device.is_available(features::GAMMA) {
            tracing::error!("cannot set gamma: Gamma node is not available");
            return Err(CameraError::Access {
                feature: features::GAMMA,
                family: TYPE_NAME,
            });
        }
        let result = require_finite("gamma", target).and_then(|()| {
            let mut node = self.gamma()?;
            write_clamped(&mut node, "gamma", target)
        });
        logged(result, TYPE_NAME, "set gamma")
    }

    fn setup_sequencer(&mut self, exposure_times: &[f64]) -> Result<Vec<f64>, CameraError> {
        if exposure_times.is_empty() {
            tracing::error!("no exposure times given for the sequencer");
            return Err(CameraError::EmptySequence);
        }
        if !self.device.is_writable(usb::SEQUENCER_MODE) {
            tracing::error!("sequencer mode not writable");
            return Err(NodeError::NotWritable(usb::SEQUENCER_MODE.to_string()).into());
        }
        let result = self.program_sequencer(exposure_times);
        logged(result, TYPE_NAME, "setup sequencer")
    }
}
