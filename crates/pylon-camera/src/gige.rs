//! GigE Vision cameras (Basler ace/scout GigE, `…Abs`/`…Raw` node names).

use crate::camera::{
    load_default_user_set, log_binning, log_range, logged, range, require_finite, run_command,
    set_exposure_impl, write_bool, write_clamped, write_enum, write_int, write_number,
    CameraError, FeatureSet, PylonCamera,
};
use crate::params::StartupParameters;
use pylon_hw::features::{self, entries, gige};
use pylon_hw::{Device, DeviceInfo, NodeError};

const TYPE_NAME: &str = "GigE";

static GIGE_FEATURES: FeatureSet = FeatureSet {
    exposure_time: gige::EXPOSURE_TIME_ABS,
    gain: gige::GAIN_RAW,
    gamma: features::GAMMA,
    auto_exposure_time_lower_limit: gige::AUTO_EXPOSURE_TIME_ABS_LOWER_LIMIT,
    auto_exposure_time_upper_limit: gige::AUTO_EXPOSURE_TIME_ABS_UPPER_LIMIT,
    auto_gain_lower_limit: gige::AUTO_GAIN_RAW_LOWER_LIMIT,
    auto_gain_upper_limit: gige::AUTO_GAIN_RAW_UPPER_LIMIT,
    resulting_frame_rate: gige::RESULTING_FRAME_RATE_ABS,
    auto_target_brightness: gige::AUTO_TARGET_VALUE,
    brightness_scale: 1.0,
};

/// Parameter adapter for a GigE Vision camera.
pub struct GigECamera<D> {
    device: D,
}

impl<D: Device> GigECamera<D> {
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

        // Drop previous settings (sequencer etc.); the default set is free-running.
        load_default_user_set(dev)?;
        // Loading the default user set switches the software trigger off.
        write_enum(dev, features::TRIGGER_SOURCE, entries::SOFTWARE)?;
        write_enum(dev, features::TRIGGER_MODE, entries::ON)?;

        let (exposure_min, exposure_max) = range(dev, gige::EXPOSURE_TIME_ABS)?;
        write_number(dev, gige::AUTO_EXPOSURE_TIME_ABS_LOWER_LIMIT, exposure_min)?;
        write_number(dev, gige::AUTO_EXPOSURE_TIME_ABS_UPPER_LIMIT, exposure_max)?;

        let (gain_min, gain_max) = range(dev, gige::GAIN_RAW)?;
        write_number(dev, gige::AUTO_GAIN_RAW_LOWER_LIMIT, gain_min)?;
        write_number(dev, gige::AUTO_GAIN_RAW_UPPER_LIMIT, gain_max)?;

        log_binning(dev)?;
        tracing::info!(
            min = exposure_min,
            max = exposure_max,
            "cam has exposure time range, measured in microseconds"
        );
        tracing::info!(
            min = gain_min,
            max = gain_max,
            "cam has gain range, measured in device specific units"
        );
        log_range(dev, features::GAMMA, "gamma")?;
        log_range(
            dev,
            gige::AUTO_TARGET_VALUE,
            "auto brightness (average pixel intensity)",
        )?;

        // Packets above 1500 bytes need jumbo frames on the host interface.
        // Raise the inter-packet delay if buffers are grabbed incompletely.
        write_int(dev, gige::GEV_SCPS_PACKET_SIZE, parameters.mtu_size)?;
        write_int(dev, gige::GEV_SCPD, parameters.inter_package_delay)?;
        Ok(())
    }

    fn enable_user_gamma(&mut self) -> Result<(), NodeError> {
        let dev: &mut dyn Device = &mut self.device;
        // GigE cameras ignore Gamma unless it is enabled.
        if dev.is_available(gige::GAMMA_ENABLE) {
            write_bool(dev, gige::GAMMA_ENABLE, true)?;
        }
        // Only the user selector takes the Gamma value into account.
        if dev.is_available(gige::GAMMA_SELECTOR) {
            write_enum(dev, gige::GAMMA_SELECTOR, entries::USER)?;
        }
        Ok(())
    }

    fn program_sequencer(&mut self, exposure_times: &[f64]) -> Result<Vec<f64>, CameraError> {
        write_bool(&mut self.device, gige::SEQUENCE_ENABLE, false)?;
        write_enum(&mut self.device, gige::SEQUENCE_ADVANCE_MODE, entries::AUTO)?;
        write_int(
            &mut self.device,
            gige::SEQUENCE_SET_TOTAL_NUMBER,
            exposure_times.len() as i64,
        )?;

        let mut reached = Vec::with_capacity(exposure_times.len());
        for (index, &seconds) in exposure_times.iter().enumerate() {
            write_int(&mut self.device, gige::SEQUENCE_SET_INDEX, index as i64)?;
            let exposure = set_exposure_impl(self, seconds * 1e6)?;
            reached.push(exposure / 1e6);
            run_command(&mut self.device, gige::SEQUENCE_SET_STORE)?;
        }

        write_bool(&mut self.device, gige::SEQUENCE_ENABLE, true)?;
        tracing::debug!(sets = reached.len(), "sequencer programmed");
        Ok(reached)
    }
}

impl<D: Device> PylonCamera for GigECamera<D> {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn features(&self) -> &'static FeatureSet {
        &GIGE_FEATURES
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
        tracing::info!(
            mtu_size = parameters.mtu_size,
            inter_package_delay = parameters.inter_package_delay,
            "GigE startup settings applied"
        );
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
            self.enable_user_gamma()?;
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
        if !self.device.is_writable(gige::SEQUENCE_ENABLE) {
            tracing::error!("sequence mode not enabled");
            return Err(NodeError::NotWritable(gige::SEQUENCE_ENABLE.to_string()).into());
        }
        let result = self.program_sequencer(exposure_times);
        logged(result, TYPE_NAME, "setup sequencer")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pylon_hw::{profiles, Access, SimDevice, Transport};

    fn camera() -> GigECamera<SimDevice> {
        GigECamera::new(profiles::sim_device("acA1300-30gc").unwrap())
    }

    fn gamma_sim(with_switches: bool) -> SimDevice {
        let builder = SimDevice::builder("acA-gamma", Transport::GigE)
            .float(features::GAMMA, 1.0, 0.1, 2.0);
        let builder = if with_switches {
            builder
                .boolean(gige::GAMMA_ENABLE, false)
                .enumeration(gige::GAMMA_SELECTOR, "sRGB", &["User", "sRGB"])
        } else {
            builder
        };
        builder.build()
    }

    fn position(dev: &SimDevice, access: Access) -> usize {
        dev.accesses().iter().position(|a| *a == access).unwrap()
    }

    #[test]
    fn test_type_name() {
        assert_eq!(camera().type_name(), "GigE");
    }

    #[test]
    fn test_startup_reasserts_trigger_and_opens_auto_limits() {
        let mut cam = camera();
        let params = StartupParameters {
            mtu_size: 8192,
            inter_package_delay: 2500,
        };
        cam.apply_startup_settings(&params).unwrap();

        let dev = cam.get_ref();
        assert_eq!(dev.enum_value(features::TRIGGER_SOURCE).unwrap(), "Software");
        assert_eq!(dev.enum_value(features::TRIGGER_MODE).unwrap(), "On");
        assert_eq!(
            dev.float_value(gige::AUTO_EXPOSURE_TIME_ABS_LOWER_LIMIT).unwrap(),
            16.0
        );
        assert_eq!(
            dev.float_value(gige::AUTO_EXPOSURE_TIME_ABS_UPPER_LIMIT).unwrap(),
            1_000_000.0
        );
        assert_eq!(dev.int_value(gige::AUTO_GAIN_RAW_LOWER_LIMIT).unwrap(), 192);
        assert_eq!(dev.int_value(gige::AUTO_GAIN_RAW_UPPER_LIMIT).unwrap(), 1023);
        assert_eq!(dev.int_value(gige::GEV_SCPS_PACKET_SIZE).unwrap(), 8192);
        assert_eq!(dev.int_value(gige::GEV_SCPD).unwrap(), 2500);

        // Trigger is re-asserted after the user set load.
        let load = position(dev, Access::Execute(features::USER_SET_LOAD.into()));
        let trigger = position(dev, Access::Write(features::TRIGGER_MODE.into()));
        assert!(load < trigger);
    }

    #[test]
    fn test_startup_fails_fast_without_rollback() {
        let mut cam = camera();
        cam.get_mut().fail_on(gige::GEV_SCPD, "write timed out");
        let err = cam
            .apply_startup_settings(&StartupParameters::default())
            .unwrap_err();
        assert!(matches!(err, CameraError::Device(NodeError::Generic { .. })));
        assert!(err.to_string().contains("write timed out"));

        // Everything before the failing write stays applied.
        let dev = cam.get_ref();
        assert_eq!(dev.enum_value(features::TRIGGER_MODE).unwrap(), "On");
        assert_eq!(dev.int_value(gige::GEV_SCPS_PACKET_SIZE).unwrap(), 3000);
    }

    #[test]
    fn test_startup_rejects_packet_size_out_of_range() {
        let mut cam = camera();
        let params = StartupParameters {
            mtu_size: 20_000,
            inter_package_delay: 1000,
        };
        let err = cam.apply_startup_settings(&params).unwrap_err();
        assert!(matches!(err, CameraError::Device(NodeError::OutOfRange { .. })));
    }

    #[test]
    fn test_set_gamma_clamps_and_enables_user_gamma() {
        let mut cam = GigECamera::new(gamma_sim(true));
        let reached = cam.set_gamma(5.0).unwrap();
        assert_eq!(reached, 2.0);

        let dev = cam.get_ref();
        assert!(dev.bool_value(gige::GAMMA_ENABLE).unwrap());
        assert_eq!(dev.enum_value(gige::GAMMA_SELECTOR).unwrap(), "User");

        let gamma_write = position(dev, Access::Write(features::GAMMA.into()));
        assert!(position(dev, Access::Write(gige::GAMMA_ENABLE.into())) < gamma_write);
        assert!(position(dev, Access::Write(gige::GAMMA_SELECTOR.into())) < gamma_write);
    }

    #[test]
    fn test_set_gamma_lower_clamp_without_switches() {
        let mut cam = GigECamera::new(gamma_sim(false));
        assert_eq!(cam.set_gamma(0.0).unwrap(), 0.1);
        assert_eq!(cam.set_gamma(0.7).unwrap(), 0.7);
        assert_eq!(cam.current_gamma().unwrap(), 0.7);

        let dev = cam.get_ref();
        assert!(dev.accesses_to(gige::GAMMA_ENABLE).is_empty());
        assert!(dev.accesses_to(gige::GAMMA_SELECTOR).is_empty());
    }

    #[test]
    fn test_set_gamma_unavailable() {
        let mut dev = gamma_sim(true);
        dev.set_available(features::GAMMA, false);
        let mut cam = GigECamera::new(dev);
        let err = cam.set_gamma(1.0).unwrap_err();
        assert!(matches!(err, CameraError::Access { feature: "Gamma", .. }));
        // Nothing was touched, not even the enable switch.
        assert!(cam.get_ref().writes().is_empty());
    }

    #[test]
    fn test_set_gamma_selector_failure() {
        let mut dev = gamma_sim(true);
        dev.fail_on(gige::GAMMA_SELECTOR, "access denied");
        let mut cam = GigECamera::new(dev);
        let err = cam.set_gamma(1.5).unwrap_err();
        assert!(err.to_string().contains("access denied"));
        assert!(cam.get_ref().accesses_to(features::GAMMA).is_empty());
    }

    #[test]
    fn test_set_gamma_enable_failure_and_nan() {
        let mut dev = gamma_sim(true);
        dev.fail_on(gige::GAMMA_ENABLE, "access denied");
        let mut cam = GigECamera::new(dev);
        let err = cam.set_gamma(1.5).unwrap_err();
        assert!(matches!(err, CameraError::Device(NodeError::Generic { .. })));
        assert!(cam.get_ref().accesses_to(features::GAMMA).is_empty());

        cam.get_mut().clear_faults();
        cam.get_mut().clear_journal();
        let err = cam.set_gamma(f64::NAN).unwrap_err();
        assert!(matches!(err, CameraError::InvalidTarget { label: "gamma", .. }));
        assert!(cam.get_ref().writes().is_empty());
        assert_eq!(cam.get_ref().float_value(features::GAMMA).unwrap(), 1.0);
    }

    #[test]
    fn test_setup_sequencer_empty_program() {
        let mut cam = camera();
        cam.get_mut().set_bool_value(gige::SEQUENCE_ENABLE, true).unwrap();
        cam.get_mut().clear_journal();

        let err = cam.setup_sequencer(&[]).unwrap_err();
        assert!(matches!(err, CameraError::EmptySequence));
        let dev = cam.get_ref();
        assert!(dev.writes().is_empty());
        assert!(dev.bool_value(gige::SEQUENCE_ENABLE).unwrap());
        assert!(dev.stored_sets().is_empty());
    }

    #[test]
    fn test_setup_sequencer() {
        let mut cam = camera();
        let reached = cam.setup_sequencer(&[0.01, 0.02, 0.05]).unwrap();
        assert_eq!(reached.len(), 3);
        for (got, want) in reached.iter().zip([0.01, 0.02, 0.05]) {
            assert!((got - want).abs() < 1e-6, "{got} != {want}");
        }

        let dev = cam.get_ref();
        assert!(dev.bool_value(gige::SEQUENCE_ENABLE).unwrap());
        assert_eq!(dev.enum_value(gige::SEQUENCE_ADVANCE_MODE).unwrap(), "Auto");
        assert_eq!(dev.int_value(gige::SEQUENCE_SET_TOTAL_NUMBER).unwrap(), 3);
        let stored: Vec<(i64, f64)> = dev.stored_sets().iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(stored, vec![(0, 10_000.0), (1, 20_000.0), (2, 50_000.0)]);
    }

    #[test]
    fn test_setup_sequencer_clamps_and_keeps_order() {
        let mut cam = camera();
        let reached = cam.setup_sequencer(&[2.0, 0.000_001, 0.5]).unwrap();
        assert_eq!(reached.len(), 3);
        assert!((reached[0] - 1.0).abs() < 1e-9);
        assert!((reached[1] - 0.000_016).abs() < 1e-9);
        assert!((reached[2] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_setup_sequencer_quantized_exposure() {
        let dev = SimDevice::builder("acA-quant", Transport::GigE)
            .float_quantized(gige::EXPOSURE_TIME_ABS, 35.0, 35.0, 999_985.0, 35.0)
            .boolean(gige::SEQUENCE_ENABLE, false)
            .enumeration(gige::SEQUENCE_ADVANCE_MODE, "Auto", &["Auto", "Controlled"])
            .int(gige::SEQUENCE_SET_TOTAL_NUMBER, 1, 1, 64)
            .int(gige::SEQUENCE_SET_INDEX, 0, 0, 63)
            .command(gige::SEQUENCE_SET_STORE)
            .build();
        let mut cam = GigECamera::new(dev);
        let reached = cam.setup_sequencer(&[0.01]).unwrap();
        // 10000 µs snaps to 35 + 285 * 35 = 10010 µs.
        assert_eq!(reached, vec![0.01001]);
    }

    #[test]
    fn test_setup_sequencer_not_writable() {
        let mut dev = profiles::sim_device("acA1300-30gc").unwrap();
        dev.set_writable(gige::SEQUENCE_ENABLE, false);
        let mut cam = GigECamera::new(dev);
        let err = cam.setup_sequencer(&[0.01]).unwrap_err();
        assert!(matches!(err, CameraError::Device(NodeError::NotWritable(_))));

        let dev = cam.get_ref();
        assert!(dev.writes().is_empty());
        assert!(!dev.bool_value(gige::SEQUENCE_ENABLE).unwrap());
    }

    #[test]
    fn test_setup_sequencer_failure_keeps_stored_sets() {
        // SequenceSetIndex only addresses two sets; the third step fails.
        let dev = SimDevice::builder("acA-short", Transport::GigE)
            .float(gige::EXPOSURE_TIME_ABS, 5000.0, 10.0, 1_000_000.0)
            .boolean(gige::SEQUENCE_ENABLE, true)
            .enumeration(gige::SEQUENCE_ADVANCE_MODE, "Auto", &["Auto", "Controlled"])
            .int(gige::SEQUENCE_SET_TOTAL_NUMBER, 1, 1, 64)
            .int(gige::SEQUENCE_SET_INDEX, 0, 0, 1)
            .command(gige::SEQUENCE_SET_STORE)
            .build();
        let mut cam = GigECamera::new(dev);
        let err = cam.setup_sequencer(&[0.01, 0.02, 0.03]).unwrap_err();
        assert!(matches!(err, CameraError::Device(NodeError::OutOfRange { .. })));

        let dev = cam.get_ref();
        assert!(!dev.bool_value(gige::SEQUENCE_ENABLE).unwrap());
        let stored: Vec<(i64, f64)> = dev.stored_sets().iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(stored, vec![(0, 10_000.0), (1, 20_000.0)]);
    }

    #[test]
    fn test_setup_sequencer_store_error() {
        let mut cam = camera();
        cam.get_mut().fail_on(gige::SEQUENCE_SET_STORE, "device busy");
        let err = cam.setup_sequencer(&[0.01, 0.02]).unwrap_err();
        assert_eq!(err.to_string(), "SequenceSetStore: device busy");
        assert!(cam.get_ref().stored_sets().is_empty());
        assert!(!cam.get_ref().bool_value(gige::SEQUENCE_ENABLE).unwrap());
    }

    #[test]
    fn test_accessors_on_profile() {
        let mut cam = camera();
        assert_eq!(cam.exposure_time().unwrap().name(), "ExposureTimeAbs");
        assert_eq!(cam.gain().unwrap().name(), "GainRaw");
        assert_eq!(
            cam.auto_exposure_time_lower_limit().unwrap().name(),
            "AutoExposureTimeAbsLowerLimit"
        );
        assert_eq!(
            cam.auto_exposure_time_upper_limit().unwrap().name(),
            "AutoExposureTimeAbsUpperLimit"
        );
        assert_eq!(cam.auto_gain_lower_limit().unwrap().name(), "AutoGainRawLowerLimit");
        assert_eq!(cam.auto_gain_upper_limit().unwrap().name(), "AutoGainRawUpperLimit");
        assert_eq!(cam.resulting_frame_rate().unwrap().name(), "ResultingFrameRateAbs");
        assert_eq!(cam.auto_target_brightness().unwrap().name(), "AutoTargetValue");
        assert_eq!(cam.current_frame_rate().unwrap(), 30.0);
    }
}
