//! In-memory camera node map.
//!
//! Behaves like a GenICam node map closely enough to exercise the adapter
//! without hardware: range-checked writes, float quantization, per-node
//! availability and writability, injected device errors, and the command
//! side effects the adapter relies on (user set load, sequencer set store).
//! Every get, set and execute is recorded in an access journal.

use crate::device::{Device, DeviceInfo, NodeError, NodeKind, Transport};
use crate::features::{self, entries, gige, usb};
use std::cell::RefCell;
use std::collections::BTreeMap;

/// One recorded call into the node map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Read(String),
    Write(String),
    Execute(String),
}

impl Access {
    pub fn name(&self) -> &str {
        match self {
            Access::Read(n) | Access::Write(n) | Access::Execute(n) => n,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SimValue {
    Integer {
        value: i64,
        min: i64,
        max: i64,
    },
    Float {
        value: f64,
        min: f64,
        max: f64,
        increment: Option<f64>,
    },
    Boolean(bool),
    Enumeration {
        value: String,
        entries: Vec<String>,
    },
    Command,
}

impl SimValue {
    fn kind(&self) -> NodeKind {
        match self {
            SimValue::Integer { .. } => NodeKind::Integer,
            SimValue::Float { .. } => NodeKind::Float,
            SimValue::Boolean(_) => NodeKind::Boolean,
            SimValue::Enumeration { .. } => NodeKind::Enumeration,
            SimValue::Command => NodeKind::Command,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SimNode {
    value: SimValue,
    available: bool,
    writable: bool,
}

/// Simulated camera.
#[derive(Debug, Clone)]
pub struct SimDevice {
    info: DeviceInfo,
    nodes: BTreeMap<String, SimNode>,
    /// Factory defaults restored by `UserSetLoad`.
    defaults: BTreeMap<String, SimNode>,
    faults: BTreeMap<String, String>,
    journal: RefCell<Vec<Access>>,
    stored_sets: BTreeMap<i64, f64>,
}

impl SimDevice {
    pub fn builder(model_name: &str, transport: Transport) -> SimDeviceBuilder {
        SimDeviceBuilder {
            info: DeviceInfo {
                model_name: model_name.to_string(),
                vendor_name: "Basler".to_string(),
                serial_number: "00000000".to_string(),
                transport,
            },
            nodes: BTreeMap::new(),
        }
    }

    /// All recorded accesses, oldest first.
    pub fn accesses(&self) -> Vec<Access> {
        self.journal.borrow().clone()
    }

    /// Recorded accesses to one node.
    pub fn accesses_to(&self, name: &str) -> Vec<Access> {
        self.journal
            .borrow()
            .iter()
            .filter(|a| a.name() == name)
            .cloned()
            .collect()
    }

    /// Names of written or executed nodes, in call order.
    pub fn writes(&self) -> Vec<String> {
        self.journal
            .borrow()
            .iter()
            .filter(|a| !matches!(a, Access::Read(_)))
            .map(|a| a.name().to_string())
            .collect()
    }

    pub fn clear_journal(&self) {
        self.journal.borrow_mut().clear();
    }

    /// Sequencer sets stored so far: set index → exposure time.
    pub fn stored_sets(&self) -> &BTreeMap<i64, f64> {
        &self.stored_sets
    }

    /// Make every write or execute on `name` fail with `description`.
    pub fn fail_on(&mut self, name: &str, description: &str) {
        self.faults.insert(name.to_string(), description.to_string());
    }

    pub fn clear_faults(&mut self) {
        self.faults.clear();
    }

    pub fn set_available(&mut self, name: &str, available: bool) {
        if let Some(node) = self.nodes.get_mut(name) {
            node.available = available;
        }
    }

    pub fn set_writable(&mut self, name: &str, writable: bool) {
        if let Some(node) = self.nodes.get_mut(name) {
            node.writable = writable;
        }
    }

    fn record(&self, access: Access) {
        self.journal.borrow_mut().push(access);
    }

    fn lookup(&self, name: &str) -> Result<&SimNode, NodeError> {
        match self.nodes.get(name) {
            Some(node) if node.available => Ok(node),
            _ => Err(NodeError::NotAvailable(name.to_string())),
        }
    }

    fn lookup_writable(&mut self, name: &str) -> Result<&mut SimNode, NodeError> {
        if let Some(description) = self.faults.get(name) {
            return Err(NodeError::Generic {
                name: name.to_string(),
                description: description.clone(),
            });
        }
        match self.nodes.get_mut(name) {
            Some(node) if node.available && node.writable => Ok(node),
            Some(node) if node.available => Err(NodeError::NotWritable(name.to_string())),
            _ => Err(NodeError::NotAvailable(name.to_string())),
        }
    }

    fn read(&self, name: &str) -> Result<&SimValue, NodeError> {
        self.record(Access::Read(name.to_string()));
        self.lookup(name).map(|n| &n.value)
    }

    fn mismatch(name: &str, expected: NodeKind, actual: &SimValue) -> NodeError {
        NodeError::TypeMismatch {
            name: name.to_string(),
            expected,
            actual: actual.kind(),
        }
    }

    fn current_exposure(&self) -> f64 {
        [gige::EXPOSURE_TIME_ABS, usb::EXPOSURE_TIME]
            .iter()
            .find_map(|name| match self.nodes.get(*name).map(|n| &n.value) {
                Some(SimValue::Float { value, .. }) => Some(*value),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn raw_int(&self, name: &str) -> Option<i64> {
        match self.nodes.get(name).map(|n| &n.value) {
            Some(SimValue::Integer { value, .. }) => Some(*value),
            _ => None,
        }
    }

    fn command_side_effect(&mut self, name: &str) -> Result<(), NodeError> {
        match name {
            features::USER_SET_LOAD => {
                // Values only; availability and access mode belong to the device.
                for (node_name, node) in self.nodes.iter_mut() {
                    if let Some(default) = self.defaults.get(node_name) {
                        node.value = default.value.clone();
                    }
                }
                tracing::debug!(model = %self.info.model_name, "simulated user set loaded");
            }
            gige::SEQUENCE_SET_STORE => {
                let enabled = matches!(
                    self.nodes.get(gige::SEQUENCE_ENABLE).map(|n| &n.value),
                    Some(SimValue::Boolean(true))
                );
                if enabled {
                    return Err(NodeError::Generic {
                        name: name.to_string(),
                        description: "sequence sets cannot be stored while SequenceEnable is true"
                            .to_string(),
                    });
                }
                let index = self.raw_int(gige::SEQUENCE_SET_INDEX).unwrap_or_default();
                let exposure = self.current_exposure();
                self.stored_sets.insert(index, exposure);
            }
            usb::SEQUENCER_SET_SAVE => {
                let configuring = matches!(
                    self.nodes.get(usb::SEQUENCER_CONFIGURATION_MODE).map(|n| &n.value),
                    Some(SimValue::Enumeration { value, .. }) if value == entries::ON
                );
                if !configuring {
                    return Err(NodeError::Generic {
                        name: name.to_string(),
                        description: "sequencer sets can only be saved in configuration mode"
                            .to_string(),
                    });
                }
                let index = self.raw_int(usb::SEQUENCER_SET_SELECTOR).unwrap_or_default();
                let exposure = self.current_exposure();
                self.stored_sets.insert(index, exposure);
            }
            _ => {}
        }
        Ok(())
    }
}

impl Device for SimDevice {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn node_kind(&self, name: &str) -> Option<NodeKind> {
        self.nodes.get(name).map(|n| n.value.kind())
    }

    fn is_available(&self, name: &str) -> bool {
        self.nodes.get(name).is_some_and(|n| n.available)
    }

    fn is_writable(&self, name: &str) -> bool {
        self.nodes.get(name).is_some_and(|n| n.available && n.writable)
    }

    fn float_value(&self, name: &str) -> Result<f64, NodeError> {
        match self.read(name)? {
            SimValue::Float { value, .. } => Ok(*value),
            other => Err(Self::mismatch(name, NodeKind::Float, other)),
        }
    }

    fn float_min(&self, name: &str) -> Result<f64, NodeError> {
        match self.read(name)? {
            SimValue::Float { min, .. } => Ok(*min),
            other => Err(Self::mismatch(name, NodeKind::Float, other)),
        }
    }

    fn float_max(&self, name: &str) -> Result<f64, NodeError> {
        match self.read(name)? {
            SimValue::Float { max, .. } => Ok(*max),
            other => Err(Self::mismatch(name, NodeKind::Float, other)),
        }
    }

    fn set_float_value(&mut self, name: &str, new: f64) -> Result<(), NodeError> {
        self.record(Access::Write(name.to_string()));
        let node = self.lookup_writable(name)?;
        match &mut node.value {
            SimValue::Float {
                value,
                min,
                max,
                increment,
            } => {
                if new < *min || new > *max || new.is_nan() {
                    return Err(NodeError::OutOfRange {
                        name: name.to_string(),
                        value: new,
                        min: *min,
                        max: *max,
                    });
                }
                *value = match increment {
                    Some(inc) if *inc > 0.0 => {
                        (*min + ((new - *min) / *inc).round() * *inc).min(*max)
                    }
                    _ => new,
                };
                Ok(())
            }
            other => Err(Self::mismatch(name, NodeKind::Float, other)),
        }
    }

    fn int_value(&self, name: &str) -> Result<i64, NodeError> {
        match self.read(name)? {
            SimValue::Integer { value, .. } => Ok(*value),
            other => Err(Self::mismatch(name, NodeKind::Integer, other)),
        }
    }

    fn int_min(&self, name: &str) -> Result<i64, NodeError> {
        match self.read(name)? {
            SimValue::Integer { min, .. } => Ok(*min),
            other => Err(Self::mismatch(name, NodeKind::Integer, other)),
        }
    }

    fn int_max(&self, name: &str) -> Result<i64, NodeError> {
        match self.read(name)? {
            SimValue::Integer { max, .. } => Ok(*max),
            other => Err(Self::mismatch(name, NodeKind::Integer, other)),
        }
    }

    fn set_int_value(&mut self, name: &str, new: i64) -> Result<(), NodeError> {
        self.record(Access::Write(name.to_string()));
        let node = self.lookup_writable(name)?;
        match &mut node.value {
            SimValue::Integer { value, min, max } => {
                if new < *min || new > *max {
                    return Err(NodeError::OutOfRange {
                        name: name.to_string(),
                        value: new as f64,
                        min: *min as f64,
                        max: *max as f64,
                    });
                }
                *value = new;
                Ok(())
            }
            other => Err(Self::mismatch(name, NodeKind::Integer, other)),
        }
    }

    fn bool_value(&self, name: &str) -> Result<bool, NodeError> {
        match self.read(name)? {
            SimValue::Boolean(value) => Ok(*value),
            other => Err(Self::mismatch(name, NodeKind::Boolean, other)),
        }
    }

    fn set_bool_value(&mut self, name: &str, new: bool) -> Result<(), NodeError> {
        self.record(Access::Write(name.to_string()));
        let node = self.lookup_writable(name)?;
        match &mut node.value {
            SimValue::Boolean(value) => {
                *value = new;
                Ok(())
            }
            other => Err(Self::mismatch(name, NodeKind::Boolean, other)),
        }
    }

    fn enum_value(&self, name: &str) -> Result<String, NodeError> {
        match self.read(name)? {
            SimValue::Enumeration { value, .. } => Ok(value.clone()),
            other => Err(Self::mismatch(name, NodeKind::Enumeration, other)),
        }
    }

    fn set_enum_value(&mut self, name: &str, entry: &str) -> Result<(), NodeError> {
        self.record(Access::Write(name.to_string()));
        let node = self.lookup_writable(name)?;
        match &mut node.value {
            SimValue::Enumeration { value, entries } => {
                if !entries.iter().any(|e| e == entry) {
                    return Err(NodeError::InvalidEntry {
                        name: name.to_string(),
                        entry: entry.to_string(),
                    });
                }
                *value = entry.to_string();
                Ok(())
            }
            other => Err(Self::mismatch(name, NodeKind::Enumeration, other)),
        }
    }

    fn execute(&mut self, name: &str) -> Result<(), NodeError> {
        self.record(Access::Execute(name.to_string()));
        let node = self.lookup_writable(name)?;
        if node.value != SimValue::Command {
            return Err(Self::mismatch(name, NodeKind::Command, &node.value));
        }
        self.command_side_effect(name)
    }
}

/// Builder for [`SimDevice`]. The node values at `build()` time become the
/// factory defaults.
pub struct SimDeviceBuilder {
    info: DeviceInfo,
    nodes: BTreeMap<String, SimNode>,
}

impl SimDeviceBuilder {
    fn insert(mut self, name: &str, value: SimValue) -> Self {
        self.nodes.insert(
            name.to_string(),
            SimNode {
                value,
                available: true,
                writable: true,
            },
        );
        self
    }

    pub fn serial_number(mut self, serial: &str) -> Self {
        self.info.serial_number = serial.to_string();
        self
    }

    pub fn vendor_name(mut self, vendor: &str) -> Self {
        self.info.vendor_name = vendor.to_string();
        self
    }

    pub fn float(self, name: &str, value: f64, min: f64, max: f64) -> Self {
        self.insert(
            name,
            SimValue::Float {
                value,
                min,
                max,
                increment: None,
            },
        )
    }

    /// Float node whose writes snap to `min + k * increment`.
    pub fn float_quantized(self, name: &str, value: f64, min: f64, max: f64, increment: f64) -> Self {
        self.insert(
            name,
            SimValue::Float {
                value,
                min,
                max,
                increment: Some(increment),
            },
        )
    }

    pub fn int(self, name: &str, value: i64, min: i64, max: i64) -> Self {
        self.insert(name, SimValue::Integer { value, min, max })
    }

    pub fn boolean(self, name: &str, value: bool) -> Self {
        self.insert(name, SimValue::Boolean(value))
    }

    pub fn enumeration(self, name: &str, value: &str, entries: &[&str]) -> Self {
        self.insert(
            name,
            SimValue::Enumeration {
                value: value.to_string(),
                entries: entries.iter().map(|e| e.to_string()).collect(),
            },
        )
    }

    pub fn command(self, name: &str) -> Self {
        self.insert(name, SimValue::Command)
    }

    /// Mark an already added node as read-only.
    pub fn read_only(mut self, name: &str) -> Self {
        if let Some(node) = self.nodes.get_mut(name) {
            node.writable = false;
        }
        self
    }

    /// Mark an already added node as present but not available.
    pub fn unavailable(mut self, name: &str) -> Self {
        if let Some(node) = self.nodes.get_mut(name) {
            node.available = false;
        }
        self
    }

    pub fn build(self) -> SimDevice {
        SimDevice {
            info: self.info,
            defaults: self.nodes.clone(),
            nodes: self.nodes,
            faults: BTreeMap::new(),
            journal: RefCell::new(Vec::new()),
            stored_sets: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gige_sim() -> SimDevice {
        SimDevice::builder("acA-sim", Transport::GigE)
            .float_quantized(gige::EXPOSURE_TIME_ABS, 5000.0, 35.0, 999_985.0, 35.0)
            .enumeration(features::TRIGGER_MODE, entries::OFF, &[entries::OFF, entries::ON])
            .boolean(gige::SEQUENCE_ENABLE, false)
            .int(gige::SEQUENCE_SET_INDEX, 0, 0, 63)
            .command(gige::SEQUENCE_SET_STORE)
            .command(features::USER_SET_LOAD)
            .build()
    }

    #[test]
    fn test_out_of_range_write_is_rejected() {
        let mut dev = gige_sim();
        let err = dev
            .set_float_value(gige::EXPOSURE_TIME_ABS, 2_000_000.0)
            .unwrap_err();
        assert!(matches!(err, NodeError::OutOfRange { .. }));
        assert_eq!(dev.float_value(gige::EXPOSURE_TIME_ABS).unwrap(), 5000.0);
    }

    #[test]
    fn test_float_writes_are_quantized() {
        let mut dev = gige_sim();
        dev.set_float_value(gige::EXPOSURE_TIME_ABS, 10_000.0).unwrap();
        // 35 + 285 * 35
        assert_eq!(dev.float_value(gige::EXPOSURE_TIME_ABS).unwrap(), 10_010.0);
    }

    #[test]
    fn test_invalid_enum_entry() {
        let mut dev = gige_sim();
        let err = dev.set_enum_value(features::TRIGGER_MODE, "Maybe").unwrap_err();
        assert!(matches!(err, NodeError::InvalidEntry { .. }));
    }

    #[test]
    fn test_user_set_load_restores_defaults() {
        let mut dev = gige_sim();
        dev.set_enum_value(features::TRIGGER_MODE, entries::ON).unwrap();
        dev.execute(features::USER_SET_LOAD).unwrap();
        assert_eq!(dev.enum_value(features::TRIGGER_MODE).unwrap(), entries::OFF);
    }

    #[test]
    fn test_user_set_load_keeps_access_mode() {
        let mut dev = gige_sim();
        dev.set_int_value(gige::SEQUENCE_SET_INDEX, 5).unwrap();
        dev.set_writable(gige::SEQUENCE_SET_INDEX, false);
        dev.set_available(gige::SEQUENCE_ENABLE, false);

        dev.execute(features::USER_SET_LOAD).unwrap();
        assert!(!dev.is_writable(gige::SEQUENCE_SET_INDEX));
        assert!(!dev.is_available(gige::SEQUENCE_ENABLE));
        assert_eq!(dev.int_value(gige::SEQUENCE_SET_INDEX).unwrap(), 0);
    }

    #[test]
    fn test_sequence_store_requires_disabled_sequencer() {
        let mut dev = gige_sim();
        dev.set_int_value(gige::SEQUENCE_SET_INDEX, 2).unwrap();
        dev.execute(gige::SEQUENCE_SET_STORE).unwrap();
        assert_eq!(dev.stored_sets().get(&2), Some(&5000.0));

        dev.set_bool_value(gige::SEQUENCE_ENABLE, true).unwrap();
        let err = dev.execute(gige::SEQUENCE_SET_STORE).unwrap_err();
        assert!(matches!(err, NodeError::Generic { .. }));
    }

    #[test]
    fn test_fault_injection_and_journal() {
        let mut dev = gige_sim();
        dev.fail_on(features::TRIGGER_MODE, "device busy");
        let err = dev.set_enum_value(features::TRIGGER_MODE, entries::ON).unwrap_err();
        assert_eq!(err.to_string(), "TriggerMode: device busy");

        dev.clear_faults();
        dev.set_enum_value(features::TRIGGER_MODE, entries::ON).unwrap();
        assert_eq!(
            dev.writes(),
            vec![features::TRIGGER_MODE.to_string(), features::TRIGGER_MODE.to_string()]
        );
        dev.clear_journal();
        assert!(dev.accesses().is_empty());
    }

    #[test]
    fn test_read_only_and_unavailable_nodes() {
        let mut dev = SimDevice::builder("acA-sim", Transport::GigE)
            .float(gige::RESULTING_FRAME_RATE_ABS, 30.0, 0.0, 1000.0)
            .read_only(gige::RESULTING_FRAME_RATE_ABS)
            .float(features::GAMMA, 1.0, 0.0, 4.0)
            .unavailable(features::GAMMA)
            .build();
        assert!(dev.is_available(gige::RESULTING_FRAME_RATE_ABS));
        assert!(!dev.is_writable(gige::RESULTING_FRAME_RATE_ABS));
        assert_eq!(
            dev.set_float_value(gige::RESULTING_FRAME_RATE_ABS, 10.0),
            Err(NodeError::NotWritable(gige::RESULTING_FRAME_RATE_ABS.into()))
        );
        assert!(!dev.is_available(features::GAMMA));
        assert_eq!(dev.node_kind(features::GAMMA), Some(NodeKind::Float));
        assert!(dev.float_value(features::GAMMA).is_err());
    }
}
