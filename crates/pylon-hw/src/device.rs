//! GenICam device access: the feature-node surface of a connected camera.
//!
//! Everything the adapter does to a camera goes through [`Device`]. The
//! Pylon SDK binding implements it over a live `INodeMap`; tests and the CLI
//! use [`SimDevice`](crate::SimDevice).

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    #[error("node {0} is not available")]
    NotAvailable(String),
    #[error("node {0} is not writable")]
    NotWritable(String),
    #[error("node {name} is {actual}, expected {expected}")]
    TypeMismatch {
        name: String,
        expected: NodeKind,
        actual: NodeKind,
    },
    #[error("value {value} out of range [{min}, {max}] for node {name}")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("value {value} is not a number for node {name}")]
    NotFinite { name: String, value: f64 },
    #[error("node {name} has no entry {entry}")]
    InvalidEntry { name: String, entry: String },
    /// Runtime error reported by the device or transport layer.
    #[error("{name}: {description}")]
    Generic { name: String, description: String },
}

/// Interface type of a feature node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Integer,
    Float,
    Boolean,
    Enumeration,
    Command,
}

impl NodeKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, NodeKind::Integer | NodeKind::Float)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::Integer => "IInteger",
            NodeKind::Float => "IFloat",
            NodeKind::Boolean => "IBoolean",
            NodeKind::Enumeration => "IEnumeration",
            NodeKind::Command => "ICommand",
        };
        f.write_str(s)
    }
}

/// Transport layer a camera is attached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Transport {
    #[serde(rename = "GigE")]
    GigE,
    #[serde(rename = "USB")]
    Usb,
    #[serde(rename = "CameraLink")]
    CameraLink,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Transport::GigE => "GigE",
            Transport::Usb => "USB",
            Transport::CameraLink => "CameraLink",
        };
        f.write_str(s)
    }
}

/// Identity of a connected camera.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceInfo {
    pub model_name: String,
    pub vendor_name: String,
    pub serial_number: String,
    pub transport: Transport,
}

/// Live feature-node access to one camera.
///
/// Values are never cached: every call goes to the device. Availability and
/// writability queries are side-effect free; callers check them before
/// reading or writing.
pub trait Device {
    fn info(&self) -> &DeviceInfo;

    /// Interface type of `name`, or `None` if the node map has no such node.
    fn node_kind(&self, name: &str) -> Option<NodeKind>;
    fn is_available(&self, name: &str) -> bool;
    fn is_writable(&self, name: &str) -> bool;

    fn float_value(&self, name: &str) -> Result<f64, NodeError>;
    fn float_min(&self, name: &str) -> Result<f64, NodeError>;
    fn float_max(&self, name: &str) -> Result<f64, NodeError>;
    fn set_float_value(&mut self, name: &str, value: f64) -> Result<(), NodeError>;

    fn int_value(&self, name: &str) -> Result<i64, NodeError>;
    fn int_min(&self, name: &str) -> Result<i64, NodeError>;
    fn int_max(&self, name: &str) -> Result<i64, NodeError>;
    fn set_int_value(&mut self, name: &str, value: i64) -> Result<(), NodeError>;

    fn bool_value(&self, name: &str) -> Result<bool, NodeError>;
    fn set_bool_value(&mut self, name: &str, value: bool) -> Result<(), NodeError>;

    /// Symbolic name of the current enumeration entry.
    fn enum_value(&self, name: &str) -> Result<String, NodeError>;
    fn set_enum_value(&mut self, name: &str, entry: &str) -> Result<(), NodeError>;

    /// Execute a command node.
    fn execute(&mut self, name: &str) -> Result<(), NodeError>;
}
