//! Typed handle to a numeric feature node.

use crate::device::{Device, NodeError, NodeKind};

/// Live handle to an integer or float node.
///
/// Holding the handle borrows the device mutably, so the node can be read
/// and written without re-resolving it. Integer nodes are exposed as `f64`;
/// writes round to the nearest integer.
pub struct FeatureNode<'a> {
    device: &'a mut dyn Device,
    name: &'static str,
    kind: NodeKind,
}

impl<'a> FeatureNode<'a> {
    /// Resolve `name` on `device`.
    ///
    /// Fails with [`NodeError::NotAvailable`] before any value access if the
    /// node is missing or unavailable.
    pub fn open(device: &'a mut dyn Device, name: &'static str) -> Result<Self, NodeError> {
        if !device.is_available(name) {
            return Err(NodeError::NotAvailable(name.to_string()));
        }
        let kind = device
            .node_kind(name)
            .ok_or_else(|| NodeError::NotAvailable(name.to_string()))?;
        if !kind.is_numeric() {
            return Err(NodeError::TypeMismatch {
                name: name.to_string(),
                expected: NodeKind::Float,
                actual: kind,
            });
        }
        Ok(Self { device, name, kind })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_writable(&self) -> bool {
        self.device.is_writable(self.name)
    }

    pub fn value(&self) -> Result<f64, NodeError> {
        match self.kind {
            NodeKind::Integer => self.device.int_value(self.name).map(|v| v as f64),
            _ => self.device.float_value(self.name),
        }
    }

    pub fn min(&self) -> Result<f64, NodeError> {
        match self.kind {
            NodeKind::Integer => self.device.int_min(self.name).map(|v| v as f64),
            _ => self.device.float_min(self.name),
        }
    }

    pub fn max(&self) -> Result<f64, NodeError> {
        match self.kind {
            NodeKind::Integer => self.device.int_max(self.name).map(|v| v as f64),
            _ => self.device.float_max(self.name),
        }
    }

    /// Write `value`. Checks writability first; nothing is sent to a
    /// read-only node or for a NaN or infinite value.
    pub fn set_value(&mut self, value: f64) -> Result<(), NodeError> {
        if !value.is_finite() {
            return Err(NodeError::NotFinite {
                name: self.name.to_string(),
                value,
            });
        }
        if !self.device.is_writable(self.name) {
            return Err(NodeError::NotWritable(self.name.to_string()));
        }
        match self.kind {
            NodeKind::Integer => self.device.set_int_value(self.name, value.round() as i64),
            _ => self.device.set_float_value(self.name, value),
        }
    }
}
