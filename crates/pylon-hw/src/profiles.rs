//! Camera model profiles.
//!
//! Describes the node map of known Basler models (node types, factory
//! defaults, ranges) so that a [`SimDevice`] can stand in for the real
//! camera. Profile files are embedded at compile time from
//! `contrib/models/*.toml`.

use crate::device::{DeviceInfo, NodeKind};
use crate::sim::SimDevice;
use serde::Deserialize;
use std::sync::OnceLock;
use thiserror::Error;

const PROFILE_ACA1300_30GC: &str = include_str!("../../../contrib/models/aca1300-30gc.toml");
const PROFILE_ACA1920_40UC: &str = include_str!("../../../contrib/models/aca1920-40uc.toml");

static PROFILE_DB: OnceLock<Vec<Profile>> = OnceLock::new();

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("unknown camera model: {0}")]
    UnknownModel(String),
    #[error("bad profile TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("node {name}: {reason}")]
    InvalidNode { name: String, reason: String },
}

/// Top-level profile structure (one per `contrib/models/*.toml`).
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub device: DeviceInfo,
    #[serde(rename = "node", default)]
    pub nodes: Vec<NodeDef>,
}

/// One `[[node]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub value: Option<toml::Value>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Float quantization step.
    pub increment: Option<f64>,
    #[serde(default)]
    pub entries: Vec<String>,
    #[serde(default = "default_true")]
    pub writable: bool,
    #[serde(default = "default_true")]
    pub available: bool,
}

fn default_true() -> bool {
    true
}

impl Profile {
    pub fn parse(src: &str) -> Result<Self, ProfileError> {
        Ok(toml::from_str(src)?)
    }

    /// Build a simulated camera with this profile's node map.
    pub fn to_sim_device(&self) -> Result<SimDevice, ProfileError> {
        let mut builder = SimDevice::builder(&self.device.model_name, self.device.transport)
            .vendor_name(&self.device.vendor_name)
            .serial_number(&self.device.serial_number);

        for node in &self.nodes {
            let name = node.name.as_str();
            builder = match node.kind {
                NodeKind::Float => {
                    let (min, max) = node.range()?;
                    let value = node.float_value()?.unwrap_or(min);
                    match node.increment {
                        Some(inc) => builder.float_quantized(name, value, min, max, inc),
                        None => builder.float(name, value, min, max),
                    }
                }
                NodeKind::Integer => {
                    let (min, max) = node.range()?;
                    let value = node.float_value()?.unwrap_or(min);
                    builder.int(name, value as i64, min as i64, max as i64)
                }
                NodeKind::Boolean => {
                    let value = match &node.value {
                        Some(toml::Value::Boolean(b)) => *b,
                        None => false,
                        Some(_) => return Err(node.invalid("value must be a boolean")),
                    };
                    builder.boolean(name, value)
                }
                NodeKind::Enumeration => {
                    let value = match &node.value {
                        Some(toml::Value::String(s)) => s.clone(),
                        _ => return Err(node.invalid("value must name an entry")),
                    };
                    if !node.entries.contains(&value) {
                        return Err(node.invalid("value is not one of the entries"));
                    }
                    let entries: Vec<&str> = node.entries.iter().map(String::as_str).collect();
                    builder.enumeration(name, &value, &entries)
                }
                NodeKind::Command => builder.command(name),
            };
            if !node.writable {
                builder = builder.read_only(name);
            }
            if !node.available {
                builder = builder.unavailable(name);
            }
        }

        Ok(builder.build())
    }
}

impl NodeDef {
    fn invalid(&self, reason: &str) -> ProfileError {
        ProfileError::InvalidNode {
            name: self.name.clone(),
            reason: reason.to_string(),
        }
    }

    fn range(&self) -> Result<(f64, f64), ProfileError> {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min <= max => Ok((min, max)),
            (Some(_), Some(_)) => Err(self.invalid("min is greater than max")),
            _ => Err(self.invalid("numeric nodes need min and max")),
        }
    }

    fn float_value(&self) -> Result<Option<f64>, ProfileError> {
        match &self.value {
            None => Ok(None),
            Some(toml::Value::Float(f)) => Ok(Some(*f)),
            Some(toml::Value::Integer(i)) => Ok(Some(*i as f64)),
            Some(_) => Err(self.invalid("value must be numeric")),
        }
    }
}

fn profile_db() -> &'static Vec<Profile> {
    PROFILE_DB.get_or_init(|| {
        let mut db = Vec::new();
        for src in [PROFILE_ACA1300_30GC, PROFILE_ACA1920_40UC] {
            match Profile::parse(src) {
                Ok(p) => db.push(p),
                Err(e) => tracing::error!(error = %e, "bad embedded camera profile"),
            }
        }
        db
    })
}

/// Look up a profile by model name (case-insensitive).
pub fn lookup_profile(model_name: &str) -> Option<&'static Profile> {
    profile_db()
        .iter()
        .find(|p| p.device.model_name.eq_ignore_ascii_case(model_name))
}

/// List all embedded profiles.
pub fn list_profiles() -> &'static [Profile] {
    profile_db()
}

/// Build a simulated camera for an embedded model.
pub fn sim_device(model_name: &str) -> Result<SimDevice, ProfileError> {
    lookup_profile(model_name)
        .ok_or_else(|| ProfileError::UnknownModel(model_name.to_string()))?
        .to_sim_device()
}
