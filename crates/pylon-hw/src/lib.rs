//! pylon-hw: Hardware abstraction for Basler cameras.
//!
//! Provides the GenICam feature-node surface the parameter adapter works
//! against, a simulated node map, and embedded camera model profiles.

pub mod device;
pub mod features;
pub mod node;
pub mod profiles;
pub mod sim;

pub use device::{Device, DeviceInfo, NodeError, NodeKind, Transport};
pub use node::FeatureNode;
pub use profiles::{lookup_profile, Profile, ProfileError};
pub use sim::{Access, SimDevice};
