//! Startup parameters supplied by the driver configuration.

use serde::Deserialize;

/// Transport settings applied once by
/// [`apply_startup_settings`](crate::PylonCamera::apply_startup_settings).
///
/// Values are passed to the camera as-is; the device rejects what it
/// cannot accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StartupParameters {
    /// GigE stream channel packet size in bytes. Sizes above 1500 need jumbo
    /// frames on the host interface (Raspberry Pi: 1500, many NICs: 9000).
    pub mtu_size: i64,
    /// GigE inter-packet delay in ticks. Raising it prevents lost frames
    /// when several cameras share one link.
    #[serde(alias = "inter_pkg_delay")]
    pub inter_package_delay: i64,
}

impl Default for StartupParameters {
    fn default() -> Self {
        Self {
            mtu_size: 3000,
            inter_package_delay: 1000,
        }
    }
}
