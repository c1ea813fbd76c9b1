//! Configuration schema types for Huddle.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with the defaults the session core uses.

mod identity;
mod realtime;
mod session;
mod system;
mod upload;

pub use identity::*;
pub use realtime::*;
pub use session::*;
pub use system::*;
pub use upload::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for Huddle.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct HuddleConfig {
    pub identity: IdentityConfig,
    pub session: SessionConfig,
    pub realtime: RealtimeSection,
    pub upload: UploadSection,
    pub logging: LoggingConfig,
}
