//! Local participant identity.

use serde::{Deserialize, Serialize};

/// Who this client appears as in the room.
///
/// An empty `user_id` means "generate one per run".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub user_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            display_name: "Guest".to_string(),
            avatar_url: None,
        }
    }
}
