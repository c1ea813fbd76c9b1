use serde::{Deserialize, Serialize};

/// The participant running this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalIdentity {
    pub user_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl LocalIdentity {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            avatar_url: None,
        }
    }

    /// Identity with a fresh random user id.
    pub fn generate(display_name: &str) -> Self {
        Self::new(huddle_common::new_id(), display_name)
    }

    pub fn with_avatar(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }
}
