pub mod errors;
pub mod id;

pub use errors::{ConfigError, HuddleError, SyncError};
pub use id::{new_correlation_id, new_id, new_local_id, LOCAL_ID_PREFIX};

pub type Result<T> = std::result::Result<T, HuddleError>;
