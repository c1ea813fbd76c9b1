/// Prefix carried by ids minted on this client before the durable store
/// has assigned a canonical one.
pub const LOCAL_ID_PREFIX: &str = "local-";

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A temporary id for an optimistically displayed message.
pub fn new_local_id() -> String {
    format!("{LOCAL_ID_PREFIX}{}", new_id())
}

pub fn new_correlation_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    let bytes = uuid.as_bytes();
    format!(
        "{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3]
    )
}
