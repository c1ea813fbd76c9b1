//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Huddle Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[identity]
display_name = "Guest"
# user_id = ""            # empty: a fresh id each run
# avatar_url = "https://example.com/me.png"

[session]
# typing_decay_ms = 2000  # 250-30000, quiet time before you stop "typing"
# typing_grace_ms = 1000  # 0-10000, delay before others stop "typing"
# notice_ttl_ms = 5000    # 500-60000, how long join/leave notices stay
# notice_policy = "single"  # single, stack
# max_visible_notices = 3 # 1-20, stack only

[realtime]
# url = "ws://localhost:3001/room"
# heartbeat_interval = 25   # 5-300 s
# reconnect_delay = 1       # 1-60 s
# max_reconnect_delay = 30  # 1-600 s
# connect_timeout = 15      # 1-120 s

[upload]
# endpoint = "http://localhost:3001/upload"
# max_bytes = 10485760

[logging]
# level = "huddle=info"
"##
    .to_string()
}
