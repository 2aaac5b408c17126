//! Default configuration values
//!
//! Named constants for all tunable parameters

/// Default favorites store backend
pub const DEFAULT_STORE_BACKEND: &str = "file";

/// Default URL of the HTTP favorites store
pub const DEFAULT_STORE_URL: &str = "http://127.0.0.1:7879";

/// Default timeout for a single store request, in seconds
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 7879;

/// Default radius unit for zone entry and display
pub const DEFAULT_UNIT: &str = "km";

/// Default palette type
pub const DEFAULT_PALETTE_KIND: &str = "schools";

/// Default palette name
pub const DEFAULT_PALETTE: &str = "vibrant";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name (for XDG paths)
pub const APP_DIR_NAME: &str = "catchment";
