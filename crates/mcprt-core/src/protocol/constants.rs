// Protocol-wide constants for MCP Runtime

pub const JSONRPC_VERSION: &str = "2.0";
pub const MAX_REQUEST_ID_LENGTH: usize = 1000;
pub const MIN_REQUEST_ID_NUMBER: i64 = -999_999_999;
pub const MAX_REQUEST_ID_NUMBER: i64 = 999_999_999;
