/// Constants used throughout the localns codebase
// Policy files
pub const DEFAULT_POLICY_FILE_NAME: &str = "Access";

// Entry cache
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

// Store
pub const DEFAULT_STORE_ENDPOINT: &str = "local";
pub const REFDATA_DURATION_SECS: u64 = 60;

// Signature packing: two (R, S) pairs of 32 bytes each
pub const SIGNATURE_HALF_LEN: usize = 32;
pub const SIGNATURE_PAIR_LEN: usize = 2 * SIGNATURE_HALF_LEN;
pub const SIGNATURE_BUF_LEN: usize = 2 * SIGNATURE_PAIR_LEN;

// Placeholders bound into the entry hash in place of a key and a content digest
pub const KEY_PLACEHOLDER_LEN: usize = 32;
pub const DIGEST_PLACEHOLDER_LEN: usize = 32;

// Environment variable names
pub const LOCALNS_LOG_VAR: &str = "LOCALNS_LOG";
pub const LOCALNS_CONFIG_VAR: &str = "LOCALNS_CONFIG";
pub const LOCALNS_ROOT_VAR: &str = "LOCALNS_ROOT";
pub const LOCALNS_OWNER_VAR: &str = "LOCALNS_OWNER";
pub const LOCALNS_STORE_ENDPOINT_VAR: &str = "LOCALNS_STORE_ENDPOINT";
pub const LOCALNS_CACHE_CAPACITY_VAR: &str = "LOCALNS_CACHE_CAPACITY";
pub const LOCALNS_SIGNING_KEY_VAR: &str = "LOCALNS_SIGNING_KEY";
pub const LOCALNS_ROTATION_KEY_VAR: &str = "LOCALNS_ROTATION_KEY";
