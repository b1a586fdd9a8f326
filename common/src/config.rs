pub const VERSION: &str = env!("BUILD_VERSION");

// Node address by default when none is specified
pub const DEFAULT_NODE_ADDRESS: &str = "http://127.0.0.1:8545";

// Interval between two receipt queries while waiting for inclusion
pub const DEFAULT_POLL_INTERVAL_MILLIS: u64 = 4_000;
// Deadline after which a submitted transaction is reported as timed out
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 180;
// Consecutive failed receipt queries tolerated before giving up on a step
pub const DEFAULT_MAX_POLL_ERRORS: u32 = 3;

// Outstanding storage reads allowed when projecting a range of elements
pub const DEFAULT_READ_CONCURRENCY: usize = 4;
// Largest array length read in one go before the length word is considered bogus
pub const DEFAULT_MAX_ARRAY_ELEMENTS: u64 = 10_000;

// 18 decimals numbers, 10^18 base units to represent 1 token
pub const DEFAULT_DECIMALS: u8 = 18;
// Largest power of ten that still fits in 256 bits
pub const MAX_DECIMALS: u8 = 77;

// EIP-1193 error code returned when the account holder declines a request
pub const USER_REJECTED_REQUEST_CODE: i64 = 4001;
