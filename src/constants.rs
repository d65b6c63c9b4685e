pub const REFRESH_INTERVAL_MS: u64 = 2000;
pub const FETCH_TIMEOUT_MS: u64 = 1500;
// Upper bound on how long the UI loop waits for a key before re-checking the fetch worker
pub const INPUT_POLL_MS: u64 = 100;

pub const HISTORY_LEN: usize = 100;
pub const BAR_WIDTH: usize = 100;
pub const RATE_BAR_WIDTH: usize = BAR_WIDTH;
pub const MIN_MAX_RATE: f64 = 0.0001;

pub const DEFAULT_HOST: &str = "localhost:3381";
pub const INFO_PATH: &str = "/v1/info";
