use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::constants::{DEFAULT_HOST, FETCH_TIMEOUT_MS, HISTORY_LEN, INFO_PATH, REFRESH_INTERVAL_MS};

#[derive(Parser, Debug)]
#[command(name = "sc-mon", author, version, about = "Monitor Snapchain Node", long_about = None)]
pub struct Args {
    /// Snapchain HTTP API host:port
    #[arg(long, env = "SC_MON_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Polling period in milliseconds
    #[arg(long, env = "SC_MON_INTERVAL_MS", default_value_t = REFRESH_INTERVAL_MS,
          value_parser = clap::value_parser!(u64).range(100..))]
    pub interval_ms: u64,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "SC_MON_TIMEOUT_MS", default_value_t = FETCH_TIMEOUT_MS,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: u64,

    /// Number of height samples kept per shard
    #[arg(long, env = "SC_MON_HISTORY", default_value_t = HISTORY_LEN,
          value_parser = parse_history)]
    pub history: usize,

    /// Write logs to this file (the terminal is taken by the dashboard)
    #[arg(long, env = "SC_MON_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Log filter (error|warn|info|debug|trace or a tracing directive)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn api_url(&self) -> String {
        format!("http://{}{}", self.host, INFO_PATH)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// Rates need at least two samples in the window
fn parse_history(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|e| format!("{e}"))?;
    if n < 2 {
        return Err("history must keep at least 2 samples".to_string());
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["sc-mon"]).unwrap();
        assert_eq!(args.host, "localhost:3381");
        assert_eq!(args.api_url(), "http://localhost:3381/v1/info");
        assert_eq!(args.interval(), Duration::from_secs(2));
        assert_eq!(args.history, 100);
        assert!(args.log_file.is_none());
    }

    #[test]
    fn custom_host() {
        let args = Args::try_parse_from(["sc-mon", "--host", "10.0.0.7:8080"]).unwrap();
        assert_eq!(args.api_url(), "http://10.0.0.7:8080/v1/info");
    }

    #[test]
    fn rejects_tiny_history() {
        assert!(Args::try_parse_from(["sc-mon", "--history", "1"]).is_err());
        assert!(Args::try_parse_from(["sc-mon", "--history", "abc"]).is_err());
        let args = Args::try_parse_from(["sc-mon", "--history", "2"]).unwrap();
        assert_eq!(args.history, 2);
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(Args::try_parse_from(["sc-mon", "--timeout-ms", "0"]).is_err());
    }

    #[test]
    fn no_subcommands() {
        assert!(Args::try_parse_from(["sc-mon", "status"]).is_err());
    }
}
