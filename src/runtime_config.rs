//! # Runtime Configuration Module
//!
//! Environment-driven settings for the `may` coroutine runtime.
//!
//! ## Environment Variables
//!
//! ### `BRRTMUX_STACK_SIZE`
//!
//! Stack size for each serving coroutine. Accepts decimal (`16384`) or
//! hexadecimal (`0x4000`). Default: `0x4000` (16 KB).
//!
//! Total memory is roughly `stack_size × concurrent_coroutines`; too small
//! overflows in deep handlers, too large wastes memory.
//!
//! ### `BRRTMUX_WORKERS`
//!
//! Number of scheduler worker threads. Default: available parallelism.
//!
//! ## Usage
//!
//! ```rust
//! use brrtmux::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! assert!(config.stack_size > 0);
//! assert!(config.workers > 0);
//! ```

use std::env;
use std::num::NonZeroUsize;
use std::thread;

use tracing::{info, warn};

const DEFAULT_STACK_SIZE: usize = 0x4000;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes (default: 16 KB / 0x4000)
    pub stack_size: usize,
    /// Scheduler worker threads
    pub workers: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            workers: default_workers(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparseable or zero values fall back to the defaults with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let stack_size = env::var("BRRTMUX_STACK_SIZE")
            .ok()
            .map(|val| match parse_size(&val) {
                Some(size) => size,
                None => {
                    warn!(value = %val, default = defaults.stack_size, "Invalid BRRTMUX_STACK_SIZE");
                    defaults.stack_size
                }
            })
            .unwrap_or(defaults.stack_size);
        let workers = env::var("BRRTMUX_WORKERS")
            .ok()
            .map(|val| match parse_size(&val) {
                Some(workers) => workers,
                None => {
                    warn!(value = %val, default = defaults.workers, "Invalid BRRTMUX_WORKERS");
                    defaults.workers
                }
            })
            .unwrap_or(defaults.workers);
        Self {
            stack_size,
            workers,
        }
    }

    /// Push the settings into the global `may` configuration.
    ///
    /// Must run before the first coroutine is spawned to take effect.
    pub fn apply(&self) {
        may::config()
            .set_stack_size(self.stack_size)
            .set_workers(self.workers);
        info!(
            stack_size = self.stack_size,
            workers = self.workers,
            "Coroutine runtime configured"
        );
    }
}

/// Parse a positive decimal or `0x`-prefixed hexadecimal number.
fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    let parsed = match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    };
    parsed.filter(|n| *n > 0)
}

fn default_workers() -> usize {
    thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("16384"), Some(16384));
        assert_eq!(parse_size("0x4000"), Some(0x4000));
        assert_eq!(parse_size("0X8000"), Some(0x8000));
        assert_eq!(parse_size(" 42 "), Some(42));
        assert_eq!(parse_size("0"), None);
        assert_eq!(parse_size("0xzz"), None);
        assert_eq!(parse_size("lots"), None);
    }

    #[test]
    fn test_default() {
        let config = RuntimeConfig::default();
        assert_eq!(config.stack_size, 0x4000);
        assert!(config.workers >= 1);
    }
}
