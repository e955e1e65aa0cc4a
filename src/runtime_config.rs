//! # Runtime Configuration Module
//!
//! Environment variable-based configuration for the decoder.
//!
//! ## Environment Variables
//!
//! ### `BRUTOS_MAX_DECODE_DEPTH`
//!
//! Maximum nesting of bean/dependency evaluation within one decode call.
//! Self-referential mapping graphs (a bean whose property maps back to the
//! bean itself) stop here with a depth error instead of exhausting the
//! stack. Accepts values in:
//! - Decimal: `64`
//! - Hexadecimal: `0x40`
//!
//! Default: `64`
//!
//! ## Usage
//!
//! ```rust
//! use brutos::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Max decode depth: {}", config.max_decode_depth);
//! ```

use std::env;

/// Default for [`RuntimeConfig::max_decode_depth`].
pub const DEFAULT_MAX_DECODE_DEPTH: usize = 64;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Maximum recursion depth of one decode call (default: 64)
    pub max_decode_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_decode_depth: DEFAULT_MAX_DECODE_DEPTH,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let max_decode_depth = env::var("BRUTOS_MAX_DECODE_DEPTH")
            .ok()
            .and_then(|val| parse_size(&val))
            .filter(|depth| *depth > 0)
            .unwrap_or(DEFAULT_MAX_DECODE_DEPTH);
        RuntimeConfig { max_decode_depth }
    }

    /// Builder-style override of the depth limit.
    #[must_use]
    pub fn with_max_decode_depth(mut self, depth: usize) -> Self {
        self.max_decode_depth = depth.max(1);
        self
    }
}

fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}
