//! Canvas configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use crate::consts::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_LOAD_TIMEOUT_MS, DEFAULT_MAX_IMAGE_BYTES, DEFAULT_RESERVED_BOTTOM_PX,
    MAX_PLACEMENT_SIZE,
};

#[derive(Debug, Clone, PartialEq)]
pub struct CanvasConfig {
    /// Upper bound on a single image fetch and decode.
    pub load_timeout: Duration,
    pub connect_timeout: Duration,
    /// Height of the control strip kept clear below the background.
    pub reserved_bottom: f64,
    /// Side of the box dropped images are fitted into.
    pub max_placement: f64,
    /// Largest image, declared or fetched, that will be accepted.
    pub max_image_bytes: u64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            load_timeout: Duration::from_millis(DEFAULT_LOAD_TIMEOUT_MS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            reserved_bottom: DEFAULT_RESERVED_BOTTOM_PX,
            max_placement: MAX_PLACEMENT_SIZE,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl CanvasConfig {
    /// Build config from environment variables. Every key is optional and
    /// falls back to its default when absent or unparsable.
    ///
    /// - `CANVAS_LOAD_TIMEOUT_MS`: default 10000
    /// - `CANVAS_CONNECT_TIMEOUT_MS`: default 5000
    /// - `CANVAS_RESERVED_BOTTOM_PX`: default 332
    /// - `CANVAS_MAX_PLACEMENT_PX`: default 200
    /// - `CANVAS_MAX_IMAGE_BYTES`: default 10485760
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| match std::env::var(key) {
            Ok(value) => Some(value),
            Err(_) => None,
        })
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let reserved_bottom: f64 = env_parse(&lookup, "CANVAS_RESERVED_BOTTOM_PX", defaults.reserved_bottom);
        let max_placement: f64 = env_parse(&lookup, "CANVAS_MAX_PLACEMENT_PX", defaults.max_placement);
        Self {
            load_timeout: Duration::from_millis(env_parse(&lookup, "CANVAS_LOAD_TIMEOUT_MS", DEFAULT_LOAD_TIMEOUT_MS)),
            connect_timeout: Duration::from_millis(env_parse(
                &lookup,
                "CANVAS_CONNECT_TIMEOUT_MS",
                DEFAULT_CONNECT_TIMEOUT_MS,
            )),
            reserved_bottom: if reserved_bottom.is_finite() && reserved_bottom >= 0.0 {
                reserved_bottom
            } else {
                defaults.reserved_bottom
            },
            max_placement: if max_placement.is_finite() && max_placement > 0.0 {
                max_placement
            } else {
                defaults.max_placement
            },
            max_image_bytes: env_parse(&lookup, "CANVAS_MAX_IMAGE_BYTES", defaults.max_image_bytes),
        }
    }
}

pub(crate) fn env_parse<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().parse::<T>()) {
        Some(Ok(value)) => value,
        _ => default,
    }
}
