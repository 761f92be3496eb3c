//! Host-page configuration.
//!
//! Element ids are fixed by the page template; the wait and rotation
//! behavior can be tuned from the location query, e.g.
//! `index.html?shell_wait=observe&shell_timeout_ms=5000`.

use web_sys::UrlSearchParams;

use crate::error::ShellError;

pub const DEFAULT_POLL_INTERVAL_MS: i32 = 50;
pub const DEFAULT_TIMEOUT_MS: i32 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Query the document on a fixed interval.
    Poll { interval_ms: i32 },
    /// Re-check on every DOM subtree mutation.
    Observe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationPolicy {
    ExitFullscreen,
    Keep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub container_id: String,
    pub wrapper_id: String,
    pub fullscreen_id: String,
    pub loading_id: String,
    pub canvas_selector: String,
    pub wait: WaitStrategy,
    /// `None` waits forever.
    pub timeout_ms: Option<i32>,
    pub rotation: RotationPolicy,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            container_id: "container".to_string(),
            wrapper_id: "wrapper".to_string(),
            fullscreen_id: "fullscreen".to_string(),
            loading_id: "loading".to_string(),
            canvas_selector: "canvas".to_string(),
            wait: WaitStrategy::Poll {
                interval_ms: DEFAULT_POLL_INTERVAL_MS,
            },
            timeout_ms: Some(DEFAULT_TIMEOUT_MS),
            rotation: RotationPolicy::ExitFullscreen,
        }
    }
}

/// Raw `shell_*` values as the browser decoded them from the query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOverrides {
    pub canvas: Option<String>,
    pub wait: Option<String>,
    pub poll_ms: Option<String>,
    pub timeout_ms: Option<String>,
    pub rotate: Option<String>,
}

impl QueryOverrides {
    /// Reads the overrides with `URLSearchParams`, so keys and values are
    /// decoded exactly as the page's own scripts would see them.
    pub fn from_query(query: &str) -> Result<Self, ShellError> {
        let params = UrlSearchParams::new_with_str(query.trim())?;
        Ok(Self {
            canvas: params.get("shell_canvas"),
            wait: params.get("shell_wait"),
            poll_ms: params.get("shell_poll_ms"),
            timeout_ms: params.get("shell_timeout_ms"),
            rotate: params.get("shell_rotate"),
        })
    }
}

impl ShellConfig {
    /// Applies `shell_*` overrides from a location query string.
    ///
    /// Returns the config plus one warning per value that was ignored.
    pub fn from_query(query: &str) -> Result<(Self, Vec<String>), ShellError> {
        Ok(Self::from_overrides(&QueryOverrides::from_query(query)?))
    }

    pub fn from_overrides(overrides: &QueryOverrides) -> (Self, Vec<String>) {
        let mut config = Self::default();
        let mut warnings = Vec::new();

        if let Some(selector) = &overrides.canvas {
            if selector.trim().is_empty() {
                warnings.push("shell_canvas is empty, keeping default".to_string());
            } else {
                config.canvas_selector = selector.clone();
            }
        }

        let mut use_observer = false;
        match overrides.wait.as_deref() {
            None | Some("poll") => {}
            Some("observe") => use_observer = true,
            Some(other) => warnings.push(format!("unknown shell_wait {:?}", other)),
        }

        let mut poll_ms = DEFAULT_POLL_INTERVAL_MS;
        if let Some(value) = &overrides.poll_ms {
            match value.trim().parse::<i32>() {
                Ok(ms) if ms >= 0 => poll_ms = ms.max(1),
                _ => warnings.push(format!("bad shell_poll_ms {:?}", value)),
            }
        }

        if let Some(value) = &overrides.timeout_ms {
            match value.trim().parse::<i32>() {
                Ok(0) => config.timeout_ms = None,
                Ok(ms) if ms > 0 => config.timeout_ms = Some(ms),
                _ => warnings.push(format!("bad shell_timeout_ms {:?}", value)),
            }
        }

        match overrides.rotate.as_deref() {
            None => {}
            Some("keep") => config.rotation = RotationPolicy::Keep,
            Some("exit") => config.rotation = RotationPolicy::ExitFullscreen,
            Some(other) => warnings.push(format!("unknown shell_rotate {:?}", other)),
        }

        config.wait = if use_observer {
            WaitStrategy::Observe
        } else {
            WaitStrategy::Poll {
                interval_ms: poll_ms,
            }
        };

        (config, warnings)
    }
}
