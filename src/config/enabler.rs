//! Process-wide on/off switch for the instrumentation.

use std::sync::{
    Arc, OnceLock,
    atomic::{AtomicBool, Ordering},
};

/// Environment variable that disables the instrumentation when set to
/// exactly `false`.
pub const ENABLED_ENV: &str = "OTEL_INSTRUMENTATION_MYSQL_ENABLED";

/// Decides whether hooks do any work.
///
/// Entry and exit hooks each consult the enabler independently. Toggling it
/// while a call is in flight can therefore leave an entry without a matching
/// exit (the span is dropped) or an exit without an entry (the exit
/// no-ops); neither case is an error.
///
/// ## Example
///
/// ```rust
/// use dbtel::config::FeatureEnabler;
///
/// let enabler = FeatureEnabler::from_lookup(|_| Some("false".to_owned()));
/// assert!(!enabler.is_enabled());
///
/// enabler.set_enabled(true);
/// assert!(enabler.is_enabled());
/// ```
#[derive(Debug)]
pub struct FeatureEnabler {
    enabled: AtomicBool,
}

impl FeatureEnabler {
    /// Creates an enabler in the given state.
    pub fn new(enabled: bool) -> Self {
        Self { enabled: AtomicBool::new(enabled) }
    }

    /// Reads [`ENABLED_ENV`] from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads [`ENABLED_ENV`] through `lookup`.
    ///
    /// Only the exact value `false` disables; unset, empty or any other
    /// value leaves the instrumentation enabled.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let enabled = lookup(ENABLED_ENV).is_none_or(|value| value != "false");
        Self::new(enabled)
    }

    /// Returns the process-wide enabler, resolved from the environment on
    /// first use.
    pub fn global() -> Arc<FeatureEnabler> {
        static GLOBAL: OnceLock<Arc<FeatureEnabler>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::from_env())))
    }

    /// Returns `true` if hooks should record telemetry.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Turns the instrumentation on or off at runtime.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        tracing::debug!(enabled, "instrumentation toggled");
    }
}

impl Default for FeatureEnabler {
    fn default() -> Self {
        Self::new(true)
    }
}
