//! This module provides observability hooks for the encode/decode loops.
//!
//! The pipeline's buffer fill levels drift from batch to batch because entropy-coded
//! and compressed sizes never line up with cube boundaries. The `log_metric!` macro
//! makes those levels visible without a debugger.
//!
//! The macro body is wrapped in `#[cfg(debug_assertions)]`, so every call site is
//! compiled out of release builds.

/// Logs a structured key-value metric line through `log::debug!`, only in debug builds.
///
/// # Example
/// ```
/// use cubedct::log_metric;
/// let frames = 16;
/// log_metric!("event"="encode_batch", "frames"=&frames);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        #[cfg(debug_assertions)]
        {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+

            $crate::__log::debug!("CUBEDCT_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}
