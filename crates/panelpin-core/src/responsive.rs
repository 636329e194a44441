#![forbid(unsafe_code)]

//! Mobile viewport detection.
//!
//! A viewport narrower than the breakpoint is "mobile". The comparison is
//! strict: a width exactly at the breakpoint is not mobile.

use serde::{Deserialize, Serialize};

/// Default mobile breakpoint in CSS pixels.
pub const DEFAULT_MOBILE_BREAKPOINT: f64 = 768.0;

/// Width threshold below which the host is considered mobile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MobileBreakpoint(f64);

impl MobileBreakpoint {
    /// A breakpoint at `px`. Non-finite or non-positive values fall back to
    /// [`DEFAULT_MOBILE_BREAKPOINT`].
    #[must_use]
    pub fn new(px: f64) -> Self {
        if px.is_finite() && px > 0.0 {
            Self(px)
        } else {
            Self::default()
        }
    }

    #[must_use]
    pub const fn px(self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn is_mobile(self, viewport_width: f64) -> bool {
        viewport_width < self.0
    }
}

impl Default for MobileBreakpoint {
    fn default() -> Self {
        Self(DEFAULT_MOBILE_BREAKPOINT)
    }
}
