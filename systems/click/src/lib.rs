#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Double-click recognition over sampled pointer input.

use std::time::Duration;

use log::trace;
use pointwalk_core::{
    PointerInput, Vec2, DEFAULT_CLICK_TOLERANCE, DEFAULT_DOUBLE_CLICK_THRESHOLD,
};
use serde::{Deserialize, Serialize};

/// Tunables for double-click recognition.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickSettings {
    /// Two triggers closer together in time than this form a double-click.
    #[serde(with = "millis")]
    pub threshold: Duration,
    /// Two triggers closer than this on both axes count as the same spot.
    pub tolerance: f32,
}

impl Default for ClickSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_DOUBLE_CLICK_THRESHOLD,
            tolerance: DEFAULT_CLICK_TOLERANCE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct LastClick {
    at: Duration,
    position: Vec2,
}

/// Recognises two nearby pointer triggers within the configured window.
///
/// Holds a single remembered trigger. Create one detector per input source.
#[derive(Clone, Debug, Default)]
pub struct ClickDetector {
    settings: ClickSettings,
    last: Option<LastClick>,
}

impl ClickDetector {
    /// Creates a detector with the provided settings.
    #[must_use]
    pub const fn new(settings: ClickSettings) -> Self {
        Self {
            settings,
            last: None,
        }
    }

    /// Feeds one pointer sample, returning the canvas position of a completed double-click.
    ///
    /// Samples without a trigger never match and leave the remembered click
    /// untouched. A matching trigger clears the remembered click, so a third
    /// rapid trigger starts a new pair.
    pub fn observe(&mut self, input: PointerInput) -> Option<Vec2> {
        if !input.triggered {
            return None;
        }

        if let Some(last) = self.last {
            if self.matches(last, input) {
                self.last = None;
                trace!("double-click at {:?}", input.position);
                return Some(input.position);
            }
        }

        self.last = Some(LastClick {
            at: input.now,
            position: input.position,
        });
        None
    }

    fn matches(&self, last: LastClick, input: PointerInput) -> bool {
        let Some(elapsed) = input.now.checked_sub(last.at) else {
            return false;
        };
        let delta = (input.position - last.position).abs();
        elapsed < self.settings.threshold
            && delta.x < self.settings.tolerance
            && delta.y < self.settings.tolerance
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
