//! Pool creation attributes

use std::borrow::Cow;

use rtpool_tick::TickConfig;
use serde::{Deserialize, Serialize};

/// Attributes applied when a pool is created
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolAttr {
    /// Display name; not required to be unique
    pub name: Option<Cow<'static, str>>,
    /// Tick length and clock used by bounded waits
    pub tick: TickConfig,
}

impl PoolAttr {
    /// Attributes carrying a display name
    #[must_use]
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Use the given tick configuration for bounded waits
    pub fn with_tick(mut self, tick: TickConfig) -> Self {
        self.tick = tick;
        self
    }
}
