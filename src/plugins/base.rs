//! Per-instance state embedded by every concrete plugin.

use std::fmt;

use super::subscriptions::EventSubscriptions;
use crate::error::{PluginError, Result};

/// Name reserved for the abstract base; concrete plugins must pick their own.
pub const ABSTRACT_PLUGIN_NAME: &str = "PluginBase";

/// Identity and event subscriptions of one plugin instance.
///
/// `P` is the concrete plugin type owning this base, so subscribed handlers
/// receive a `&mut P` when invoked.
pub struct PluginBase<P> {
    name: String,
    subscriptions: EventSubscriptions<P>,
}

impl<P> PluginBase<P> {
    /// Create the base for a concrete plugin called `name`.
    ///
    /// Fails with [`PluginError::Instantiation`] if the name is blank or is
    /// the reserved abstract name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(PluginError::Instantiation(
                "a plugin needs a non-empty concrete name".into(),
            ));
        }
        if trimmed == ABSTRACT_PLUGIN_NAME {
            return Err(PluginError::Instantiation(format!(
                "abstract {ABSTRACT_PLUGIN_NAME} can't be instantiated"
            )));
        }

        Ok(Self {
            name: trimmed.to_string(),
            subscriptions: EventSubscriptions::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subscriptions(&self) -> &EventSubscriptions<P> {
        &self.subscriptions
    }

    pub fn subscriptions_mut(&mut self) -> &mut EventSubscriptions<P> {
        &mut self.subscriptions
    }
}

impl<P> fmt::Debug for PluginBase<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginBase")
            .field("name", &self.name)
            .field("subscriptions", &self.subscriptions)
            .finish()
    }
}
