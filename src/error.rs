//! Error types shared by the plugin contract and the lifecycle driver.

use thiserror::Error;

use crate::plugins::traits::PluginState;

#[derive(Error, Debug)]
pub enum PluginError {
    /// A plugin base was built without a usable concrete identity.
    #[error("Cannot instantiate plugin: {0}")]
    Instantiation(String),

    /// The work wrapped by `create_promise` signalled failure.
    #[error("Pending operation rejected: {0}")]
    Rejected(#[source] anyhow::Error),

    /// The settle handle was dropped before resolving or rejecting.
    #[error("Pending operation was dropped without settling")]
    Abandoned,

    #[error("Handler for event '{event}' failed: {source}")]
    Handler {
        event: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Plugin '{plugin}' cannot {action} while {from}")]
    InvalidTransition {
        plugin: String,
        from: PluginState,
        action: &'static str,
    },

    #[error("Plugin '{plugin}' panicked in {hook}")]
    HookPanicked { plugin: String, hook: &'static str },

    #[error("Plugin already registered: {0}")]
    DuplicatePlugin(String),

    #[error("Plugin not found: {0}")]
    PluginNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, PluginError>;

impl PluginError {
    /// Wrap a handler failure with the event it was handling.
    pub fn handler(event: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Handler {
            event: event.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instantiation_error_display() {
        let err = PluginError::Instantiation("plugin name is empty".into());
        assert_eq!(err.to_string(), "Cannot instantiate plugin: plugin name is empty");
    }

    #[test]
    fn handler_error_keeps_event_name() {
        let err = PluginError::handler("/lol-gameflow/v1/session", anyhow::anyhow!("boom"));
        let msg = err.to_string();
        assert!(msg.contains("/lol-gameflow/v1/session"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn invalid_transition_names_state() {
        let err = PluginError::InvalidTransition {
            plugin: "Example".into(),
            from: PluginState::Closed,
            action: "connect",
        };
        assert_eq!(err.to_string(), "Plugin 'Example' cannot connect while closed");
    }
}
