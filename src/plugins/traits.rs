//! The plugin contract.
//!
//! A plugin is any type implementing [`Plugin`]. The trait itself is the
//! abstract base: it cannot be instantiated, only implemented. Per-instance
//! state (name and event subscriptions) lives in a [`PluginBase`] that each
//! concrete plugin embeds and exposes through `base()` / `base_mut()`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

use super::base::PluginBase;
use super::pending::{self, Pending, Settle};
use crate::error::{PluginError, Result};

/// State of the external client connection handed to `on_connect`.
///
/// The core never interprets it; plugins may ask for a typed view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientData(serde_json::Value);

impl ClientData {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_inner(self) -> serde_json::Value {
        self.0
    }

    /// Deserialize the client data into a plugin-specific shape.
    pub fn parse<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(T::deserialize(&self.0)?)
    }
}

impl From<serde_json::Value> for ClientData {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// A named event emitted by the client connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event name, the key plugins subscribe under
    pub name: String,
    /// Opaque payload
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Event {
    pub fn new(name: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn parse<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(T::deserialize(&self.data)?)
    }
}

/// Lifecycle state of a plugin instance, as seen by whoever drives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginState {
    Constructed,
    Connecting,
    Connected,
    Closing,
    Closed,
    /// A lifecycle hook returned an error or panicked
    Failed,
}

impl PluginState {
    pub fn can_connect(self) -> bool {
        matches!(self, Self::Constructed)
    }

    pub fn can_close(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Constructed => "constructed",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closing => "closing",
            Self::Closed => "closed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Trait for client-connection plugins.
///
/// Only `base` and `base_mut` are required. Lifecycle hooks default to
/// no-ops; override the ones you care about. Subscriptions made inside an
/// `on_connect` that awaits are visible once the returned future resolves.
///
/// A bare [`PluginBase`] is not a plugin and cannot be driven:
///
/// ```compile_fail
/// use lcu_plugin::config::PluginsConfig;
/// use lcu_plugin::{PluginBase, PluginRegistry};
///
/// struct Marker;
///
/// let mut registry = PluginRegistry::new(&PluginsConfig::default());
/// registry.register(PluginBase::<Marker>::new("Marker").unwrap()).unwrap();
/// ```
///
/// A type becomes a plugin by embedding a base and implementing the trait:
///
/// ```
/// use lcu_plugin::config::PluginsConfig;
/// use lcu_plugin::{Plugin, PluginBase, PluginRegistry};
///
/// struct Marker {
///     base: PluginBase<Self>,
/// }
///
/// impl Plugin for Marker {
///     fn base(&self) -> &PluginBase<Self> {
///         &self.base
///     }
///     fn base_mut(&mut self) -> &mut PluginBase<Self> {
///         &mut self.base
///     }
/// }
///
/// let mut registry = PluginRegistry::new(&PluginsConfig::default());
/// let plugin = Marker { base: PluginBase::new("Marker").unwrap() };
/// assert!(registry.register(plugin).unwrap());
/// ```
#[async_trait]
pub trait Plugin: Send + Sync + Sized + 'static {
    fn base(&self) -> &PluginBase<Self>;
    fn base_mut(&mut self) -> &mut PluginBase<Self>;

    fn name(&self) -> &str {
        self.base().name()
    }

    /// Called once when the client connection becomes available.
    async fn on_connect(&mut self, _client: &ClientData) -> Result<()> {
        Ok(())
    }

    /// Called once when the client connection goes away.
    async fn on_close(&mut self) -> Result<()> {
        Ok(())
    }

    /// Register `handler` for `event`, replacing any previous handler.
    fn subscribe_event<F>(&mut self, event: impl Into<String>, handler: F)
    where
        F: Fn(&mut Self, &Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let event = event.into();
        tracing::trace!(plugin = %self.name(), event = %event, "Subscribing to event");
        self.base_mut().subscriptions_mut().insert(event, handler);
    }

    fn unsubscribe_event(&mut self, event: &str) {
        if self.base_mut().subscriptions_mut().remove(event) {
            tracing::trace!(plugin = %self.name(), event = %event, "Unsubscribed from event");
        }
    }

    fn unsubscribe_all(&mut self) {
        self.base_mut().subscriptions_mut().clear();
    }

    fn is_subscribed(&self, event: &str) -> bool {
        self.base().subscriptions().contains(event)
    }

    fn subscribed_events(&self) -> Vec<String> {
        self.base().subscriptions().names()
    }

    /// Invoke the handler subscribed to `event.name`, if any.
    ///
    /// Returns `Ok(false)` when the plugin is not subscribed.
    fn handle_event(&mut self, event: &Event) -> Result<bool> {
        let Some(handler) = self.base().subscriptions().get(&event.name) else {
            return Ok(false);
        };
        (*handler)(self, event).map_err(|e| PluginError::handler(&event.name, e))?;
        Ok(true)
    }

    /// Bridge completion-callback work into an awaitable [`Pending`].
    ///
    /// `handler` runs immediately with this plugin and a [`Settle`] handle.
    /// The pending value yields whatever the handle resolves with, or
    /// [`PluginError::Rejected`] when it rejects.
    fn create_promise<T, F>(&self, handler: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(&Self, Settle<T>),
    {
        let (settle, pending) = pending::channel();
        handler(self, settle);
        pending
    }

    /// Suspend for at least `milliseconds`.
    async fn sleep(&self, milliseconds: u64) {
        let delay = Duration::from_millis(milliseconds);
        let started = Instant::now();
        let timer = self.create_promise(|_, settle| pending::resolve_after(delay, settle));
        pending::await_timer(timer, started, delay).await;
    }

    /// Log prefix identifying this plugin, e.g. `[Example]`.
    fn tag(&self) -> String {
        format!("[{}]", self.name())
    }

    fn log(&self, message: impl fmt::Display) {
        tracing::info!(plugin = %self.name(), "{} {}", self.tag(), message);
    }

    fn error(&self, message: impl fmt::Display) {
        tracing::error!(plugin = %self.name(), "{} {}", self.tag(), message);
    }
}
