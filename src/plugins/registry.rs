//! Plugin registry and lifecycle driver.
//!
//! The registry owns plugin instances of different concrete types, walks them
//! through `Constructed -> Connecting -> Connected -> Closing -> Closed`, and
//! awaits every lifecycle hook before moving on. It does not produce or route
//! events; a dispatcher looks plugins up and calls `handle_event` itself.

use async_trait::async_trait;
use futures_util::FutureExt;
use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;

use super::traits::{ClientData, Event, Plugin, PluginState};
use crate::config::PluginsConfig;
use crate::error::{PluginError, Result};

/// Object-safe view of a [`Plugin`], implemented for every plugin type.
///
/// Method names carry a `dyn_` prefix so that having both traits in scope
/// never makes calls on a concrete plugin ambiguous.
#[async_trait]
pub trait DynPlugin: Send + Sync {
    fn dyn_name(&self) -> &str;
    async fn dyn_on_connect(&mut self, client: &ClientData) -> Result<()>;
    async fn dyn_on_close(&mut self) -> Result<()>;
    fn dyn_handle_event(&mut self, event: &Event) -> Result<bool>;
    fn dyn_is_subscribed(&self, event: &str) -> bool;
    fn dyn_subscribed_events(&self) -> Vec<String>;
}

#[async_trait]
impl<P: Plugin> DynPlugin for P {
    fn dyn_name(&self) -> &str {
        self.name()
    }

    async fn dyn_on_connect(&mut self, client: &ClientData) -> Result<()> {
        self.on_connect(client).await
    }

    async fn dyn_on_close(&mut self) -> Result<()> {
        self.on_close().await
    }

    fn dyn_handle_event(&mut self, event: &Event) -> Result<bool> {
        self.handle_event(event)
    }

    fn dyn_is_subscribed(&self, event: &str) -> bool {
        self.is_subscribed(event)
    }

    fn dyn_subscribed_events(&self) -> Vec<String> {
        self.subscribed_events()
    }
}

/// A registered plugin and where it is in its lifecycle.
pub struct PluginEntry {
    plugin: Box<dyn DynPlugin>,
    state: PluginState,
}

impl PluginEntry {
    pub fn name(&self) -> &str {
        self.plugin.dyn_name()
    }

    pub fn state(&self) -> PluginState {
        self.state
    }
}

/// Registry for plugins sharing one client connection.
pub struct PluginRegistry {
    /// Entries in registration order
    plugins: Vec<PluginEntry>,
    /// Whether the plugin system is enabled
    enabled: bool,
    /// Names skipped at registration
    disabled: HashSet<String>,
    /// Plugin-specific settings keyed by plugin name
    settings: HashMap<String, HashMap<String, serde_json::Value>>,
}

impl PluginRegistry {
    pub fn new(config: &PluginsConfig) -> Self {
        Self {
            plugins: Vec::new(),
            enabled: config.enabled,
            disabled: config.disabled.iter().cloned().collect(),
            settings: config.settings.clone(),
        }
    }

    /// Register a concrete plugin.
    ///
    /// Returns `Ok(false)` when the plugin is skipped because the registry or
    /// the plugin is disabled by configuration.
    pub fn register<P: Plugin>(&mut self, plugin: P) -> Result<bool> {
        self.register_boxed(Box::new(plugin))
    }

    pub fn register_boxed(&mut self, plugin: Box<dyn DynPlugin>) -> Result<bool> {
        let name = plugin.dyn_name().to_string();

        if !self.enabled {
            tracing::debug!(plugin = %name, "Plugin system is disabled, skipping");
            return Ok(false);
        }
        if self.disabled.contains(&name) {
            tracing::debug!(plugin = %name, "Plugin '{name}' is disabled, skipping");
            return Ok(false);
        }
        if self.position(&name).is_some() {
            return Err(PluginError::DuplicatePlugin(name));
        }

        tracing::info!(plugin = %name, "Registered plugin");
        self.plugins.push(PluginEntry {
            plugin,
            state: PluginState::Constructed,
        });
        Ok(true)
    }

    /// Connect one plugin and wait for its `on_connect` to settle.
    pub async fn connect(&mut self, name: &str, client: &ClientData) -> Result<()> {
        let entry = self.entry_mut(name)?;
        if !entry.state.can_connect() {
            return Err(PluginError::InvalidTransition {
                plugin: name.to_string(),
                from: entry.state,
                action: "connect",
            });
        }

        entry.state = PluginState::Connecting;
        tracing::debug!(plugin = %name, "Connecting plugin");
        let outcome = AssertUnwindSafe(entry.plugin.dyn_on_connect(client))
            .catch_unwind()
            .await;
        settle_hook(entry, outcome, "on_connect", PluginState::Connected)
    }

    /// Close one connected plugin and wait for its `on_close` to settle.
    pub async fn close(&mut self, name: &str) -> Result<()> {
        let entry = self.entry_mut(name)?;
        if !entry.state.can_close() {
            return Err(PluginError::InvalidTransition {
                plugin: name.to_string(),
                from: entry.state,
                action: "close",
            });
        }

        entry.state = PluginState::Closing;
        tracing::debug!(plugin = %name, "Closing plugin");
        let outcome = AssertUnwindSafe(entry.plugin.dyn_on_close())
            .catch_unwind()
            .await;
        settle_hook(entry, outcome, "on_close", PluginState::Closed)
    }

    /// Connect every constructed plugin in registration order.
    ///
    /// A failing plugin does not stop the others. Returns the names of the
    /// plugins that failed.
    pub async fn connect_all(&mut self, client: &ClientData) -> Vec<String> {
        let mut failed = Vec::new();
        for name in self.names_in(PluginState::Constructed) {
            if self.connect(&name, client).await.is_err() {
                failed.push(name);
            }
        }
        failed
    }

    /// Close every connected plugin in registration order.
    pub async fn close_all(&mut self) -> Vec<String> {
        let mut failed = Vec::new();
        for name in self.names_in(PluginState::Connected) {
            if self.close(&name).await.is_err() {
                failed.push(name);
            }
        }
        failed
    }

    pub fn state(&self, name: &str) -> Option<PluginState> {
        self.position(name).map(|i| self.plugins[i].state)
    }

    /// Look up a plugin so a dispatcher can hand it events.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn DynPlugin + 'static)> {
        let i = self.position(name)?;
        Some(self.plugins[i].plugin.as_mut())
    }

    /// Events the named plugin is currently subscribed to.
    pub fn subscriptions(&self, name: &str) -> Option<Vec<String>> {
        self.position(name)
            .map(|i| self.plugins[i].plugin.dyn_subscribed_events())
    }

    /// Names of connected plugins subscribed to `event`.
    pub fn subscribers(&self, event: &str) -> Vec<&str> {
        self.plugins
            .iter()
            .filter(|e| e.state == PluginState::Connected && e.plugin.dyn_is_subscribed(event))
            .map(PluginEntry::name)
            .collect()
    }

    pub fn settings(&self, name: &str) -> Option<&HashMap<String, serde_json::Value>> {
        self.settings.get(name)
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(PluginEntry::name).collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &PluginEntry> {
        self.plugins.iter()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.plugins.iter().position(|e| e.name() == name)
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut PluginEntry> {
        self.plugins
            .iter_mut()
            .find(|e| e.name() == name)
            .ok_or_else(|| PluginError::PluginNotFound(name.to_string()))
    }

    fn names_in(&self, state: PluginState) -> Vec<String> {
        self.plugins
            .iter()
            .filter(|e| e.state == state)
            .map(|e| e.name().to_string())
            .collect()
    }
}

/// Record the outcome of an awaited lifecycle hook on `entry`.
fn settle_hook(
    entry: &mut PluginEntry,
    outcome: std::thread::Result<Result<()>>,
    hook: &'static str,
    next: PluginState,
) -> Result<()> {
    match outcome {
        Ok(Ok(())) => {
            entry.state = next;
            tracing::info!(plugin = %entry.name(), state = %next, "Plugin {hook} completed");
            Ok(())
        }
        Ok(Err(e)) => {
            entry.state = PluginState::Failed;
            tracing::error!(plugin = %entry.name(), error = %e, "Plugin {hook} failed");
            Err(e)
        }
        Err(_) => {
            entry.state = PluginState::Failed;
            tracing::error!(plugin = %entry.name(), "Plugin {hook} panicked");
            Err(PluginError::HookPanicked {
                plugin: entry.name().to_string(),
                hook,
            })
        }
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("enabled", &self.enabled)
            .field("plugins", &self.plugin_names())
            .finish_non_exhaustive()
    }
}
