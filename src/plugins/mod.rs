//! Plugin system.
//!
//! Plugins react to an external client connection: `on_connect` when it comes
//! up, `on_close` when it goes away, and named events in between through the
//! handlers they subscribe. Both hooks are async; whoever drives a plugin
//! awaits them before treating it as ready or torn down.
//!
//! # Example
//!
//! ```no_run
//! use lcu_plugin::prelude::*;
//!
//! struct Example {
//!     base: PluginBase<Self>,
//! }
//!
//! #[async_trait]
//! impl Plugin for Example {
//!     fn base(&self) -> &PluginBase<Self> {
//!         &self.base
//!     }
//!     fn base_mut(&mut self) -> &mut PluginBase<Self> {
//!         &mut self.base
//!     }
//!
//!     async fn on_connect(&mut self, _client: &ClientData) -> Result<()> {
//!         self.sleep(50).await;
//!         self.subscribe_event("ready", |plugin: &mut Example, _| {
//!             plugin.log("client is ready");
//!             Ok(())
//!         });
//!         Ok(())
//!     }
//!
//!     async fn on_close(&mut self) -> Result<()> {
//!         self.unsubscribe_all();
//!         Ok(())
//!     }
//! }
//! ```

pub mod base;
pub mod pending;
pub mod registry;
pub mod subscriptions;
pub mod traits;

pub use base::{PluginBase, ABSTRACT_PLUGIN_NAME};
pub use pending::{Pending, Settle};
pub use registry::{DynPlugin, PluginEntry, PluginRegistry};
pub use subscriptions::{EventHandler, EventSubscriptions};
pub use traits::{ClientData, Event, Plugin, PluginState};
