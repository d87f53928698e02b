//! Plugin contract for components driven by an external client connection.

pub mod config;
pub mod error;
pub mod logging;
pub mod plugins;

pub use config::Config;
pub use error::{PluginError, Result};
pub use plugins::{ClientData, Event, Plugin, PluginBase, PluginRegistry, PluginState};

pub mod prelude {
    //! Everything a plugin implementation usually needs.

    pub use crate::error::{PluginError, Result};
    pub use crate::plugins::{ClientData, Event, Pending, Plugin, PluginBase, Settle};
    pub use async_trait::async_trait;
}
