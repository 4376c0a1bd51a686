//! Bootstrap extension points
//!
//! A plugin contributes command handlers and storage providers before the
//! server starts serving. Loading returns a [`Registration`] recording
//! exactly what was installed; unloading consumes it and removes exactly
//! those contributions, leaving everything else untouched. Once serving
//! begins the registries are shared immutably, so plugins only ever run
//! during bootstrap.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::command::{CommandRegistry, RegistryError};
use crate::storage::{MemoryProvider, ProviderRegistry, StorageError};

/// Errors loading a plugin
#[derive(Debug, Error)]
pub enum PluginError {
    /// A command keyword the plugin claims is already taken
    #[error(transparent)]
    Command(#[from] RegistryError),

    /// A provider name the plugin claims is already taken
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The mutable registries plugins install into.
///
/// The server builds one of these at bootstrap, runs every plugin
/// against it, then freezes both registries for serving.
pub struct ExtensionPoints {
    pub commands: CommandRegistry,
    pub providers: ProviderRegistry,
}

impl ExtensionPoints {
    /// Builtin command set plus the memory storage provider
    ///
    /// # Errors
    /// Fails only if the builtin handler set is internally inconsistent.
    pub fn with_builtins() -> Result<Self, PluginError> {
        let commands = CommandRegistry::with_builtins()?;
        let mut providers = ProviderRegistry::new();
        providers.register(Arc::new(MemoryProvider::new()))?;
        Ok(Self {
            commands,
            providers,
        })
    }

    /// Load one plugin, recording its contributions.
    ///
    /// # Errors
    /// Fails when the plugin claims an occupied keyword or provider name;
    /// the plugin is responsible for not leaving partial installs behind.
    pub fn load(&mut self, plugin: &dyn Plugin) -> Result<Registration, PluginError> {
        let registration = plugin.load(self)?;
        info!(
            "Loaded plugin {}: {} command keyword(s), {} provider(s)",
            registration.plugin,
            registration.command_keywords.len(),
            registration.provider_names.len()
        );
        Ok(registration)
    }

    /// Remove exactly what a load installed
    pub fn unload(&mut self, registration: Registration) {
        for keyword in &registration.command_keywords {
            if self.commands.unregister(keyword).is_none() {
                warn!(
                    "Plugin {} keyword {} was already unregistered",
                    registration.plugin, keyword
                );
            }
        }
        for name in &registration.provider_names {
            if self.providers.unregister(name).is_none() {
                warn!(
                    "Plugin {} provider {} was already unregistered",
                    registration.plugin, name
                );
            }
        }
        info!("Unloaded plugin {}", registration.plugin);
    }
}

/// What one plugin installed; consumed to reverse the load
#[derive(Debug)]
pub struct Registration {
    plugin: String,
    command_keywords: Vec<String>,
    provider_names: Vec<String>,
}

impl Registration {
    /// Record a plugin's contributions. Keywords and names must match
    /// what the plugin actually registered, or unload will not reverse
    /// the load.
    pub fn new(
        plugin: impl Into<String>,
        command_keywords: Vec<String>,
        provider_names: Vec<String>,
    ) -> Self {
        Self {
            plugin: plugin.into(),
            command_keywords,
            provider_names,
        }
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn command_keywords(&self) -> &[String] {
        &self.command_keywords
    }

    pub fn provider_names(&self) -> &[String] {
        &self.provider_names
    }
}

/// A bundle of command handlers and storage providers
pub trait Plugin {
    fn name(&self) -> &str;

    /// Install this plugin's contributions.
    ///
    /// # Errors
    /// Fails when a claimed keyword or provider name is occupied. A
    /// failing load must leave the extension points as it found them.
    fn load(&self, extensions: &mut ExtensionPoints) -> Result<Registration, PluginError>;
}
