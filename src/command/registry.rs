//! Keyword-to-handler dispatch table
//!
//! Built once at startup from the builtin handler set, optionally
//! extended by plugins before serving begins, then shared immutably by
//! every session. A keyword claimed twice is a configuration error
//! reported at build time, never at dispatch time.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::command::handler::CommandHandler;
use crate::command::handlers;

/// The capability list always leads with the protocol version
const CAPABILITY_VERSION: &str = "VERSION 2";

/// Errors building or extending the dispatch table
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate handler registration for {0}")]
    DuplicateKeyword(String),
}

/// Maps protocol keywords to their handlers and assembles the
/// CAPABILITIES advertisement from the handlers' claims.
pub struct CommandRegistry {
    by_keyword: HashMap<String, Arc<dyn CommandHandler>>,
    /// Registration order; drives capability assembly
    handlers: Vec<Arc<dyn CommandHandler>>,
    capabilities: Vec<String>,
}

impl CommandRegistry {
    /// Build a registry from the given handlers.
    ///
    /// # Errors
    /// `DuplicateKeyword` when two handlers claim the same keyword.
    pub fn build(handlers: Vec<Arc<dyn CommandHandler>>) -> Result<Self, RegistryError> {
        let mut registry = Self {
            by_keyword: HashMap::new(),
            handlers: Vec::new(),
            capabilities: Vec::new(),
        };
        for handler in handlers {
            registry.register(handler)?;
        }
        Ok(registry)
    }

    /// The full RFC 3977/4643 builtin command set
    pub fn with_builtins() -> Result<Self, RegistryError> {
        Self::build(handlers::builtin_handlers())
    }

    /// Add a handler, claiming all its keywords.
    ///
    /// Nothing is claimed when any keyword is already taken.
    ///
    /// # Errors
    /// `DuplicateKeyword` on the first keyword already registered.
    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) -> Result<(), RegistryError> {
        for keyword in handler.supported_commands() {
            if self.by_keyword.contains_key(*keyword) {
                return Err(RegistryError::DuplicateKeyword((*keyword).to_string()));
            }
        }
        for keyword in handler.supported_commands() {
            self.by_keyword
                .insert((*keyword).to_string(), Arc::clone(&handler));
        }
        self.handlers.push(handler);
        self.rebuild_capabilities();
        Ok(())
    }

    /// Release one keyword, returning its handler.
    ///
    /// A handler stops contributing to CAPABILITIES once its last
    /// keyword is released.
    pub fn unregister(&mut self, keyword: &str) -> Option<Arc<dyn CommandHandler>> {
        let removed = self.by_keyword.remove(&keyword.to_ascii_uppercase());
        if removed.is_some() {
            self.rebuild_capabilities();
        }
        removed
    }

    /// Handler for an uppercase dispatch keyword
    pub fn resolve(&self, keyword: &str) -> Option<&Arc<dyn CommandHandler>> {
        self.by_keyword.get(&keyword.to_ascii_uppercase())
    }

    /// Capability labels for the CAPABILITIES response, version first
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    /// Every registered keyword, sorted; drives the HELP listing
    pub fn keywords(&self) -> Vec<&str> {
        let mut keywords: Vec<&str> = self.by_keyword.keys().map(String::as_str).collect();
        keywords.sort_unstable();
        keywords
    }

    /// Number of registered keywords
    pub fn len(&self) -> usize {
        self.by_keyword.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_keyword.is_empty()
    }

    /// Re-derive the capability list from handlers that still hold at
    /// least one keyword, keeping registration order and dropping
    /// duplicate labels.
    fn rebuild_capabilities(&mut self) {
        let by_keyword = &self.by_keyword;
        self.handlers.retain(|handler| {
            handler
                .supported_commands()
                .iter()
                .any(|kw| by_keyword.get(*kw).map_or(false, |h| Arc::ptr_eq(h, handler)))
        });

        let mut capabilities = vec![CAPABILITY_VERSION.to_string()];
        for handler in &self.handlers {
            if let Some(label) = handler.implied_capability() {
                if !capabilities.iter().any(|c| c == label) {
                    capabilities.push(label.to_string());
                }
            }
        }
        self.capabilities = capabilities;
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("keywords", &self.len())
            .field("capabilities", &self.capabilities)
            .finish()
    }
}
