//! Per-host client registry
//!
//! Shares one [`LebaiClient`] per controller host. Entries live as long as
//! the registry; there is no eviction.

use crate::client::LebaiClient;
use dashmap::DashMap;
use lebai_core::{ClientConfig, Result};
use std::sync::Arc;
use tracing::debug;

pub struct ClientRegistry {
    template: ClientConfig,
    clients: DashMap<String, Arc<LebaiClient>>,
}

impl ClientRegistry {
    /// Every client is built from `template` with its host replaced
    pub fn new(template: ClientConfig) -> Self {
        Self {
            template,
            clients: DashMap::new(),
        }
    }

    /// Return the client for `host`, creating it on first access.
    ///
    /// Construction happens under the map entry lock, so racing callers for
    /// the same host always receive the same instance.
    pub fn get_or_connect(&self, host: &str) -> Result<Arc<LebaiClient>> {
        if let Some(client) = self.clients.get(host) {
            return Ok(Arc::clone(client.value()));
        }

        let entry = self.clients.entry(host.to_string()).or_try_insert_with(|| {
            debug!(host, "Registering new client");
            let mut config = self.template.clone();
            config.host = host.to_string();
            LebaiClient::new(config).map(Arc::new)
        })?;
        Ok(Arc::clone(entry.value()))
    }

    pub fn contains(&self, host: &str) -> bool {
        self.clients.contains_key(host)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lebai_core::Error;

    #[test]
    fn test_same_host_shares_client() {
        let registry = ClientRegistry::default();
        let first = registry.get_or_connect("10.0.0.1").unwrap();
        let second = registry.get_or_connect("10.0.0.1").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_distinct_hosts_get_distinct_clients() {
        let registry = ClientRegistry::default();
        let a = registry.get_or_connect("10.0.0.1").unwrap();
        let b = registry.get_or_connect("10.0.0.2").unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.config().host, "10.0.0.1");
        assert_eq!(b.config().host, "10.0.0.2");
        assert!(registry.contains("10.0.0.2"));
        assert!(!registry.contains("10.0.0.3"));
    }

    #[test]
    fn test_template_settings_are_kept() {
        let mut template = ClientConfig::default();
        template.http_port = 8080;
        let registry = ClientRegistry::new(template);

        let client = registry.get_or_connect("robot").unwrap();
        assert_eq!(client.tasks().api().base_url(), "http://robot:8080");
    }

    #[test]
    fn test_invalid_host_is_not_registered() {
        let registry = ClientRegistry::default();
        assert!(matches!(registry.get_or_connect(""), Err(Error::Config(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_first_access_builds_one_client() {
        let registry = Arc::new(ClientRegistry::default());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.get_or_connect("10.0.0.9").unwrap())
            })
            .collect();
        let clients: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(registry.len(), 1);
        assert!(clients.iter().all(|c| Arc::ptr_eq(c, &clients[0])));
    }
}
