//! Built-in manifest for the Wazuh single-cluster swarm stack.
//!
//! Paths are relative to the manifest root (`config/` by default), matching
//! the layout produced by the Wazuh certificate generator.

use super::{Manifest, SecretManifestEntry};

const WAZUH_SECRETS: &[(&str, &str)] = &[
    // TLS material from the certificate generator
    ("wazuh-root-ca", "wazuh_indexer_ssl_certs/root-ca.pem"),
    ("wazuh-root-ca-manager", "wazuh_indexer_ssl_certs/root-ca-manager.pem"),
    ("wazuh-indexer-cert", "wazuh_indexer_ssl_certs/wazuh.indexer.pem"),
    ("wazuh-indexer-key", "wazuh_indexer_ssl_certs/wazuh.indexer-key.pem"),
    ("wazuh-admin-cert", "wazuh_indexer_ssl_certs/admin.pem"),
    ("wazuh-admin-key", "wazuh_indexer_ssl_certs/admin-key.pem"),
    ("wazuh-manager-cert", "wazuh_indexer_ssl_certs/wazuh.manager.pem"),
    ("wazuh-manager-key", "wazuh_indexer_ssl_certs/wazuh.manager-key.pem"),
    ("wazuh-dashboard-cert", "wazuh_indexer_ssl_certs/wazuh.dashboard.pem"),
    ("wazuh-dashboard-key", "wazuh_indexer_ssl_certs/wazuh.dashboard-key.pem"),
    // Component configuration
    ("wazuh-indexer-config", "wazuh_indexer/wazuh.indexer.yml"),
    ("wazuh-indexer-internal-users", "wazuh_indexer/internal_users.yml"),
    ("wazuh-dashboard-config", "wazuh_dashboard/opensearch_dashboards.yml"),
    ("wazuh-dashboard-app-config", "wazuh_dashboard/wazuh.yml"),
    ("wazuh-manager-config", "wazuh_cluster/wazuh_manager.conf"),
];

/// The manifest used when no manifest file is configured
#[must_use]
pub fn wazuh_default_manifest() -> Manifest {
    let entries = WAZUH_SECRETS
        .iter()
        .map(|(name, path)| SecretManifestEntry::new(*name, *path))
        .collect();
    // Names above are static and satisfy the validation rules
    Manifest { entries }
}
