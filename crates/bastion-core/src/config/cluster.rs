//! Local cluster identity.

use serde::{Deserialize, Serialize};

/// Identity of the cluster this auth server signs for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Cluster (domain) name used as the certificate authority identity.
    #[serde(default = "default_name")]
    pub name: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
        }
    }
}

fn default_name() -> String {
    "localhost".to_string()
}
