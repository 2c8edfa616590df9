//! Definitions document rendering
//!
//! The document uses the broker's definitions import format so a freshly
//! provisioned site broker can load its whole object graph at boot.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use relaymesh_core::types::SiteSettings;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::compile::CompiledTopology;
use crate::relay::{RelaySpec, ShovelValue};

/// Hashing scheme name the broker expects next to `password_hash`
pub const HASHING_ALGORITHM: &str = "rabbit_password_hashing_sha256";

/// Runtime parameter component of relay links
pub const SHOVEL_COMPONENT: &str = "shovel";

/// Tag granting the administrative user full management access
pub const ADMIN_TAG: &str = "administrator";

/// Full-access permission pattern
const ALL: &str = ".*";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VhostDefinition {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDefinition {
    pub name: String,
    pub password_hash: String,
    pub hashing_algorithm: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionDefinition {
    pub user: String,
    pub vhost: String,
    pub configure: String,
    pub write: String,
    pub read: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeDefinition {
    pub name: String,
    pub vhost: String,
    #[serde(rename = "type")]
    pub exchange_type: String,
    pub durable: bool,
    pub auto_delete: bool,
    pub internal: bool,
    pub arguments: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueDefinition {
    pub name: String,
    pub vhost: String,
    pub durable: bool,
    pub auto_delete: bool,
    pub arguments: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingDefinition {
    pub source: String,
    pub vhost: String,
    pub destination: String,
    pub destination_type: String,
    pub routing_key: String,
    pub arguments: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub value: ShovelValue,
    pub vhost: String,
    pub component: String,
    pub name: String,
}

/// Complete object graph of one site broker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionsDocument {
    pub vhosts: Vec<VhostDefinition>,
    pub users: Vec<UserDefinition>,
    pub permissions: Vec<PermissionDefinition>,
    pub exchanges: Vec<ExchangeDefinition>,
    pub queues: Vec<QueueDefinition>,
    pub bindings: Vec<BindingDefinition>,
    pub parameters: Vec<ParameterDefinition>,
}

impl DefinitionsDocument {
    /// Render the document for a site from its site-variant topology
    pub fn render(
        site_name: &str,
        topology: &CompiledTopology,
        relays: &[RelaySpec],
        admin: &SiteSettings,
    ) -> Self {
        let vhost = topology.vhost.clone();
        let salt = derive_salt(site_name, &admin.username);

        Self {
            vhosts: vec![VhostDefinition {
                name: vhost.clone(),
            }],
            users: vec![UserDefinition {
                name: admin.username.clone(),
                password_hash: rabbit_password_hash(salt, admin.password.expose()),
                hashing_algorithm: HASHING_ALGORITHM.to_string(),
                tags: vec![ADMIN_TAG.to_string()],
            }],
            permissions: vec![PermissionDefinition {
                user: admin.username.clone(),
                vhost: vhost.clone(),
                configure: ALL.to_string(),
                write: ALL.to_string(),
                read: ALL.to_string(),
            }],
            exchanges: topology
                .exchanges
                .iter()
                .map(|e| ExchangeDefinition {
                    name: e.name.clone(),
                    vhost: vhost.clone(),
                    exchange_type: e.exchange_type.clone(),
                    durable: e.durable,
                    auto_delete: e.auto_delete,
                    internal: false,
                    arguments: Map::new(),
                })
                .collect(),
            queues: topology
                .queues
                .iter()
                .map(|q| QueueDefinition {
                    name: q.name.clone(),
                    vhost: vhost.clone(),
                    durable: q.durable,
                    auto_delete: q.auto_delete,
                    arguments: Map::new(),
                })
                .collect(),
            bindings: topology
                .bindings
                .iter()
                .map(|b| BindingDefinition {
                    source: b.source.clone(),
                    vhost: vhost.clone(),
                    destination: b.destination.clone(),
                    destination_type: "queue".to_string(),
                    routing_key: b.routing_key.clone(),
                    arguments: Map::new(),
                })
                .collect(),
            parameters: relays
                .iter()
                .map(|r| ParameterDefinition {
                    value: r.shovel_value(),
                    vhost: vhost.clone(),
                    component: SHOVEL_COMPONENT.to_string(),
                    name: r.name.clone(),
                })
                .collect(),
        }
    }

    /// Pretty-printed JSON, newline terminated
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

/// Salt for the admin user's digest, stable per site and user
fn derive_salt(site_name: &str, username: &str) -> [u8; 4] {
    let digest = Sha256::digest(format!("{}:{}", site_name, username).as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Password digest in the broker's `rabbit_password_hashing_sha256` format
///
/// `base64(salt ++ sha256(salt ++ password))`
pub fn rabbit_password_hash(salt: [u8; 4], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();

    let mut salted = Vec::with_capacity(salt.len() + digest.len());
    salted.extend_from_slice(&salt);
    salted.extend_from_slice(&digest);
    STANDARD.encode(salted)
}
