//! Remote status service configuration.

use crate::sync::{MalformedPolicy, RemoteEndpoint, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub malformed_policy: MalformedPolicy,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user: String::new(),
            password: String::new(),
            timeout_secs: default_timeout_secs(),
            malformed_policy: MalformedPolicy::default(),
        }
    }
}

impl RemoteConfig {
    pub fn endpoint(&self) -> RemoteEndpoint {
        RemoteEndpoint {
            base_url: self.base_url.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}
