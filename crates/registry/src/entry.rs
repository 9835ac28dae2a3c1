use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::policy::Policy;

/// Um arquivo disponível para resgate.
///
/// `expires_at` é calculado na criação e nunca muda.
#[derive(Debug, Clone)]
pub struct Entry {
    code: String,
    storage_path: PathBuf,
    display_name: String,
    created_at: DateTime<Utc>,
    policy: Policy,
    expires_at: DateTime<Utc>,
    download_count: u64,
}

impl Entry {
    pub(crate) fn new(
        code: String,
        storage_path: PathBuf,
        display_name: String,
        created_at: DateTime<Utc>,
        policy: Policy,
    ) -> Self {
        Self {
            code,
            storage_path,
            display_name,
            created_at,
            policy,
            expires_at: created_at + policy.lifetime(),
            download_count: 0,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn download_count(&self) -> u64 {
        self.download_count
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub(crate) fn record_download(&mut self) {
        self.download_count = self.download_count.saturating_add(1);
    }
}
