//! Remote store: one row per owner, replaced wholesale on save.
//!
//! `PgRemoteStore` talks to Postgres directly. `RestRemoteStore` talks to a
//! hosted PostgREST-style table API. Both upsert keyed by owner, so concurrent
//! saves resolve last-write-wins without duplicate rows.

use async_trait::async_trait;
use reqwest::Client;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::models::row::ResumeRow;
use crate::sync::SyncError;

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// The owner's most recent row, if any.
    async fn fetch_latest(&self, owner: Uuid) -> Result<Option<ResumeRow>, SyncError>;
    /// Insert-or-replace the owner's row.
    async fn upsert(&self, row: &ResumeRow) -> Result<(), SyncError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Postgres
// ────────────────────────────────────────────────────────────────────────────

pub struct PgRemoteStore {
    pool: PgPool,
}

impl PgRemoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RemoteStore for PgRemoteStore {
    async fn fetch_latest(&self, owner: Uuid) -> Result<Option<ResumeRow>, SyncError> {
        Ok(sqlx::query_as::<_, ResumeRow>(
            r#"
            SELECT user_id, data, template, updated_at
            FROM resumes
            WHERE user_id = $1
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn upsert(&self, row: &ResumeRow) -> Result<(), SyncError> {
        sqlx::query(
            r#"
            INSERT INTO resumes (user_id, data, template, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET data = EXCLUDED.data,
                template = EXCLUDED.template,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(row.user_id)
        .bind(&row.data)
        .bind(&row.template)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        debug!("Upserted resume row for {}", row.user_id);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Hosted row API
// ────────────────────────────────────────────────────────────────────────────

const REST_TABLE_PATH: &str = "rest/v1/resumes";

pub struct RestRemoteStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestRemoteStore {
    pub fn new(base_url: String, api_key: String) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/{}", self.base_url, REST_TABLE_PATH)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

#[async_trait]
impl RemoteStore for RestRemoteStore {
    async fn fetch_latest(&self, owner: Uuid) -> Result<Option<ResumeRow>, SyncError> {
        let response = self
            .authed(self.client.get(self.table_url()))
            .query(&[
                ("user_id", format!("eq.{owner}")),
                ("order", "updated_at.desc".to_string()),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let mut rows: Vec<ResumeRow> = response.json().await?;
        Ok(rows.pop())
    }

    async fn upsert(&self, row: &ResumeRow) -> Result<(), SyncError> {
        self.authed(self.client.post(self.table_url()))
            .query(&[("on_conflict", "user_id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[row])
            .send()
            .await?
            .error_for_status()?;

        debug!("Upserted resume row for {} via row API", row.user_id);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory double
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub mod memory {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    /// Upsert-by-owner map with failure injection and simulated latency.
    #[derive(Default)]
    pub struct MemoryRemoteStore {
        rows: Mutex<HashMap<Uuid, ResumeRow>>,
        pub fail_loads: AtomicBool,
        pub fail_saves: AtomicBool,
        pub upserts: AtomicUsize,
        pub latency: Mutex<Duration>,
        pub load_latency: Mutex<Duration>,
    }

    impl MemoryRemoteStore {
        pub fn insert(&self, row: ResumeRow) {
            self.rows.lock().unwrap().insert(row.user_id, row);
        }

        pub fn row(&self, owner: Uuid) -> Option<ResumeRow> {
            self.rows.lock().unwrap().get(&owner).cloned()
        }

        pub fn row_count(&self) -> usize {
            self.rows.lock().unwrap().len()
        }

        pub fn upsert_count(&self) -> usize {
            self.upserts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteStore for MemoryRemoteStore {
        async fn fetch_latest(&self, owner: Uuid) -> Result<Option<ResumeRow>, SyncError> {
            let latency = *self.load_latency.lock().unwrap();
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            if self.fail_loads.load(Ordering::SeqCst) {
                return Err(SyncError::Remote("connection refused".to_string()));
            }
            Ok(self.row(owner))
        }

        async fn upsert(&self, row: &ResumeRow) -> Result<(), SyncError> {
            let latency = *self.latency.lock().unwrap();
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            self.upserts.fetch_add(1, Ordering::SeqCst);
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(SyncError::Remote("network unreachable".to_string()));
            }
            self.insert(row.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_table_url_normalizes_trailing_slash() {
        let store = RestRemoteStore::new("https://rows.example.com/".to_string(), "k".to_string())
            .unwrap();
        assert_eq!(store.table_url(), "https://rows.example.com/rest/v1/resumes");
    }
}
