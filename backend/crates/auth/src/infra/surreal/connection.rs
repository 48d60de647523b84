//! Shared, lazily established database connection

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;

use super::client::{DbConfig, HttpSurrealClient, SurrealClient};
use crate::domain::adapter::AdapterError;

/// Opens new clients
pub trait Connector: Send + Sync {
    type Client: SurrealClient + Sync + 'static;

    fn connect(&self) -> impl Future<Output = Result<Self::Client, AdapterError>> + Send;
}

impl Connector for DbConfig {
    type Client = HttpSurrealClient;

    async fn connect(&self) -> Result<HttpSurrealClient, AdapterError> {
        HttpSurrealClient::connect(self).await
    }
}

/// Connects on first use and reconnects after transport failures
///
/// Connection attempts hold the slot lock, so concurrent first callers wait
/// for a single in-flight connect instead of opening their own. Only
/// read-only statements are replayed on the fresh client; a write may already
/// have been committed when the transport failed.
pub struct SurrealConnection<K: Connector> {
    connector: K,
    client: Mutex<Option<Arc<K::Client>>>,
}

impl<K: Connector> SurrealConnection<K> {
    pub fn new(connector: K) -> Self {
        Self {
            connector,
            client: Mutex::new(None),
        }
    }

    pub async fn client(&self) -> Result<Arc<K::Client>, AdapterError> {
        let mut slot = self.client.lock().await;
        if let Some(client) = slot.as_ref() {
            return Ok(Arc::clone(client));
        }

        let client = Arc::new(self.connector.connect().await.inspect_err(|e| {
            tracing::error!(error = %e, "Database connection failed");
        })?);
        *slot = Some(Arc::clone(&client));
        Ok(client)
    }

    pub async fn is_connected(&self) -> bool {
        self.client.lock().await.is_some()
    }

    /// Drop the cached client; the next query connects again
    pub async fn close(&self) {
        self.client.lock().await.take();
    }
}

impl<K: Connector> SurrealClient for SurrealConnection<K> {
    async fn query(&self, sql: &str) -> Result<Vec<Value>, AdapterError> {
        let client = self.client().await?;
        match client.query(sql).await {
            Err(e) if e.is_transport() => {
                self.close().await;
                if !is_read_only(sql) {
                    tracing::warn!(error = %e, "Database connection lost during a write");
                    return Err(e);
                }
                tracing::warn!(error = %e, "Database connection lost, reconnecting");
                self.client().await?.query(sql).await
            }
            result => result,
        }
    }
}

/// True when every statement only reads
fn is_read_only(sql: &str) -> bool {
    sql.split(';')
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .all(|statement| {
            let keyword = statement
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_ascii_uppercase();
            matches!(keyword.as_str(), "SELECT" | "INFO" | "RETURN")
        })
}
