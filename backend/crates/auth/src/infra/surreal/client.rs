//! SurrealDB HTTP client and connection settings

use std::time::Duration;

use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::adapter::AdapterError;

/// Executes SurrealQL; one JSON result per statement
#[trait_variant::make(SurrealClient: Send)]
pub trait LocalSurrealClient {
    async fn query(&self, sql: &str) -> Result<Vec<Value>, AdapterError>;
}

/// Database connection settings
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("namespace", &self.namespace)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl DbConfig {
    /// Read `DB_*` variables from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let is_test = non_empty("APP_ENV")
            .or_else(|| non_empty("NODE_ENV"))
            .is_some_and(|env| env == "test");
        let default_host = if is_test {
            "mem://test.db"
        } else {
            "http://127.0.0.1:8000"
        };

        Self {
            host: non_empty("DB_HOST").unwrap_or_else(|| default_host.to_string()),
            namespace: non_empty("DB_NAMESPACE").unwrap_or_else(|| "local".to_string()),
            database: non_empty("DB_DATABASE").unwrap_or_else(|| "persisted".to_string()),
            username: non_empty("DB_USERNAME"),
            password: non_empty("DB_PASSWORD"),
            token: non_empty("DB_TOKEN"),
        }
    }

    /// Served in-process instead of by a server
    pub fn is_memory(&self) -> bool {
        self.host.starts_with("mem://")
    }

    /// Base HTTP URL of the server (`ws(s)://` mapped to `http(s)://`)
    pub fn http_base(&self) -> Result<String, AdapterError> {
        let host = self.host.trim();
        let base = if let Some(rest) = host.strip_prefix("ws://") {
            format!("http://{rest}")
        } else if let Some(rest) = host.strip_prefix("wss://") {
            format!("https://{rest}")
        } else if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            return Err(AdapterError::Transport(format!(
                "unsupported database host {host}; use mem:// or an http(s)/ws(s) server URL"
            )));
        };

        let base = base.trim_end_matches('/');
        Ok(base
            .strip_suffix("/rpc")
            .or_else(|| base.strip_suffix("/sql"))
            .unwrap_or(base)
            .to_string())
    }

    fn check_credentials(&self) -> Result<(), AdapterError> {
        if self.token.is_some() || (self.username.is_some() && self.password.is_some()) {
            return Ok(());
        }
        Err(AdapterError::Transport(
            "Username and password are required for non-embedded databases".to_string(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct StatementResponse {
    status: String,
    #[serde(default)]
    result: Value,
}

fn transport(e: reqwest::Error) -> AdapterError {
    AdapterError::Transport(e.to_string())
}

/// Client for a running SurrealDB server
#[derive(Debug, Clone)]
pub struct HttpSurrealClient {
    http: reqwest::Client,
    sql_url: String,
    config: DbConfig,
}

impl HttpSurrealClient {
    /// Build a client and check the server answers its health endpoint
    pub async fn connect(config: &DbConfig) -> Result<Self, AdapterError> {
        config.check_credentials()?;
        let base = config.http_base()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(transport)?;

        http.get(format!("{base}/health"))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(transport)?;

        tracing::info!(
            host = %config.host,
            namespace = %config.namespace,
            database = %config.database,
            "Connected to SurrealDB"
        );

        Ok(Self {
            http,
            sql_url: format!("{base}/sql"),
            config: config.clone(),
        })
    }
}

impl SurrealClient for HttpSurrealClient {
    async fn query(&self, sql: &str) -> Result<Vec<Value>, AdapterError> {
        let mut request = self
            .http
            .post(&self.sql_url)
            .header(ACCEPT, "application/json")
            .header("surreal-ns", &self.config.namespace)
            .header("surreal-db", &self.config.database)
            .body(sql.to_string());

        request = match (&self.config.token, &self.config.username) {
            (Some(token), _) => request.bearer_auth(token),
            (None, Some(user)) => request.basic_auth(user, self.config.password.as_ref()),
            (None, None) => request,
        };

        tracing::debug!(sql = %sql, "SurrealQL");

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if status.is_server_error() && status != reqwest::StatusCode::INTERNAL_SERVER_ERROR {
            return Err(AdapterError::Transport(format!("SurrealDB returned {status}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Query(format!(
                "SurrealDB returned {status}: {body}"
            )));
        }

        let statements: Vec<StatementResponse> = response
            .json()
            .await
            .map_err(|e| AdapterError::Decode(e.to_string()))?;

        statements
            .into_iter()
            .map(|statement| {
                if statement.status == "OK" {
                    Ok(statement.result)
                } else {
                    let message = match statement.result {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    Err(AdapterError::Query(message))
                }
            })
            .collect()
    }
}
