//! Runtime choice between the in-memory and SurrealDB adapters

use crate::domain::adapter::{Adapter, AdapterError, FindMany, Record, Where};
use crate::domain::schema::AuthSchema;
use crate::infra::memory::MemoryAdapter;
use crate::infra::surreal::{DbConfig, SurrealAdapter, SurrealConnection};

pub enum AnyAdapter {
    Memory(MemoryAdapter),
    Surreal(SurrealAdapter<SurrealConnection<DbConfig>>),
}

impl AnyAdapter {
    /// `mem://` hosts are served in-process, everything else by a server
    pub fn from_config(config: DbConfig, schema: AuthSchema) -> Self {
        if config.is_memory() {
            tracing::info!(host = %config.host, "Using in-memory database");
            AnyAdapter::Memory(MemoryAdapter::new(schema))
        } else {
            AnyAdapter::Surreal(SurrealAdapter::new(SurrealConnection::new(config), schema))
        }
    }

    pub async fn init_schema(&self) -> Result<(), AdapterError> {
        match self {
            AnyAdapter::Memory(_) => Ok(()),
            AnyAdapter::Surreal(adapter) => adapter.init_schema().await,
        }
    }

    pub async fn close(&self) {
        if let AnyAdapter::Surreal(adapter) = self {
            adapter.client().close().await;
        }
    }
}

impl Adapter for AnyAdapter {
    async fn create(&self, model: &str, data: Record) -> Result<Record, AdapterError> {
        match self {
            AnyAdapter::Memory(a) => a.create(model, data).await,
            AnyAdapter::Surreal(a) => a.create(model, data).await,
        }
    }

    async fn find_one(
        &self,
        model: &str,
        wheres: &[Where],
        select: &[String],
    ) -> Result<Option<Record>, AdapterError> {
        match self {
            AnyAdapter::Memory(a) => a.find_one(model, wheres, select).await,
            AnyAdapter::Surreal(a) => a.find_one(model, wheres, select).await,
        }
    }

    async fn find_many(&self, model: &str, query: FindMany) -> Result<Vec<Record>, AdapterError> {
        match self {
            AnyAdapter::Memory(a) => a.find_many(model, query).await,
            AnyAdapter::Surreal(a) => a.find_many(model, query).await,
        }
    }

    async fn count(&self, model: &str, wheres: &[Where]) -> Result<u64, AdapterError> {
        match self {
            AnyAdapter::Memory(a) => a.count(model, wheres).await,
            AnyAdapter::Surreal(a) => a.count(model, wheres).await,
        }
    }

    async fn update(
        &self,
        model: &str,
        wheres: &[Where],
        update: Record,
    ) -> Result<Record, AdapterError> {
        match self {
            AnyAdapter::Memory(a) => a.update(model, wheres, update).await,
            AnyAdapter::Surreal(a) => a.update(model, wheres, update).await,
        }
    }

    async fn update_many(
        &self,
        model: &str,
        wheres: &[Where],
        update: Record,
    ) -> Result<u64, AdapterError> {
        match self {
            AnyAdapter::Memory(a) => a.update_many(model, wheres, update).await,
            AnyAdapter::Surreal(a) => a.update_many(model, wheres, update).await,
        }
    }

    async fn delete(&self, model: &str, wheres: &[Where]) -> Result<(), AdapterError> {
        match self {
            AnyAdapter::Memory(a) => a.delete(model, wheres).await,
            AnyAdapter::Surreal(a) => a.delete(model, wheres).await,
        }
    }

    async fn delete_many(&self, model: &str, wheres: &[Where]) -> Result<u64, AdapterError> {
        match self {
            AnyAdapter::Memory(a) => a.delete_many(model, wheres).await,
            AnyAdapter::Surreal(a) => a.delete_many(model, wheres).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_host_selects_memory_adapter() {
        let config = DbConfig::from_lookup(|key| match key {
            "DB_HOST" => Some("mem://test.db".to_string()),
            _ => None,
        });
        let adapter = AnyAdapter::from_config(config, AuthSchema::default());
        assert!(matches!(adapter, AnyAdapter::Memory(_)));
        assert!(adapter.init_schema().await.is_ok());
        assert_eq!(adapter.count("user", &[]).await.unwrap(), 0);
    }

    #[test]
    fn test_server_host_selects_surreal_adapter() {
        let config = DbConfig::from_lookup(|key| match key {
            "DB_HOST" => Some("ws://127.0.0.1:8000/rpc".to_string()),
            _ => None,
        });
        let adapter = AnyAdapter::from_config(config, AuthSchema::default());
        assert!(matches!(adapter, AnyAdapter::Surreal(_)));
    }
}
