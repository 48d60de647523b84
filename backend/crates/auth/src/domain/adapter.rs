//! Adapter Contract
//!
//! Store-independent data access used by every auth flow. Records are JSON
//! objects keyed by logical field names; implementations translate them into
//! their own storage layout.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A record as seen by the auth flows
pub type Record = serde_json::Map<String, Value>;

/// Comparison operator of a where predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    #[default]
    Eq,
    In,
    Contains,
    StartsWith,
    EndsWith,
    /// Unrecognized operators fall back to equality
    #[serde(other)]
    Other,
}

/// One predicate of a where clause; a list of them is joined with AND
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Where {
    pub field: String,
    #[serde(default)]
    pub operator: Operator,
    pub value: Value,
}

impl Where {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Eq, value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortBy {
    pub field: String,
    pub direction: SortDirection,
}

/// Arguments of `find_many`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindMany {
    pub wheres: Vec<Where>,
    pub sort_by: Option<SortBy>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl FindMany {
    pub fn filter(mut self, clause: Where) -> Self {
        self.wheres.push(clause);
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_by = Some(SortBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Adapter failures
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Model {0} not found in schema")]
    UnknownModel(String),

    /// A statement failed or returned nothing where a record was required
    #[error("{0}")]
    Query(String),

    #[error("Refusing to {0} without a where clause")]
    EmptyWhere(&'static str),

    #[error("Invalid record id: {0}")]
    InvalidRecordId(String),

    #[error("Database unreachable: {0}")]
    Transport(String),

    #[error("Failed to decode record: {0}")]
    Decode(String),
}

impl AdapterError {
    /// Whether a fresh connection may succeed where this one failed
    pub fn is_transport(&self) -> bool {
        matches!(self, AdapterError::Transport(_))
    }
}

/// Generic CRUD contract implemented per backing store
#[trait_variant::make(Adapter: Send)]
pub trait LocalAdapter {
    async fn create(&self, model: &str, data: Record) -> Result<Record, AdapterError>;

    async fn find_one(
        &self,
        model: &str,
        wheres: &[Where],
        select: &[String],
    ) -> Result<Option<Record>, AdapterError>;

    async fn find_many(&self, model: &str, query: FindMany) -> Result<Vec<Record>, AdapterError>;

    async fn count(&self, model: &str, wheres: &[Where]) -> Result<u64, AdapterError>;

    /// Update matching records and return the first one
    async fn update(
        &self,
        model: &str,
        wheres: &[Where],
        update: Record,
    ) -> Result<Record, AdapterError>;

    /// Update matching records and return how many changed
    async fn update_many(
        &self,
        model: &str,
        wheres: &[Where],
        update: Record,
    ) -> Result<u64, AdapterError>;

    async fn delete(&self, model: &str, wheres: &[Where]) -> Result<(), AdapterError>;

    async fn delete_many(&self, model: &str, wheres: &[Where]) -> Result<u64, AdapterError>;
}

/// Guard for operations that must never run unfiltered
pub fn require_where(wheres: &[Where], operation: &'static str) -> Result<(), AdapterError> {
    if wheres.is_empty() {
        return Err(AdapterError::EmptyWhere(operation));
    }
    Ok(())
}

/// Deserialize an adapter record into an entity
pub fn decode_record<T: DeserializeOwned>(record: Record) -> Result<T, AdapterError> {
    serde_json::from_value(Value::Object(record)).map_err(|e| AdapterError::Decode(e.to_string()))
}

/// Serialize an entity into an adapter record
pub fn encode_record<T: Serialize>(value: &T) -> Result<Record, AdapterError> {
    match serde_json::to_value(value).map_err(|e| AdapterError::Decode(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(AdapterError::Decode(format!(
            "expected an object, got {other}"
        ))),
    }
}
