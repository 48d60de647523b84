//! In-memory adapter
//!
//! Same contract and transforms as the SurrealDB adapter, evaluated over
//! process-local tables. Serves `mem://` hosts, development and tests.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::domain::adapter::{
    Adapter, AdapterError, FindMany, Operator, Record, SortDirection, Where, require_where,
};
use crate::domain::schema::AuthSchema;
use crate::infra::transform::{Action, ResolvedWhere, Transform};
use crate::infra::value::SurrealValue;

type Row = BTreeMap<String, SurrealValue>;

/// Process-local store; clones share the same tables
#[derive(Debug, Clone)]
pub struct MemoryAdapter {
    transform: Transform,
    tables: Arc<RwLock<BTreeMap<String, Vec<Row>>>>,
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::new(AuthSchema::default())
    }
}

fn rank(value: &SurrealValue) -> u8 {
    match value {
        SurrealValue::Null => 0,
        SurrealValue::Bool(_) => 1,
        SurrealValue::Number(_) => 2,
        SurrealValue::Strand(_) => 3,
        SurrealValue::Datetime(_) => 4,
        SurrealValue::Thing(_) => 5,
        SurrealValue::Array(_) => 6,
        SurrealValue::Object(_) => 7,
    }
}

fn compare(a: &SurrealValue, b: &SurrealValue) -> Ordering {
    use SurrealValue::*;
    match (a, b) {
        (Bool(x), Bool(y)) => x.cmp(y),
        (Number(x), Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Strand(x), Strand(y)) => x.cmp(y),
        (Datetime(x), Datetime(y)) => x.cmp(y),
        (Thing(x), Thing(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn matches(row: &Row, clause: &ResolvedWhere) -> bool {
    let field = row.get(&clause.column).unwrap_or(&SurrealValue::Null);
    match clause.operator {
        Operator::Eq | Operator::Other => field == &clause.value,
        Operator::In => match &clause.value {
            SurrealValue::Array(items) => items.contains(field),
            other => other == field,
        },
        Operator::Contains => match field {
            SurrealValue::Strand(s) => s.contains(&clause.value.to_text()),
            SurrealValue::Array(items) => items.contains(&clause.value),
            _ => false,
        },
        Operator::StartsWith => field
            .as_str()
            .is_some_and(|s| s.starts_with(&clause.value.to_text())),
        Operator::EndsWith => field
            .as_str()
            .is_some_and(|s| s.ends_with(&clause.value.to_text())),
    }
}

fn matches_all(row: &Row, clauses: &[ResolvedWhere]) -> bool {
    clauses.iter().all(|c| matches(row, c))
}

fn row_to_record(row: &Row) -> Record {
    row.iter()
        .map(|(k, v)| (k.clone(), v.clone().into_json()))
        .collect()
}

impl MemoryAdapter {
    pub fn new(schema: AuthSchema) -> Self {
        Self {
            transform: Transform::new(schema),
            tables: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    fn output(&self, row: &Row, model: &str, select: &[String]) -> Result<Record, AdapterError> {
        self.transform
            .transform_output(&row_to_record(row), model, select)
    }

    /// Column of a unique field already holding `row`'s value
    fn unique_conflict(&self, model: &str, others: &[&Row], row: &Row) -> Option<String> {
        let table = self.transform.schema().table(model)?;
        table
            .fields()
            .filter(|(_, attr)| attr.unique)
            .map(|(name, _)| table.column(name))
            .find(|column| {
                row.get(*column).is_some_and(|value| {
                    !value.is_null()
                        && others
                            .iter()
                            .any(|existing| existing.get(*column) == Some(value))
                })
            })
            .map(str::to_string)
    }

    /// Merge `fields` into every row matching `clauses`, or into none of them
    ///
    /// Returns the indexes of the updated rows.
    fn merge_matching(
        &self,
        model: &str,
        rows: &mut [Row],
        clauses: &[ResolvedWhere],
        fields: &BTreeMap<String, SurrealValue>,
    ) -> Result<Vec<usize>, AdapterError> {
        let matched: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| matches_all(row, clauses))
            .map(|(i, _)| i)
            .collect();

        let merged: Vec<Row> = matched
            .iter()
            .map(|&i| {
                let mut row = rows[i].clone();
                row.extend(fields.clone());
                row
            })
            .collect();

        let mut others: Vec<&Row> = rows
            .iter()
            .enumerate()
            .filter(|(i, _)| !matched.contains(i))
            .map(|(_, row)| row)
            .collect();
        for row in &merged {
            if let Some(column) = self.unique_conflict(model, &others, row) {
                return Err(AdapterError::Query(format!(
                    "Failed to update record: duplicate value for unique field {column}"
                )));
            }
            others.push(row);
        }

        for (&i, row) in matched.iter().zip(merged) {
            rows[i] = row;
        }
        Ok(matched)
    }
}

impl Adapter for MemoryAdapter {
    async fn create(&self, model: &str, data: Record) -> Result<Record, AdapterError> {
        let input = self
            .transform
            .transform_input(&data, model, Action::Create)?;
        let id = input
            .id
            .ok_or_else(|| AdapterError::Query("Failed to create record".to_string()))?;

        let mut row = input.fields;
        row.insert("id".to_string(), SurrealValue::Thing(id.clone()));

        let mut tables = self.tables.write().await;
        let rows = tables.entry(model.to_string()).or_default();

        if rows
            .iter()
            .any(|r| r.get("id") == Some(&SurrealValue::Thing(id.clone())))
        {
            return Err(AdapterError::Query(format!(
                "Failed to create record: {id} already exists"
            )));
        }
        let existing: Vec<&Row> = rows.iter().collect();
        if let Some(column) = self.unique_conflict(model, &existing, &row) {
            return Err(AdapterError::Query(format!(
                "Failed to create record: duplicate value for unique field {column}"
            )));
        }

        let output = self.output(&row, model, &[])?;
        rows.push(row);
        Ok(output)
    }

    async fn find_one(
        &self,
        model: &str,
        wheres: &[Where],
        select: &[String],
    ) -> Result<Option<Record>, AdapterError> {
        require_where(wheres, "find one record")?;
        let clauses = self.transform.resolve_wheres(model, wheres)?;

        let tables = self.tables.read().await;
        tables
            .get(model)
            .and_then(|rows| rows.iter().find(|row| matches_all(row, &clauses)))
            .map(|row| self.output(row, model, select))
            .transpose()
    }

    async fn find_many(&self, model: &str, query: FindMany) -> Result<Vec<Record>, AdapterError> {
        self.transform.table(model)?;
        let clauses = self.transform.resolve_wheres(model, &query.wheres)?;
        let sort = query
            .sort_by
            .as_ref()
            .map(|s| {
                self.transform
                    .sort_column(model, &s.field)
                    .map(|column| (column, s.direction))
            })
            .transpose()?;

        let tables = self.tables.read().await;
        let mut rows: Vec<&Row> = tables
            .get(model)
            .map(|rows| rows.iter().filter(|r| matches_all(r, &clauses)).collect())
            .unwrap_or_default();

        if let Some((column, direction)) = sort {
            rows.sort_by(|a, b| {
                let ord = compare(
                    a.get(&column).unwrap_or(&SurrealValue::Null),
                    b.get(&column).unwrap_or(&SurrealValue::Null),
                );
                match direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }

        rows.into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|row| self.output(row, model, &[]))
            .collect()
    }

    async fn count(&self, model: &str, wheres: &[Where]) -> Result<u64, AdapterError> {
        self.transform.table(model)?;
        let clauses = self.transform.resolve_wheres(model, wheres)?;

        let tables = self.tables.read().await;
        let count = tables
            .get(model)
            .map(|rows| rows.iter().filter(|r| matches_all(r, &clauses)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn update(
        &self,
        model: &str,
        wheres: &[Where],
        update: Record,
    ) -> Result<Record, AdapterError> {
        require_where(wheres, "update")?;
        let clauses = self.transform.resolve_wheres(model, wheres)?;
        let input = self
            .transform
            .transform_input(&update, model, Action::Update)?;

        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(model) else {
            return Err(AdapterError::Query("Failed to update record".to_string()));
        };
        let updated = self.merge_matching(model, rows, &clauses, &input.fields)?;

        match updated.first() {
            Some(&i) => self.output(&rows[i], model, &[]),
            None => Err(AdapterError::Query("Failed to update record".to_string())),
        }
    }

    async fn update_many(
        &self,
        model: &str,
        wheres: &[Where],
        update: Record,
    ) -> Result<u64, AdapterError> {
        require_where(wheres, "update many records")?;
        let clauses = self.transform.resolve_wheres(model, wheres)?;
        let input = self
            .transform
            .transform_input(&update, model, Action::Update)?;

        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(model) else {
            return Ok(0);
        };
        let updated = self.merge_matching(model, rows, &clauses, &input.fields)?;
        Ok(updated.len() as u64)
    }

    async fn delete(&self, model: &str, wheres: &[Where]) -> Result<(), AdapterError> {
        self.delete_many(model, wheres).await.map(|_| ())
    }

    async fn delete_many(&self, model: &str, wheres: &[Where]) -> Result<u64, AdapterError> {
        require_where(wheres, "delete")?;
        let clauses = self.transform.resolve_wheres(model, wheres)?;

        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(model) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !matches_all(row, &clauses));
        Ok((before - rows.len()) as u64)
    }
}
