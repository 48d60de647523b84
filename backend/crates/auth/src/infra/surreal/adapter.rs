//! SurrealQL implementation of the adapter contract

use serde_json::Value;

use super::client::SurrealClient;
use crate::domain::adapter::{Adapter, AdapterError, FindMany, Record, Where, require_where};
use crate::domain::schema::AuthSchema;
use crate::infra::transform::{Action, Transform};

pub struct SurrealAdapter<C> {
    client: C,
    transform: Transform,
}

/// Table and index definitions for the schema
pub fn schema_statements(schema: &AuthSchema) -> Vec<String> {
    let mut statements = Vec::new();
    for table in schema.tables() {
        let model = &table.model_name;
        statements.push(format!("DEFINE TABLE IF NOT EXISTS {model} SCHEMALESS;"));

        for (name, attribute) in table.fields() {
            let column = table.column(name);
            if attribute.unique {
                statements.push(format!(
                    "DEFINE INDEX IF NOT EXISTS {model}_{column}_unique ON TABLE {model} FIELDS {column} UNIQUE;"
                ));
            } else if attribute.references.is_some() {
                statements.push(format!(
                    "DEFINE INDEX IF NOT EXISTS {model}_{column}_idx ON TABLE {model} FIELDS {column};"
                ));
            }
        }
    }
    statements
}

fn into_rows(value: Value, failure: &str) -> Result<Vec<Record>, AdapterError> {
    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect()),
        Value::Object(map) => Ok(vec![map]),
        Value::Null => Ok(Vec::new()),
        _ => Err(AdapterError::Query(failure.to_string())),
    }
}

impl<C> SurrealAdapter<C> {
    pub fn new(client: C, schema: AuthSchema) -> Self {
        Self {
            client,
            transform: Transform::new(schema),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }
}

impl<C: SurrealClient + Sync> SurrealAdapter<C> {
    /// Run a single statement and return its result
    async fn run(&self, sql: &str) -> Result<Value, AdapterError> {
        let mut results = self.client.query(sql).await?;
        if results.is_empty() {
            return Ok(Value::Null);
        }
        Ok(results.swap_remove(0))
    }

    fn where_sql(&self, model: &str, wheres: &[Where]) -> Result<String, AdapterError> {
        let condition = self.transform.convert_where_clause(wheres, model)?;
        Ok(if condition.is_empty() {
            String::new()
        } else {
            format!(" WHERE {condition}")
        })
    }

    fn outputs(&self, rows: Vec<Record>, model: &str) -> Result<Vec<Record>, AdapterError> {
        rows.iter()
            .map(|row| self.transform.transform_output(row, model, &[]))
            .collect()
    }

    /// Define tables and unique indexes; safe to repeat
    pub async fn init_schema(&self) -> Result<(), AdapterError> {
        let sql = schema_statements(self.transform.schema()).join("\n");
        self.client.query(&sql).await?;
        tracing::info!("Database schema initialized");
        Ok(())
    }
}

impl<C: SurrealClient + Sync> Adapter for SurrealAdapter<C> {
    async fn create(&self, model: &str, data: Record) -> Result<Record, AdapterError> {
        let input = self
            .transform
            .transform_input(&data, model, Action::Create)?;
        let id = input
            .id
            .as_ref()
            .ok_or_else(|| AdapterError::Query("Failed to create record".to_string()))?;

        let sql = format!("CREATE {id} CONTENT {} RETURN AFTER", input.content());
        let rows = into_rows(self.run(&sql).await?, "Failed to create record")?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| AdapterError::Query("Failed to create record".to_string()))?;
        self.transform.transform_output(&row, model, &[])
    }

    async fn find_one(
        &self,
        model: &str,
        wheres: &[Where],
        select: &[String],
    ) -> Result<Option<Record>, AdapterError> {
        require_where(wheres, "find one record")?;
        self.transform.table(model)?;

        let columns = self.transform.select_clause(model, select)?;
        let sql = format!(
            "SELECT {columns} FROM {model}{} LIMIT 1",
            self.where_sql(model, wheres)?
        );
        let rows = into_rows(self.run(&sql).await?, "Failed to find record")?;

        rows.first()
            .map(|row| self.transform.transform_output(row, model, select))
            .transpose()
    }

    async fn find_many(&self, model: &str, query: FindMany) -> Result<Vec<Record>, AdapterError> {
        self.transform.table(model)?;

        let mut sql = format!(
            "SELECT * FROM {model}{}",
            self.where_sql(model, &query.wheres)?
        );
        if let Some(sort) = &query.sort_by {
            let column = self.transform.sort_column(model, &sort.field)?;
            sql.push_str(&format!(" ORDER BY {column} {}", sort.direction.as_str()));
        }
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = query.offset {
            sql.push_str(&format!(" START {offset}"));
        }

        let rows = into_rows(self.run(&sql).await?, "Failed to find records")?;
        self.outputs(rows, model)
    }

    async fn count(&self, model: &str, wheres: &[Where]) -> Result<u64, AdapterError> {
        self.transform.table(model)?;

        let condition = self.transform.convert_where_clause(wheres, model)?;
        let sql = format!("SELECT count({condition}) AS count FROM {model} GROUP ALL");
        let rows = into_rows(self.run(&sql).await?, "Failed to count records")?;

        match rows.first() {
            None => Ok(0),
            Some(row) => row
                .get("count")
                .and_then(Value::as_u64)
                .ok_or_else(|| AdapterError::Query("Failed to count records".to_string())),
        }
    }

    async fn update(
        &self,
        model: &str,
        wheres: &[Where],
        update: Record,
    ) -> Result<Record, AdapterError> {
        require_where(wheres, "update")?;
        let input = self
            .transform
            .transform_input(&update, model, Action::Update)?;

        let sql = format!(
            "UPDATE {model} MERGE {}{} RETURN AFTER",
            input.content(),
            self.where_sql(model, wheres)?
        );
        let rows = into_rows(self.run(&sql).await?, "Failed to update record")?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| AdapterError::Query("Failed to update record".to_string()))?;
        self.transform.transform_output(&row, model, &[])
    }

    async fn update_many(
        &self,
        model: &str,
        wheres: &[Where],
        update: Record,
    ) -> Result<u64, AdapterError> {
        require_where(wheres, "update many records")?;
        let input = self
            .transform
            .transform_input(&update, model, Action::Update)?;

        let sql = format!(
            "UPDATE {model} MERGE {}{} RETURN AFTER",
            input.content(),
            self.where_sql(model, wheres)?
        );
        let rows = into_rows(self.run(&sql).await?, "Failed to update many records")?;
        Ok(rows.len() as u64)
    }

    async fn delete(&self, model: &str, wheres: &[Where]) -> Result<(), AdapterError> {
        require_where(wheres, "delete")?;
        self.transform.table(model)?;

        let sql = format!("DELETE FROM {model}{}", self.where_sql(model, wheres)?);
        self.run(&sql).await?;
        Ok(())
    }

    async fn delete_many(&self, model: &str, wheres: &[Where]) -> Result<u64, AdapterError> {
        require_where(wheres, "delete")?;
        self.transform.table(model)?;

        let sql = format!(
            "DELETE FROM {model}{} RETURN BEFORE",
            self.where_sql(model, wheres)?
        );
        let rows = into_rows(self.run(&sql).await?, "Failed to delete records")?;
        Ok(rows.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::adapter::{Operator, SortDirection};
    use crate::domain::schema::models;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Records every statement and answers from a queue of canned results
    #[derive(Default)]
    struct MockClient {
        queries: Mutex<Vec<String>>,
        responses: Mutex<VecDeque<Result<Vec<Value>, AdapterError>>>,
    }

    impl MockClient {
        fn respond(self, result: Value) -> Self {
            self.responses.lock().unwrap().push_back(Ok(vec![result]));
            self
        }

        fn fail(self, error: AdapterError) -> Self {
            self.responses.lock().unwrap().push_back(Err(error));
            self
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    impl SurrealClient for MockClient {
        async fn query(&self, sql: &str) -> Result<Vec<Value>, AdapterError> {
            self.queries.lock().unwrap().push(sql.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(vec![json!([])]))
        }
    }

    fn adapter(client: MockClient) -> SurrealAdapter<MockClient> {
        SurrealAdapter::new(client, AuthSchema::default())
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn test_create() {
        let db = adapter(MockClient::default().respond(json!([{
            "id": "session:s1",
            "token": "tok",
            "userId": "user:u1",
            "expiresAt": "2099-01-01T00:00:00Z",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }])));

        let out = db
            .create(
                models::SESSION,
                record(json!({
                    "id": "s1",
                    "token": "tok",
                    "userId": "user:u1",
                    "expiresAt": "2099-01-01T00:00:00Z"
                })),
            )
            .await
            .unwrap();

        let sql = &db.client().queries()[0];
        assert!(sql.starts_with("CREATE session:s1 CONTENT { "));
        assert!(sql.contains(r#""userId": user:u1"#));
        assert!(sql.contains(r#""expiresAt": <datetime>'2099-01-01T00:00:00Z'"#));
        assert!(sql.ends_with(" RETURN AFTER"));

        assert_eq!(out["id"], json!("session:s1"));
        assert_eq!(out["userId"], json!("user:u1"));
    }

    #[tokio::test]
    async fn test_create_without_result_fails() {
        let db = adapter(MockClient::default().respond(json!([])));
        let err = db
            .create(models::USER, record(json!({ "name": "a", "email": "a@b.c" })))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to create record");
    }

    #[tokio::test]
    async fn test_find_one_queries() {
        let db = adapter(
            MockClient::default()
                .respond(json!([{ "id": "user:a", "email": "a@b.c" }]))
                .respond(json!([])),
        );

        let found = db
            .find_one(models::USER, &[Where::eq("email", "a@b.c")], &[])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found["id"], json!("user:a"));

        let missing = db
            .find_one(
                models::USER,
                &[Where::eq("id", "zzz")],
                &["email".to_string()],
            )
            .await
            .unwrap();
        assert!(missing.is_none());

        assert_eq!(
            db.client().queries(),
            vec![
                "SELECT * FROM user WHERE email = 'a@b.c' LIMIT 1",
                "SELECT id, email FROM user WHERE id = user:zzz LIMIT 1",
            ]
        );
    }

    #[tokio::test]
    async fn test_find_many_query() {
        let db = adapter(MockClient::default());
        db.find_many(
            models::SESSION,
            FindMany::default()
                .filter(Where::eq("userId", "user:u1"))
                .sort_by("createdAt", SortDirection::Desc)
                .limit(5)
                .offset(10),
        )
        .await
        .unwrap();
        db.find_many(models::SESSION, FindMany::default())
            .await
            .unwrap();

        assert_eq!(
            db.client().queries(),
            vec![
                "SELECT * FROM session WHERE userId = user:u1 ORDER BY createdAt DESC LIMIT 5 START 10",
                "SELECT * FROM session",
            ]
        );
    }

    #[tokio::test]
    async fn test_count() {
        let db = adapter(
            MockClient::default()
                .respond(json!([{ "count": 3 }]))
                .respond(json!([])),
        );
        assert_eq!(
            db.count(
                models::USER,
                &[Where::new("email", Operator::EndsWith, ".com")]
            )
            .await
            .unwrap(),
            3
        );
        assert_eq!(db.count(models::USER, &[]).await.unwrap(), 0);

        assert_eq!(
            db.client().queries(),
            vec![
                "SELECT count(string::ends_with(email, '.com')) AS count FROM user GROUP ALL",
                "SELECT count() AS count FROM user GROUP ALL",
            ]
        );
    }

    #[tokio::test]
    async fn test_update_and_update_many() {
        let db = adapter(
            MockClient::default()
                .respond(json!([{ "id": "user:a", "name": "New" }]))
                .respond(json!([]))
                .respond(json!([{ "id": "user:a" }, { "id": "user:b" }])),
        );

        let updated = db
            .update(
                models::USER,
                &[Where::eq("id", "user:a")],
                record(json!({ "name": "New" })),
            )
            .await
            .unwrap();
        assert_eq!(updated["name"], json!("New"));

        let err = db
            .update(
                models::USER,
                &[Where::eq("id", "user:b")],
                record(json!({ "name": "New" })),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to update record");

        let n = db
            .update_many(
                models::USER,
                &[Where::eq("emailVerified", false)],
                record(json!({ "emailVerified": true })),
            )
            .await
            .unwrap();
        assert_eq!(n, 2);

        let queries = db.client().queries();
        assert_eq!(
            queries[0],
            r#"UPDATE user MERGE { "name": 'New' } WHERE id = user:a RETURN AFTER"#
        );
        assert_eq!(
            queries[2],
            r#"UPDATE user MERGE { "emailVerified": true } WHERE emailVerified = false RETURN AFTER"#
        );
    }

    #[tokio::test]
    async fn test_delete_and_delete_many() {
        let db = adapter(
            MockClient::default()
                .respond(json!([]))
                .respond(json!([{ "id": "session:a" }, { "id": "session:b" }])),
        );

        db.delete(models::SESSION, &[Where::eq("token", "t")])
            .await
            .unwrap();
        let n = db
            .delete_many(models::SESSION, &[Where::eq("userId", "u1")])
            .await
            .unwrap();
        assert_eq!(n, 2);

        assert_eq!(
            db.client().queries(),
            vec![
                "DELETE FROM session WHERE token = 't'",
                "DELETE FROM session WHERE userId = user:u1 RETURN BEFORE",
            ]
        );
    }

    #[tokio::test]
    async fn test_guards_and_errors() {
        let db = adapter(MockClient::default().fail(AdapterError::Query(
            "Database record `user:a` already exists".into(),
        )));

        assert!(matches!(
            db.delete(models::USER, &[]).await,
            Err(AdapterError::EmptyWhere(_))
        ));
        assert!(matches!(
            db.count("team", &[]).await,
            Err(AdapterError::UnknownModel(_))
        ));
        assert!(db.client().queries().is_empty());

        let err = db
            .create(models::USER, record(json!({ "id": "a", "name": "x", "email": "x@y.z" })))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_init_schema() {
        let db = adapter(MockClient::default());
        db.init_schema().await.unwrap();

        let sql = &db.client().queries()[0];
        assert!(sql.contains("DEFINE TABLE IF NOT EXISTS user SCHEMALESS;"));
        assert!(sql.contains(
            "DEFINE INDEX IF NOT EXISTS user_email_unique ON TABLE user FIELDS email UNIQUE;"
        ));
        assert!(sql.contains(
            "DEFINE INDEX IF NOT EXISTS session_token_unique ON TABLE session FIELDS token UNIQUE;"
        ));
        assert!(sql.contains(
            "DEFINE INDEX IF NOT EXISTS account_userId_idx ON TABLE account FIELDS userId;"
        ));
    }
}
