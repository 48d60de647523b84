//! Field transforms shared by the adapters
//!
//! Maps logical field names to storage columns, applies schema defaults on
//! create, coerces `*Id` fields into record references and ISO date strings
//! into datetimes, and renders where clauses as SurrealQL.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::domain::adapter::{AdapterError, Operator, Record, Where};
use crate::domain::schema::{AuthSchema, DefaultValue, FieldAttribute, TableSchema};
use crate::infra::value::{RecordId, SurrealValue, quote_str};

/// Whether the input is being created or merged into existing records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
}

/// Fields whose names end in `Id` hold record references, with exceptions
pub fn should_convert_to_record_id(field: &str, model: &str) -> bool {
    if !field.ends_with("Id") {
        return false;
    }
    if matches!(field, "providerId" | "activeOrganizationId") {
        return false;
    }
    !(field == "accountId" && model == "account")
}

fn has_iso_date_prefix(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() > 10
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[4] == b'-'
        && b[5..7].iter().all(u8::is_ascii_digit)
        && b[7] == b'-'
        && b[8..10].iter().all(u8::is_ascii_digit)
        && b[10] == b'T'
}

/// `YYYY-MM-DDT...` strings that parse as RFC 3339, or as a naive UTC time
pub fn parse_date_string(s: &str) -> Option<DateTime<Utc>> {
    if !has_iso_date_prefix(s) {
        return None;
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

pub fn is_date_string(s: &str) -> bool {
    parse_date_string(s).is_some()
}

fn to_record_id(value: Value, table: &str) -> Result<SurrealValue, AdapterError> {
    match value {
        Value::String(s) => RecordId::parse_or(&s, table).map(SurrealValue::Thing),
        Value::Number(n) => Ok(SurrealValue::Thing(RecordId::new(table, n.to_string()))),
        other => Err(AdapterError::InvalidRecordId(other.to_string())),
    }
}

fn coerce(
    value: Value,
    field: Option<&FieldAttribute>,
    column: &str,
    model: &str,
) -> Result<SurrealValue, AdapterError> {
    if value.is_null() {
        return Ok(SurrealValue::Null);
    }
    if column == "id" {
        return to_record_id(value, model);
    }
    if let Some(reference) = field.and_then(|f| f.references.as_ref()) {
        return to_record_id(value, &reference.model);
    }
    if should_convert_to_record_id(column, model) {
        let table = column.strip_suffix("Id").unwrap_or(column);
        return to_record_id(value, table);
    }
    if let Value::String(s) = &value {
        if let Some(dt) = parse_date_string(s) {
            return Ok(SurrealValue::Datetime(dt));
        }
    }
    Ok(SurrealValue::from_json(value))
}

fn default_of(default: &DefaultValue) -> SurrealValue {
    match default {
        DefaultValue::Value(v) => SurrealValue::from_json(v.clone()),
        DefaultValue::Now => SurrealValue::Datetime(Utc::now()),
    }
}

/// Resolve one input value against its schema field
///
/// `None` means the column is left out of the write. Defaults apply on
/// create only; coercions apply to both actions.
pub fn with_apply_default(
    value: Option<Value>,
    field: &FieldAttribute,
    column: &str,
    action: Action,
    model: &str,
) -> Result<Option<SurrealValue>, AdapterError> {
    match value {
        None | Some(Value::Null) => {
            if action == Action::Create {
                if let Some(default) = &field.default_value {
                    return Ok(Some(default_of(default)));
                }
            }
            Ok(value.map(|_| SurrealValue::Null))
        }
        Some(v) => coerce(v, Some(field), column, model).map(Some),
    }
}

fn checked_column(column: &str) -> Result<&str, AdapterError> {
    if !column.is_empty()
        && column
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(column)
    } else {
        Err(AdapterError::Query(format!("Invalid field name: {column}")))
    }
}

/// Transformed write payload
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedInput {
    /// Set on create only
    pub id: Option<RecordId>,
    pub fields: BTreeMap<String, SurrealValue>,
}

impl TransformedInput {
    pub fn content(&self) -> SurrealValue {
        SurrealValue::Object(self.fields.clone())
    }
}

/// A where predicate resolved to its column and typed value
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedWhere {
    pub column: String,
    pub operator: Operator,
    pub value: SurrealValue,
}

impl ResolvedWhere {
    pub fn to_surql(&self) -> String {
        let column = &self.column;
        let value = &self.value;
        match self.operator {
            Operator::Eq | Operator::Other => format!("{column} = {value}"),
            Operator::In => format!("{column} IN {value}"),
            Operator::Contains => format!("{column} CONTAINS {value}"),
            Operator::StartsWith => format!(
                "string::starts_with({column}, {})",
                quote_str(&value.to_text())
            ),
            Operator::EndsWith => format!(
                "string::ends_with({column}, {})",
                quote_str(&value.to_text())
            ),
        }
    }
}

/// Schema-driven transforms
#[derive(Debug, Clone)]
pub struct Transform {
    schema: Arc<AuthSchema>,
}

impl Transform {
    pub fn new(schema: AuthSchema) -> Self {
        Self {
            schema: Arc::new(schema),
        }
    }

    pub fn schema(&self) -> &AuthSchema {
        &self.schema
    }

    pub fn table(&self, model: &str) -> Result<&TableSchema, AdapterError> {
        self.schema
            .table(model)
            .ok_or_else(|| AdapterError::UnknownModel(model.to_string()))
    }

    /// Storage column of a logical field (`id` is never renamed)
    pub fn get_field(&self, model: &str, field: &str) -> String {
        if field == "id" {
            return field.to_string();
        }
        self.schema
            .table(model)
            .map(|t| t.column(field).to_string())
            .unwrap_or_else(|| field.to_string())
    }

    pub fn transform_select(&self, model: &str, select: &[String]) -> Vec<String> {
        select.iter().map(|f| self.get_field(model, f)).collect()
    }

    /// Validated column list for a `SELECT`
    pub fn select_clause(&self, model: &str, select: &[String]) -> Result<String, AdapterError> {
        if select.is_empty() {
            return Ok("*".to_string());
        }
        let mut columns = self.transform_select(model, select);
        if !columns.iter().any(|c| c == "id") {
            columns.insert(0, "id".to_string());
        }
        for column in &columns {
            checked_column(column)?;
        }
        Ok(columns.join(", "))
    }

    pub fn sort_column(&self, model: &str, field: &str) -> Result<String, AdapterError> {
        let column = self.get_field(model, field);
        checked_column(&column)?;
        Ok(column)
    }

    pub fn transform_input(
        &self,
        data: &Record,
        model: &str,
        action: Action,
    ) -> Result<TransformedInput, AdapterError> {
        let table = self.table(model)?;

        let id = match action {
            Action::Update => None,
            Action::Create => {
                let key = match data.get("id") {
                    Some(Value::String(s)) if !s.is_empty() => RecordId::parse_or(s, model)?.key,
                    Some(Value::Number(n)) => n.to_string(),
                    _ => platform::crypto::generate_id(),
                };
                Some(RecordId::new(model, key))
            }
        };

        let mut fields = BTreeMap::new();
        for (name, attribute) in table.fields() {
            let value = data.get(name).cloned();
            if value.is_none() && attribute.default_value.is_none() {
                continue;
            }
            let column = table.column(name);
            if let Some(v) = with_apply_default(value, attribute, column, action, model)? {
                fields.insert(column.to_string(), v);
            }
        }

        Ok(TransformedInput { id, fields })
    }

    /// Map a stored row back to logical field names
    pub fn transform_output(
        &self,
        row: &Record,
        model: &str,
        select: &[String],
    ) -> Result<Record, AdapterError> {
        let table = self.table(model)?;
        let mut out = Record::new();

        let wants = |field: &str| select.is_empty() || select.iter().any(|s| s == field);

        if let Some(id) = row.get("id").or_else(|| row.get("_id")) {
            if !id.is_null() && wants("id") {
                out.insert("id".to_string(), normalize_id(id, model));
            }
        }

        for (name, _) in table.fields() {
            if !wants(name) {
                continue;
            }
            if let Some(value) = row.get(table.column(name)) {
                out.insert(name.to_string(), value.clone());
            }
        }

        Ok(out)
    }

    /// Resolve a predicate to its column and a value coerced like input data
    pub fn resolve_where(&self, model: &str, clause: &Where) -> Result<ResolvedWhere, AdapterError> {
        let table = self.table(model)?;
        let column = self.get_field(model, &clause.field);
        checked_column(&column)?;
        let attribute = table.get(&clause.field);

        let value = match (clause.operator, clause.value.clone()) {
            (Operator::In, Value::Array(items)) => SurrealValue::Array(
                items
                    .into_iter()
                    .map(|item| coerce(item, attribute, &column, model))
                    .collect::<Result<_, _>>()?,
            ),
            (Operator::In, single) => {
                SurrealValue::Array(vec![coerce(single, attribute, &column, model)?])
            }
            (Operator::StartsWith | Operator::EndsWith, Value::String(s)) => SurrealValue::Strand(s),
            (_, value) => coerce(value, attribute, &column, model)?,
        };

        Ok(ResolvedWhere {
            column,
            operator: clause.operator,
            value,
        })
    }

    pub fn resolve_wheres(
        &self,
        model: &str,
        wheres: &[Where],
    ) -> Result<Vec<ResolvedWhere>, AdapterError> {
        wheres.iter().map(|w| self.resolve_where(model, w)).collect()
    }

    /// SurrealQL condition for a clause list (empty for no clauses)
    pub fn convert_where_clause(&self, wheres: &[Where], model: &str) -> Result<String, AdapterError> {
        Ok(self
            .resolve_wheres(model, wheres)?
            .iter()
            .map(ResolvedWhere::to_surql)
            .collect::<Vec<_>>()
            .join(" AND "))
    }
}

/// Render stored ids as `table:key` strings
fn normalize_id(id: &Value, model: &str) -> Value {
    match id {
        Value::String(s) => match RecordId::parse_or(s, model) {
            Ok(record) => Value::String(record.to_string()),
            Err(_) => id.clone(),
        },
        Value::Object(map) => match (map.get("tb").and_then(Value::as_str), map.get("id")) {
            (Some(tb), Some(Value::String(key))) => {
                Value::String(RecordId::new(tb, key.as_str()).to_string())
            }
            _ => id.clone(),
        },
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::{FieldType, models};
    use serde_json::json;

    fn transform() -> Transform {
        Transform::new(AuthSchema::default())
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_should_convert_to_record_id() {
        assert!(should_convert_to_record_id("userId", "session"));
        assert!(should_convert_to_record_id("accountId", "session"));
        assert!(!should_convert_to_record_id("accountId", "account"));
        assert!(!should_convert_to_record_id("providerId", "account"));
        assert!(!should_convert_to_record_id("activeOrganizationId", "session"));
        assert!(!should_convert_to_record_id("email", "user"));
        assert!(!should_convert_to_record_id("id", "user"));
    }

    #[test]
    fn test_date_strings() {
        assert!(is_date_string("2024-05-01T12:00:00Z"));
        assert!(is_date_string("2024-05-01T12:00:00.123+02:00"));
        assert!(is_date_string("2024-05-01T12:00:00"));
        assert!(!is_date_string("2024-05-01"));
        assert!(!is_date_string("2024-13-45T99:00:00Z"));
        assert!(!is_date_string("hello"));
    }

    #[test]
    fn test_with_apply_default_order() {
        let plain = FieldAttribute::new(FieldType::String);
        let flag = FieldAttribute::new(FieldType::Boolean)
            .default_value(DefaultValue::Value(json!(false)));
        let referencing = FieldAttribute::new(FieldType::String).references("user", "id");

        // default on create, including falsy defaults
        assert_eq!(
            with_apply_default(None, &flag, "emailVerified", Action::Create, "user").unwrap(),
            Some(SurrealValue::Bool(false))
        );
        // never on update
        assert_eq!(
            with_apply_default(None, &flag, "emailVerified", Action::Update, "user").unwrap(),
            None
        );
        // explicit null without default is kept
        assert_eq!(
            with_apply_default(Some(Value::Null), &plain, "image", Action::Update, "user")
                .unwrap(),
            Some(SurrealValue::Null)
        );
        // references beat the name rule
        assert_eq!(
            with_apply_default(Some(json!("abc")), &referencing, "owner", Action::Update, "x")
                .unwrap(),
            Some(SurrealValue::Thing(RecordId::new("user", "abc")))
        );
        // name rule
        assert_eq!(
            with_apply_default(Some(json!("team:t1")), &plain, "teamId", Action::Create, "x")
                .unwrap(),
            Some(SurrealValue::Thing(RecordId::new("team", "t1")))
        );
        // dates
        assert!(matches!(
            with_apply_default(
                Some(json!("2024-05-01T12:00:00Z")),
                &plain,
                "expiresAt",
                Action::Update,
                "session"
            )
            .unwrap(),
            Some(SurrealValue::Datetime(_))
        ));
        // plain strings stay strings
        assert_eq!(
            with_apply_default(Some(json!("Ann")), &plain, "name", Action::Create, "user")
                .unwrap(),
            Some(SurrealValue::Strand("Ann".into()))
        );
    }

    #[test]
    fn test_transform_input_create() {
        let t = transform();
        let input = t
            .transform_input(
                &record(json!({
                    "name": "Ann",
                    "email": "ann@example.com",
                    "unknown": "dropped"
                })),
                models::USER,
                Action::Create,
            )
            .unwrap();

        let id = input.id.unwrap();
        assert_eq!(id.table, "user");
        assert_eq!(id.key.len(), 32);

        assert_eq!(input.fields["emailVerified"], SurrealValue::Bool(false));
        assert_eq!(input.fields["providers"], SurrealValue::Array(vec![]));
        assert!(matches!(input.fields["createdAt"], SurrealValue::Datetime(_)));
        assert!(!input.fields.contains_key("image"));
        assert!(!input.fields.contains_key("unknown"));
    }

    #[test]
    fn test_transform_input_keeps_given_id() {
        let t = transform();
        let input = t
            .transform_input(
                &record(json!({ "id": "session:fixed", "token": "t", "userId": "u1" })),
                models::SESSION,
                Action::Create,
            )
            .unwrap();
        assert_eq!(input.id, Some(RecordId::new("session", "fixed")));
        assert_eq!(
            input.fields["userId"],
            SurrealValue::Thing(RecordId::new("user", "u1"))
        );
    }

    #[test]
    fn test_transform_input_update() {
        let t = transform();
        let input = t
            .transform_input(
                &record(json!({ "name": "Bob" })),
                models::USER,
                Action::Update,
            )
            .unwrap();
        assert!(input.id.is_none());
        assert_eq!(input.fields.len(), 1);
        assert_eq!(input.content().to_string(), r#"{ "name": 'Bob' }"#);
    }

    #[test]
    fn test_transform_input_unknown_model() {
        let t = transform();
        assert!(matches!(
            t.transform_input(&Record::new(), "team", Action::Create),
            Err(AdapterError::UnknownModel(_))
        ));
    }

    #[test]
    fn test_renamed_columns() {
        let t = Transform::new(AuthSchema::default().with_field_name(
            "user",
            "emailVerified",
            "email_verified",
        ));
        assert_eq!(t.get_field("user", "emailVerified"), "email_verified");
        assert_eq!(t.get_field("user", "id"), "id");

        let input = t
            .transform_input(&Record::new(), models::USER, Action::Create)
            .unwrap();
        assert!(input.fields.contains_key("email_verified"));

        let output = t
            .transform_output(
                &record(json!({ "id": "user:a", "email_verified": true })),
                models::USER,
                &[],
            )
            .unwrap();
        assert_eq!(output["emailVerified"], json!(true));
    }

    #[test]
    fn test_transform_output_select() {
        let t = transform();
        let row = record(json!({
            "id": "user:abc",
            "name": "Ann",
            "email": "ann@example.com",
            "image": null
        }));

        let all = t.transform_output(&row, models::USER, &[]).unwrap();
        assert_eq!(all["id"], json!("user:abc"));
        assert_eq!(all["image"], Value::Null);
        assert!(!all.contains_key("providers"));

        let some = t
            .transform_output(&row, models::USER, &["email".to_string()])
            .unwrap();
        assert_eq!(some.len(), 1);
        assert_eq!(some["email"], json!("ann@example.com"));
    }

    #[test]
    fn test_transform_output_thing_object() {
        let t = transform();
        let row = record(json!({ "id": { "tb": "user", "id": "abc" } }));
        let out = t.transform_output(&row, models::USER, &[]).unwrap();
        assert_eq!(out["id"], json!("user:abc"));
    }

    #[test]
    fn test_convert_where_clause() {
        let t = transform();
        let wheres = vec![
            Where::eq("id", "abc"),
            Where::eq("email", "a@b.c"),
            Where::new("name", Operator::In, json!(["a", "b"])),
            Where::new("providers", Operator::Contains, "github"),
            Where::new("email", Operator::StartsWith, "a"),
            Where::new("email", Operator::EndsWith, "'.c"),
        ];
        assert_eq!(
            t.convert_where_clause(&wheres, models::USER).unwrap(),
            "id = user:abc AND email = 'a@b.c' AND name IN ['a', 'b'] \
             AND providers CONTAINS 'github' AND string::starts_with(email, 'a') \
             AND string::ends_with(email, '\\'.c')"
        );
    }

    #[test]
    fn test_convert_where_clause_records_and_dates() {
        let t = transform();
        let wheres = vec![
            Where::eq("userId", "user:u1"),
            Where::new("userId", Operator::Other, "u2"),
            Where::new("userId", Operator::In, json!(["u3"])),
            Where::eq("expiresAt", "2024-05-01T12:00:00Z"),
        ];
        assert_eq!(
            t.convert_where_clause(&wheres, models::SESSION).unwrap(),
            "userId = user:u1 AND userId = user:u2 AND userId IN [user:u3] \
             AND expiresAt = <datetime>'2024-05-01T12:00:00Z'"
        );
    }

    #[test]
    fn test_convert_where_clause_rejects_bad_field() {
        let t = transform();
        let wheres = vec![Where::eq("email = '' OR true", "x")];
        assert!(t.convert_where_clause(&wheres, models::USER).is_err());
        assert_eq!(t.convert_where_clause(&[], models::USER).unwrap(), "");
    }

    #[test]
    fn test_select_clause() {
        let t = transform();
        assert_eq!(t.select_clause(models::USER, &[]).unwrap(), "*");
        assert_eq!(
            t.select_clause(models::USER, &["email".to_string()]).unwrap(),
            "id, email"
        );
    }
}
