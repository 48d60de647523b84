//! Auth Schema
//!
//! Table definitions that drive field-name mapping, defaults and record-id
//! coercion in the adapters.

use std::collections::BTreeMap;

use serde_json::Value;

/// Model names
pub mod models {
    pub const USER: &str = "user";
    pub const SESSION: &str = "session";
    pub const ACCOUNT: &str = "account";
    pub const VERIFICATION: &str = "verification";
    pub const PROMPT: &str = "ai_prompt";
    pub const PROMPT_USAGE: &str = "prompt_usage";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Boolean,
    Number,
    Date,
    StringArray,
}

impl FieldType {
    /// SurrealQL type used in table definitions
    pub fn surreal_type(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Boolean => "bool",
            FieldType::Number => "number",
            FieldType::Date => "datetime",
            FieldType::StringArray => "array<string>",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Value(Value),
    /// Current time at insert
    Now,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReference {
    pub model: String,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldAttribute {
    pub field_type: FieldType,
    pub required: bool,
    pub unique: bool,
    /// Storage column, when it differs from the logical name
    pub field_name: Option<String>,
    pub default_value: Option<DefaultValue>,
    pub references: Option<FieldReference>,
}

impl FieldAttribute {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            unique: false,
            field_name: None,
            default_value: None,
            references: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, value: DefaultValue) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn references(mut self, model: &str, field: &str) -> Self {
        self.references = Some(FieldReference {
            model: model.to_string(),
            field: field.to_string(),
        });
        self
    }
}

/// Fields of one model, in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub model_name: String,
    fields: Vec<(String, FieldAttribute)>,
}

impl TableSchema {
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: &str, attribute: FieldAttribute) -> Self {
        self.fields.push((name.to_string(), attribute));
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldAttribute> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, attribute)| attribute)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldAttribute)> {
        self.fields.iter().map(|(name, attr)| (name.as_str(), attr))
    }

    /// Storage column of a logical field
    pub fn column<'a>(&'a self, name: &'a str) -> &'a str {
        self.get(name)
            .and_then(|attr| attr.field_name.as_deref())
            .unwrap_or(name)
    }
}

fn timestamps(table: TableSchema) -> TableSchema {
    table
        .field(
            "createdAt",
            FieldAttribute::new(FieldType::Date)
                .required()
                .default_value(DefaultValue::Now),
        )
        .field(
            "updatedAt",
            FieldAttribute::new(FieldType::Date)
                .required()
                .default_value(DefaultValue::Now),
        )
}

/// All auth tables
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSchema {
    tables: BTreeMap<String, TableSchema>,
}

impl Default for AuthSchema {
    fn default() -> Self {
        use models::*;

        let user = timestamps(
            TableSchema::new(USER)
                .field("name", FieldAttribute::new(FieldType::String).required())
                .field(
                    "email",
                    FieldAttribute::new(FieldType::String).required().unique(),
                )
                .field(
                    "emailVerified",
                    FieldAttribute::new(FieldType::Boolean)
                        .required()
                        .default_value(DefaultValue::Value(Value::Bool(false))),
                )
                .field("image", FieldAttribute::new(FieldType::String))
                .field(
                    "providers",
                    FieldAttribute::new(FieldType::StringArray)
                        .default_value(DefaultValue::Value(Value::Array(Vec::new()))),
                ),
        );

        let session = timestamps(
            TableSchema::new(SESSION)
                .field("expiresAt", FieldAttribute::new(FieldType::Date).required())
                .field(
                    "token",
                    FieldAttribute::new(FieldType::String).required().unique(),
                )
                .field("ipAddress", FieldAttribute::new(FieldType::String))
                .field("userAgent", FieldAttribute::new(FieldType::String))
                .field(
                    "userId",
                    FieldAttribute::new(FieldType::String)
                        .required()
                        .references(USER, "id"),
                )
                .field(
                    "rememberMe",
                    FieldAttribute::new(FieldType::Boolean)
                        .default_value(DefaultValue::Value(Value::Bool(true))),
                ),
        );

        let account = timestamps(
            TableSchema::new(ACCOUNT)
                .field("accountId", FieldAttribute::new(FieldType::String).required())
                .field(
                    "providerId",
                    FieldAttribute::new(FieldType::String).required(),
                )
                .field(
                    "userId",
                    FieldAttribute::new(FieldType::String)
                        .required()
                        .references(USER, "id"),
                )
                .field("accessToken", FieldAttribute::new(FieldType::String))
                .field("refreshToken", FieldAttribute::new(FieldType::String))
                .field("idToken", FieldAttribute::new(FieldType::String))
                .field("accessTokenExpiresAt", FieldAttribute::new(FieldType::Date))
                .field("refreshTokenExpiresAt", FieldAttribute::new(FieldType::Date))
                .field("scope", FieldAttribute::new(FieldType::String))
                .field("password", FieldAttribute::new(FieldType::String)),
        );

        let verification = timestamps(
            TableSchema::new(VERIFICATION)
                .field(
                    "identifier",
                    FieldAttribute::new(FieldType::String).required(),
                )
                .field("value", FieldAttribute::new(FieldType::String).required())
                .field("expiresAt", FieldAttribute::new(FieldType::Date).required()),
        );

        let prompt = timestamps(
            TableSchema::new(PROMPT)
                .field("name", FieldAttribute::new(FieldType::String).required())
                .field("description", FieldAttribute::new(FieldType::String))
                .field("type", FieldAttribute::new(FieldType::String).required())
                .field(
                    "promptText",
                    FieldAttribute::new(FieldType::String).required(),
                )
                .field(
                    "isActive",
                    FieldAttribute::new(FieldType::Boolean)
                        .required()
                        .default_value(DefaultValue::Value(Value::Bool(false))),
                )
                .field(
                    "isDefault",
                    FieldAttribute::new(FieldType::Boolean)
                        .required()
                        .default_value(DefaultValue::Value(Value::Bool(false))),
                )
                .field(
                    "tags",
                    FieldAttribute::new(FieldType::StringArray)
                        .default_value(DefaultValue::Value(Value::Array(Vec::new()))),
                )
                .field(
                    "createdBy",
                    FieldAttribute::new(FieldType::String).references(USER, "id"),
                ),
        );

        let prompt_usage = timestamps(
            TableSchema::new(PROMPT_USAGE)
                .field(
                    "promptId",
                    FieldAttribute::new(FieldType::String)
                        .required()
                        .references(PROMPT, "id"),
                )
                .field("success", FieldAttribute::new(FieldType::Boolean).required())
                .field("processingTime", FieldAttribute::new(FieldType::Number))
                .field("feedback", FieldAttribute::new(FieldType::String)),
        );

        let tables = [user, session, account, verification, prompt, prompt_usage]
            .into_iter()
            .map(|table| (table.model_name.clone(), table))
            .collect();

        Self { tables }
    }
}

impl AuthSchema {
    pub fn table(&self, model: &str) -> Option<&TableSchema> {
        self.tables.get(model)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    /// Store `field` of `model` under a different column name
    pub fn with_field_name(mut self, model: &str, field: &str, column: &str) -> Self {
        if let Some(table) = self.tables.get_mut(model) {
            if let Some((_, attribute)) = table.fields.iter_mut().find(|(name, _)| name == field) {
                attribute.field_name = Some(column.to_string());
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables() {
        let schema = AuthSchema::default();
        let names: Vec<_> = schema.tables().map(|t| t.model_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["account", "ai_prompt", "prompt_usage", "session", "user", "verification"]
        );
    }

    #[test]
    fn test_prompt_usage_references_prompt() {
        let schema = AuthSchema::default();
        let usage = schema.table(models::PROMPT_USAGE).unwrap();
        assert_eq!(usage.get("promptId").unwrap().references.as_ref().unwrap().model, "ai_prompt");
        let prompt = schema.table(models::PROMPT).unwrap();
        assert_eq!(
            prompt.get("isDefault").unwrap().default_value,
            Some(DefaultValue::Value(Value::Bool(false)))
        );
    }

    #[test]
    fn test_user_defaults() {
        let schema = AuthSchema::default();
        let user = schema.table(models::USER).unwrap();

        assert!(user.get("email").unwrap().unique);
        assert_eq!(
            user.get("emailVerified").unwrap().default_value,
            Some(DefaultValue::Value(Value::Bool(false)))
        );
        assert_eq!(
            user.get("createdAt").unwrap().default_value,
            Some(DefaultValue::Now)
        );
    }

    #[test]
    fn test_session_references_user() {
        let schema = AuthSchema::default();
        let reference = schema
            .table(models::SESSION)
            .and_then(|t| t.get("userId"))
            .and_then(|f| f.references.clone())
            .unwrap();
        assert_eq!(reference.model, "user");
    }

    #[test]
    fn test_with_field_name() {
        let schema = AuthSchema::default().with_field_name("user", "emailVerified", "email_verified");
        let user = schema.table("user").unwrap();
        assert_eq!(user.column("emailVerified"), "email_verified");
        assert_eq!(user.column("name"), "name");
        assert_eq!(user.column("unknown"), "unknown");
    }
}
