//! Prompt Management Use Case
//!
//! Admin curation of AI prompts plus the read paths users pick from.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::application::store::timestamp;
use crate::domain::adapter::{Adapter, FindMany, Record, Where, decode_record, encode_record};
use crate::domain::entity::prompt::{
    NewPrompt, NewPromptUsage, Prompt, PromptAnalytics, PromptKind, PromptUsage,
};
use crate::domain::schema::models;
use crate::error::{AuthError, AuthResult};
use crate::infra::value::RecordId;

const NAME_MIN: usize = 3;
const NAME_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 500;
const PROMPT_TEXT_MIN: usize = 10;

#[derive(Debug, Clone)]
pub struct CreatePromptInput {
    pub name: String,
    pub description: Option<String>,
    pub kind: PromptKind,
    pub prompt_text: String,
    pub tags: Vec<String>,
}

/// Fields left `None` are not touched; an empty description clears it
#[derive(Debug, Default)]
pub struct UpdatePromptInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub prompt_text: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl UpdatePromptInput {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.prompt_text.is_none()
            && self.tags.is_none()
    }
}

fn invalid(message: &str) -> AuthError {
    AuthError::InvalidInput(message.to_string())
}

fn valid_name(name: &str) -> AuthResult<String> {
    let name = name.trim();
    let len = name.chars().count();
    if len < NAME_MIN {
        return Err(invalid("Name must be at least 3 characters"));
    }
    if len > NAME_MAX {
        return Err(invalid("Name must be at most 100 characters"));
    }
    Ok(name.to_string())
}

/// `None` for a blank description
fn valid_description(description: &str) -> AuthResult<Option<String>> {
    let description = description.trim();
    if description.chars().count() > DESCRIPTION_MAX {
        return Err(invalid("Description must be at most 500 characters"));
    }
    Ok(Some(description.to_string()).filter(|d| !d.is_empty()))
}

fn valid_prompt_text(text: &str) -> AuthResult<String> {
    if text.trim().chars().count() < PROMPT_TEXT_MIN {
        return Err(invalid("Prompt text must be at least 10 characters"));
    }
    Ok(text.to_string())
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Normalized `ai_prompt:<key>` for a path id; bare keys are accepted
pub fn prompt_id(id: &str) -> AuthResult<String> {
    let id = id.trim();
    if id.is_empty() {
        return Err(invalid("ID is required"));
    }
    let record = RecordId::parse_or(id, models::PROMPT).map_err(|_| AuthError::PromptNotFound)?;
    if record.table != models::PROMPT {
        return Err(AuthError::PromptNotFound);
    }
    Ok(record.to_string())
}

/// Defaults first, then active, newest first
fn admin_order(a: &Prompt, b: &Prompt) -> Ordering {
    b.is_default
        .cmp(&a.is_default)
        .then(b.is_active.cmp(&a.is_active))
        .then(b.created_at.cmp(&a.created_at))
}

/// Default first, then by name
fn selection_order(a: &Prompt, b: &Prompt) -> Ordering {
    b.is_default.cmp(&a.is_default).then(a.name.cmp(&b.name))
}

pub struct PromptService<A> {
    adapter: Arc<A>,
}

impl<A: Adapter> PromptService<A> {
    pub fn new(adapter: Arc<A>) -> Self {
        Self { adapter }
    }

    async fn find_all(&self, wheres: Vec<Where>) -> AuthResult<Vec<Prompt>> {
        Ok(self
            .adapter
            .find_many(models::PROMPT, FindMany { wheres, ..Default::default() })
            .await?
            .into_iter()
            .map(decode_record)
            .collect::<Result<_, _>>()?)
    }

    async fn existing(&self, id: &str) -> AuthResult<Prompt> {
        self.get(id).await?.ok_or(AuthError::PromptNotFound)
    }

    async fn patch(&self, id: &str, mut patch: Record) -> AuthResult<Prompt> {
        let prompt = self.existing(id).await?;
        patch.insert("updatedAt".to_string(), timestamp(Utc::now()));
        let record = self
            .adapter
            .update(models::PROMPT, &[Where::eq("id", prompt.id.as_str())], patch)
            .await?;
        Ok(decode_record(record)?)
    }

    /// Every prompt, optionally of one kind
    pub async fn list(&self, kind: Option<PromptKind>) -> AuthResult<Vec<Prompt>> {
        let wheres = kind
            .map(|kind| vec![Where::eq("type", kind.as_str())])
            .unwrap_or_default();
        let mut prompts = self.find_all(wheres).await?;
        prompts.sort_by(admin_order);
        Ok(prompts)
    }

    pub async fn get(&self, id: &str) -> AuthResult<Option<Prompt>> {
        let id = prompt_id(id)?;
        Ok(self
            .adapter
            .find_one(models::PROMPT, &[Where::eq("id", id)], &[])
            .await?
            .map(decode_record)
            .transpose()?)
    }

    /// New prompts are neither active nor default
    pub async fn create(&self, created_by: &str, input: CreatePromptInput) -> AuthResult<Prompt> {
        let new_prompt = NewPrompt {
            name: valid_name(&input.name)?,
            description: match input.description {
                Some(description) => valid_description(&description)?,
                None => None,
            },
            kind: input.kind,
            prompt_text: valid_prompt_text(&input.prompt_text)?,
            tags: clean_tags(input.tags),
            created_by: created_by.to_string(),
        };

        let record = self
            .adapter
            .create(models::PROMPT, encode_record(&new_prompt)?)
            .await?;
        let prompt: Prompt = decode_record(record)?;

        tracing::info!(prompt_id = %prompt.id, kind = %prompt.kind, created_by = %created_by, "Prompt created");
        Ok(prompt)
    }

    pub async fn update(&self, id: &str, input: UpdatePromptInput) -> AuthResult<Prompt> {
        if input.is_empty() {
            return Err(invalid("No fields to update"));
        }

        let mut patch = Record::new();
        if let Some(name) = input.name {
            patch.insert("name".to_string(), Value::String(valid_name(&name)?));
        }
        if let Some(description) = input.description {
            let value = valid_description(&description)?.map_or(Value::Null, Value::String);
            patch.insert("description".to_string(), value);
        }
        if let Some(text) = input.prompt_text {
            patch.insert("promptText".to_string(), Value::String(valid_prompt_text(&text)?));
        }
        if let Some(tags) = input.tags {
            let tags = clean_tags(tags).into_iter().map(Value::String).collect();
            patch.insert("tags".to_string(), Value::Array(tags));
        }

        let prompt = self.patch(id, patch).await?;
        tracing::info!(prompt_id = %prompt.id, "Prompt updated");
        Ok(prompt)
    }

    /// Deleting an absent prompt is not an error
    pub async fn delete(&self, id: &str) -> AuthResult<()> {
        let id = prompt_id(id)?;
        self.adapter
            .delete(models::PROMPT, &[Where::eq("id", id.as_str())])
            .await?;
        tracing::info!(prompt_id = %id, "Prompt deleted");
        Ok(())
    }

    /// Several prompts of a kind may be active at once
    pub async fn set_active(&self, id: &str, is_active: bool) -> AuthResult<Prompt> {
        let mut patch = Record::new();
        patch.insert("isActive".to_string(), Value::Bool(is_active));
        let prompt = self.patch(id, patch).await?;
        tracing::info!(prompt_id = %prompt.id, is_active, "Prompt active status changed");
        Ok(prompt)
    }

    /// Make this the only default of its kind; the default is always active
    pub async fn set_default(&self, id: &str, kind: PromptKind) -> AuthResult<Prompt> {
        let prompt = self.existing(id).await?;
        if prompt.kind != kind {
            return Err(invalid("Prompt type does not match"));
        }

        let mut unset = Record::new();
        unset.insert("isDefault".to_string(), Value::Bool(false));
        self.adapter
            .update_many(
                models::PROMPT,
                &[Where::eq("type", kind.as_str()), Where::eq("isDefault", true)],
                unset,
            )
            .await?;

        let mut patch = Record::new();
        patch.insert("isDefault".to_string(), Value::Bool(true));
        patch.insert("isActive".to_string(), Value::Bool(true));
        let prompt = self.patch(&prompt.id, patch).await?;

        tracing::info!(prompt_id = %prompt.id, kind = %kind, "Default prompt set");
        Ok(prompt)
    }

    /// Prompts users may choose from
    pub async fn active(&self, kind: PromptKind) -> AuthResult<Vec<Prompt>> {
        let mut prompts = self
            .find_all(vec![
                Where::eq("type", kind.as_str()),
                Where::eq("isActive", true),
            ])
            .await?;
        prompts.sort_by(selection_order);
        Ok(prompts)
    }

    pub async fn default_for(&self, kind: PromptKind) -> AuthResult<Option<Prompt>> {
        Ok(self
            .adapter
            .find_one(
                models::PROMPT,
                &[Where::eq("type", kind.as_str()), Where::eq("isDefault", true)],
                &[],
            )
            .await?
            .map(decode_record)
            .transpose()?)
    }

    /// Record one run of a prompt
    pub async fn record_usage(&self, usage: NewPromptUsage) -> AuthResult<PromptUsage> {
        let prompt = self.existing(&usage.prompt_id).await?;
        let usage = NewPromptUsage {
            prompt_id: prompt.id,
            ..usage
        };
        let record = self
            .adapter
            .create(models::PROMPT_USAGE, encode_record(&usage)?)
            .await?;
        Ok(decode_record(record)?)
    }

    pub async fn analytics(&self, id: &str) -> AuthResult<PromptAnalytics> {
        let id = prompt_id(id)?;
        let usage: Vec<PromptUsage> = self
            .adapter
            .find_many(
                models::PROMPT_USAGE,
                FindMany::default().filter(Where::eq("promptId", id.as_str())),
            )
            .await?
            .into_iter()
            .map(decode_record)
            .collect::<Result<_, _>>()?;
        Ok(PromptAnalytics::from_usage(&id, &usage, Utc::now()))
    }
}
