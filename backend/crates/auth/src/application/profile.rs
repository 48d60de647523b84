//! Profile Use Case

use std::sync::Arc;

use serde_json::Value;

use crate::application::store::AuthStore;
use crate::domain::adapter::{Adapter, Record};
use crate::domain::entity::user::User;
use crate::domain::value_object::display_name::DisplayName;
use crate::error::{AuthError, AuthResult};

/// Fields left `None` are not touched; an empty image clears it
#[derive(Debug, Default)]
pub struct UpdateProfileInput {
    pub name: Option<String>,
    pub image: Option<String>,
}

pub struct ProfileUseCase<A> {
    store: AuthStore<A>,
}

impl<A: Adapter> ProfileUseCase<A> {
    pub fn new(adapter: Arc<A>) -> Self {
        Self {
            store: AuthStore::new(adapter),
        }
    }

    pub async fn get(&self, user_id: &str) -> AuthResult<User> {
        self.store
            .user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn update(&self, user_id: &str, input: UpdateProfileInput) -> AuthResult<User> {
        let mut patch = Record::new();
        if let Some(name) = input.name {
            let name = DisplayName::new(name)?;
            patch.insert("name".to_string(), Value::String(name.into_inner()));
        }
        if let Some(image) = input.image {
            let image = image.trim();
            let value = if image.is_empty() {
                Value::Null
            } else {
                Value::String(image.to_string())
            };
            patch.insert("image".to_string(), value);
        }

        let user = self.get(user_id).await?;
        if patch.is_empty() {
            return Ok(user);
        }

        let user = self.store.update_user(&user.id, patch).await?;
        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::user::NewUser;
    use crate::infra::memory::MemoryAdapter;

    async fn setup() -> (ProfileUseCase<MemoryAdapter>, String) {
        let adapter = Arc::new(MemoryAdapter::default());
        let user = AuthStore::new(adapter.clone())
            .create_user(&NewUser {
                name: "Ann".into(),
                email: "ann@example.com".into(),
                image: Some("https://img.example.com/a.png".into()),
            })
            .await
            .unwrap();
        (ProfileUseCase::new(adapter), user.id)
    }

    #[tokio::test]
    async fn test_update_name() {
        let (use_case, user_id) = setup().await;
        let user = use_case
            .update(
                &user_id,
                UpdateProfileInput {
                    name: Some("  Ann Smith ".into()),
                    image: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(user.name, "Ann Smith");
        assert_eq!(user.image.as_deref(), Some("https://img.example.com/a.png"));
        assert_eq!(use_case.get(&user_id).await.unwrap().name, "Ann Smith");
    }

    #[tokio::test]
    async fn test_clear_image() {
        let (use_case, user_id) = setup().await;
        let user = use_case
            .update(
                &user_id,
                UpdateProfileInput {
                    name: None,
                    image: Some(String::new()),
                },
            )
            .await
            .unwrap();
        assert!(user.image.is_none());
    }

    #[tokio::test]
    async fn test_rejects_long_name() {
        let (use_case, user_id) = setup().await;
        let err = use_case
            .update(
                &user_id,
                UpdateProfileInput {
                    name: Some("x".repeat(101)),
                    image: None,
                },
            )
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AuthError::InvalidInput(_)));
    }
}
