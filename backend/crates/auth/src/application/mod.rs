//! Application Layer
//!
//! Use cases and application services.

pub mod change_password;
pub mod check_session;
pub mod config;
pub mod delete_account;
pub mod dev_login;
pub mod notifier;
pub mod password_reset;
pub mod profile;
pub mod prompts;
pub mod providers;
pub mod session;
pub mod session_token;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;
pub mod store;

// Re-exports
pub use change_password::{ChangePasswordInput, ChangePasswordUseCase};
pub use check_session::{CheckSessionUseCase, SessionWithUser};
pub use config::{AuthConfig, ConfigError, Environment};
pub use delete_account::DeleteAccountUseCase;
pub use dev_login::{DevLoginInput, DevLoginUseCase};
pub use notifier::{LogResetPasswordSender, RecordingResetPasswordSender, ResetPasswordSender};
pub use password_reset::PasswordResetUseCase;
pub use profile::{ProfileUseCase, UpdateProfileInput};
pub use prompts::{CreatePromptInput, PromptService, UpdatePromptInput};
pub use providers::ProvidersUseCase;
pub use session::{IssuedSession, SessionService};
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use sign_up::{SignUpInput, SignUpOutput, SignUpUseCase};
pub use store::AuthStore;
