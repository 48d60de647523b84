//! Shared Kernel
//!
//! Error vocabulary shared by every crate in the workspace:
//! - [`error::kind::ErrorKind`] - error classification mapped to HTTP statuses
//! - [`error::app_error::AppError`] - the unified error value and result alias
//! - conversions from common library errors, plus the axum response shape
//!
//! Kept deliberately small: only things whose meaning is the same in
//! every layer belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
