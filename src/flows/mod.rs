//! Account lifecycle flows for GradeTrack.
//!
//! Thin orchestration over the security core: each flow composes the
//! credential store, token service, rate limiter, session invalidator, and
//! mailer into one user-facing operation. The flows own the call sequence
//! and the user-visible error shape; all real invariants live below them.

mod account;
mod email_change;
mod password_reset;
mod registration;

pub use account::{change_password, delete_account, login, AccountError};
pub use email_change::{confirm_email_change, request_email_change, EmailChangeError};
pub use password_reset::{forgot_password, reset_password, PasswordResetError};
pub use registration::{register, verify_email, RegistrationError};
