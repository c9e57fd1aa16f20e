//! Infrastructure Layer
//!
//! Database implementations and external service integrations.

pub mod backend;
pub mod mailer;
pub mod memory;
pub mod postgres;

pub use backend::UserBackend;
pub use mailer::{MailTemplate, MailVars, Mailer, MemoryMailer, SmtpMailer, SmtpSettings};
pub use memory::MemoryUserRepository;
pub use postgres::PgUserRepository;
