pub mod dispatcher;
pub mod mailer;

pub use dispatcher::{
    EnvMailConfig, MailConfigProvider, NotificationDispatcher, NotificationQueue,
    NotificationService,
};
pub use mailer::MailClient;
