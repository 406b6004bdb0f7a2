// libs/invitation-cell/src/services/mod.rs

pub mod dispatch_log;
pub mod dispatcher;
pub mod mail;
pub mod template;

pub use dispatch_log::{DispatchLog, InMemoryDispatchLog, RedisDispatchLog};
pub use dispatcher::InvitationDispatcher;
pub use mail::{transport_from_config, HttpMailTransport, LogMailTransport, MailTransport};
pub use template::InvitationTemplate;
