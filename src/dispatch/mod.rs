//! Notification dispatch: input resolution, formatting, and fan-out delivery.
//!
//! The flow for one call is
//! [`resolve`] → [`MessageFormat::escape`] → [`fan_out`] → [`DispatchOutcome`],
//! orchestrated by [`NotificationDispatcher`].

mod dispatcher;
mod format;
mod request;
mod resolver;
mod sender;

pub use dispatcher::{
    DispatchError, DispatcherStats, DispatcherStatsSnapshot, NotificationDispatcher, ScopedClient,
};
pub use format::MessageFormat;
pub use request::{ChatTarget, NotificationFields, NotificationInput, NotificationQuery};
pub use resolver::{resolve, Credential, ResolveError, ResolvedNotification};
pub use sender::{fan_out, DispatchOutcome, PreparedMessage, RecipientOutcome};
