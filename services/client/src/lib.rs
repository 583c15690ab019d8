pub mod adapters;
pub mod api;
pub mod config;
pub mod error;
pub mod guard;
pub mod http;
pub mod notifications;
pub mod session;

pub use error::{ClientError, ClientResult, ErrorClass};
pub use guard::{authorize, command_access, GuardDecision};
pub use http::{ApiClient, ClientOptions, RefreshState};
pub use notifications::{NotificationCenter, NotificationEvent};
pub use session::SessionStore;
