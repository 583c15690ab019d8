pub mod domain;
pub mod ports;

pub use domain::{
    AuthPayload, Notification, NotificationId, NotificationKind, Role, RouteAccess, Session,
    UserSummary,
};
pub use ports::{
    ApiRequest, ApiResponse, HttpMethod, HttpTransport, Navigator, PortError, PortResult,
    RequestBody, SessionStorage, TransportError,
};
