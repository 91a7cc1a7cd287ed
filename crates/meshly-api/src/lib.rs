// meshly-api: Async Rust client for CloudMesh dashboards (signed REST + legacy session)

pub mod error;
pub mod html;
pub mod models;
pub mod session;
pub mod signed;
pub mod signing;
pub mod transport;

pub use error::Error;
pub use session::{DashboardPages, SessionClient};
pub use signed::{Payload, SignedClient};
pub use transport::{TlsMode, TransportConfig};
