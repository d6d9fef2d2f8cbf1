pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod module;
pub mod types;

pub use auth::{IdentityResolver, TrustedHeader};
pub use clock::{Clock, SystemClock};
pub use config::ServiceConfig;
pub use error::ServiceError;
pub use module::Module;
pub use types::{Page, PageParams};
