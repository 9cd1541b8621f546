mod admin_auth;
mod metrics_layer;
mod tracing_layer;

pub use admin_auth::*;
pub use metrics_layer::*;
pub use tracing_layer::*;
