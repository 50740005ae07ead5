mod http;
mod router;

pub use crate::http::HttpTransport;
pub use crate::router::RouterTransport;
