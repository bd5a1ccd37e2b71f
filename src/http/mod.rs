//! HTTP request values and the transport seam.

pub mod request;
pub mod transport;

pub use request::{ApiRequest, ApiResponse};
pub use transport::{ReqwestTransport, Transport};
