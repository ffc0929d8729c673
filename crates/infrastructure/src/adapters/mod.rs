//! Adapters implementing the application ports.

mod reqwest_transport;
mod system_clock;

pub use reqwest_transport::ReqwestAuthTransport;
pub use system_clock::SystemClock;
