//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the providers and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod cancellation;
mod captor;
mod clock;
mod flow_source;
mod transport;

pub use cancellation::{CancellationReceiver, CancellationToken};
pub use captor::{AuthorizationGrantCaptor, CaptorSet, bounded_capture};
pub use clock::Clock;
pub use flow_source::FlowStateSource;
pub use transport::{ChallengeFetcher, TokenExchanger, TokenRequest};
