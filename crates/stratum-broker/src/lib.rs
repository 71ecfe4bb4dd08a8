//! # stratum-broker
//!
//! Request/response correlation with the external storage coordinator.
//!
//! A caller publishes a [`message::Request`] on a pub/sub topic and suspends
//! on a single-use [`slot::ResponseSlot`] registered in the
//! [`pending::PendingTable`]. The coordinator answers out of band through
//! an HTTP webhook, which hands the decoded [`message::Response`] to
//! [`pending::PendingTable::deliver`]. [`broker::CorrelationBroker`] ties
//! the pieces together and implements the `StorageCoordinator` seam.

pub mod broker;
pub mod codec;
pub mod message;
pub mod pending;
pub mod publisher;
pub mod slot;

pub use broker::CorrelationBroker;
pub use codec::{CodecError, derive_content_id, extract_content_id, parse_node_id};
pub use message::{Operation, Request, Response};
pub use pending::{DeliveryOutcome, PendingGuard, PendingTable};
pub use publisher::{MemoryPublisher, RedisPublisher};
pub use slot::{ResponseSlot, SlotError};
