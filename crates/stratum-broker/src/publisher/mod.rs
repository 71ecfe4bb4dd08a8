//! Outbound publishers for coordinator requests.

pub mod memory;
pub mod redis;

pub use self::memory::MemoryPublisher;
pub use self::redis::RedisPublisher;
