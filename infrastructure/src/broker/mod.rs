//! Job broker adapter (spec.md §4.4).

pub mod redis_broker;

pub use redis_broker::RedisJobBroker;
