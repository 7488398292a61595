//! Infrastructure layer: adapters implementing the application layer's
//! ports against Postgres, Redis Streams, Bedrock, and the local schema
//! registry, plus configuration loading and tracing setup.

pub mod broker;
pub mod config;
pub mod db;
pub mod llm;
pub mod logging;
pub mod schema;

pub use broker::RedisJobBroker;
pub use config::{ConfigLoadError, ConfigLoader};
pub use db::{
    PgDecisionRepository, PgPersonaReviewRepository, PgProposalRepository, PgRunRepository,
    PgStepProgressRepository,
};
pub use llm::BedrockLlmClient;
pub use schema::SchemaRegistry;
