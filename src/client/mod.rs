//! Client-side protocol surface: card discovery and the agent client

pub mod agent;
pub mod resolver;

pub use agent::{A2AClient, ClientConfig};
pub use resolver::CardResolver;
