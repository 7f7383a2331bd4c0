//! Wire encoding for JSON-RPC envelopes and SSE frames

pub mod jsonrpc;
pub mod sse;

pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
