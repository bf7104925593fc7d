//! Domain layer: entity types, the chunking algorithms, and the port traits
//! the application layer drives and the adapters layer implements. No
//! dependency on `tokio`'s runtime beyond `async_trait` signatures, no I/O.

pub mod chunking;
pub mod error;
pub mod ports;
pub mod types;
