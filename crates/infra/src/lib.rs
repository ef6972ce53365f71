//! Infrastructure layer: configuration, the remote store and identity
//! provider clients, their in-memory doubles, and session persistence.

pub mod config;
pub mod demo_seed;
pub mod functions;
pub mod identity;
pub mod query;
pub mod remote;
pub mod repo;
pub mod session_context;
pub mod session_storage;
pub mod store;

pub use config::{ConfigError, StoreConfig};
pub use demo_seed::{SeedError, seed_demo_data};
pub use functions::{DemoSeedResponse, DemoUser, FunctionsClient};
pub use identity::{IdentityProvider, InMemoryIdentityProvider, RestIdentityProvider, SignedUp};
pub use query::{Direction, Filter, Query};
pub use remote::Backend;
pub use repo::Repository;
pub use session_context::SessionContext;
pub use session_storage::{FileSessionStorage, MemorySessionStorage, SessionStorage, StorageError};
pub use store::{DataAccessError, DataResult, DataStore, InMemoryStore, RestStore, Row, StoreOp};
