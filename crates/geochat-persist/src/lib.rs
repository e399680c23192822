pub mod backend;
pub mod checkpoint;
pub mod checkpointer;
pub mod error;
pub mod memory;
pub mod postgres_store;
pub mod redis_store;

pub use backend::{Backend, BackendKind, BackendSettings, PoolSettings};
pub use checkpoint::{new_thread_id, Checkpoint, CheckpointMetadata};
pub use checkpointer::{list_thread_ids, Checkpointer};
pub use error::{PersistError, Result};
pub use memory::MemorySaver;
pub use postgres_store::PostgresSaver;
pub use redis_store::RedisSaver;
