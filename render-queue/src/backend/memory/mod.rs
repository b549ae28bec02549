//! In-process queue store.
//!
//! Used by tests and by `STORE_BACKEND=memory` local runs. The worker side of
//! the lifecycle is simulated through the helpers in [`worker`].

mod storage;
mod worker;

pub use storage::{MemoryBackend, DEFAULT_MEMORY_CAPACITY};
