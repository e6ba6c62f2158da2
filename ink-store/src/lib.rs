//! # ink-store: local persistence for Ink stories
//!
//! ```text
//! ┌───────────────┐  prepare_save   ┌─────────────────┐  get / set   ┌──────────────┐
//! │ EditorSession │ ──────────────► │ StoryRepository │ ───────────► │ ContentStore │
//! └───────────────┘     Story       └─────────────────┘  full list   └──────────────┘
//! ```
//!
//! The repository always reads the whole story list, changes it in memory
//! and writes the whole list back. There are no partial updates and no
//! transactions; the last writer wins.
//!
//! ## Modules
//!
//! - [`storage`]: the key/value `ContentStore` and its file and memory backends
//! - [`repository`]: story save/delete/list on top of a store

pub mod repository;
pub mod storage;

pub use repository::{StoryRepository, RECENT_LIMIT, STORIES_NAMESPACE};
pub use storage::{ContentStore, FileStore, MemoryStore, StoreConfig, StoreError};
