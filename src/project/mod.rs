mod record;
pub mod storage;
mod store;

pub use record::{
    BufferKind, DocumentSnapshot, Patch, ProjectDocument, ProjectRecord, SharedProject,
};
pub use storage::{FileStorage, MemoryStorage, StorageAdapter};
pub use store::{export_file_name, upsert_index, ProjectStore};
