pub mod mem;
pub mod models;
pub mod pg;
pub mod store;

pub use mem::MemStore;
pub use pg::PgStore;
pub use store::RecordStore;
