pub mod kv;
pub mod ledger;
pub mod paths;
pub mod schema;
pub mod store;

pub use kv::{FileKv, KeyValue, MemoryKv};
pub use ledger::LedgerStore;
pub use store::LocalStore;
