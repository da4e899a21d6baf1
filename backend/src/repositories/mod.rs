pub mod memory;
pub mod postgres;
pub mod session;
pub mod store;
pub mod user;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{AuthStore, AuthTransaction, StoreError};
