mod sqlite;

pub use sqlite::{AccountStore, StoreError};
