pub mod sqlite;

pub use sqlite::{StoreError, StoreStats, TagsDb};
