pub mod store;

pub use store::{session_record_key, SessionStore, SESSION_INDEX_KEY};
