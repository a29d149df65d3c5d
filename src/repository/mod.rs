pub mod store;

pub use store::{
    Document, DocumentStore, DocumentWrite, FieldUpdate, Notifier, MAX_IDS_PER_QUERY,
};
