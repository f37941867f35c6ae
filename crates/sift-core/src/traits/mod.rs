//! Trait seams between the crates: embedding providers and the durable
//! document store. Both are object-safe and `Send + Sync` so engines can
//! hold them behind `Arc<dyn ...>`.

mod embedding;
mod store;

pub use embedding::IEmbeddingProvider;
pub use store::{IDocumentStore, PostingEntry, TermPosting};
