//! Shared fixtures for integration tests across the workspace: corpus
//! builders and a once-only tracing initializer.

use std::sync::Once;

use sift_core::document::Document;

static TRACING: Once = Once::new();

/// Initialize a tracing subscriber honoring `RUST_LOG`. Safe to call from
/// every test; only the first call installs the subscriber.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A document with null metadata.
pub fn make_document(id: &str, text: &str) -> Document {
    Document::new(id, text)
}

/// A document carrying a source tag in its metadata.
pub fn make_tagged_document(id: &str, text: &str, source: &str) -> Document {
    Document::new(id, text).with_metadata(serde_json::json!({ "source": source }))
}

/// The three-document pets corpus used by the ranking scenarios.
pub fn pets_corpus() -> Vec<Document> {
    vec![
        make_document("doc-1", "cats are great pets"),
        make_document("doc-2", "dogs are loyal companions"),
        make_document("doc-3", "cats and dogs are pets"),
    ]
}

/// A slightly larger corpus for fusion and escalation tests.
pub fn animals_corpus() -> Vec<Document> {
    vec![
        make_document("doc-1", "cats are great pets"),
        make_document("doc-2", "dogs are loyal companions"),
        make_document("doc-3", "cats and dogs are pets"),
        make_document("doc-4", "parrots can mimic human speech"),
        make_document("doc-5", "goldfish need a clean tank to thrive"),
        make_document("doc-6", "hamsters run on wheels at night"),
    ]
}
