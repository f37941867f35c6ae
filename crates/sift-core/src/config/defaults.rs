// Single source of truth for all default values.

// --- Storage ---
pub const DEFAULT_DB_FILENAME: &str = "sift.db";
pub const DEFAULT_READ_POOL_SIZE: usize = 4;
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;

// --- Embeddings ---
pub const DEFAULT_L1_CACHE_SIZE: u64 = 10_000;
pub const DEFAULT_L2_CACHE_ENABLED: bool = true;
pub const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 32;
pub const DEFAULT_REMOTE_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_REMOTE_ENDPOINT: &str = "https://api.openai.com/v1/embeddings";
pub const DEFAULT_REMOTE_MAX_RETRIES: u32 = 3;
pub const DEFAULT_REMOTE_API_KEY_ENV: &str = "SIFT_REMOTE_API_KEY";
/// Texts estimated above this many tokens prefer the accurate tier.
pub const DEFAULT_LONG_TEXT_TOKEN_THRESHOLD: usize = 4_000;
/// Latency budgets below this pin the fast tier.
pub const DEFAULT_FAST_LATENCY_CUTOFF_MS: u64 = 50;

// --- Retrieval ---
pub const DEFAULT_RESULT_LIMIT: usize = 10;
/// Candidates gathered per source before fusion truncates to the limit.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 20;
pub const DEFAULT_RRF_K: u32 = 60;
pub const DEFAULT_SPARSE_WEIGHT: f64 = 0.4;
pub const DEFAULT_DENSE_WEIGHT: f64 = 0.6;
pub const DEFAULT_BM25_K1: f64 = 1.2;
pub const DEFAULT_BM25_B: f64 = 0.75;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.65;
/// RRF scores are not normalizable; confidence compares against this floor.
pub const DEFAULT_RRF_CONFIDENCE_FLOOR: f64 = 0.015;
pub const DEFAULT_MAX_ESCALATIONS: u32 = 2;
/// Write-exclusion shards for index mutation, keyed by hash(document_id).
pub const DEFAULT_INDEX_SHARDS: usize = 16;
