pub mod offline_rewriter;

pub use offline_rewriter::OfflineRewriter;
