//! Memoization of expensive calls, keyed by a hash of their serialized input.

mod builder;
mod memo_cache;

pub use builder::{input_hash, MemoBuilder};
pub use memo_cache::{MemoCache, MemoStore, MemoryMemoStore, PgMemoStore};
