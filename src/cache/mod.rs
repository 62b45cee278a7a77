pub mod quota;

pub use quota::{CacheEntry, QuotaCache};
