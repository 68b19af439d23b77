pub mod errors;
pub mod http;
pub mod models;

pub const MIN_THREAD_CHARS: usize = 3;
pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;
