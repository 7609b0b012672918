pub mod cache;
pub mod fallback;
pub mod resolver;

pub use cache::TtlCache;
pub use resolver::{TokenResolver, TokenSource};
