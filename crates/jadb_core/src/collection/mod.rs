//! Collections: the untyped document engine and its typed wrapper.

mod engine;
mod typed;

pub use engine::Collection;
pub use typed::TypedCollection;
