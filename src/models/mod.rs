pub mod settings;

pub use settings::{DbEngine, ResolvedSettings};
