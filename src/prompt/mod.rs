pub mod constructor;
pub mod context;

pub use constructor::{PromptConstructor, PLACEHOLDER};
pub use context::ContextDocument;
