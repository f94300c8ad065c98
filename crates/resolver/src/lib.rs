pub mod pipeline;
pub mod select;
pub mod walk;

#[cfg(test)]
mod testing;

pub use pipeline::{Resolution, ResolutionPipeline, ResolveRequest};
pub use select::NodeSelector;
pub use walk::{TreeWalk, WalkOutcome, WalkStop};
