mod matcher;
mod render;
mod tasks;
mod types;

pub use matcher::*;
pub use render::*;
pub use tasks::*;
pub use types::*;
