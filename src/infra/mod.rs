mod logging;
mod scan;
mod task_files;
mod task_store;

pub use logging::*;
pub use scan::*;
pub use task_files::*;
pub use task_store::*;
