mod filter;
mod input;
mod properties;
mod task;
mod template;

pub use filter::*;
pub use input::*;
pub use properties::*;
pub use task::*;
pub use template::*;
