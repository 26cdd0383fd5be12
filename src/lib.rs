pub mod engine;
pub mod transport;
pub mod cli;
pub mod utils;

pub use engine::*;
pub use transport::*;
pub use cli::*;
pub use utils::*;
