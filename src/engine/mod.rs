// Core engine components
pub mod query_composer;
pub mod response_flattener;
pub mod validation;
pub mod explorer;

pub use query_composer::*;
pub use response_flattener::*;
pub use validation::*;
pub use explorer::*;
