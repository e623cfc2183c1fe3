pub mod logging;
pub mod progress;
pub mod types;
pub mod utils;

pub use logging::*;
pub use types::*;
pub use utils::*;

// Re-export progress functions for library users
#[allow(unused_imports)]
pub use progress::create_spinner;
