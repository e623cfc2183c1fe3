pub mod harvest;
pub mod sync;

pub use harvest::run_harvest;
pub use sync::run_sync;
