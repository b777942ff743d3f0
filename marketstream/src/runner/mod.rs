pub mod backoff;
pub mod driver;
pub mod state;

pub use driver::drive;
