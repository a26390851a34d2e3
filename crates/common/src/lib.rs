pub mod alerts;
pub mod crowd;
pub mod export;
pub mod parking;
pub mod validation;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
