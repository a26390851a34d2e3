pub mod alert_engine;
pub mod config;
pub mod density;
pub mod error;
pub mod heatmap;
pub mod parking;
pub mod predict;
pub mod routes;
pub mod scheduler;
pub mod state;
pub mod trend;

pub use config::{InferenceConfig, MonitorConfig};
pub use error::{ApiError, MonitorError};
pub use state::MonitorState;
