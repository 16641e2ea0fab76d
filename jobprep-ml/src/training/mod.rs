//! Model training: feature scaling and ElasticNet regression.

pub mod elastic_net;
pub mod scaler;
pub mod trainer;

pub use elastic_net::ElasticNet;
pub use scaler::StandardScaler;
pub use trainer::{LinearModel, ModelTrainer};
