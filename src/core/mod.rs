pub mod config;
pub mod window_buffer;
pub mod feature_tensor;
pub mod classifier;
pub mod state_monitor;

// Sequence-model collaborator
pub mod model_bridge;
pub mod model_assets;
