pub mod experience;
pub mod penalties;
pub mod pipeline;
pub mod scoring;
pub mod sectional;
pub mod thresholds;
