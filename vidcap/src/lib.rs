pub mod batch;
pub mod caption;
pub mod frame_extractor;
pub mod sampler;
