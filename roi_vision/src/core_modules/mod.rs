pub mod background_model;
pub mod blob_detector;
pub mod containment;
pub mod frame;
pub mod image_sequence;
pub mod motion_mask;
pub mod occupancy;
pub mod rect;
