pub mod applications;
pub mod batch;
