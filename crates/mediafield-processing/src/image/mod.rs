//! Image processing module
//!
//! - percentage resize math, scale-down and cover crop (resize)
//! - the decode → optimize → resize → encode chain (transformer)

pub mod resize;
pub mod transformer;
