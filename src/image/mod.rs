//! Minimal image containers used by the pipeline.
//!
//! - [`ImageF32`]: single-channel probability maps.
//! - [`TensorF32`]: channel-last `height × width × channels` network outputs.
//! - [`LabelImage`]: integer instance rasters produced by the rasterizer.
//!
//! All containers are contiguous and row-major; coordinates are `(row, col)`.

pub mod f32;
pub mod labels;
pub mod tensor;
pub mod traits;

pub use self::f32::ImageF32;
pub use self::labels::LabelImage;
pub use self::tensor::TensorF32;
pub use self::traits::{ImageView, ImageViewMut, Rows};
