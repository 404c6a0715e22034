//! Geometry kernel for star-convex polygons.
//!
//! A star-convex polygon is stored implicitly as a center plus `n_rays` radial
//! distances measured along equally spaced angles. This module turns that
//! representation into explicit vertices and provides the primitives the rest
//! of the pipeline is built on:
//!
//! - [`rays`]: ray angles and cached direction vectors for a given `n_rays`.
//! - [`polygon`]: explicit [`StarPolygon`]s, areas, bounding boxes and the
//!   `n_polys × 2 × n_rays` coordinate array ([`PolygonCoords`]).
//! - [`intersection`]: exact intersection area of two simple polygons and the
//!   intersection-over-smaller-area overlap used by NMS.
//! - [`fill`]: the scan-fill seam used by the label rasterizer.
//!
//! Coordinates follow array axes: the first component is the row, the second
//! the column. For `nalgebra::Point2` this means `p.x` is the row.

pub mod fill;
pub mod intersection;
pub mod polygon;
pub mod rays;

pub use fill::{PolygonFill, ScanlineFill};
pub use intersection::{intersection_area, overlap_ratio};
pub use polygon::{dist_to_coord, BoundingBox, PolygonCoords, StarPolygon};
pub use rays::{ray_angles, RayGeometry};
