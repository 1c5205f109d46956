//! The animated night-street scene as a per-tick display list.

pub mod compose;
pub mod frame;
pub mod palette;

pub use compose::{compose_frame, flicker_opacity};
pub use frame::{BlendMode, DrawOp, GradientStop, Layer, Overlay, Paint, SceneFrame, Shape};
