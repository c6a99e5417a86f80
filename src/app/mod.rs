//! Platform-facing input plumbing.
//!
//! The viewer never talks to a windowing system directly; frontends translate
//! their pointer events into [`Input`] and surface sizes into
//! [`SurfaceSize`](crate::viewer::host::SurfaceSize).

pub mod input;

pub use input::{Input, PointerButton};
