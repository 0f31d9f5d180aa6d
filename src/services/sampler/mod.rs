//! Sampler: responsibility and boundaries
//!
//! This module and its submodules ONLY read the pointer position, the primary
//! button state and the active window id. They MUST NOT classify zones or keep
//! drag state: every decision belongs to `services::drag_state`.

mod dry_run;
mod r#trait;
mod x11;

pub use self::r#trait::{create_sampler, PointerSampler};
