//! Геометрия зон: какой участок экрана означает намерение разместить окно.
//!
//! Здесь только чистые функции над координатами. Время, удержание и
//! гистерезис по времени живут в `services::drag_state`.

mod classifier;
mod zone;

pub use classifier::{ZoneClassifier, ZoneGeometry};
pub use zone::Zone;
