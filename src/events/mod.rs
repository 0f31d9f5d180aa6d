pub mod sample;
pub mod snap;
pub mod window;

pub use sample::{Sample, Screen};
pub use snap::{SnapEvent, TickEvents};
pub use window::{ProtectedSet, WindowId};
