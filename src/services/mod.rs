pub mod clock;
pub mod detector;
pub mod drag_state;
pub mod emitter;
pub mod sampler;

pub use clock::MonotonicClock;
pub use detector::SnapDetector;
pub use drag_state::{DragContext, DragMachine};
pub use emitter::EventEmitter;
pub use sampler::create_sampler;
