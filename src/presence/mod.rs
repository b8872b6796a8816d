pub mod classifier;
pub mod latch;
pub mod state_machine;

pub use classifier::{classify, LYING_GAP_THRESHOLD};
pub use latch::AlertLatch;
pub use state_machine::{transition, Transition};
