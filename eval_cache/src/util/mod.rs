pub mod clock;
pub mod timing;

pub use clock::{Clock, ManualClock, SystemClock};
