// Clock sources and timeline construction

mod clock;
mod timeline;

pub use clock::{
    FrameTicker, GameClock, MAX_FRAME_STEP_US, MAX_SCALE, MIN_SCALE, SystemTimeProvider,
    TimeProvider,
};
pub use earwise_types::time::{US_PER_SECOND, secs_to_us, us_to_secs};
pub use timeline::Timeline;
