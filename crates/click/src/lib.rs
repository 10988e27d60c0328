pub mod player;
pub mod schedule;
pub mod sound;

pub use player::{ClickPlayer, PlayerConfig};
pub use schedule::ClickSchedule;
pub use sound::ClickSound;
