pub mod playback;

pub use playback::{PlaybackActor, PlaybackArguments, PlaybackMsg};
