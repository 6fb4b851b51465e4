//! Audio mixer control
//!
//! This crate exposes hardware mixer elements (volumes and mute switches) as typed,
//! percentage-normalized values. A [`Mixer`] session enumerates [`SoundControl`]s;
//! each control reads and writes up to nine channels per direction, translating
//! between 0-100% and the element's raw hardware range.
//!
//! # Backends
//!
//! - [`amixer::AmixerBackend`]: ALSA through the `amixer` utility
//! - [`mock::MockBackend`]: in-memory elements for tests
//!
//! # Example
//!
//! ```no_run
//! use hwstate_sound::{Channel, Mixer, Mode};
//!
//! fn main() -> hwstate_sound::Result<()> {
//!     let mixer = Mixer::get()?;
//!     for control in mixer.controls() {
//!         if control.has_playback_volume() {
//!             let volume = control.get_volume(Mode::Playback)?;
//!             println!("{}: {:?}", control.name(), volume.get(Channel::FrontLeft));
//!         }
//!     }
//!
//!     if let Some(master) = mixer.control("Master") {
//!         master.set_playback_volume_all_relative(5.0)?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod amixer;
pub mod backend;
pub mod channel;
pub mod config;
pub mod control;
pub mod convert;
pub mod error;
pub mod mixer;
pub mod mock;

pub use amixer::AmixerBackend;
pub use backend::{ElementId, MixerBackend};
pub use channel::{Channel, ChannelState, Mode, StatusState, VolumeState};
pub use config::MixerConfig;
pub use control::SoundControl;
pub use convert::{percent_to_value, value_to_percent};
pub use error::{Error, MixerError, NO_ERROR, Outcome, Result, ResultExt, Status};
pub use mixer::Mixer;
