//! Platform audio subsystem contract
//!
//! The mixer core does not talk to hardware itself. It drives an implementation of
//! [`MixerBackend`]: [`crate::amixer::AmixerBackend`] on real systems and
//! [`crate::mock::MockBackend`] in tests.

use crate::channel::{Channel, Mode};
use crate::error::Result;

/// Opaque handle to one element of a loaded backend
///
/// Only meaningful for the backend that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub usize);

/// Adapter over a host audio mixer subsystem
///
/// Methods take `&self`; backends that mutate state use interior mutability.
/// Range and capability queries must hit the subsystem on every call.
pub trait MixerBackend {
    /// Attach to the subsystem's default session
    fn attach(&self) -> Result<()>;

    /// Register the simple mixer abstraction layer
    fn register(&self) -> Result<()>;

    /// Load the current element list
    fn load(&self) -> Result<()>;

    /// Release the session. Called exactly once by the owning mixer.
    fn close(&self);

    /// First element of the loaded list
    fn first(&self) -> Option<ElementId>;

    /// Element following `element`
    fn next(&self, element: ElementId) -> Option<ElementId>;

    fn is_active(&self, element: ElementId) -> bool;

    fn name(&self, element: ElementId) -> String;

    fn has_switch(&self, element: ElementId, mode: Mode) -> bool;

    fn has_volume(&self, element: ElementId, mode: Mode) -> bool;

    fn has_channel(&self, element: ElementId, mode: Mode, channel: Channel) -> bool;

    /// Current raw `(min, max)` volume range
    fn volume_range(&self, element: ElementId, mode: Mode) -> Result<(i64, i64)>;

    fn get_switch(&self, element: ElementId, mode: Mode, channel: Channel) -> Result<bool>;

    fn set_switch(&self, element: ElementId, mode: Mode, channel: Channel, on: bool)
    -> Result<()>;

    /// Apply one switch value to every channel of `mode`
    fn set_switch_all(&self, element: ElementId, mode: Mode, on: bool) -> Result<()>;

    fn get_volume(&self, element: ElementId, mode: Mode, channel: Channel) -> Result<i64>;

    fn set_volume(&self, element: ElementId, mode: Mode, channel: Channel, raw: i64)
    -> Result<()>;

    /// Apply one raw volume to every channel of `mode`
    fn set_volume_all(&self, element: ElementId, mode: Mode, raw: i64) -> Result<()>;
}
