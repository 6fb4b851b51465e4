//! Channel identities and per-channel state
//!
//! A mixer element exposes up to nine channels per mode. [`ChannelState`] holds an
//! optional value for each one; an absent entry means the element does not expose
//! that channel, not that something failed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a mixer capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Playback,
    Capture,
}

impl Mode {
    /// Get the amixer direction keyword
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Playback => "playback",
            Mode::Capture => "capture",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Speaker or microphone position, in hardware channel order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
    FrontCenter,
    Woofer,
    SideLeft,
    SideRight,
    RearCenter,
}

impl Channel {
    pub const COUNT: usize = 9;

    /// All channels in hardware order
    pub const ALL: [Channel; Channel::COUNT] = [
        Channel::FrontLeft,
        Channel::FrontRight,
        Channel::RearLeft,
        Channel::RearRight,
        Channel::FrontCenter,
        Channel::Woofer,
        Channel::SideLeft,
        Channel::SideRight,
        Channel::RearCenter,
    ];

    /// Position in hardware order
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name as printed by ALSA
    pub fn alsa_name(self) -> &'static str {
        match self {
            Channel::FrontLeft => "Front Left",
            Channel::FrontRight => "Front Right",
            Channel::RearLeft => "Rear Left",
            Channel::RearRight => "Rear Right",
            Channel::FrontCenter => "Front Center",
            Channel::Woofer => "Woofer",
            Channel::SideLeft => "Side Left",
            Channel::SideRight => "Side Right",
            Channel::RearCenter => "Rear Center",
        }
    }

    /// Parse an ALSA channel name. `Mono` shares the front-left slot.
    pub fn from_alsa_name(name: &str) -> Option<Self> {
        match name.trim() {
            "Mono" => Some(Channel::FrontLeft),
            other => Channel::ALL.into_iter().find(|c| c.alsa_name() == other),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alsa_name())
    }
}

/// Optional value per channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelState<T> {
    slots: [Option<T>; Channel::COUNT],
}

/// Switch state per channel (`true` = enabled)
pub type StatusState = ChannelState<bool>;

/// Volume per channel as a percentage
pub type VolumeState = ChannelState<f64>;

impl<T> ChannelState<T> {
    /// Every channel absent
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    pub fn get(&self, channel: Channel) -> Option<&T> {
        self.slots[channel.index()].as_ref()
    }

    pub fn set(&mut self, channel: Channel, value: T) {
        self.slots[channel.index()] = Some(value);
    }

    /// Mark `channel` absent, returning what it held
    pub fn clear(&mut self, channel: Channel) -> Option<T> {
        self.slots[channel.index()].take()
    }

    /// Builder form of [`ChannelState::set`]
    pub fn with(mut self, channel: Channel, value: T) -> Self {
        self.set(channel, value);
        self
    }

    pub fn contains(&self, channel: Channel) -> bool {
        self.slots[channel.index()].is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Number of channels holding a value
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Defined channels and their values, in hardware order
    pub fn iter(&self) -> impl Iterator<Item = (Channel, &T)> + '_ {
        Channel::ALL
            .into_iter()
            .zip(self.slots.iter())
            .filter_map(|(channel, slot)| slot.as_ref().map(|value| (channel, value)))
    }

    /// For each channel defined on both sides, combine the two values
    ///
    /// Channels missing on either side stay absent in the result.
    pub fn combine<U, V, F>(&self, other: &ChannelState<U>, mut f: F) -> ChannelState<V>
    where
        F: FnMut(&T, &U) -> V,
    {
        let mut out = ChannelState::new();
        for channel in Channel::ALL {
            if let (Some(a), Some(b)) = (self.get(channel), other.get(channel)) {
                out.set(channel, f(a, b));
            }
        }
        out
    }
}

impl<T: Clone> ChannelState<T> {
    /// Every channel holding `value`
    pub fn filled(value: T) -> Self {
        Self {
            slots: std::array::from_fn(|_| Some(value.clone())),
        }
    }
}

impl<T> Default for ChannelState<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(Channel, T)> for ChannelState<T> {
    fn from_iter<I: IntoIterator<Item = (Channel, T)>>(iter: I) -> Self {
        let mut state = Self::new();
        for (channel, value) in iter {
            state.set(channel, value);
        }
        state
    }
}
