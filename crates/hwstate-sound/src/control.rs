//! Sound controls
//!
//! A [`SoundControl`] is a handle to one mixer element of a [`crate::Mixer`]
//! session. It borrows the session and cannot outlive it.
//!
//! Capabilities and ranges are queried from the backend on every call, never
//! cached. Writes are not rolled back: when a per-channel write fails, channels
//! already written keep their new value and the error is returned.
//!
//! Hardware may reject a write issued too soon after the previous one on the
//! same control. Nothing here waits or retries; callers issuing back-to-back
//! mutations should pace them (see [`crate::MixerConfig::pacing`]).

use crate::backend::{ElementId, MixerBackend};
use crate::channel::{Channel, ChannelState, Mode, StatusState, VolumeState};
use crate::convert::{percent_to_value, value_to_percent};
use crate::error::{Error, MixerError, Result, ResultExt, Status};
use std::fmt;

/// Handle to one mixer element
pub struct SoundControl<'m> {
    backend: &'m dyn MixerBackend,
    element: ElementId,
    name: String,
}

impl<'m> SoundControl<'m> {
    pub(crate) fn new(backend: &'m dyn MixerBackend, element: ElementId) -> Self {
        Self {
            name: backend.name(element),
            backend,
            element,
        }
    }

    /// Element name as reported by the subsystem (not necessarily unique)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn has_playback_status(&self) -> bool {
        self.backend.has_switch(self.element, Mode::Playback)
    }

    pub fn has_playback_volume(&self) -> bool {
        self.backend.has_volume(self.element, Mode::Playback)
    }

    pub fn has_capture_status(&self) -> bool {
        self.backend.has_switch(self.element, Mode::Capture)
    }

    pub fn has_capture_volume(&self) -> bool {
        self.backend.has_volume(self.element, Mode::Capture)
    }

    /// Read the switch of every channel exposed for `mode`
    pub fn get_status(&self, mode: Mode) -> Result<StatusState> {
        self.require_switch(mode).trace("SoundControl::get_status")?;

        let mut state = StatusState::new();
        for channel in Channel::ALL {
            if !self.backend.has_channel(self.element, mode, channel) {
                continue;
            }
            let on = self
                .backend
                .get_switch(self.element, mode, channel)
                .trace("SoundControl::get_status")?;
            state.set(channel, on);
        }
        Ok(state)
    }

    /// Read the volume of every channel exposed for `mode`, as percentages
    pub fn get_volume(&self, mode: Mode) -> Result<VolumeState> {
        self.require_volume(mode).trace("SoundControl::get_volume")?;

        let (min, max) = self.range(mode).trace("SoundControl::get_volume")?;
        let mut state = VolumeState::new();
        for channel in Channel::ALL {
            if !self.backend.has_channel(self.element, mode, channel) {
                continue;
            }
            let raw = self
                .backend
                .get_volume(self.element, mode, channel)
                .trace("SoundControl::get_volume")?;
            state.set(channel, value_to_percent(min, max, raw));
        }
        Ok(state)
    }

    /// Write the switch of each defined channel
    ///
    /// Channels the element does not expose for `mode` are skipped.
    pub fn set_status(&self, mode: Mode, state: &StatusState) -> Status {
        self.require_switch(mode).trace("SoundControl::set_status")?;

        for (channel, &on) in state.iter() {
            if !self.backend.has_channel(self.element, mode, channel) {
                tracing::trace!("'{}' has no {} {}, skipping", self.name, mode, channel);
                continue;
            }
            self.backend
                .set_switch(self.element, mode, channel, on)
                .trace("SoundControl::set_status")?;
            tracing::debug!("'{}' {} {} switch set to {}", self.name, mode, channel, on);
        }
        Ok(())
    }

    /// Set every channel's switch with one bulk call
    pub fn set_status_all(&self, mode: Mode, on: bool) -> Status {
        self.require_switch(mode)
            .trace("SoundControl::set_status_all")?;
        self.backend
            .set_switch_all(self.element, mode, on)
            .trace("SoundControl::set_status_all")?;
        tracing::debug!("'{}' {} switches set to {}", self.name, mode, on);
        Ok(())
    }

    /// Invert the switch of every exposed channel
    pub fn toggle_status(&self, mode: Mode) -> Status {
        let current = self
            .get_status(mode)
            .trace("SoundControl::toggle_status")?;
        let toggled = current.combine(&StatusState::filled(true), |on, flip| on ^ flip);
        self.set_status(mode, &toggled)
            .trace("SoundControl::toggle_status")
    }

    /// Write each defined channel's volume
    ///
    /// Every defined percentage must lie in `[0, 100]`; otherwise nothing is
    /// written. Channels the element does not expose for `mode` are skipped.
    pub fn set_volume(&self, mode: Mode, state: &VolumeState) -> Status {
        for (_, &percent) in state.iter() {
            check_percent(percent).trace("SoundControl::set_volume")?;
        }
        self.require_volume(mode).trace("SoundControl::set_volume")?;

        let (min, max) = self.range(mode).trace("SoundControl::set_volume")?;
        for (channel, &percent) in state.iter() {
            if !self.backend.has_channel(self.element, mode, channel) {
                tracing::trace!("'{}' has no {} {}, skipping", self.name, mode, channel);
                continue;
            }
            let raw = percent_to_value(min, max, percent);
            self.backend
                .set_volume(self.element, mode, channel, raw)
                .trace("SoundControl::set_volume")?;
            tracing::debug!(
                "'{}' {} {} volume set to {:.1}% (raw {})",
                self.name,
                mode,
                channel,
                percent,
                raw
            );
        }
        Ok(())
    }

    /// Set every channel's volume with one bulk call
    pub fn set_volume_all(&self, mode: Mode, percent: f64) -> Status {
        check_percent(percent).trace("SoundControl::set_volume_all")?;
        self.require_volume(mode)
            .trace("SoundControl::set_volume_all")?;

        let (min, max) = self.range(mode).trace("SoundControl::set_volume_all")?;
        let raw = percent_to_value(min, max, percent);
        self.backend
            .set_volume_all(self.element, mode, raw)
            .trace("SoundControl::set_volume_all")?;
        tracing::debug!(
            "'{}' {} volume set to {:.1}% (raw {})",
            self.name,
            mode,
            percent,
            raw
        );
        Ok(())
    }

    /// Shift every exposed channel by `delta` percentage points
    ///
    /// Results saturate at 0% and 100% instead of failing.
    pub fn set_volume_all_relative(&self, mode: Mode, delta: f64) -> Status {
        let current = self
            .get_volume(mode)
            .trace("SoundControl::set_volume_all_relative")?;
        let adjusted = current.combine(&ChannelState::filled(delta), |volume, delta| {
            (volume + delta).clamp(0.0, 100.0)
        });
        self.set_volume(mode, &adjusted)
            .trace("SoundControl::set_volume_all_relative")
    }

    pub fn get_playback_status(&self) -> Result<StatusState> {
        self.get_status(Mode::Playback)
    }

    pub fn get_capture_status(&self) -> Result<StatusState> {
        self.get_status(Mode::Capture)
    }

    pub fn set_playback_status(&self, state: &StatusState) -> Status {
        self.set_status(Mode::Playback, state)
    }

    pub fn set_capture_status(&self, state: &StatusState) -> Status {
        self.set_status(Mode::Capture, state)
    }

    pub fn set_playback_status_all(&self, on: bool) -> Status {
        self.set_status_all(Mode::Playback, on)
    }

    pub fn set_capture_status_all(&self, on: bool) -> Status {
        self.set_status_all(Mode::Capture, on)
    }

    pub fn toggle_playback_status(&self) -> Status {
        self.toggle_status(Mode::Playback)
    }

    pub fn toggle_capture_status(&self) -> Status {
        self.toggle_status(Mode::Capture)
    }

    pub fn get_playback_volume(&self) -> Result<VolumeState> {
        self.get_volume(Mode::Playback)
    }

    pub fn get_capture_volume(&self) -> Result<VolumeState> {
        self.get_volume(Mode::Capture)
    }

    pub fn set_playback_volume(&self, state: &VolumeState) -> Status {
        self.set_volume(Mode::Playback, state)
    }

    pub fn set_capture_volume(&self, state: &VolumeState) -> Status {
        self.set_volume(Mode::Capture, state)
    }

    pub fn set_playback_volume_all(&self, percent: f64) -> Status {
        self.set_volume_all(Mode::Playback, percent)
    }

    pub fn set_capture_volume_all(&self, percent: f64) -> Status {
        self.set_volume_all(Mode::Capture, percent)
    }

    pub fn set_playback_volume_all_relative(&self, delta: f64) -> Status {
        self.set_volume_all_relative(Mode::Playback, delta)
    }

    pub fn set_capture_volume_all_relative(&self, delta: f64) -> Status {
        self.set_volume_all_relative(Mode::Capture, delta)
    }

    fn range(&self, mode: Mode) -> Result<(i64, i64)> {
        let (min, max) = self.backend.volume_range(self.element, mode)?;
        tracing::debug!("'{}' {} range is [{}, {}]", self.name, mode, min, max);
        Ok((min, max))
    }

    fn require_switch(&self, mode: Mode) -> Status {
        if self.backend.has_switch(self.element, mode) {
            Ok(())
        } else {
            Err(Error::platform(format!(
                "control '{}' has no {} switch",
                self.name, mode
            )))
        }
    }

    fn require_volume(&self, mode: Mode) -> Status {
        if self.backend.has_volume(self.element, mode) {
            Ok(())
        } else {
            Err(Error::platform(format!(
                "control '{}' has no {} volume",
                self.name, mode
            )))
        }
    }
}

impl fmt::Debug for SoundControl<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoundControl")
            .field("name", &self.name)
            .field("element", &self.element)
            .finish()
    }
}

fn check_percent(percent: f64) -> Status {
    if (0.0..=100.0).contains(&percent) {
        Ok(())
    } else {
        Err(MixerError::OutOfRange(percent).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBackend, MockElement};

    fn stereo_master() -> MockBackend {
        MockBackend::new(vec![
            MockElement::new("Master")
                .playback_volume(0, 87, &[Channel::FrontLeft, Channel::FrontRight])
                .playback_switch(),
        ])
    }

    #[test]
    fn test_check_percent() {
        assert!(check_percent(0.0).is_ok());
        assert!(check_percent(100.0).is_ok());
        assert!(check_percent(-0.5).unwrap_err().is_out_of_range());
        assert!(check_percent(100.5).unwrap_err().is_out_of_range());
        assert!(check_percent(f64::NAN).is_err());
    }

    #[test]
    fn test_capabilities() {
        let backend = stereo_master();
        let control = SoundControl::new(&backend, ElementId(0));

        assert_eq!(control.name(), "Master");
        assert!(control.has_playback_status());
        assert!(control.has_playback_volume());
        assert!(!control.has_capture_status());
        assert!(!control.has_capture_volume());
    }

    #[test]
    fn test_missing_capability_is_platform_error() {
        let backend = stereo_master();
        let control = SoundControl::new(&backend, ElementId(0));

        let err = control.get_capture_volume().unwrap_err();
        assert!(err.is_platform());
        assert!(err.to_string().contains("has no capture volume"));
        assert!(err.to_string().contains("SoundControl::get_volume"));
    }

    #[test]
    fn test_range_is_queried_every_call() {
        let backend = stereo_master();
        let control = SoundControl::new(&backend, ElementId(0));

        let before = backend.range_queries();
        control.get_playback_volume().unwrap();
        control.get_playback_volume().unwrap();
        assert_eq!(backend.range_queries() - before, 2);
    }

    #[test]
    fn test_range_change_between_calls() {
        let backend = stereo_master();
        let control = SoundControl::new(&backend, ElementId(0));

        control.set_playback_volume_all(100.0).unwrap();
        assert_eq!(backend.raw_volume(0, Mode::Playback, Channel::FrontLeft), Some(87));

        backend.set_range(0, Mode::Playback, 0, 174);
        let volume = control.get_playback_volume().unwrap();
        assert!((volume.get(Channel::FrontLeft).unwrap() - 50.0).abs() < 0.1);
    }

    #[test]
    fn test_out_of_range_writes_nothing() {
        let backend = stereo_master();
        let control = SoundControl::new(&backend, ElementId(0));

        let state = VolumeState::new()
            .with(Channel::FrontLeft, 30.0)
            .with(Channel::FrontRight, 130.0);
        let err = control.set_playback_volume(&state).unwrap_err();

        assert!(err.is_out_of_range());
        assert!(backend.writes().is_empty());
    }
}
