//! Mock mixer backend for testing without sound hardware
//!
//! [`MockBackend`] keeps its elements in shared state, so a test can hand one
//! clone to a [`crate::Mixer`] and inspect or manipulate the hardware through
//! another.
//!
//! # Usage
//!
//! ```no_run
//! use hwstate_sound::mock::{MockBackend, MockElement};
//! use hwstate_sound::{Channel, Mixer};
//!
//! let backend = MockBackend::new(vec![
//!     MockElement::new("Master")
//!         .playback_volume(0, 87, &[Channel::FrontLeft, Channel::FrontRight])
//!         .playback_switch(),
//! ]);
//! let mixer = Mixer::with_backend(Box::new(backend.clone()))?;
//! # Ok::<(), hwstate_sound::Error>(())
//! ```

use crate::backend::{ElementId, MixerBackend};
use crate::channel::{Channel, ChannelState, Mode};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Session setup step, for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockStage {
    Attach,
    Register,
    Load,
}

/// Value carried by a recorded write
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockValue {
    Switch(bool),
    Volume(i64),
}

/// One write that reached the mock hardware
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MockWrite {
    pub element: usize,
    pub mode: Mode,
    /// `None` for bulk writes
    pub channel: Option<Channel>,
    pub value: MockValue,
}

#[derive(Debug, Clone, Default)]
struct MockDirection {
    channels: Vec<Channel>,
    switch: bool,
    range: Option<(i64, i64)>,
    switches: ChannelState<bool>,
    volumes: ChannelState<i64>,
}

impl MockDirection {
    fn has_channel(&self, channel: Channel) -> bool {
        self.channels.contains(&channel)
    }

    fn add_channels(&mut self, channels: &[Channel]) {
        for channel in channels {
            if !self.channels.contains(channel) {
                self.channels.push(*channel);
            }
        }
    }
}

/// Mock mixer element, built with chained setters
#[derive(Debug, Clone)]
pub struct MockElement {
    name: String,
    active: bool,
    playback: MockDirection,
    capture: MockDirection,
}

impl MockElement {
    /// An active element with no capabilities
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            active: true,
            playback: MockDirection::default(),
            capture: MockDirection::default(),
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Expose `channels` for `mode`
    pub fn channels(mut self, mode: Mode, channels: &[Channel]) -> Self {
        self.direction_mut(mode).add_channels(channels);
        self
    }

    /// Give `mode` a switch on its channels
    pub fn switch(mut self, mode: Mode) -> Self {
        self.direction_mut(mode).switch = true;
        self
    }

    /// Give `mode` a volume with range `[min, max]`
    pub fn volume(mut self, mode: Mode, min: i64, max: i64) -> Self {
        self.direction_mut(mode).range = Some((min, max));
        self
    }

    pub fn playback_volume(self, min: i64, max: i64, channels: &[Channel]) -> Self {
        self.channels(Mode::Playback, channels)
            .volume(Mode::Playback, min, max)
    }

    pub fn capture_volume(self, min: i64, max: i64, channels: &[Channel]) -> Self {
        self.channels(Mode::Capture, channels)
            .volume(Mode::Capture, min, max)
    }

    pub fn playback_switch(self) -> Self {
        self.switch(Mode::Playback)
    }

    pub fn capture_switch(self) -> Self {
        self.switch(Mode::Capture)
    }

    /// Initial switch value of one channel (switches start on)
    pub fn switch_value(mut self, mode: Mode, channel: Channel, on: bool) -> Self {
        self.direction_mut(mode).switches.set(channel, on);
        self
    }

    /// Initial raw volume of one channel (volumes start at the range maximum)
    pub fn volume_value(mut self, mode: Mode, channel: Channel, raw: i64) -> Self {
        self.direction_mut(mode).volumes.set(channel, raw);
        self
    }

    fn direction(&self, mode: Mode) -> &MockDirection {
        match mode {
            Mode::Playback => &self.playback,
            Mode::Capture => &self.capture,
        }
    }

    fn direction_mut(&mut self, mode: Mode) -> &mut MockDirection {
        match mode {
            Mode::Playback => &mut self.playback,
            Mode::Capture => &mut self.capture,
        }
    }
}

/// Shared mock state
#[derive(Debug, Default)]
struct MockState {
    elements: Vec<MockElement>,
    loaded: bool,
    closes: usize,
    range_queries: usize,
    writes: Vec<MockWrite>,
    stage_failures: HashMap<MockStage, String>,
    write_failures: HashMap<(usize, Mode, Channel), String>,
    settle: Option<Duration>,
    last_write: HashMap<(usize, Mode, Channel), Instant>,
}

impl MockState {
    fn element(&self, element: ElementId) -> Result<&MockElement> {
        self.elements
            .get(element.0)
            .ok_or_else(|| Error::platform(format!("no element #{}", element.0)))
    }

    fn direction_mut(&mut self, element: ElementId, mode: Mode) -> Result<&mut MockDirection> {
        self.elements
            .get_mut(element.0)
            .map(|e| e.direction_mut(mode))
            .ok_or_else(|| Error::platform(format!("no element #{}", element.0)))
    }

    /// Apply injected failures and settle-time rejection to a channel write
    fn check_write(&mut self, element: ElementId, mode: Mode, channel: Channel) -> Result<()> {
        let key = (element.0, mode, channel);
        if let Some(message) = self.write_failures.get(&key) {
            return Err(Error::platform(message.clone()));
        }
        let now = Instant::now();
        if let (Some(settle), Some(last)) = (self.settle, self.last_write.get(&key)) {
            if now.duration_since(*last) < settle {
                return Err(Error::platform("Device or resource busy"));
            }
        }
        self.last_write.insert(key, now);
        Ok(())
    }

    fn stage(&self, stage: MockStage) -> Result<()> {
        match self.stage_failures.get(&stage) {
            Some(message) => Err(Error::platform(message.clone())),
            None => Ok(()),
        }
    }
}

/// In-memory [`MixerBackend`]
#[derive(Debug, Clone)]
pub struct MockBackend {
    state: Arc<RwLock<MockState>>,
}

impl MockBackend {
    pub fn new(elements: Vec<MockElement>) -> Self {
        Self {
            state: Arc::new(RwLock::new(MockState {
                elements,
                ..MockState::default()
            })),
        }
    }

    /// A typical laptop codec: stereo Master and Capture, mono Beep
    pub fn laptop() -> Self {
        let stereo = [Channel::FrontLeft, Channel::FrontRight];
        Self::new(vec![
            MockElement::new("Master")
                .playback_volume(0, 87, &stereo)
                .playback_switch(),
            MockElement::new("Headphone")
                .playback_volume(0, 87, &stereo)
                .playback_switch()
                .inactive(),
            MockElement::new("Capture")
                .capture_volume(0, 63, &stereo)
                .capture_switch(),
            MockElement::new("Beep")
                .playback_volume(0, 15, &[Channel::FrontLeft])
                .playback_switch()
                .switch_value(Mode::Playback, Channel::FrontLeft, false),
        ])
    }

    /// Make a session setup step fail with `message`
    pub fn fail_stage(&self, stage: MockStage, message: &str) {
        if let Ok(mut state) = self.state.write() {
            state.stage_failures.insert(stage, message.to_string());
        }
    }

    /// Make writes to one channel fail with `message`
    pub fn fail_write(&self, element: usize, mode: Mode, channel: Channel, message: &str) {
        if let Ok(mut state) = self.state.write() {
            state
                .write_failures
                .insert((element, mode, channel), message.to_string());
        }
    }

    /// Reject a channel write issued within `settle` of the previous one
    pub fn set_settle_time(&self, settle: Duration) {
        if let Ok(mut state) = self.state.write() {
            state.settle = Some(settle);
        }
    }

    pub fn set_active(&self, element: usize, active: bool) {
        if let Ok(mut state) = self.state.write() {
            if let Some(e) = state.elements.get_mut(element) {
                e.active = active;
            }
        }
    }

    /// Change the range the hardware reports for `mode`
    pub fn set_range(&self, element: usize, mode: Mode, min: i64, max: i64) {
        if let Ok(mut state) = self.state.write() {
            if let Some(e) = state.elements.get_mut(element) {
                e.direction_mut(mode).range = Some((min, max));
            }
        }
    }

    /// Current raw volume of a channel
    pub fn raw_volume(&self, element: usize, mode: Mode, channel: Channel) -> Option<i64> {
        let state = self.state.read().ok()?;
        let direction = state.elements.get(element)?.direction(mode);
        let (_, max) = direction.range?;
        if !direction.has_channel(channel) {
            return None;
        }
        Some(direction.volumes.get(channel).copied().unwrap_or(max))
    }

    /// Current switch value of a channel
    pub fn switch_state(&self, element: usize, mode: Mode, channel: Channel) -> Option<bool> {
        let state = self.state.read().ok()?;
        let direction = state.elements.get(element)?.direction(mode);
        if !direction.switch || !direction.has_channel(channel) {
            return None;
        }
        Some(direction.switches.get(channel).copied().unwrap_or(true))
    }

    /// Writes that reached the hardware, oldest first
    pub fn writes(&self) -> Vec<MockWrite> {
        self.state
            .read()
            .map(|s| s.writes.clone())
            .unwrap_or_default()
    }

    pub fn clear_writes(&self) {
        if let Ok(mut state) = self.state.write() {
            state.writes.clear();
        }
    }

    /// Number of times the session was released
    pub fn close_count(&self) -> usize {
        self.state.read().map(|s| s.closes).unwrap_or(0)
    }

    /// Number of range queries served
    pub fn range_queries(&self) -> usize {
        self.state.read().map(|s| s.range_queries).unwrap_or(0)
    }

    fn read<R>(&self, f: impl FnOnce(&MockState) -> Result<R>) -> Result<R> {
        let state = self
            .state
            .read()
            .map_err(|_| Error::platform("mock state poisoned"))?;
        f(&*state)
    }

    fn write<R>(&self, f: impl FnOnce(&mut MockState) -> Result<R>) -> Result<R> {
        let mut state = self
            .state
            .write()
            .map_err(|_| Error::platform("mock state poisoned"))?;
        f(&mut *state)
    }

    fn query(&self, f: impl FnOnce(&MockState) -> Option<bool>) -> bool {
        self.state.read().ok().and_then(|s| f(&*s)).unwrap_or(false)
    }
}

impl MixerBackend for MockBackend {
    fn attach(&self) -> Result<()> {
        self.read(|s| s.stage(MockStage::Attach))?;
        tracing::debug!("[MOCK] Attached to default session");
        Ok(())
    }

    fn register(&self) -> Result<()> {
        self.read(|s| s.stage(MockStage::Register))
    }

    fn load(&self) -> Result<()> {
        self.write(|s| {
            s.stage(MockStage::Load)?;
            s.loaded = true;
            Ok(())
        })?;
        tracing::debug!("[MOCK] Element list loaded");
        Ok(())
    }

    fn close(&self) {
        if let Ok(mut state) = self.state.write() {
            state.closes += 1;
            state.loaded = false;
        }
        tracing::debug!("[MOCK] Session closed");
    }

    fn first(&self) -> Option<ElementId> {
        let state = self.state.read().ok()?;
        (state.loaded && !state.elements.is_empty()).then_some(ElementId(0))
    }

    fn next(&self, element: ElementId) -> Option<ElementId> {
        let state = self.state.read().ok()?;
        let next = element.0 + 1;
        (state.loaded && next < state.elements.len()).then_some(ElementId(next))
    }

    fn is_active(&self, element: ElementId) -> bool {
        self.query(|s| s.elements.get(element.0).map(|e| e.active))
    }

    fn name(&self, element: ElementId) -> String {
        self.state
            .read()
            .ok()
            .and_then(|s| s.elements.get(element.0).map(|e| e.name.clone()))
            .unwrap_or_default()
    }

    fn has_switch(&self, element: ElementId, mode: Mode) -> bool {
        self.query(|s| s.elements.get(element.0).map(|e| e.direction(mode).switch))
    }

    fn has_volume(&self, element: ElementId, mode: Mode) -> bool {
        self.query(|s| {
            s.elements
                .get(element.0)
                .map(|e| e.direction(mode).range.is_some())
        })
    }

    fn has_channel(&self, element: ElementId, mode: Mode, channel: Channel) -> bool {
        self.query(|s| {
            s.elements
                .get(element.0)
                .map(|e| e.direction(mode).has_channel(channel))
        })
    }

    fn volume_range(&self, element: ElementId, mode: Mode) -> Result<(i64, i64)> {
        self.write(|s| {
            s.range_queries += 1;
            s.element(element)?
                .direction(mode)
                .range
                .ok_or_else(|| Error::platform(format!("no {mode} volume")))
        })
    }

    fn get_switch(&self, element: ElementId, mode: Mode, channel: Channel) -> Result<bool> {
        self.read(|s| {
            let direction = s.element(element)?.direction(mode);
            if !direction.switch || !direction.has_channel(channel) {
                return Err(Error::platform(format!("no {mode} switch on {channel}")));
            }
            Ok(direction.switches.get(channel).copied().unwrap_or(true))
        })
    }

    fn set_switch(
        &self,
        element: ElementId,
        mode: Mode,
        channel: Channel,
        on: bool,
    ) -> Result<()> {
        self.write(|s| {
            let direction = s.direction_mut(element, mode)?;
            if !direction.switch || !direction.has_channel(channel) {
                return Err(Error::platform(format!("no {mode} switch on {channel}")));
            }
            s.check_write(element, mode, channel)?;
            s.direction_mut(element, mode)?.switches.set(channel, on);
            s.writes.push(MockWrite {
                element: element.0,
                mode,
                channel: Some(channel),
                value: MockValue::Switch(on),
            });
            Ok(())
        })
    }

    fn set_switch_all(&self, element: ElementId, mode: Mode, on: bool) -> Result<()> {
        self.write(|s| {
            let direction = s.direction_mut(element, mode)?;
            if !direction.switch {
                return Err(Error::platform(format!("no {mode} switch")));
            }
            for channel in direction.channels.clone() {
                direction.switches.set(channel, on);
            }
            s.writes.push(MockWrite {
                element: element.0,
                mode,
                channel: None,
                value: MockValue::Switch(on),
            });
            Ok(())
        })
    }

    fn get_volume(&self, element: ElementId, mode: Mode, channel: Channel) -> Result<i64> {
        self.read(|s| {
            let direction = s.element(element)?.direction(mode);
            match direction.range {
                Some((_, max)) if direction.has_channel(channel) => {
                    Ok(direction.volumes.get(channel).copied().unwrap_or(max))
                }
                _ => Err(Error::platform(format!("no {mode} volume on {channel}"))),
            }
        })
    }

    fn set_volume(
        &self,
        element: ElementId,
        mode: Mode,
        channel: Channel,
        raw: i64,
    ) -> Result<()> {
        self.write(|s| {
            let direction = s.direction_mut(element, mode)?;
            if direction.range.is_none() || !direction.has_channel(channel) {
                return Err(Error::platform(format!("no {mode} volume on {channel}")));
            }
            s.check_write(element, mode, channel)?;
            s.direction_mut(element, mode)?.volumes.set(channel, raw);
            s.writes.push(MockWrite {
                element: element.0,
                mode,
                channel: Some(channel),
                value: MockValue::Volume(raw),
            });
            Ok(())
        })
    }

    fn set_volume_all(&self, element: ElementId, mode: Mode, raw: i64) -> Result<()> {
        self.write(|s| {
            let direction = s.direction_mut(element, mode)?;
            if direction.range.is_none() {
                return Err(Error::platform(format!("no {mode} volume")));
            }
            for channel in direction.channels.clone() {
                direction.volumes.set(channel, raw);
            }
            s.writes.push(MockWrite {
                element: element.0,
                mode,
                channel: None,
                value: MockValue::Volume(raw),
            });
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_laptop_profile() {
        let backend = MockBackend::laptop();
        backend.load().unwrap();

        assert_eq!(backend.name(ElementId(0)), "Master");
        assert!(!backend.is_active(ElementId(1)));
        assert!(backend.has_volume(ElementId(2), Mode::Capture));
        assert!(!backend.has_volume(ElementId(2), Mode::Playback));
        assert_eq!(
            backend.switch_state(3, Mode::Playback, Channel::FrontLeft),
            Some(false)
        );
    }

    #[test]
    fn test_walk_requires_load() {
        let backend = MockBackend::laptop();
        assert_eq!(backend.first(), None);

        backend.load().unwrap();
        assert_eq!(backend.first(), Some(ElementId(0)));
        assert_eq!(backend.next(ElementId(3)), None);
    }

    #[test]
    fn test_volume_defaults_to_max() {
        let backend = MockBackend::laptop();
        assert_eq!(
            backend.get_volume(ElementId(0), Mode::Playback, Channel::FrontRight).unwrap(),
            87
        );
        assert!(backend
            .get_volume(ElementId(0), Mode::Playback, Channel::Woofer)
            .is_err());
    }

    #[test]
    fn test_stage_failure() {
        let backend = MockBackend::laptop();
        backend.fail_stage(MockStage::Register, "no simple mixer");

        assert!(backend.attach().is_ok());
        let err = backend.register().unwrap_err();
        assert_eq!(err.to_string(), "Platform error: no simple mixer");
    }

    #[test]
    fn test_settle_time_rejects_rapid_writes() {
        let backend = MockBackend::laptop();
        backend.set_settle_time(Duration::from_secs(60));

        backend
            .set_switch(ElementId(0), Mode::Playback, Channel::FrontLeft, false)
            .unwrap();
        let err = backend
            .set_switch(ElementId(0), Mode::Playback, Channel::FrontLeft, true)
            .unwrap_err();
        assert!(err.to_string().contains("busy"));

        // Other channels are independent
        backend
            .set_switch(ElementId(0), Mode::Playback, Channel::FrontRight, false)
            .unwrap();
    }

    #[test]
    fn test_bulk_writes_recorded() {
        let backend = MockBackend::laptop();
        backend.set_volume_all(ElementId(0), Mode::Playback, 40).unwrap();

        assert_eq!(
            backend.writes(),
            vec![MockWrite {
                element: 0,
                mode: Mode::Playback,
                channel: None,
                value: MockValue::Volume(40),
            }]
        );
        assert_eq!(backend.raw_volume(0, Mode::Playback, Channel::FrontRight), Some(40));
    }
}
