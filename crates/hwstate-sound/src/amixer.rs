//! ALSA backend driven through the `amixer` utility
//!
//! Every query runs `amixer sget` on the element and parses the simple-control
//! report, so ranges and capabilities always reflect the current hardware.

use crate::backend::{ElementId, MixerBackend};
use crate::channel::{Channel, ChannelState, Mode};
use crate::config::MixerConfig;
use crate::error::{Error, Result, ResultExt};
use std::cell::RefCell;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Simple control identity as `amixer` addresses it
#[derive(Debug, Clone, PartialEq, Eq)]
struct SimpleId {
    name: String,
    index: u32,
}

impl SimpleId {
    fn spec(&self) -> String {
        format!("'{}',{}", self.name, self.index)
    }
}

/// One channel line of a report
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ChannelReading {
    raw: Option<i64>,
    on: Option<bool>,
}

/// Report data for one direction
#[derive(Debug, Clone, Default, PartialEq)]
struct DirectionReport {
    switch: bool,
    volume: bool,
    range: Option<(i64, i64)>,
    channels: ChannelState<ChannelReading>,
}

/// Parsed `Simple mixer control` block
#[derive(Debug, Clone, PartialEq)]
struct ControlReport {
    id: SimpleId,
    active: bool,
    playback: DirectionReport,
    capture: DirectionReport,
}

impl ControlReport {
    fn new(id: SimpleId) -> Self {
        Self {
            id,
            active: true,
            playback: DirectionReport::default(),
            capture: DirectionReport::default(),
        }
    }

    fn direction(&self, mode: Mode) -> &DirectionReport {
        match mode {
            Mode::Playback => &self.playback,
            Mode::Capture => &self.capture,
        }
    }

    fn directions_mut(&mut self, mode: Option<Mode>) -> Vec<&mut DirectionReport> {
        match mode {
            Some(Mode::Playback) => vec![&mut self.playback],
            Some(Mode::Capture) => vec![&mut self.capture],
            None => vec![&mut self.playback, &mut self.capture],
        }
    }

    fn parse_capabilities(&mut self, caps: &str) {
        for cap in caps.split_whitespace() {
            let base = cap.split('-').next().unwrap_or(cap);
            match base {
                "pvolume" => self.playback.volume = true,
                "cvolume" => self.capture.volume = true,
                "volume" => {
                    self.playback.volume = true;
                    self.capture.volume = true;
                }
                "pswitch" => self.playback.switch = true,
                "cswitch" => self.capture.switch = true,
                "switch" => {
                    self.playback.switch = true;
                    self.capture.switch = true;
                }
                "inactive" => self.active = false,
                _ => {}
            }
        }
    }

    fn parse_channel_list(&mut self, mode: Mode, list: &str) {
        for name in list.split(" - ") {
            match Channel::from_alsa_name(name) {
                Some(channel) => {
                    let direction = self.directions_mut(Some(mode)).remove(0);
                    if !direction.channels.contains(channel) {
                        direction.channels.set(channel, ChannelReading::default());
                    }
                }
                None => tracing::warn!("Unknown ALSA channel '{}'", name.trim()),
            }
        }
    }

    /// `Limits: Playback 0 - 87 Capture 0 - 63`, or `Limits: 0 - 31` for common volume
    fn parse_limits(&mut self, limits: &str) {
        let tokens: Vec<&str> = limits.split_whitespace().collect();
        let mut mode = None;
        let mut i = 0;
        while i < tokens.len() {
            match tokens[i] {
                "Playback" => mode = Some(Mode::Playback),
                "Capture" => mode = Some(Mode::Capture),
                token => {
                    if let (Ok(min), Some(&"-"), Some(Ok(max))) = (
                        token.parse::<i64>(),
                        tokens.get(i + 1),
                        tokens.get(i + 2).map(|t| t.parse::<i64>()),
                    ) {
                        for direction in self.directions_mut(mode) {
                            direction.range = Some((min, max));
                        }
                        i += 2;
                    }
                }
            }
            i += 1;
        }
    }

    /// `Front Left: Playback 87 [100%] [0.00dB] [on] Capture 0 [0%] [off]`
    fn parse_channel_line(&mut self, channel: Channel, rest: &str) {
        let mut mode = None;
        let mut readings = [ChannelReading::default(); 2];
        let mut seen = [false; 2];

        for token in rest.split_whitespace() {
            match token {
                "Playback" => mode = Some(Mode::Playback),
                "Capture" => mode = Some(Mode::Capture),
                "[on]" | "[off]" => {
                    for &slot in slots(mode) {
                        readings[slot].on = Some(token == "[on]");
                        seen[slot] = true;
                    }
                }
                _ => {
                    if let Ok(raw) = token.parse::<i64>() {
                        for &slot in slots(mode) {
                            if readings[slot].raw.is_none() {
                                readings[slot].raw = Some(raw);
                            }
                            seen[slot] = true;
                        }
                    }
                }
            }
            if mode.is_some() {
                seen[slots(mode)[0]] = true;
            }
        }

        for (slot, direction_mode) in [(0, Mode::Playback), (1, Mode::Capture)] {
            if seen[slot] {
                let direction = self.directions_mut(Some(direction_mode)).remove(0);
                direction.channels.set(channel, readings[slot]);
            }
        }
    }
}

/// Reading slots a channel-line token applies to; no keyword means both directions
fn slots(mode: Option<Mode>) -> &'static [usize] {
    match mode {
        Some(Mode::Playback) => &[0],
        Some(Mode::Capture) => &[1],
        None => &[0, 1],
    }
}

/// Parse `amixer scontents` or `amixer sget` output
fn parse_report(text: &str) -> Vec<ControlReport> {
    let mut reports: Vec<ControlReport> = Vec::new();

    for line in text.lines() {
        if let Some(header) = line.strip_prefix("Simple mixer control ") {
            match parse_header(header) {
                Some(id) => reports.push(ControlReport::new(id)),
                None => tracing::warn!("Unparseable amixer header: {}", line),
            }
            continue;
        }
        let Some(report) = reports.last_mut() else {
            continue;
        };
        let Some((key, value)) = line.trim().split_once(':') else {
            continue;
        };
        match key {
            "Capabilities" => report.parse_capabilities(value),
            "Playback channels" => report.parse_channel_list(Mode::Playback, value.trim()),
            "Capture channels" => report.parse_channel_list(Mode::Capture, value.trim()),
            "Limits" => report.parse_limits(value),
            other => {
                if let Some(channel) = Channel::from_alsa_name(other) {
                    if !value.trim().is_empty() {
                        report.parse_channel_line(channel, value);
                    }
                }
            }
        }
    }

    reports
}

/// `'Master',0`
fn parse_header(header: &str) -> Option<SimpleId> {
    let (quoted, index) = header.trim().rsplit_once(',')?;
    let name = quoted.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(SimpleId {
        name: name.to_string(),
        index: index.trim().parse().ok()?,
    })
}

/// Switch keyword for `amixer sset`
fn switch_keyword(mode: Mode, on: bool) -> &'static str {
    match (mode, on) {
        (Mode::Playback, true) => "on",
        (Mode::Playback, false) => "off",
        (Mode::Capture, true) => "cap",
        (Mode::Capture, false) => "nocap",
    }
}

/// Comma-separated per-channel list in channel order, replacing `target`
///
/// `amixer` assigns list entries to the element's channels in order, so every
/// other channel is written back with its current value.
fn value_list<T: Copy>(
    present: &ChannelState<ChannelReading>,
    current: impl Fn(&ChannelReading) -> Option<T>,
    target: Channel,
    value: T,
    render: impl Fn(T) -> String,
) -> Result<String> {
    let mut entries = Vec::new();
    for (channel, reading) in present.iter() {
        let entry = if channel == target {
            value
        } else {
            current(reading).ok_or_else(|| {
                Error::platform(format!("no current value for {channel}"))
            })?
        };
        entries.push(render(entry));
    }
    Ok(entries.join(","))
}

/// Find `amixer` on a `PATH`-style search list
fn locate(search: Option<OsString>) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    which::which_in("amixer", search, cwd)
        .map_err(|e| Error::platform(format!("amixer not found: {e}")))
}

/// [`MixerBackend`] over the `amixer` command-line tool
pub struct AmixerBackend {
    program: PathBuf,
    card: String,
    elements: RefCell<Vec<SimpleId>>,
}

impl AmixerBackend {
    pub fn new(program: impl Into<PathBuf>, card: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            card: card.into(),
            elements: RefCell::new(Vec::new()),
        }
    }

    /// Build from configuration, locating `amixer` on `PATH` if no path is set
    pub fn from_config(config: &MixerConfig) -> Result<Self> {
        let program = match &config.amixer_path {
            Some(path) => path.clone(),
            None => locate(std::env::var_os("PATH"))?,
        };
        tracing::info!("Using {} on card '{}'", program.display(), config.card);
        Ok(Self::new(program, config.card.clone()))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn card(&self) -> &str {
        &self.card
    }

    /// Options end at `--` so negative raw values reach `amixer` as operands
    fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new(&self.program)
            .arg("-c")
            .arg(&self.card)
            .arg("--")
            .args(args)
            .output()
            .map_err(|e| {
                Error::platform(format!("failed to run {}: {}", self.program.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::platform(format!(
                "amixer {}: {}",
                args.join(" "),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn id(&self, element: ElementId) -> Result<SimpleId> {
        self.elements
            .borrow()
            .get(element.0)
            .cloned()
            .ok_or_else(|| Error::platform(format!("no element #{}", element.0)))
    }

    /// Fresh report for one element
    fn report(&self, element: ElementId) -> Result<ControlReport> {
        let id = self.id(element)?;
        let output = self.run(&["sget", &id.spec()])?;
        parse_report(&output)
            .into_iter()
            .next()
            .ok_or_else(|| Error::platform(format!("empty report for {}", id.spec())))
    }

    fn query(&self, element: ElementId, f: impl FnOnce(&ControlReport) -> bool) -> bool {
        match self.report(element) {
            Ok(report) => f(&report),
            Err(err) => {
                tracing::debug!("Query of element #{} failed: {}", element.0, err);
                false
            }
        }
    }

    fn reading(&self, element: ElementId, mode: Mode, channel: Channel) -> Result<ChannelReading> {
        let report = self.report(element)?;
        report
            .direction(mode)
            .channels
            .get(channel)
            .copied()
            .ok_or_else(|| Error::platform(format!("{} has no {mode} {channel}", report.id.spec())))
    }

    fn sset(&self, element: ElementId, mode: Mode, value: &str) -> Result<()> {
        let id = self.id(element)?;
        self.run(&["sset", &id.spec(), mode.as_str(), value])?;
        Ok(())
    }
}

impl MixerBackend for AmixerBackend {
    fn attach(&self) -> Result<()> {
        self.run(&["info"]).trace("AmixerBackend::attach")?;
        tracing::info!("Attached to ALSA card '{}'", self.card);
        Ok(())
    }

    fn register(&self) -> Result<()> {
        self.run(&["scontrols"]).trace("AmixerBackend::register")?;
        Ok(())
    }

    fn load(&self) -> Result<()> {
        let output = self.run(&["scontents"]).trace("AmixerBackend::load")?;
        let ids: Vec<SimpleId> = parse_report(&output).into_iter().map(|r| r.id).collect();
        tracing::info!("Loaded {} mixer elements", ids.len());
        *self.elements.borrow_mut() = ids;
        Ok(())
    }

    fn close(&self) {
        self.elements.borrow_mut().clear();
        tracing::info!("Released ALSA card '{}'", self.card);
    }

    fn first(&self) -> Option<ElementId> {
        (!self.elements.borrow().is_empty()).then_some(ElementId(0))
    }

    fn next(&self, element: ElementId) -> Option<ElementId> {
        let next = element.0 + 1;
        (next < self.elements.borrow().len()).then_some(ElementId(next))
    }

    fn is_active(&self, element: ElementId) -> bool {
        self.query(element, |r| r.active)
    }

    fn name(&self, element: ElementId) -> String {
        self.id(element).map(|id| id.name).unwrap_or_default()
    }

    fn has_switch(&self, element: ElementId, mode: Mode) -> bool {
        self.query(element, |r| r.direction(mode).switch)
    }

    fn has_volume(&self, element: ElementId, mode: Mode) -> bool {
        self.query(element, |r| r.direction(mode).volume)
    }

    fn has_channel(&self, element: ElementId, mode: Mode, channel: Channel) -> bool {
        self.query(element, |r| r.direction(mode).channels.contains(channel))
    }

    fn volume_range(&self, element: ElementId, mode: Mode) -> Result<(i64, i64)> {
        let report = self.report(element)?;
        report
            .direction(mode)
            .range
            .ok_or_else(|| Error::platform(format!("{} reports no {mode} limits", report.id.spec())))
    }

    fn get_switch(&self, element: ElementId, mode: Mode, channel: Channel) -> Result<bool> {
        self.reading(element, mode, channel)?
            .on
            .ok_or_else(|| Error::platform(format!("no {mode} switch reading for {channel}")))
    }

    fn set_switch(
        &self,
        element: ElementId,
        mode: Mode,
        channel: Channel,
        on: bool,
    ) -> Result<()> {
        let report = self.report(element)?;
        let list = value_list(
            &report.direction(mode).channels,
            |r| r.on,
            channel,
            on,
            |on| switch_keyword(mode, on).to_string(),
        )?;
        self.sset(element, mode, &list)
    }

    fn set_switch_all(&self, element: ElementId, mode: Mode, on: bool) -> Result<()> {
        self.sset(element, mode, switch_keyword(mode, on))
    }

    fn get_volume(&self, element: ElementId, mode: Mode, channel: Channel) -> Result<i64> {
        self.reading(element, mode, channel)?
            .raw
            .ok_or_else(|| Error::platform(format!("no {mode} volume reading for {channel}")))
    }

    fn set_volume(
        &self,
        element: ElementId,
        mode: Mode,
        channel: Channel,
        raw: i64,
    ) -> Result<()> {
        let report = self.report(element)?;
        let list = value_list(
            &report.direction(mode).channels,
            |r| r.raw,
            channel,
            raw,
            |raw| raw.to_string(),
        )?;
        self.sset(element, mode, &list)
    }

    fn set_volume_all(&self, element: ElementId, mode: Mode, raw: i64) -> Result<()> {
        self.sset(element, mode, &raw.to_string())
    }
}
