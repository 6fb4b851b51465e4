//! Sound mixer sessions
//!
//! A [`Mixer`] owns the backend session. Controls borrow it, so the borrow
//! checker keeps every [`SoundControl`] from outliving the session, and dropping
//! the mixer releases the backend exactly once.

use crate::amixer::AmixerBackend;
use crate::backend::MixerBackend;
use crate::config::MixerConfig;
use crate::control::SoundControl;
use crate::error::{Result, ResultExt};
use std::fmt;

/// Live session with the platform audio subsystem
pub struct Mixer {
    backend: Box<dyn MixerBackend>,
    default_control: String,
}

impl Mixer {
    /// Open the default ALSA session using the configuration from default locations
    pub fn get() -> Result<Self> {
        let config = MixerConfig::load_default().trace("Mixer::get")?;
        Self::open(&config).trace("Mixer::get")
    }

    /// Open an `amixer`-backed session
    pub fn open(config: &MixerConfig) -> Result<Self> {
        let backend = AmixerBackend::from_config(config).trace("Mixer::open")?;
        let mut mixer = Self::with_backend(Box::new(backend)).trace("Mixer::open")?;
        mixer.default_control = config.default_control.clone();
        Ok(mixer)
    }

    /// Attach, register and load through `backend`
    ///
    /// A failure after a successful attach closes the backend before returning.
    pub fn with_backend(backend: Box<dyn MixerBackend>) -> Result<Self> {
        backend.attach().trace("Mixer::attach")?;
        backend
            .register()
            .trace("Mixer::register")
            .and_then(|()| backend.load().trace("Mixer::load"))
            .inspect_err(|_| backend.close())?;
        tracing::info!("Mixer session opened");

        Ok(Self {
            backend,
            default_control: MixerConfig::default().default_control,
        })
    }

    /// Active controls, in subsystem order
    pub fn controls(&self) -> Vec<SoundControl<'_>> {
        let mut controls = Vec::new();
        let mut cursor = self.backend.first();
        while let Some(element) = cursor {
            if self.backend.is_active(element) {
                controls.push(SoundControl::new(self.backend.as_ref(), element));
            } else {
                tracing::debug!("Skipping inactive element '{}'", self.backend.name(element));
            }
            cursor = self.backend.next(element);
        }
        controls
    }

    /// First active control named `name`
    pub fn control(&self, name: &str) -> Option<SoundControl<'_>> {
        self.controls().into_iter().find(|c| c.name() == name)
    }

    /// The configured default control
    pub fn default_control(&self) -> Option<SoundControl<'_>> {
        self.control(&self.default_control)
    }
}

impl Drop for Mixer {
    fn drop(&mut self) {
        self.backend.close();
        tracing::info!("Mixer session closed");
    }
}

impl fmt::Debug for Mixer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mixer")
            .field("default_control", &self.default_control)
            .finish_non_exhaustive()
    }
}
