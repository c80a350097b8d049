// Boot Selection
//
// Init -> WakeRead -> MappingResolve -> VolumeLocate -> PathBuild -> Load
//      -> Execute -> Done
//
// Any stage may end the run with a `Failure`. Nothing is retried and there
// is no fallback target.

use crate::{
    config::{BootSettings, RunFlags},
    mapping,
    platform::Firmware,
    smbios::{SystemInfo, WakeCode},
    volume::BootTarget,
    BootError,
};
use alloc::string::String;
use core::{fmt, panic::Location};
use log::{debug, error, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Init,
    WakeRead,
    MappingResolve,
    VolumeLocate,
    PathBuild,
    Load,
    Execute,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::WakeRead => "reading wake-up type",
            Self::MappingResolve => "resolving boot mapping",
            Self::VolumeLocate => "locating volume",
            Self::PathBuild => "building file path",
            Self::Load => "loading image",
            Self::Execute => "starting image",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Terminal state of a failed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Failure {
    pub stage: Stage,
    pub error: BootError,
    /// Where the failure was raised
    pub location: &'static Location<'static>,
}

impl Failure {
    #[track_caller]
    #[inline]
    pub fn new(stage: Stage, error: BootError) -> Self {
        Self {
            stage,
            error,
            location: Location::caller(),
        }
    }

    pub fn report(&self) {
        error!("EFI Error: {}", self.error);
        error!("Error in file: {}", self.location.file());
        error!("Error in line: {}", self.location.line());
        error!("Error while {}", self.stage);
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} while {} ({})", self.error, self.stage, self.location)
    }
}

/// Runs the selection once against `firmware`.
pub struct Selector<'a, F: Firmware> {
    firmware: &'a mut F,
    settings: &'a BootSettings<'a>,
    stage: Stage,
}

impl<'a, F: Firmware> Selector<'a, F> {
    #[inline]
    pub fn new(firmware: &'a mut F, settings: &'a BootSettings<'a>) -> Self {
        Self {
            firmware,
            settings,
            stage: Stage::Init,
        }
    }

    #[inline]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[inline]
    fn enter(&mut self, stage: Stage) {
        debug!("{} -> {}", self.stage, stage);
        self.stage = stage;
    }

    #[track_caller]
    #[inline]
    fn fail(&self, error: BootError) -> Failure {
        Failure::new(self.stage, error)
    }

    pub fn read_wake_code(&mut self) -> Result<WakeCode, Failure> {
        self.enter(Stage::WakeRead);
        let table = self
            .firmware
            .structure_table()
            .map_err(|err| self.fail(err))?;
        let info = SystemInfo::find(&table).map_err(|err| self.fail(err))?;
        if let Some(manufacturer) = info.manufacturer() {
            debug!("System: {} {}", manufacturer, info.product_name().unwrap_or(""));
        }
        let code = info.wake_code().map_err(|err| self.fail(err))?;
        info!("WakeUpType: {}", code);
        Ok(code)
    }

    pub fn resolve_mapping(
        &mut self,
        code: WakeCode,
    ) -> Result<(Option<Uuid>, String), Failure> {
        self.enter(Stage::MappingResolve);
        let settings = self.settings;
        let bytes = self
            .firmware
            .get(settings.variable(), settings.vendor())
            .ok_or_else(|| self.fail(BootError::ConfigUnavailable))?;
        let (volume, path) = mapping::resolve(&bytes, code).map_err(|err| self.fail(err))?;
        info!("BootNext: {}", path);
        Ok((volume, path))
    }

    pub fn locate(
        &mut self,
        volume: Option<Uuid>,
        path: String,
    ) -> Result<BootTarget<F::Device>, Failure> {
        self.enter(Stage::VolumeLocate);
        let device = match volume {
            Some(ref guid) => crate::volume::locate(&*self.firmware, guid),
            None => self
                .firmware
                .boot_device()
                .ok_or(BootError::VolumeNotFound),
        }
        .map_err(|err| self.fail(err))?;
        Ok(BootTarget {
            volume,
            device,
            path,
        })
    }

    /// Runs every stage up to and including the volume lookup.
    pub fn resolve(&mut self) -> Result<BootTarget<F::Device>, Failure> {
        let code = self.read_wake_code()?;
        let (volume, path) = self.resolve_mapping(code)?;
        self.locate(volume, path)
    }

    /// Resolves the target and chain-loads it.
    ///
    /// Returns `Ok` only if the started image exits back to us.
    pub fn run(&mut self) -> Result<(), Failure> {
        let target = self.resolve()?;

        self.enter(Stage::PathBuild);
        let path = self
            .firmware
            .file_path(target.device, &target.path)
            .map_err(|err| self.fail(err))?;
        info!("Loading: {}", self.firmware.describe(&path));

        self.enter(Stage::Load);
        let image = self.firmware.load(&path).map_err(|err| self.fail(err))?;

        self.enter(Stage::Execute);
        self.firmware.start(image).map_err(|err| self.fail(err))?;

        self.enter(Stage::Done);
        Ok(())
    }

    /// Like [`Selector::run`], but reports a failure on the console and,
    /// when configured, waits for the operator to acknowledge it.
    pub fn boot(mut self) -> Result<(), Failure> {
        let result = self.run();
        if let Err(failure) = &result {
            failure.report();
            if self.settings.flags().contains(RunFlags::PAUSE_ON_ERROR) {
                info!("Press any key to continue.");
                self.firmware.pause();
            }
        }
        result
    }
}
