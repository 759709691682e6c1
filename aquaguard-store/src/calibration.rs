//! File-backed calibration store

use std::fs;
use std::path::{Path, PathBuf};

use aquaguard_core::{CalibrationCurve, CalibrationStore, ProbeResult, SensorKind};

use crate::atomic::{read_optional, write_atomic};
use crate::error::{StoreError, StoreResult};
use crate::record::CalibrationRecord;

/// Calibration curve of one probe, persisted as a JSON record
///
/// The store is bound to a sensor type; a record written for another probe
/// is refused on load.
#[derive(Debug, Clone)]
pub struct FileCalibrationStore {
    path: PathBuf,
    sensor: SensorKind,
}

impl FileCalibrationStore {
    pub fn new(path: impl Into<PathBuf>, sensor: SensorKind) -> Self {
        Self {
            path: path.into(),
            sensor,
        }
    }

    /// `<dir>/<sensor>.calibration.json`
    pub fn in_dir(dir: impl AsRef<Path>, sensor: SensorKind) -> Self {
        let file = format!("{}.calibration.json", sensor.name());
        Self::new(dir.as_ref().join(file), sensor)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sensor(&self) -> SensorKind {
        self.sensor
    }

    /// Read the stored curve, `None` when nothing was saved yet
    pub fn read(&self) -> StoreResult<Option<CalibrationCurve>> {
        let Some(text) = read_optional(&self.path)? else {
            return Ok(None);
        };

        let record = CalibrationRecord::from_json(&text)?;
        if record.sensor != self.sensor {
            return Err(StoreError::SensorMismatch {
                found: record.sensor,
                expected: self.sensor,
            });
        }
        Ok(Some(record.curve))
    }

    /// Replace the stored curve
    pub fn write(&self, curve: &CalibrationCurve) -> StoreResult<()> {
        let record = CalibrationRecord::new(self.sensor, curve.clone());
        write_atomic(&self.path, record.to_json()?.as_bytes())?;
        log::debug!("saved {} calibration to {}", self.sensor.name(), self.path.display());
        Ok(())
    }

    /// Forget the stored curve
    pub fn clear(&self) -> StoreResult<()> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

impl CalibrationStore for FileCalibrationStore {
    fn load(&mut self) -> ProbeResult<Option<CalibrationCurve>> {
        self.read().map_err(|err| {
            log::warn!("loading {}: {}", self.path.display(), err);
            err.into()
        })
    }

    fn save(&mut self, curve: &CalibrationCurve) -> ProbeResult<()> {
        self.write(curve).map_err(|err| {
            log::warn!("saving {}: {}", self.path.display(), err);
            err.into()
        })
    }
}
