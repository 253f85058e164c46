//! Run configuration accumulated while exposure categories are staged.
//!
//! Every field ends up as a placeholder binding for the processing document.
//! Categories that were never staged keep the `"None"` sentinel and a zero count.
use crate::acquisition::StagedBatch;
use crate::render::Binding;
use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_yaml::{Number, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Value specinti reads as "not provided".
pub const ABSENT: &str = "None";

/// Header keyword holding the observed target name.
pub const TARGET_HEADER_KEY: &str = "FIELD";

/// Exposure categories known to the processing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureKind {
    Light,
    Dark,
    Offset,
    SpecFlat,
    SpecCalib,
}

impl ExposureKind {
    pub const ALL: [ExposureKind; 5] = [
        ExposureKind::Light,
        ExposureKind::Dark,
        ExposureKind::Offset,
        ExposureKind::SpecFlat,
        ExposureKind::SpecCalib,
    ];

    /// Filename prefix used for staged copies.
    pub fn staging_prefix(self) -> &'static str {
        match self {
            ExposureKind::Light => "light_",
            ExposureKind::Dark => "dark_",
            ExposureKind::Offset => "offset_",
            ExposureKind::SpecFlat => "flat_",
            ExposureKind::SpecCalib => "calib_",
        }
    }

    fn prefix_placeholder(self) -> &'static str {
        match self {
            ExposureKind::Light => "LIGHT_PREFIX",
            ExposureKind::Dark => "DARK_PREFIX",
            ExposureKind::Offset => "OFFSET_PREFIX",
            ExposureKind::SpecFlat => "SPEC_FLAT_PREFIX",
            ExposureKind::SpecCalib => "SPEC_CALIB_PREFIX",
        }
    }

    fn count_placeholder(self) -> &'static str {
        match self {
            ExposureKind::Light => "LIGHT_NB",
            ExposureKind::Dark => "DARK_NB",
            ExposureKind::Offset => "OFFSET_NB",
            ExposureKind::SpecFlat => "SPEC_FLAT_NB",
            ExposureKind::SpecCalib => "SPEC_CALIB_NB",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExposureSet {
    pub prefix: Option<String>,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunConfig {
    exposures: BTreeMap<ExposureKind, ExposureSet>,
    target: Option<Value>,
    instrument_response: Option<PathBuf>,
}

impl RunConfig {
    pub fn record_exposures(&mut self, kind: ExposureKind, batch: &StagedBatch) {
        self.exposures.insert(
            kind,
            ExposureSet {
                prefix: Some(batch.prefix.clone()),
                count: batch.count,
            },
        );
    }

    pub fn exposures(&self, kind: ExposureKind) -> ExposureSet {
        self.exposures.get(&kind).cloned().unwrap_or_default()
    }

    pub fn set_target(&mut self, target: Value) {
        self.target = Some(target);
    }

    pub fn target(&self) -> Option<&Value> {
        self.target.as_ref()
    }

    pub fn set_instrument_response(&mut self, path: &Path) {
        self.instrument_response = Some(path.to_path_buf());
    }

    /// Bindings for every processing-document placeholder.
    pub fn bindings(&self) -> Result<Vec<Binding>> {
        let target = self
            .target
            .clone()
            .ok_or_else(|| anyhow!("target identifier was never recorded"))?;
        let mut bindings = vec![Binding::new("SIMBAD_NAME", target)];
        for kind in ExposureKind::ALL {
            let set = self.exposures(kind);
            let prefix = set.prefix.unwrap_or_else(|| ABSENT.to_string());
            bindings.push(Binding::new(kind.prefix_placeholder(), prefix));
            bindings.push(Binding::new(
                kind.count_placeholder(),
                Value::Number(Number::from(set.count as u64)),
            ));
        }
        let response = match &self.instrument_response {
            Some(path) => path.display().to_string(),
            None => ABSENT.to_string(),
        };
        bindings.push(Binding::new("INSTRUMENT_RESPONSE", response));
        Ok(bindings)
    }
}
