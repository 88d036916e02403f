//! Analysis configuration.
//!
//! [`AnalysisConfig`] holds every caller-tunable setting of the pipeline and
//! round-trips through JSON. Names such as the ladder family and the peak
//! model are kept as strings here and checked when the config is resolved.

use crate::error::Result;
use crate::ladder::{LadderFamily, LadderParameters, ScoringMethod};
use crate::peaks::PeakFinderSettings;
use crate::quantify::QuantificationSettings;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Quantification settings as written in a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantificationConfig {
    /// One of `gauss`, `voigt` or `lorentzian`.
    pub peak_model: String,
    pub cutoff: Option<f64>,
    pub rel_height: f64,
    pub padding: usize,
}

impl Default for QuantificationConfig {
    fn default() -> Self {
        let settings = QuantificationSettings::default();
        Self {
            peak_model: settings.peak_model.to_string(),
            cutoff: settings.cutoff,
            rel_height: settings.rel_height,
            padding: settings.padding,
        }
    }
}

/// Settings for analysing one or more samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Ladder family name: `LIZ`, `ROX` or `ORANGE`.
    pub ladder: String,
    pub size_standard_channel: Option<String>,
    pub min_height: Option<f64>,
    pub min_interpeak_distance: Option<usize>,
    pub max_ladder_trace_distance: Option<usize>,
    pub peak_count_padding: usize,
    pub scoring: ScoringMethod,
    /// Sample channel name. Resolving it is left to the trace source.
    pub trace_channel: String,
    pub peak_finder: PeakFinderSettings,
    pub quantification: QuantificationConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            ladder: LadderFamily::Liz.name().to_string(),
            size_standard_channel: None,
            min_height: None,
            min_interpeak_distance: None,
            max_ladder_trace_distance: None,
            peak_count_padding: 3,
            scoring: ScoringMethod::default(),
            trace_channel: "DATA1".to_string(),
            peak_finder: PeakFinderSettings::default(),
            quantification: QuantificationConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load a config from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_json(&contents)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn ladder_family(&self) -> Result<LadderFamily> {
        self.ladder.parse()
    }

    /// Ladder family defaults with the overrides of this config applied.
    pub fn ladder_parameters(&self) -> Result<LadderParameters> {
        let mut params = LadderParameters::from_family(self.ladder_family()?);
        if let Some(min_height) = self.min_height {
            params.min_height = min_height;
        }
        if let Some(distance) = self.min_interpeak_distance {
            params.min_interpeak_distance = distance;
        }
        if let Some(distance) = self.max_ladder_trace_distance {
            params.max_ladder_trace_distance = distance;
        }
        params.peak_count_padding = self.peak_count_padding;
        params.scoring = self.scoring;
        Ok(params)
    }

    /// Channel holding the size standard.
    pub fn size_standard_channel(&self) -> Result<String> {
        match &self.size_standard_channel {
            Some(channel) => Ok(channel.clone()),
            None => Ok(self.ladder_family()?.definition().channel.to_string()),
        }
    }

    pub fn quantification_settings(&self) -> Result<QuantificationSettings> {
        let q = &self.quantification;
        Ok(QuantificationSettings {
            peak_model: q.peak_model.parse()?,
            cutoff: q.cutoff,
            rel_height: q.rel_height,
            padding: q.padding,
        })
    }
}
