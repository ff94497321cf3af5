//! JSON configuration and report helpers for recognition runs.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{RecognizeError, RecognizeOutput, Recognizer, RecognizerParams};

#[derive(thiserror::Error, Debug)]
pub enum ConfigIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Input description for one recognition run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizeConfig {
    pub image_path: String,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub params: RecognizerParams,
}

impl RecognizeConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("cvmark_recognize_report.json"))
    }

    /// Build a recognizer from the config parameters.
    pub fn build_recognizer(&self) -> Result<Recognizer, RecognizeError> {
        Recognizer::new(self.params.clone())
    }
}

/// Outcome of a recognition run, as written by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizeReport {
    pub image_path: String,
    pub profile: String,
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub output: Option<RecognizeOutput>,
    #[serde(default)]
    pub error: Option<String>,
}

impl RecognizeReport {
    pub fn new(image_path: impl Into<String>, profile: impl Into<String>, width: usize, height: usize) -> Self {
        Self {
            image_path: image_path.into(),
            profile: profile.into(),
            width,
            height,
            output: None,
            error: None,
        }
    }

    /// Populate the report from a successful run.
    pub fn set_output(&mut self, output: RecognizeOutput) {
        self.output = Some(output);
        self.error = None;
    }

    /// Record a recognition error.
    pub fn set_error(&mut self, err: &RecognizeError) {
        self.error = Some(err.to_string());
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "image_path": "scan.png", "params": { "profile": "66N", "provide_area": true } }"#,
        )
        .expect("write");

        let cfg = RecognizeConfig::load_json(&path).expect("load");
        assert_eq!(cfg.params.profile, "66N");
        assert!(cfg.params.provide_area);
        assert_eq!(cfg.output_path(), PathBuf::from("cvmark_recognize_report.json"));
        assert_eq!(cfg.build_recognizer().expect("recognizer").profile().payload_bits, 30);

        let report_path = dir.path().join("report.json");
        let mut report = RecognizeReport::new(&cfg.image_path, &cfg.params.profile, 10, 20);
        report.set_output(RecognizeOutput::default());
        report.write_json(&report_path).expect("write report");
        let back = RecognizeReport::load_json(&report_path).expect("load report");
        assert_eq!(back.output, Some(RecognizeOutput::default()));
        assert_eq!((back.width, back.height), (10, 20));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = RecognizeConfig::load_json("/nonexistent/cvmark.json").unwrap_err();
        assert!(matches!(err, ConfigIoError::Io(_)));
    }
}
