// Per-channel calibration offsets loaded from a JSON table.
//
// File format: {"0": -3.5, "9": 2.0, ...}. Channels not listed read as 0.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::info;

/// Highest servo channel accepted in a table
pub const MAX_CHANNEL: u8 = 15;

#[derive(Debug, thiserror::Error)]
pub enum CalibrationError {
    #[error("Failed to read calibration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid calibration table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid calibration channel {key:?}")]
    InvalidChannel { key: String },

    #[error("Calibration offset for channel {channel} is not finite")]
    NonFinite { channel: u8 },
}

/// Degree offsets added to each channel's commanded angle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Calibration {
    offsets: HashMap<u8, f32>,
}

impl Calibration {
    pub fn load(path: &Path) -> Result<Self, CalibrationError> {
        let text = std::fs::read_to_string(path).map_err(|source| CalibrationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let calibration = Self::from_json_str(&text)?;
        info!("Loaded {} calibration offsets from {}", calibration.len(), path.display());
        Ok(calibration)
    }

    pub fn from_json_str(text: &str) -> Result<Self, CalibrationError> {
        let raw: HashMap<String, f32> = serde_json::from_str(text)?;
        let mut offsets = HashMap::with_capacity(raw.len());
        for (key, offset) in raw {
            let channel = match key.trim().parse::<u8>() {
                Ok(channel) if channel <= MAX_CHANNEL => channel,
                _ => return Err(CalibrationError::InvalidChannel { key }),
            };
            if !offset.is_finite() {
                return Err(CalibrationError::NonFinite { channel });
            }
            offsets.insert(channel, offset);
        }
        Ok(Self { offsets })
    }

    pub fn offset(&self, channel: u8) -> f32 {
        self.offsets.get(&channel).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table() {
        let cal = Calibration::from_json_str(r#"{"0": -3.5, "9": 2, "14": 0.25}"#).unwrap();
        assert_eq!(cal.len(), 3);
        assert_eq!(cal.offset(0), -3.5);
        assert_eq!(cal.offset(9), 2.0);
        assert_eq!(cal.offset(14), 0.25);
        // Unlisted channels are uncalibrated
        assert_eq!(cal.offset(5), 0.0);
    }

    #[test]
    fn test_rejects_bad_channels() {
        for text in [r#"{"hip": 1.0}"#, r#"{"16": 1.0}"#, r#"{"-1": 1.0}"#] {
            let err = Calibration::from_json_str(text).unwrap_err();
            println!("{} -> {}", text, err);
            assert!(matches!(err, CalibrationError::InvalidChannel { .. }));
        }
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = Calibration::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, CalibrationError::Parse(_)));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = Calibration::load(Path::new("/nonexistent/offsets.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/offsets.json"));
    }
}
