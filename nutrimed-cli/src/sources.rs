// Input sources for the CLI.
//
// Raw analysis text arrives from a file, from stdin, or inside a saved history
// entry. Display fields (thumbnail, capture date, medical profile) come from
// the history entry and can be overridden on the command line.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate};
use nutrimed_core::{DisplayFields, MedicalProfile, Thumbnail};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};

/// A saved analysis as the history store writes it
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    pub analysis: String,
    #[serde(default)]
    pub image_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub current_conditions: Vec<String>,
    #[serde(default)]
    pub concerned_conditions: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl HistoryEntry {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Invalid history entry JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read history entry {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn display_fields(&self) -> DisplayFields {
        let notes = self.notes.clone().filter(|n| !n.trim().is_empty());
        let profile = if self.current_conditions.is_empty() && self.concerned_conditions.is_empty() && notes.is_none() {
            None
        } else {
            Some(MedicalProfile {
                current_conditions: self.current_conditions.clone(),
                concerned_conditions: self.concerned_conditions.clone(),
                notes,
            })
        };

        DisplayFields {
            thumbnail: self.image_name.as_ref().map(|name| Thumbnail {
                name: name.clone(),
                jpeg: None,
            }),
            capture_date: self.created_at.map(|t| t.date_naive()),
            profile,
            description: self.description.clone(),
        }
    }
}

/// Where the raw analysis text comes from
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisSource {
    File(PathBuf),
    Stdin,
    History(PathBuf),
}

impl AnalysisSource {
    /// `--history-entry` wins over `--input`; `-` means stdin
    pub fn from_args(input: Option<&str>, history_entry: Option<&str>) -> Option<Self> {
        match (history_entry, input) {
            (Some(path), _) => Some(AnalysisSource::History(PathBuf::from(path))),
            (None, Some("-")) => Some(AnalysisSource::Stdin),
            (None, Some(path)) => Some(AnalysisSource::File(PathBuf::from(path))),
            (None, None) => None,
        }
    }

    /// Name used for default output files
    pub fn stem(&self) -> String {
        match self {
            AnalysisSource::Stdin => "stdin".to_string(),
            AnalysisSource::File(path) | AnalysisSource::History(path) => path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("analysis")
                .to_string(),
        }
    }

    pub fn load(&self) -> Result<LoadedAnalysis> {
        let (raw, fields) = match self {
            AnalysisSource::File(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read analysis {}", path.display()))?;
                (raw, DisplayFields::default())
            }
            AnalysisSource::Stdin => {
                let mut raw = String::new();
                std::io::stdin()
                    .read_to_string(&mut raw)
                    .context("Failed to read analysis from stdin")?;
                (raw, DisplayFields::default())
            }
            AnalysisSource::History(path) => {
                let entry = HistoryEntry::load(path)?;
                let fields = entry.display_fields();
                (entry.analysis, fields)
            }
        };

        tracing::debug!("Loaded {} bytes of analysis text from {:?}", raw.len(), self);
        Ok(LoadedAnalysis {
            raw,
            fields,
            stem: self.stem(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct LoadedAnalysis {
    pub raw: String,
    pub fields: DisplayFields,
    pub stem: String,
}

/// Command-line values that replace what the source supplied
#[derive(Debug, Clone, Default)]
pub struct DisplayOverrides {
    pub image: Option<PathBuf>,
    pub date: Option<NaiveDate>,
    pub current: Vec<String>,
    pub concerned: Vec<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

impl DisplayOverrides {
    pub fn apply(&self, mut fields: DisplayFields) -> Result<DisplayFields> {
        if let Some(path) = &self.image {
            fields.thumbnail = Some(load_thumbnail(path)?);
        }
        if let Some(date) = self.date {
            fields.capture_date = Some(date);
        }
        if !self.current.is_empty() || !self.concerned.is_empty() || self.notes.is_some() {
            let profile = fields.profile.get_or_insert_with(MedicalProfile::default);
            if !self.current.is_empty() {
                profile.current_conditions = self.current.clone();
            }
            if !self.concerned.is_empty() {
                profile.concerned_conditions = self.concerned.clone();
            }
            if let Some(notes) = &self.notes {
                profile.notes = Some(notes.clone());
            }
        }
        if let Some(description) = &self.description {
            fields.description = Some(description.clone());
        }
        Ok(fields)
    }
}

/// Only JPEG bytes are embedded; any other image keeps just its name
fn load_thumbnail(path: &Path) -> Result<Thumbnail> {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .to_string();
    let is_jpeg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));

    let jpeg = if is_jpeg {
        Some(std::fs::read(path).with_context(|| format!("Failed to read image {}", path.display()))?)
    } else {
        tracing::warn!("{name} is not a JPEG, the report shows a placeholder frame");
        None
    };
    Ok(Thumbnail { name, jpeg })
}

/// Parse a `YYYY-MM-DD` date flag
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}
