//! Named card and paper presets plus default resolution and mark geometry.
//!
//! With the `std` feature the table is read from a JSON document:
//!
//! ```json
//! {
//!   "ppi": 300,
//!   "card_sizes": { "poker": { "width": "63mm", "height": "88mm", "radius": "3mm" } },
//!   "paper_sizes": { "a4": { "width": "210mm", "height": "297mm" } },
//!   "silhouette": { "inset": "10mm", "thickness": "0.5mm", "length": "5mm" }
//! }
//! ```
//!
//! Sizes use the same grammar as [`crate::units::parse_size`].

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::solver::{CardSpec, PaperSpec, RegistrationMarks};

/// Preset table consulted when resolving a layout request.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Deserialize))]
pub struct Presets {
    /// Default device resolution.
    pub ppi: u32,
    pub card_sizes: BTreeMap<String, CardSpec>,
    pub paper_sizes: BTreeMap<String, PaperSpec>,
    /// Default registration mark geometry.
    pub silhouette: RegistrationMarks,
}

impl Presets {
    /// Empty table with the given defaults.
    pub fn new(ppi: u32, silhouette: RegistrationMarks) -> Self {
        Self {
            ppi,
            card_sizes: BTreeMap::new(),
            paper_sizes: BTreeMap::new(),
            silhouette,
        }
    }

    pub fn with_card(mut self, name: impl Into<String>, card: CardSpec) -> Self {
        self.card_sizes.insert(name.into(), card);
        self
    }

    pub fn with_paper(mut self, name: impl Into<String>, paper: PaperSpec) -> Self {
        self.paper_sizes.insert(name.into(), paper);
        self
    }

    pub fn card(&self, name: &str) -> Result<&CardSpec, ConfigError> {
        self.card_sizes
            .get(name)
            .ok_or_else(|| ConfigError::UnknownCardSize {
                name: name.into(),
                valid: self.card_sizes.keys().cloned().collect(),
            })
    }

    pub fn paper(&self, name: &str) -> Result<&PaperSpec, ConfigError> {
        self.paper_sizes
            .get(name)
            .ok_or_else(|| ConfigError::UnknownPaperSize {
                name: name.into(),
                valid: self.paper_sizes.keys().cloned().collect(),
            })
    }
}

#[cfg(feature = "std")]
impl Presets {
    /// Parse a preset document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a preset file. Every call reads the file again.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let presets = Self::from_json_str(&json)?;
        tracing::debug!(
            path = %path.display(),
            cards = presets.card_sizes.len(),
            papers = presets.paper_sizes.len(),
            "loaded presets"
        );
        Ok(presets)
    }

    /// The bundled preset table (`assets/sizing.json`).
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json_str(BUILTIN_SIZING)
    }
}

#[cfg(feature = "std")]
const BUILTIN_SIZING: &str = include_str!("../assets/sizing.json");

/// Preset lookup or preset document failure.
#[derive(Debug)]
pub enum ConfigError {
    /// The preset file could not be read.
    #[cfg(feature = "std")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    /// The preset document is not valid JSON, misses a field, or holds a bad size.
    #[cfg(feature = "std")]
    Malformed(serde_json::Error),
    UnknownCardSize { name: String, valid: Vec<String> },
    UnknownPaperSize { name: String, valid: Vec<String> },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "std")]
            ConfigError::Io { path, source } => {
                write!(f, "cannot read presets from {}: {source}", path.display())
            }
            #[cfg(feature = "std")]
            ConfigError::Malformed(e) => write!(f, "cannot parse presets: {e}"),
            ConfigError::UnknownCardSize { name, valid } => {
                write!(f, "unsupported card size {name:?}, try one of: {}", valid.join(", "))
            }
            ConfigError::UnknownPaperSize { name, valid } => {
                write!(f, "unsupported paper size {name:?}, try one of: {}", valid.join(", "))
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Malformed(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "std")]
impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Malformed(e)
    }
}
