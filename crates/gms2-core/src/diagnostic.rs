//! Build diagnostics
//!
//! Problems with a single asset never abort a catalog build; they are
//! recorded here and reported with the scan.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::asset::AssetCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Asset folder without a usable descriptor
    MissingDescriptor,
    /// Descriptor could not be parsed, even leniently
    ParseError,
    /// Asset name already taken in its category; this occurrence was dropped
    Conflict,
    /// More than one `.yyp` at the project root
    MultipleDescriptors,
    /// Directory or file could not be read
    Unreadable,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DiagnosticKind::MissingDescriptor => "MissingDescriptor",
            DiagnosticKind::ParseError => "ParseError",
            DiagnosticKind::Conflict => "Conflict",
            DiagnosticKind::MultipleDescriptors => "MultipleDescriptors",
            DiagnosticKind::Unreadable => "Unreadable",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<AssetCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    /// Offending path, relative to the project root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            category: None,
            asset: None,
            path: None,
            message: message.into(),
        }
    }

    pub fn with_asset(mut self, category: AssetCategory, name: impl Into<String>) -> Self {
        self.category = Some(category);
        self.asset = Some(name.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.kind)?;
        if let (Some(category), Some(asset)) = (&self.category, &self.asset) {
            write!(f, " {}/{}", category, asset)?;
        }
        if let Some(path) = &self.path {
            write!(f, " ({})", path.display())?;
        }
        write!(f, ": {}", self.message)
    }
}
