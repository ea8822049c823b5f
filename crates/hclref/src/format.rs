//! JSON and YAML files
use serde::{de::DeserializeOwned, Serialize};
use std::{fmt, io, path::Path};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    Json,
    #[default]
    Yaml,
}

impl Format {
    /// Format by file extension: `.json`, `.yaml` or `.yml`
    pub fn from_path(path: &Path) -> Result<Self, FormatError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("yaml" | "yml") => Ok(Format::Yaml),
            _ => Err(FormatError::UnknownExtension(path.to_path_buf())),
        }
    }

    pub fn parse<T: DeserializeOwned>(self, content: &str) -> Result<T, FormatError> {
        Ok(match self {
            Format::Json => serde_json::from_str(content)?,
            Format::Yaml => serde_yaml::from_str(content)?,
        })
    }

    pub fn write<T, W>(self, writer: W, value: &T) -> Result<(), FormatError>
    where
        T: Serialize + ?Sized,
        W: io::Write,
    {
        match self {
            Format::Json => {
                let mut writer = writer;
                serde_json::to_writer_pretty(&mut writer, value)?;
                writeln!(writer)?;
            }
            Format::Yaml => serde_yaml::to_writer(writer, value)?,
        };

        Ok(())
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => f.write_str("json"),
            Format::Yaml => f.write_str("yaml"),
        }
    }
}

/// Read a file in the format its extension names
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, FormatError> {
    let format = Format::from_path(path)?;
    tracing::info!(path = %path.display(), %format, "loading file");

    let content = std::fs::read_to_string(path)?;
    format.parse(&content)
}

#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("unknown file type {0:?}, expected .json, .yaml or .yml")]
    UnknownExtension(std::path::PathBuf),
    #[error("IO error")]
    Io(#[from] io::Error),
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("invalid yaml")]
    Yaml(#[from] serde_yaml::Error),
}
