use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Character encoding applied to a result-document stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "utf-16le")]
    Utf16Le,
    #[serde(rename = "utf-16be")]
    Utf16Be,
    #[serde(rename = "iso-8859-1")]
    Latin1,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf16Le => "utf-16le",
            Self::Utf16Be => "utf-16be",
            Self::Latin1 => "iso-8859-1",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "utf-16le" | "utf16le" => Ok(Self::Utf16Le),
            "utf-16be" | "utf16be" => Ok(Self::Utf16Be),
            "iso-8859-1" | "latin1" => Ok(Self::Latin1),
            _ => Err(anyhow!("unsupported output encoding: {value}")),
        }
    }
}

/// Serialization settings for one result-document writer: what the stream is
/// labeled as and how its text is encoded. Hosts hand one of these to every
/// `resolve` call; the manager records it in the produced-output descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterConfig {
    #[serde(default = "default_media_type")]
    pub media_type: String,
    #[serde(default)]
    pub encoding: Encoding,
    #[serde(default)]
    pub indent: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            media_type: default_media_type(),
            encoding: Encoding::Utf8,
            indent: false,
        }
    }
}

impl WriterConfig {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(input).context("failed to parse writer configuration")?;
        validate_media_type(&config.media_type)
            .with_context(|| format!("invalid media type '{}'", config.media_type))?;
        Ok(config)
    }
}

fn default_media_type() -> String {
    "application/xml".to_string()
}

fn validate_media_type(media_type: &str) -> Result<()> {
    let Some((main_type, subtype)) = media_type.split_once('/') else {
        return Err(anyhow!("media type must be a type/subtype pair"));
    };
    for token in [main_type, subtype] {
        if token.is_empty() {
            return Err(anyhow!("media type must not have an empty type or subtype"));
        }
        if token
            .chars()
            .any(|ch| !(ch.is_ascii_alphanumeric() || ch == '+' || ch == '-' || ch == '.'))
        {
            return Err(anyhow!("media type contains invalid character(s)"));
        }
    }
    Ok(())
}
