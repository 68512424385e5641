use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, filename::split_extension};

/// First byte of the query response when nothing matched. The rest isn't JSON either.
pub(crate) const NOT_FOUND_SENTINEL: u8 = 0xFF;

/// One subtitle file offered by the service, before it has been downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleCandidate {
    #[serde(rename = "Ext")]
    extension: String,
    #[serde(rename = "Link")]
    download_link: String,
    /// Name the subtitle is saved under (plus extension) when the server doesn't suggest one.
    #[serde(skip)]
    base_film_name: Option<String>,
}

impl SubtitleCandidate {
    pub fn new(extension: impl Into<String>, download_link: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            download_link: download_link.into(),
            base_film_name: None,
        }
    }

    /// Sets the film name unless one is already assigned.
    pub fn with_base_film_name(mut self, name: impl Into<String>) -> Self {
        if self.base_film_name.is_none() {
            self.base_film_name = Some(name.into());
        }
        self
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn download_link(&self) -> &str {
        &self.download_link
    }

    pub fn base_film_name(&self) -> Option<&str> {
        self.base_film_name.as_deref()
    }
}

impl fmt::Display for SubtitleCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string_pretty(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[derive(Debug, Deserialize)]
struct SubtitleDescription {
    #[allow(dead_code)]
    #[serde(rename = "Desc", default)]
    description: String,
    #[allow(dead_code)]
    #[serde(rename = "Delay", default)]
    delay_seconds: i64,
    #[serde(rename = "Files", default)]
    files: Option<Vec<SubtitleCandidate>>,
}

/// Parses a query response body into candidates named after `filename`.
///
/// The body is either the not-found sentinel or a JSON array of descriptions, each holding some
/// files. Descriptions are dropped and the files are returned in response order.
pub(crate) fn parse_query_response(body: &[u8], filename: &str) -> Result<Vec<SubtitleCandidate>> {
    if body.first() == Some(&NOT_FOUND_SENTINEL) {
        return Err(Error::NotFound);
    }

    let descriptions: Vec<SubtitleDescription> = serde_json::from_slice(body)?;
    let (film_name, _) = split_extension(filename);

    Ok(descriptions
        .into_iter()
        .flat_map(|description| description.files.unwrap_or_default())
        .map(|candidate| candidate.with_base_film_name(film_name))
        .collect())
}
