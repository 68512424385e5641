use std::borrow::Cow;

use futures::{Stream, TryStreamExt};
use reqwest::header::CONTENT_DISPOSITION;

use crate::client::check_status;
use crate::filename::split_extension;
use crate::{Error, Result, ShooterClient, SubtitleCandidate};

/// A subtitle download in progress, with the name it should be saved under.
///
/// The body hasn't been read yet. Dropping this (or the stream from
/// [`FetchedContent::into_stream`]) releases the connection.
#[derive(Debug)]
pub struct FetchedContent {
    filename: String,
    film_name: String,
    response: reqwest::Response,
}

impl FetchedContent {
    /// File name to save under, extension included.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The film name this subtitle resolved to, either from the query or from the server.
    pub fn film_name(&self) -> &str {
        &self.film_name
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<impl AsRef<[u8]>>> {
        self.response.bytes_stream().map_err(Error::from)
    }
}

impl ShooterClient {
    /// Starts downloading one candidate and works out what to call it.
    pub async fn fetch_content(&self, candidate: &SubtitleCandidate) -> Result<FetchedContent> {
        let link = downgrade_scheme(candidate.download_link());
        log::debug!("Fetching {link}");

        let response = self.http.get(&*link).send().await?;
        check_status(response.status())?;

        let suggested = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .and_then(|value| filename_from_disposition(&value));
        let (filename, film_name) = resolve_filename(candidate, suggested.as_deref())?;

        Ok(FetchedContent {
            filename,
            film_name,
            response,
        })
    }
}

/// The service hands out `https://` links, but its download endpoint is only reachable over
/// plain `http://`. This is specific to shooter.cn, not a general policy.
fn downgrade_scheme(link: &str) -> Cow<'_, str> {
    match link.strip_prefix("https://") {
        Some(rest) => Cow::Owned(format!("http://{rest}")),
        None => Cow::Borrowed(link),
    }
}

/// Pulls the `filename=` value out of a content-disposition header, without any directories.
fn filename_from_disposition(value: &str) -> Option<String> {
    let (_, raw) = value.split_once("filename=")?;
    let raw = raw.split(';').next()?.trim().trim_matches('"');
    let name = raw.rsplit(['/', '\\']).next()?;
    (!name.is_empty()).then(|| name.to_string())
}

/// Returns `(filename, film_name)` for a download.
///
/// A server-suggested name wins, but only if it has the extension the candidate was advertised
/// with. Otherwise the candidate's own film name is used.
fn resolve_filename(
    candidate: &SubtitleCandidate,
    suggested: Option<&str>,
) -> Result<(String, String)> {
    match suggested {
        Some(name) => {
            let (stem, extension) = split_extension(name);
            if extension != Some(candidate.extension()) {
                return Err(Error::ExtensionMismatch {
                    expected: candidate.extension().to_string(),
                    found: extension.unwrap_or_default().to_string(),
                });
            }
            let film_name = candidate.base_film_name().unwrap_or(stem);
            Ok((name.to_string(), film_name.to_string()))
        }
        None => match candidate.base_film_name() {
            Some(film_name) => Ok((
                format!("{film_name}.{}", candidate.extension()),
                film_name.to_string(),
            )),
            None => Err(Error::FilenameUndetermined),
        },
    }
}
