use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, ORIGIN, REFERER};

use crate::candidate::parse_query_response;
use crate::{Error, Fingerprint, Result, ShooterConfig, SubtitleCandidate};

/// Talks to the subtitle service. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ShooterClient {
    pub(crate) http: reqwest::Client,
    pub(crate) config: ShooterConfig,
}

impl ShooterClient {
    pub fn new(config: ShooterConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ORIGIN, HeaderValue::from_str(&config.origin)?);
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(REFERER, HeaderValue::from_str(&config.referer)?);

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ShooterConfig {
        &self.config
    }

    /// Asks the service for subtitles matching a film.
    ///
    /// `filename` is the film's file name; every returned candidate is named after it (minus
    /// its extension) unless the server suggests a better name at download time.
    pub async fn query(
        &self,
        fingerprint: &Fingerprint,
        filename: &str,
    ) -> Result<Vec<SubtitleCandidate>> {
        log::debug!("Querying {} for {filename}", self.config.query_url);

        let response = self
            .http
            .post(&self.config.query_url)
            .form(&[
                ("filehash", fingerprint.as_str()),
                ("pathinfo", filename),
                ("format", "json"),
            ])
            .send()
            .await?;
        check_status(response.status())?;

        let body = response.bytes().await?;
        let candidates = parse_query_response(&body, filename)?;
        log::debug!("Found {} candidates for {filename}", candidates.len());
        Ok(candidates)
    }
}

/// Anything past the 3xx range is a failure.
pub(crate) fn check_status(status: StatusCode) -> Result<()> {
    if status.as_u16() / 100 > 3 {
        return Err(Error::HttpStatus(status));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_SITE, DEFAULT_USER_AGENT};
    use mockito::{Matcher, Server};

    const FILM: &str = "Eva.2011.720p.BluRay.x264-DON.mkv";
    const HASH: &str = "66781fc73341bf357500505ad7de1ede;e75e7b0e54b37e3ca511523314e3f1e2;454a5bcb53654a08b2345a606e0cafe6;3f2af6eab10caa9909c0a54652400dd9";

    fn client_for(server: &Server) -> ShooterClient {
        ShooterClient::new(ShooterConfig {
            query_url: format!("{}/api/subapi.php", server.url()),
            ..ShooterConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_query_sends_form_and_headers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/subapi.php")
            .match_header("origin", DEFAULT_SITE)
            .match_header("referer", DEFAULT_SITE)
            .match_header("user-agent", DEFAULT_USER_AGENT)
            .match_header("accept", "*/*")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("filehash".into(), HASH.into()),
                Matcher::UrlEncoded("pathinfo".into(), FILM.into()),
                Matcher::UrlEncoded("format".into(), "json".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"[{"Desc":"","Delay":0,"Files":[{"Ext":"ass","Link":"https://a"}]},
                    {"Desc":"","Delay":0,"Files":[{"Ext":"srt","Link":"https://b"},{"Ext":"sub","Link":"https://c"}]}]"#,
            )
            .create_async()
            .await;

        let candidates = client_for(&server)
            .query(&HASH.parse().unwrap(), FILM)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(candidates.len(), 3);
        let extensions: Vec<&str> = candidates.iter().map(|c| c.extension()).collect();
        assert_eq!(extensions, ["ass", "srt", "sub"]);
        assert!(
            candidates
                .iter()
                .all(|c| c.base_film_name() == Some("Eva.2011.720p.BluRay.x264-DON"))
        );
    }

    #[tokio::test]
    async fn test_query_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/subapi.php")
            .with_status(200)
            .with_body(vec![0xFFu8])
            .create_async()
            .await;

        let result = client_for(&server).query(&HASH.parse().unwrap(), FILM).await;
        assert!(matches!(result, Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn test_query_http_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/subapi.php")
            .with_status(503)
            .with_body("[]")
            .create_async()
            .await;

        let result = client_for(&server).query(&HASH.parse().unwrap(), FILM).await;
        match result {
            Err(Error::HttpStatus(status)) => assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE),
            other => panic!("expected HttpStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_query_decode_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/subapi.php")
            .with_status(200)
            .with_body("<html>busy</html>")
            .create_async()
            .await;

        let result = client_for(&server).query(&HASH.parse().unwrap(), FILM).await;
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_check_status() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(check_status(StatusCode::FOUND).is_ok());
        assert!(matches!(
            check_status(StatusCode::NOT_FOUND),
            Err(Error::HttpStatus(StatusCode::NOT_FOUND))
        ));
        assert!(check_status(StatusCode::INTERNAL_SERVER_ERROR).is_err());
    }

    #[test]
    fn test_rejects_bad_header_config() {
        let config = ShooterConfig {
            origin: "http://bad\norigin/".to_string(),
            ..ShooterConfig::default()
        };
        assert!(matches!(
            ShooterClient::new(config),
            Err(Error::InvalidHeader(_))
        ));
    }
}
