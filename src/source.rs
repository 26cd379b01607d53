use crate::config::Config;
use crate::errors::SourceError;
use reqwest::{Client, StatusCode};
use std::path::PathBuf;
use tokio::fs;

/// Where the point log is read from on every poll.
#[derive(Debug, Clone)]
pub enum PointSource {
    File(PathBuf),
    Http { client: Client, url: String },
}

impl PointSource {
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        match &config.points_url {
            Some(url) => {
                let client = Client::builder().timeout(config.fetch_timeout).build()?;
                Ok(Self::Http {
                    client,
                    url: url.clone(),
                })
            }
            None => Ok(Self::File(config.points_path.clone())),
        }
    }

    /// A missing log file reads as an empty log.
    pub async fn fetch(&self) -> Result<String, SourceError> {
        match self {
            Self::File(path) => match fs::read_to_string(path).await {
                Ok(text) => Ok(text),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
                Err(err) => Err(err.into()),
            },
            Self::Http { client, url } => {
                let response = client.get(url).send().await?;
                if response.status() != StatusCode::OK {
                    return Err(SourceError::Status(response.status().as_u16()));
                }
                Ok(response.text().await?)
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Http { url, .. } => url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_reads_as_empty_log() {
        let source = PointSource::File(std::env::temp_dir().join("pathmap_missing_points.txt"));
        assert_eq!(source.fetch().await.unwrap(), "");
    }

    #[tokio::test]
    async fn unreachable_url_is_an_error() {
        let config = Config {
            points_url: Some("http://127.0.0.1:9/points.txt".to_string()),
            ..Config::default()
        };
        let source = PointSource::from_config(&config).unwrap();
        assert!(matches!(source, PointSource::Http { .. }));
        assert!(source.fetch().await.is_err());
    }
}
