use crate::settings::Settings;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use reqwest::Client;
use std::time::Duration;

/// Lengths of the body chunks of one download, in arrival order.
pub type ChunkStream = BoxStream<'static, Result<usize, ProbeError>>;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Resolves once the response head arrives. The status code is not inspected.
    async fn head(&self, url: &str) -> Result<(), ProbeError>;

    async fn download(&self, url: &str) -> Result<ChunkStream, ProbeError>;
}

pub struct HttpTransport {
    latency_client: Client,
    payload_client: Client,
}

impl HttpTransport {
    pub fn new(settings: &Settings) -> Result<Self, ProbeError> {
        let latency_client = Client::builder()
            .connect_timeout(settings.ping_timeout)
            .build()?;

        // Payload servers are only a source of bytes, so certificate checks
        // are off for this client and nowhere else.
        let payload_client = Client::builder()
            .connect_timeout(settings.download_timeout)
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self {
            latency_client,
            payload_client,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn head(&self, url: &str) -> Result<(), ProbeError> {
        self.latency_client.head(url).send().await?;
        Ok(())
    }

    async fn download(&self, url: &str) -> Result<ChunkStream, ProbeError> {
        // An error page is not payload; the candidate fails like any other error.
        let response = self.payload_client.get(url).send().await?.error_for_status()?;
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.len()).map_err(ProbeError::from));
        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speedtest::download::DownloadTest;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_head_ignores_status_code() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&Settings::default()).unwrap();
        assert!(transport.head(&server.uri()).await.is_ok());
    }

    #[tokio::test]
    async fn test_download_yields_every_byte() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/payload"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 256 * 1024]))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&Settings::default()).unwrap();
        let stream = transport
            .download(&format!("{}/payload", server.uri()))
            .await
            .unwrap();

        let total: usize = stream.map(|chunk| chunk.unwrap()).collect::<Vec<_>>().await.iter().sum();
        assert_eq!(total, 256 * 1024);
    }

    #[tokio::test]
    async fn test_error_status_is_not_a_download() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_bytes(vec![0u8; 512 * 1024]))
            .expect(3)
            .mount(&server)
            .await;

        let settings = Settings {
            download_urls: vec![
                format!("{}/first", server.uri()),
                format!("{}/second", server.uri()),
            ],
            ..Settings::default()
        };
        let transport = HttpTransport::new(&settings).unwrap();

        assert!(matches!(
            transport.download(&settings.download_urls[0]).await,
            Err(ProbeError::Http(_))
        ));

        let result = DownloadTest::new(&settings).run(&transport, |_| {}).await;
        assert_eq!(result.speed_mbps, 0.0);
    }

    #[tokio::test]
    async fn test_refused_connection_is_an_error() {
        // Bind and drop to get a port nothing listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let transport = HttpTransport::new(&Settings::default()).unwrap();
        let url = format!("http://127.0.0.1:{}/", port);
        assert!(matches!(transport.head(&url).await, Err(ProbeError::Http(_))));
        assert!(matches!(transport.download(&url).await, Err(ProbeError::Http(_))));
    }
}
