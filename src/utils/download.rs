//! Streaming PDF downloads to disk.

use futures_util::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use super::HttpClient;
use crate::sources::SourceError;

/// Stream `url` into `path`, creating parent directories as needed.
///
/// `idle_timeout` bounds the wait for the response headers and for each body
/// chunk, not the transfer as a whole. Returns the number of bytes written. A
/// failure part-way through leaves the truncated file on disk.
pub async fn stream_to_file(
    client: &HttpClient,
    url: &str,
    path: &Path,
    idle_timeout: Duration,
) -> Result<u64, SourceError> {
    let response = tokio::time::timeout(idle_timeout, client.get_streaming(url).send())
        .await
        .map_err(|_| stalled(url, idle_timeout, "response"))??;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    loop {
        let next = tokio::time::timeout(idle_timeout, stream.next())
            .await
            .map_err(|_| stalled(url, idle_timeout, "body data"))?;
        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    tracing::debug!(url, path = %path.display(), bytes = written, "download complete");
    Ok(written)
}

fn stalled(url: &str, idle_timeout: Duration, waiting_for: &str) -> SourceError {
    SourceError::Timeout(format!(
        "no {} from {} for {:?}",
        waiting_for, url, idle_timeout
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use std::io::Write;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_stream_to_file_writes_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/files/book.pdf")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body("%PDF-1.4 test body")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("book.pdf");
        let client = HttpClient::new(&HttpConfig::default()).unwrap();

        let url = format!("{}/files/book.pdf", server.url());
        let written = stream_to_file(&client, &url, &path, Duration::from_secs(5))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(written, 18);
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 test body");
    }

    #[tokio::test]
    async fn test_stream_to_file_rejects_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.pdf")
            .with_status(404)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.pdf");
        let client = HttpClient::new(&HttpConfig::default()).unwrap();

        let url = format!("{}/missing.pdf", server.url());
        let err = stream_to_file(&client, &url, &path, Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::Status { status: 404, .. }));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_slow_steady_body_outlives_idle_timeout() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/big.pdf")
            .with_chunked_body(|w| {
                for _ in 0..8 {
                    w.write_all(b"%PDF-chunk\n")?;
                    w.flush()?;
                    std::thread::sleep(std::time::Duration::from_millis(300));
                }
                Ok(())
            })
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let path = dir.path().join("big.pdf");
        let client = HttpClient::new(&HttpConfig::default()).unwrap();

        let url = format!("{}/big.pdf", server.url());
        let written = stream_to_file(&client, &url, &path, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(written, 88);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 88);
    }

    #[tokio::test]
    async fn test_stalled_body_times_out() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/stuck.pdf")
            .with_chunked_body(|w| {
                w.write_all(b"%PDF-start\n")?;
                w.flush()?;
                std::thread::sleep(std::time::Duration::from_millis(1500));
                w.write_all(b"too late")
            })
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let path = dir.path().join("stuck.pdf");
        let client = HttpClient::new(&HttpConfig::default()).unwrap();

        let url = format!("{}/stuck.pdf", server.url());
        let err = stream_to_file(&client, &url, &path, Duration::from_millis(300))
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::Timeout(_)), "got {:?}", err);
        assert!(err.to_string().contains("body data"));
    }
}
