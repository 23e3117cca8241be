//! Cover image download and re-encoding.

use image::ImageFormat;
use std::io::Cursor;
use std::path::Path;

use super::HttpClient;
use crate::sources::SourceError;

/// Download an image, decode it, and write it to `path` as JPEG.
pub async fn save_cover(client: &HttpClient, url: &str, path: &Path) -> Result<(), SourceError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    let bytes = response.bytes().await?;

    let jpeg = encode_jpeg(&bytes)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, jpeg).await?;
    Ok(())
}

/// Re-encode arbitrary image bytes as JPEG. Alpha is dropped.
pub fn encode_jpeg(bytes: &[u8]) -> Result<Vec<u8>, SourceError> {
    let img = image::load_from_memory(bytes)?;
    let rgb = image::DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)?;
    Ok(buf)
}

#[cfg(test)]
pub(crate) fn sample_png() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 6, image::Rgba([200, 30, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_jpeg_from_png() {
        let jpeg = encode_jpeg(&sample_png()).unwrap();
        // JPEG SOI marker
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.width(), 4);
        assert_eq!(decoded.height(), 6);
    }

    #[test]
    fn test_encode_jpeg_rejects_garbage() {
        let err = encode_jpeg(b"definitely not an image").unwrap_err();
        assert!(matches!(err, SourceError::Image(_)));
    }
}
