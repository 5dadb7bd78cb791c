use crate::error::Result;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// On-disk cache of square JPEG thumbnails, keyed by a hash of the source path.
#[derive(Debug, Clone)]
pub struct ThumbnailCache {
    base_dir: PathBuf,
    size: u32,
}

impl ThumbnailCache {
    pub fn new(base_dir: impl Into<PathBuf>, size: u32) -> Self {
        Self {
            base_dir: base_dir.into(),
            size,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn cache_path(&self, source: &Path) -> PathBuf {
        let digest = Sha256::digest(source.to_string_lossy().as_bytes());
        self.base_dir.join(format!("{:x}.jpg", digest))
    }

    /// Returns the cached thumbnail for `source`, generating it first if needed.
    ///
    /// The thumbnail is written to a temporary file and renamed into place, so
    /// concurrent callers may both do the work but never observe a partial file.
    pub fn get_or_create(&self, source: &Path) -> Result<PathBuf> {
        let path = self.cache_path(source);
        if path.is_file() {
            return Ok(path);
        }

        let thumb = self.render(source)?;

        fs::create_dir_all(&self.base_dir)?;
        let tmp = NamedTempFile::new_in(&self.base_dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            thumb.write_to(&mut writer, ImageFormat::Jpeg)?;
            writer.flush()?;
        }
        tmp.persist(&path).map_err(|err| err.error)?;

        debug!(source = %source.display(), thumbnail = %path.display(), "generated thumbnail");
        Ok(path)
    }

    fn render(&self, source: &Path) -> Result<DynamicImage> {
        let image = image::open(source)?;
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        Ok(rgb.resize_to_fill(self.size, self.size, FilterType::Lanczos3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
        img.save(path).unwrap();
    }

    #[test]
    fn generates_square_jpeg() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("photo.png");
        write_png(&source, 300, 120);

        let cache = ThumbnailCache::new(tmp.path().join("thumbs"), 150);
        let thumb = cache.get_or_create(&source).unwrap();

        assert_eq!(thumb, cache.cache_path(&source));
        assert_eq!(thumb.extension().unwrap(), "jpg");
        let decoded = image::open(&thumb).unwrap();
        assert_eq!(decoded.dimensions(), (150, 150));
        assert_eq!(image::guess_format(&fs::read(&thumb).unwrap()).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn reuses_cached_file() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("photo.png");
        write_png(&source, 10, 10);

        let cache = ThumbnailCache::new(tmp.path().join("thumbs"), 150);
        let cached = cache.cache_path(&source);
        fs::create_dir_all(cache.base_dir()).unwrap();
        fs::write(&cached, b"already here").unwrap();

        assert_eq!(cache.get_or_create(&source).unwrap(), cached);
        assert_eq!(fs::read(&cached).unwrap(), b"already here");
    }

    #[test]
    fn distinct_sources_get_distinct_names() {
        let cache = ThumbnailCache::new("/cache", 150);
        assert_ne!(
            cache.cache_path(Path::new("/srv/a.png")),
            cache.cache_path(Path::new("/srv/b.png"))
        );
    }

    #[test]
    fn undecodable_source_fails_without_cache_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("fake.png");
        fs::write(&source, b"not an image").unwrap();

        let cache = ThumbnailCache::new(tmp.path().join("thumbs"), 150);
        assert!(cache.get_or_create(&source).is_err());
        assert!(!cache.cache_path(&source).exists());
    }
}
