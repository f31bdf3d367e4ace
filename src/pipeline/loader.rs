use std::path::Path;

use image::RgbImage;
use tracing::debug;

use crate::error::DetectError;

/// Decode the image at `path` into an RGB grid.
///
/// Gray and alpha images are expanded to RGB so every region goes through the
/// same blur and luma conversion.
pub fn load_image(path: &Path) -> Result<RgbImage, DetectError> {
    if !path.is_file() {
        return Err(DetectError::FileNotFound(path.to_path_buf()));
    }

    let image = image::open(path).map_err(|source| DetectError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        "Loaded {} ({}x{}, {:?})",
        path.display(),
        image.width(),
        image.height(),
        image.color()
    );
    Ok(image.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.png");
        assert!(matches!(
            load_image(&path),
            Err(DetectError::FileNotFound(p)) if p == path
        ));
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_image(dir.path()),
            Err(DetectError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_zero_byte_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        std::fs::write(&path, b"").unwrap();
        assert!(matches!(load_image(&path), Err(DetectError::Decode { .. })));
    }

    #[test]
    fn test_corrupt_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(matches!(load_image(&path), Err(DetectError::Decode { .. })));
    }

    #[test]
    fn test_gray_image_expands_to_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        GrayImage::from_pixel(5, 4, Luma([90u8])).save(&path).unwrap();

        let image = load_image(&path).unwrap();
        assert_eq!(image.dimensions(), (5, 4));
        assert_eq!(image.get_pixel(2, 2).0, [90, 90, 90]);
    }
}
