use image::{imageops, RgbImage};

use crate::config::Region;
use crate::error::DetectError;

/// Copy `region` out of `image`. The source is only read; the returned
/// buffer is owned and shares nothing with it.
pub fn extract(
    image: &RgbImage,
    name: &'static str,
    region: Region,
) -> Result<RgbImage, DetectError> {
    let (width, height) = image.dimensions();
    if !region.fits(width, height) {
        return Err(DetectError::InvalidRegion {
            name,
            region,
            width,
            height,
        });
    }

    Ok(imageops::crop_imm(
        image,
        region.xmin,
        region.ymin,
        region.width(),
        region.height(),
    )
    .to_image())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 0]))
    }

    #[test]
    fn test_extract_copies_the_rectangle() {
        let image = gradient(20, 10);
        let crop = extract(&image, "red", Region::new(2, 5, 10, 14)).unwrap();
        assert_eq!(crop.dimensions(), (4, 3));
        assert_eq!(crop.get_pixel(0, 0), &Rgb([10, 2, 0]));
        assert_eq!(crop.get_pixel(3, 2), &Rgb([13, 4, 0]));
    }

    #[test]
    fn test_extract_does_not_alias_source() {
        let image = gradient(8, 8);
        let mut crop = extract(&image, "green", Region::new(0, 4, 0, 4)).unwrap();
        crop.put_pixel(0, 0, Rgb([255, 255, 255]));
        assert_eq!(image.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_extract_full_image_edge() {
        let image = gradient(6, 6);
        assert!(extract(&image, "amber", Region::new(0, 6, 0, 6)).is_ok());
    }

    #[test]
    fn test_extract_out_of_bounds() {
        let image = gradient(300, 80);
        let err = extract(&image, "green", Region::new(83, 89, 295, 301)).unwrap_err();
        match err {
            DetectError::InvalidRegion {
                name,
                width,
                height,
                ..
            } => {
                assert_eq!(name, "green");
                assert_eq!((width, height), (300, 80));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
