//! Raster image conversion: re-encode between formats with optional
//! downscaling and JPEG quality.

use std::fmt;
use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageFormat};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Jpeg,
    Png,
    Webp,
    Gif,
    Bmp,
}

impl RasterFormat {
    /// Formats this crate can decode. HEIC/HEIF are recognised as images
    /// elsewhere but have no decoder here.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(RasterFormat::Jpeg),
            "png" => Some(RasterFormat::Png),
            "webp" => Some(RasterFormat::Webp),
            "gif" => Some(RasterFormat::Gif),
            "bmp" => Some(RasterFormat::Bmp),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            RasterFormat::Jpeg => "jpg",
            RasterFormat::Png => "png",
            RasterFormat::Webp => "webp",
            RasterFormat::Gif => "gif",
            RasterFormat::Bmp => "bmp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            RasterFormat::Jpeg => "image/jpeg",
            RasterFormat::Png => "image/png",
            RasterFormat::Webp => "image/webp",
            RasterFormat::Gif => "image/gif",
            RasterFormat::Bmp => "image/bmp",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            RasterFormat::Jpeg => ImageFormat::Jpeg,
            RasterFormat::Png => ImageFormat::Png,
            RasterFormat::Webp => ImageFormat::WebP,
            RasterFormat::Gif => ImageFormat::Gif,
            RasterFormat::Bmp => ImageFormat::Bmp,
        }
    }
}

impl fmt::Display for RasterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RasterFormat::Jpeg => "JPEG",
            RasterFormat::Png => "PNG",
            RasterFormat::Webp => "WebP",
            RasterFormat::Gif => "GIF",
            RasterFormat::Bmp => "BMP",
        })
    }
}

/// Resizing and encoding options for image targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    /// JPEG quality in percent (1-100). Other encoders are lossless.
    pub quality: u8,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            max_width: None,
            max_height: None,
            quality: 92,
        }
    }
}

/// Dimensions after fitting into the width bound, then the height bound,
/// keeping the aspect ratio. Images are never enlarged.
pub fn fitted_size(width: u32, height: u32, options: &ImageOptions) -> (u32, u32) {
    let (mut w, mut h) = (f64::from(width), f64::from(height));
    if let Some(max) = options.max_width.map(f64::from) {
        if w > max {
            h = h * max / w;
            w = max;
        }
    }
    if let Some(max) = options.max_height.map(f64::from) {
        if h > max {
            w = w * max / h;
            h = max;
        }
    }
    ((w.round() as u32).max(1), (h.round() as u32).max(1))
}

/// Decode `bytes` and encode them as `target`.
pub fn convert_image(
    bytes: &[u8],
    target: RasterFormat,
    options: &ImageOptions,
) -> Result<Vec<u8>, ImageError> {
    let mut image = image::load_from_memory(bytes)?;

    let (width, height) = fitted_size(image.width(), image.height(), options);
    if (width, height) != (image.width(), image.height()) {
        debug!(from = ?(image.width(), image.height()), to = ?(width, height), "resizing image");
        image = image.resize_exact(width, height, FilterType::Lanczos3);
    }

    let mut out = Cursor::new(Vec::new());
    match target {
        RasterFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            let quality = options.quality.clamp(1, 100);
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))?;
        }
        RasterFormat::Webp | RasterFormat::Gif => {
            DynamicImage::ImageRgba8(image.to_rgba8()).write_to(&mut out, target.image_format())?;
        }
        RasterFormat::Png | RasterFormat::Bmp => image.write_to(&mut out, target.image_format())?,
    }
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 128]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(image)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[rstest]
    #[case(RasterFormat::Jpeg, ImageFormat::Jpeg)]
    #[case(RasterFormat::Webp, ImageFormat::WebP)]
    #[case(RasterFormat::Gif, ImageFormat::Gif)]
    #[case(RasterFormat::Bmp, ImageFormat::Bmp)]
    fn reencodes_png(#[case] target: RasterFormat, #[case] expected: ImageFormat) {
        let bytes = convert_image(&png(4, 2), target, &ImageOptions::default()).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), expected);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 2));
    }

    #[test]
    fn downscales_to_max_width() {
        let options = ImageOptions {
            max_width: Some(2),
            ..Default::default()
        };
        let bytes = convert_image(&png(8, 4), RasterFormat::Png, &options).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (2, 1));
    }

    #[rstest]
    #[case((100, 50), Some(50), None, (50, 25))]
    #[case((100, 50), None, Some(10), (20, 10))]
    #[case((100, 50), Some(80), Some(20), (40, 20))]
    #[case((10, 5), Some(80), None, (10, 5))]
    #[case((1000, 1), Some(10), None, (10, 1))]
    fn fits_bounds(
        #[case] size: (u32, u32),
        #[case] max_width: Option<u32>,
        #[case] max_height: Option<u32>,
        #[case] expected: (u32, u32),
    ) {
        let options = ImageOptions {
            max_width,
            max_height,
            ..Default::default()
        };
        assert_eq!(fitted_size(size.0, size.1, &options), expected);
    }

    #[test]
    fn lower_quality_gives_smaller_jpeg() {
        let mut image = RgbaImage::new(32, 32);
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            *pixel = Rgba([(x * 8) as u8, (y * 8) as u8, ((x ^ y) * 8) as u8, 255]);
        }
        let mut source = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(image)
            .write_to(&mut source, ImageFormat::Png)
            .unwrap();
        let source = source.into_inner();

        let encode = |quality| {
            let options = ImageOptions {
                quality,
                ..Default::default()
            };
            convert_image(&source, RasterFormat::Jpeg, &options).unwrap()
        };
        assert!(encode(10).len() < encode(95).len());
    }

    #[test]
    fn undecodable_bytes_fail() {
        assert!(convert_image(b"not an image", RasterFormat::Png, &ImageOptions::default()).is_err());
    }
}
