//! # 位图解码模块
//!
//! ## 设计思路
//!
//! “字节 → 位图”这一步被抽象为 `BitmapDecoder`，编排层只依赖该 trait，
//! 因此可以替换为任意原生编解码库，而不改变对外契约。
//! 格式识别与校验完全交给解码器负责，编排层不检查格式字节。
//!
//! ## 实现思路
//!
//! 默认实现 `ImageCrateBitmapDecoder` 基于 `image` crate：
//! 1. 空输入与明显非图片的文件签名（zip、pdf 等）直接拒绝
//! 2. 按魔数猜测格式
//! 3. 只读 header 取尺寸，按像素/内存上限快速拒绝
//! 4. 带 `Limits` 完整解码，可选应用 EXIF 方向

use std::io::Cursor;

use image::metadata::Orientation;
use image::{DynamicImage, GenericImageView, ImageDecoder as _, ImageReader, Limits};

use super::source::DecodedBitmap;
use super::{DecodeError, DecoderConfig};

/// 将编码字节解码为带固有尺寸的位图。
pub trait BitmapDecoder: Send + Sync + 'static {
    /// 解码器产出的不透明位图句柄。
    type Handle: Send + 'static;

    fn decode_bitmap(
        &self,
        bytes: &[u8],
        config: &DecoderConfig,
    ) -> Result<DecodedBitmap<Self::Handle>, DecodeError>;
}

/// 基于 `image` crate 的默认位图解码器。
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateBitmapDecoder;

impl BitmapDecoder for ImageCrateBitmapDecoder {
    type Handle = DynamicImage;

    fn decode_bitmap(
        &self,
        bytes: &[u8],
        config: &DecoderConfig,
    ) -> Result<DecodedBitmap<DynamicImage>, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::UnsupportedFormat("图片内容为空".to_string()));
        }

        if config.verify_signature {
            Self::validate_image_signature(bytes)?;
        }

        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| DecodeError::UnsupportedFormat(format!("无法识别图片格式：{}", e)))?;

        let format = reader
            .format()
            .ok_or_else(|| DecodeError::UnsupportedFormat("无法识别图片格式".to_string()))?;

        reader.limits(Self::limits_for(config));

        let mut decoder = reader.into_decoder()?;
        let (header_width, header_height) = decoder.dimensions();
        config.check_dimensions(header_width, header_height)?;

        let orientation = if config.apply_orientation {
            decoder.orientation()?
        } else {
            Orientation::NoTransforms
        };

        let mut image = DynamicImage::from_decoder(decoder)?;
        if !matches!(orientation, Orientation::NoTransforms) {
            log::debug!("🔄 应用 EXIF 方向：{:?}", orientation);
            image.apply_orientation(orientation);
        }

        let (width, height) = image.dimensions();
        log::debug!(
            "🖼️ 位图解码完成 - 格式: {:?} 颜色: {:?} 尺寸: {}x{}",
            format,
            image.color(),
            width,
            height
        );

        Ok(DecodedBitmap::new(width, height, image).with_mime_type(format.to_mime_type()))
    }
}

impl ImageCrateBitmapDecoder {
    /// 文件签名校验：只拒绝被明确识别为非图片的内容。
    ///
    /// 无法识别的签名交给格式猜测处理（部分格式如 TGA 没有魔数）。
    fn validate_image_signature(bytes: &[u8]) -> Result<(), DecodeError> {
        if let Some(kind) = infer::get(bytes) {
            if kind.matcher_type() != infer::MatcherType::Image {
                return Err(DecodeError::UnsupportedFormat(format!(
                    "文件签名不是图片类型：{}",
                    kind.mime_type()
                )));
            }
        }

        Ok(())
    }

    /// 中间缓冲可能是 16 位或浮点像素，分配上限按 RGBA8 预算放宽到 4 倍。
    fn limits_for(config: &DecoderConfig) -> Limits {
        let mut limits = Limits::default();
        limits.max_alloc = Some(config.max_decoded_bytes.saturating_mul(4));
        limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_decoder::test_support::{create_png_bytes, encode_image, png_with_exif_orientation};
    use image::{ImageFormat, Rgba, RgbaImage};

    #[test]
    fn decodes_png_with_intrinsic_dimensions() {
        let png = create_png_bytes(31, 17);
        let bitmap = ImageCrateBitmapDecoder
            .decode_bitmap(&png, &DecoderConfig::default())
            .expect("png should decode");

        assert_eq!(bitmap.dimensions(), (31, 17));
        assert_eq!(bitmap.mime_type(), Some("image/png"));
        assert_eq!(bitmap.handle().dimensions(), (31, 17));
    }

    #[test]
    fn decodes_jpeg_and_bmp() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(12, 9, image::Rgb([10, 200, 30])));

        for format in [ImageFormat::Jpeg, ImageFormat::Bmp] {
            let bytes = encode_image(&img, format);
            let bitmap = ImageCrateBitmapDecoder
                .decode_bitmap(&bytes, &DecoderConfig::default())
                .expect("encoded image should decode");

            assert_eq!(bitmap.dimensions(), (12, 9), "format {:?}", format);
        }
    }

    #[test]
    fn rejects_empty_input() {
        let result = ImageCrateBitmapDecoder.decode_bitmap(&[], &DecoderConfig::default());
        assert!(matches!(result, Err(DecodeError::UnsupportedFormat(_))));
    }

    #[test]
    fn rejects_non_image_signature() {
        let mut zip = b"PK\x03\x04".to_vec();
        zip.extend_from_slice(&[0u8; 60]);

        let result = ImageCrateBitmapDecoder.decode_bitmap(&zip, &DecoderConfig::default());
        assert!(matches!(result, Err(DecodeError::UnsupportedFormat(_))));
    }

    #[test]
    fn rejects_unrecognised_bytes() {
        let result =
            ImageCrateBitmapDecoder.decode_bitmap(b"definitely not an image", &DecoderConfig::default());
        assert!(matches!(result, Err(DecodeError::UnsupportedFormat(_))));
    }

    #[test]
    fn truncated_png_is_a_decode_error() {
        let png = create_png_bytes(64, 64);
        let truncated = &png[..png.len() / 2];

        let result = ImageCrateBitmapDecoder.decode_bitmap(truncated, &DecoderConfig::default());
        assert!(matches!(result, Err(DecodeError::Decode(_))));
    }

    #[test]
    fn header_dimensions_are_checked_before_full_decode() {
        let config = DecoderConfig {
            max_decoded_pixels: 1_000,
            ..DecoderConfig::default()
        };
        let png = create_png_bytes(100, 100);

        let result = ImageCrateBitmapDecoder.decode_bitmap(&png, &config);
        assert!(matches!(result, Err(DecodeError::ResourceLimit(_))));
    }

    #[test]
    fn signature_check_can_be_disabled() {
        let mut zip = b"PK\x03\x04".to_vec();
        zip.extend_from_slice(&[0u8; 60]);

        let checked = ImageCrateBitmapDecoder.decode_bitmap(&zip, &DecoderConfig::default());
        match checked {
            Err(DecodeError::UnsupportedFormat(msg)) => assert!(msg.contains("application/zip"), "{}", msg),
            other => panic!("expected signature rejection, got {:?}", other.map(|b| b.dimensions())),
        }

        let config = DecoderConfig {
            verify_signature: false,
            ..DecoderConfig::default()
        };
        let unchecked = ImageCrateBitmapDecoder.decode_bitmap(&zip, &config);
        match unchecked {
            Err(DecodeError::UnsupportedFormat(msg)) => assert!(!msg.contains("application/zip"), "{}", msg),
            other => panic!("expected format guess failure, got {:?}", other.map(|b| b.dimensions())),
        }

        let png = create_png_bytes(5, 3);
        let bitmap = ImageCrateBitmapDecoder
            .decode_bitmap(&png, &config)
            .expect("png should decode without signature check");
        assert_eq!(bitmap.dimensions(), (5, 3));
    }

    #[test]
    fn exif_orientation_rotates_unless_disabled() {
        let mut img = RgbaImage::from_pixel(4, 2, Rgba([0, 0, 255, 255]));
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        let png = encode_image(&DynamicImage::ImageRgba8(img), ImageFormat::Png);
        // 6 = 顺时针旋转 90°
        let png = png_with_exif_orientation(&png, 6);

        let rotated = ImageCrateBitmapDecoder
            .decode_bitmap(&png, &DecoderConfig::default())
            .expect("png with exif should decode");
        assert_eq!(rotated.dimensions(), (2, 4));
        assert_eq!(rotated.handle().to_rgba8().get_pixel(1, 0), &Rgba([255, 0, 0, 255]));

        let config = DecoderConfig {
            apply_orientation: false,
            ..DecoderConfig::default()
        };
        let untouched = ImageCrateBitmapDecoder
            .decode_bitmap(&png, &config)
            .expect("png with exif should decode");
        assert_eq!(untouched.dimensions(), (4, 2));
        assert_eq!(untouched.handle().to_rgba8().get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn png_without_exif_keeps_orientation() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(4, 2, |x, _| Rgba([x as u8, 0, 0, 255])));
        let png = encode_image(&img, ImageFormat::Png);

        let bitmap = ImageCrateBitmapDecoder
            .decode_bitmap(&png, &DecoderConfig::default())
            .expect("png should decode");

        assert_eq!(bitmap.dimensions(), (4, 2));
        assert_eq!(bitmap.handle().to_rgba8().get_pixel(3, 0), &Rgba([3, 0, 0, 255]));
    }
}
