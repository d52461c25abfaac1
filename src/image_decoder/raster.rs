//! # 光栅化模块
//!
//! ## 设计思路
//!
//! “位图 → 像素”这一步被抽象为 `Rasterizer`：新建一块与位图等大的透明画布，
//! 在原点 (0,0) 不缩放地绘制位图，再整幅回读为 `PixelBuffer`。
//! 画布每次调用新建、用完即弃，不做复用或池化。
//!
//! ## 像素策略
//!
//! - 输出为直通（非预乘）alpha 的 RGBA8
//! - 不做色彩管理，内嵌 ICC 配置被忽略，按 sRGB 原样输出
//! - 灰度、RGB 等格式展开为 RGBA，16 位/浮点通道量化到 8 位

use image::{DynamicImage, GenericImageView, RgbaImage, imageops};

use super::DecodeError;
use super::source::{DecodedBitmap, PixelBuffer};

/// 将位图句柄绘制并回读为像素缓冲。
pub trait Rasterizer<H>: Send + Sync {
    fn rasterize(&self, bitmap: DecodedBitmap<H>) -> Result<PixelBuffer, DecodeError>;
}

/// 临时 RGBA 画布，初始全透明。
#[derive(Debug, Clone)]
pub struct RasterSurface {
    pixels: RgbaImage,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Result<Self, DecodeError> {
        PixelBuffer::expected_len(width, height)?;

        Ok(Self {
            pixels: RgbaImage::new(width, height),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// 在 (x, y) 处绘制图像，超出画布的部分被裁掉。
    ///
    /// 画布为透明底，源像素按原值写入，不做 alpha 预乘。
    pub fn draw_image(&mut self, image: &DynamicImage, x: i64, y: i64) {
        match image {
            DynamicImage::ImageRgba8(rgba) => self.draw_rgba(rgba, x, y),
            other => self.draw_rgba(&other.to_rgba8(), x, y),
        }
    }

    pub fn draw_rgba(&mut self, image: &RgbaImage, x: i64, y: i64) {
        imageops::replace(&mut self.pixels, image, x, y);
    }

    /// 回读画布上的矩形区域。
    pub fn get_image_data(
        &self,
        sx: u32,
        sy: u32,
        sw: u32,
        sh: u32,
    ) -> Result<PixelBuffer, DecodeError> {
        let right = sx.checked_add(sw);
        let bottom = sy.checked_add(sh);

        match (right, bottom) {
            (Some(right), Some(bottom)) if right <= self.width() && bottom <= self.height() => {}
            _ => {
                return Err(DecodeError::Raster(format!(
                    "回读区域越界：({}, {}) {}x{}（画布 {}x{}）",
                    sx,
                    sy,
                    sw,
                    sh,
                    self.width(),
                    self.height()
                )));
            }
        }

        let region = imageops::crop_imm(&self.pixels, sx, sy, sw, sh).to_image();
        PixelBuffer::new(sw, sh, region.into_raw())
    }

    /// 整幅回读，直接移交画布内存。
    pub fn into_pixel_buffer(self) -> Result<PixelBuffer, DecodeError> {
        let (width, height) = self.pixels.dimensions();
        PixelBuffer::new(width, height, self.pixels.into_raw())
    }
}

/// 基于 `RasterSurface` 的默认光栅器。
#[derive(Debug, Clone, Copy, Default)]
pub struct CanvasRasterizer;

impl CanvasRasterizer {
    fn check_handle_dimensions(
        bitmap_dimensions: (u32, u32),
        handle_dimensions: (u32, u32),
    ) -> Result<(), DecodeError> {
        if bitmap_dimensions != handle_dimensions {
            return Err(DecodeError::Raster(format!(
                "位图尺寸 {}x{} 与句柄尺寸 {}x{} 不一致",
                bitmap_dimensions.0, bitmap_dimensions.1, handle_dimensions.0, handle_dimensions.1
            )));
        }

        Ok(())
    }
}

impl Rasterizer<DynamicImage> for CanvasRasterizer {
    fn rasterize(&self, bitmap: DecodedBitmap<DynamicImage>) -> Result<PixelBuffer, DecodeError> {
        let (width, height) = bitmap.dimensions();
        let image = bitmap.into_handle();
        Self::check_handle_dimensions((width, height), image.dimensions())?;

        let mut surface = RasterSurface::new(width, height)?;
        surface.draw_image(&image, 0, 0);
        drop(image);

        surface.into_pixel_buffer()
    }
}

impl Rasterizer<RgbaImage> for CanvasRasterizer {
    fn rasterize(&self, bitmap: DecodedBitmap<RgbaImage>) -> Result<PixelBuffer, DecodeError> {
        let (width, height) = bitmap.dimensions();
        let image = bitmap.into_handle();
        Self::check_handle_dimensions((width, height), image.dimensions())?;

        let mut surface = RasterSurface::new(width, height)?;
        surface.draw_rgba(&image, 0, 0);
        drop(image);

        surface.into_pixel_buffer()
    }
}
