//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示外部来源语义
//! - `EncodedImageResource` 表示已加载但未解码的字节
//! - `DecodedBitmap` 表示解码完成、尚未光栅化的位图
//! - `PixelBuffer` 表示交给调用方的 RGBA 像素数据

use std::path::PathBuf;

use image::RgbaImage;

use super::DecodeError;
use super::config::BYTES_PER_PIXEL;

/// 图片输入来源。
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// 内存中的编码字节。
    Bytes(Vec<u8>),
    /// Base64（支持 Data URL 与纯 Base64 字符串）。
    Base64(String),
    /// 本地文件路径来源。
    FilePath(PathBuf),
}

/// 加载阶段输出：编码字节与来源标识。
#[derive(Debug, Clone)]
pub struct EncodedImageResource {
    bytes: Vec<u8>,
    source_hint: &'static str,
}

impl EncodedImageResource {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            source_hint: "bytes",
        }
    }

    pub(crate) fn with_hint(bytes: Vec<u8>, source_hint: &'static str) -> Self {
        Self { bytes, source_hint }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// 来源提示（用于日志与诊断）。
    pub fn source_hint(&self) -> &'static str {
        self.source_hint
    }
}

/// 位图解码阶段输出。
///
/// `H` 是解码器自定义的不透明句柄，只有配套的光栅器知道如何绘制它。
#[derive(Debug)]
pub struct DecodedBitmap<H> {
    width: u32,
    height: u32,
    mime_type: Option<&'static str>,
    handle: H,
}

impl<H> DecodedBitmap<H> {
    pub fn new(width: u32, height: u32, handle: H) -> Self {
        Self {
            width,
            height,
            mime_type: None,
            handle,
        }
    }

    pub fn with_mime_type(mut self, mime_type: &'static str) -> Self {
        self.mime_type = Some(mime_type);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn mime_type(&self) -> Option<&'static str> {
        self.mime_type
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn into_handle(self) -> H {
        self.handle
    }
}

/// 解码结果：行优先、非预乘的 RGBA8 像素数据（`width * height * 4` 字节）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// 构建像素缓冲，并校验字节长度与尺寸一致。
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, DecodeError> {
        let expected_len = Self::expected_len(width, height)?;

        if data.len() != expected_len {
            return Err(DecodeError::Raster(format!(
                "像素数据长度异常：{} 字节（期望 {}x{}x4 = {} 字节）",
                data.len(),
                width,
                height,
                expected_len
            )));
        }

        Ok(Self { width, height, data })
    }

    pub(crate) fn expected_len(width: u32, height: u32) -> Result<usize, DecodeError> {
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL as usize))
            .ok_or_else(|| DecodeError::ResourceLimit("图片尺寸导致内存溢出风险".to_string()))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 读取单个像素，越界返回 `None`。
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL as usize;
        let px = self.data.get(offset..offset + BYTES_PER_PIXEL as usize)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// 转换为 `image` crate 的 RGBA 图像，便于继续处理或重新编码。
    pub fn into_rgba_image(self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_buffer_rejects_mismatched_length() {
        let result = PixelBuffer::new(2, 2, vec![0; 15]);
        assert!(matches!(result, Err(DecodeError::Raster(_))));
    }

    #[test]
    fn pixel_lookup_is_row_major() {
        let data = (0u8..24).collect::<Vec<_>>();
        let buffer = PixelBuffer::new(3, 2, data).expect("valid buffer");

        assert_eq!(buffer.pixel(0, 0), Some([0, 1, 2, 3]));
        assert_eq!(buffer.pixel(2, 0), Some([8, 9, 10, 11]));
        assert_eq!(buffer.pixel(0, 1), Some([12, 13, 14, 15]));
        assert_eq!(buffer.pixel(3, 0), None);
        assert_eq!(buffer.pixel(0, 2), None);
    }

    #[test]
    fn empty_pixel_buffer_is_allowed() {
        let buffer = PixelBuffer::new(0, 0, Vec::new()).expect("0x0 buffer");
        assert!(buffer.is_empty());
        assert_eq!(buffer.pixel(0, 0), None);
    }

    #[test]
    fn bitmap_keeps_dimensions_and_handle() {
        let bitmap = DecodedBitmap::new(7, 3, "handle").with_mime_type("image/png");

        assert_eq!(bitmap.dimensions(), (7, 3));
        assert_eq!(bitmap.mime_type(), Some("image/png"));
        assert_eq!(bitmap.into_handle(), "handle");
    }
}
