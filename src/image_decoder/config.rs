//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `DecoderConfig`，保证运行时行为可观测、可调整、可测试。
//! 解码本身不做缩放或色彩转换，这里只承载输入体积、像素数与内存预算等资源上限，
//! 以及 EXIF 方向与文件签名两个开关。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的限制值。
//! - `validate` 在配置生效前拒绝无意义的取值。
//! - `check_dimensions` 供位图解码与编排层共用，在分配像素内存前快速拒绝。

use serde::{Deserialize, Serialize};

use super::DecodeError;

/// 单个 RGBA 像素占用的字节数。
pub(crate) const BYTES_PER_PIXEL: u64 = 4;

/// 图片解码配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// 读取原始字节时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 是否按 EXIF 方向旋转/翻转位图。
    ///
    /// 开启时输出尺寸为“方向校正后”的固有尺寸。
    pub apply_orientation: bool,
    /// 是否在解码前用文件签名拒绝明显不是图片的内容（zip、pdf 等）。
    pub verify_signature: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            apply_orientation: true,
            verify_signature: true,
        }
    }
}

impl DecoderConfig {
    /// 校验配置取值。
    ///
    /// # 示例
    /// ```rust
    /// use image_decode::DecoderConfig;
    ///
    /// let mut config = DecoderConfig::default();
    /// assert!(config.validate().is_ok());
    ///
    /// config.max_decoded_pixels = 0;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.max_file_size == 0 {
            return Err(DecodeError::InvalidConfig("max_file_size 不能为 0".to_string()));
        }
        if self.max_decoded_pixels == 0 {
            return Err(DecodeError::InvalidConfig("max_decoded_pixels 不能为 0".to_string()));
        }
        if self.max_decoded_bytes < BYTES_PER_PIXEL {
            return Err(DecodeError::InvalidConfig(format!(
                "max_decoded_bytes 不能小于单个像素的 {} 字节",
                BYTES_PER_PIXEL
            )));
        }

        Ok(())
    }

    /// 校验尺寸是否超过像素数与内存上限。
    pub(crate) fn check_dimensions(&self, width: u32, height: u32) -> Result<(), DecodeError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| DecodeError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > self.max_decoded_pixels {
            return Err(DecodeError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, self.max_decoded_pixels
            )));
        }

        let estimated = pixels
            .checked_mul(BYTES_PER_PIXEL)
            .ok_or_else(|| DecodeError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

        if estimated > self.max_decoded_bytes {
            return Err(DecodeError::ResourceLimit(format!(
                "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
                estimated as f64 / 1024.0 / 1024.0,
                self.max_decoded_bytes as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }

    /// 校验原始输入体积。
    pub(crate) fn check_file_size(&self, len: u64) -> Result<(), DecodeError> {
        if len > self.max_file_size {
            return Err(DecodeError::ResourceLimit(format!(
                "输入体积过大：{:.2} MB（限制：{:.2} MB）",
                len as f64 / 1024.0 / 1024.0,
                self.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }
}
