//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（内存字节 / Base64 / 本地文件）的原始字节加载，并在“尽可能早”的阶段执行体积校验。
//! 目标是尽快失败，减少不必要内存与 CPU 消耗。格式本身不在这里校验，交给位图解码器。

use std::path::Path;

use base64::{Engine as _, engine::general_purpose};

use super::source::{EncodedImageResource, ImageSource};
use super::{DecodeError, DecoderConfig, ImageDecoder};

impl<D, R> ImageDecoder<D, R> {
    /// 按来源加载编码字节。
    pub fn load(&self, source: ImageSource) -> Result<EncodedImageResource, DecodeError> {
        let config = self.config_snapshot()?;

        match source {
            ImageSource::Bytes(bytes) => {
                config.check_file_size(bytes.len() as u64)?;
                Ok(EncodedImageResource::with_hint(bytes, "bytes"))
            }
            ImageSource::Base64(data) => Self::load_from_base64(&data, &config),
            ImageSource::FilePath(path) => Self::load_from_file(&path, &config),
        }
    }

    /// 从 Base64 字符串加载图片原始字节。
    pub(super) fn load_from_base64(
        data: &str,
        config: &DecoderConfig,
    ) -> Result<EncodedImageResource, DecodeError> {
        log::debug!("📝 开始处理 base64 图片");

        let bytes = parse_base64_with_limit(data, config.max_file_size)?;
        config.check_file_size(bytes.len() as u64)?;

        Ok(EncodedImageResource::with_hint(bytes, "base64"))
    }

    /// 从本地路径加载图片原始字节。
    pub(super) fn load_from_file(
        path: &Path,
        config: &DecoderConfig,
    ) -> Result<EncodedImageResource, DecodeError> {
        log::debug!("📁 开始读取本地图片 - 路径: {}", path.display());

        if !path.exists() {
            return Err(DecodeError::FileSystem(format!("文件不存在：{}", path.display())));
        }

        let metadata = std::fs::metadata(path)
            .map_err(|e| DecodeError::FileSystem(format!("无法读取文件信息：{}", e)))?;
        config.check_file_size(metadata.len())?;

        let bytes = std::fs::read(path)
            .map_err(|e| DecodeError::FileSystem(format!("无法读取图片文件：{}", e)))?;

        Ok(EncodedImageResource::with_hint(bytes, "file"))
    }
}

fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, DecodeError> {
    let len = base64_data.trim().len() as u64;
    let groups = len
        .checked_add(3)
        .ok_or_else(|| DecodeError::ResourceLimit("Base64 输入长度溢出".to_string()))?
        / 4;

    groups
        .checked_mul(3)
        .ok_or_else(|| DecodeError::ResourceLimit("Base64 解码体积估算溢出".to_string()))
}

/// 解析 Data URL 或纯 Base64，在真正解码前按估算体积拒绝超限输入。
fn parse_base64_with_limit(data: &str, max_file_size: u64) -> Result<Vec<u8>, DecodeError> {
    let normalized = data.trim();

    let payload = if has_data_url_scheme(normalized) {
        // ASCII 小写不改变字节偏移
        let base64_start = normalized
            .to_ascii_lowercase()
            .find(";base64,")
            .ok_or_else(|| DecodeError::UnsupportedFormat("Data URL 缺少 base64 标记".to_string()))?;
        &normalized[base64_start + ";base64,".len()..]
    } else {
        normalized
    };

    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    let estimated_len = estimate_base64_decoded_upper_bound_len(&compact)?;
    if estimated_len > max_file_size {
        return Err(DecodeError::ResourceLimit(format!(
            "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
            estimated_len as f64 / 1024.0 / 1024.0,
            max_file_size as f64 / 1024.0 / 1024.0
        )));
    }

    general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| DecodeError::Decode(format!("Base64 解码失败：{}", e)))
}

fn has_data_url_scheme(data: &str) -> bool {
    data.get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}
