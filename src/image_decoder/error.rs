//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 解码链路（加载 → 位图解码 → 光栅化 → 回读）中的所有失败都归入同一个 `DecodeError`。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。

/// 图片解码统一错误类型。
///
/// 任一阶段失败都直接透传给调用方，不做本地恢复，也不返回部分像素数据。
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("格式错误：{0}")]
    UnsupportedFormat(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("光栅化错误：{0}")]
    Raster(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("配置错误：{0}")]
    InvalidConfig(String),

    #[error("运行时错误：{0}")]
    Runtime(String),
}

impl From<DecodeError> for String {
    /// 兼容仍使用字符串错误的调用点。
    fn from(error: DecodeError) -> Self {
        error.to_string()
    }
}

impl From<image::ImageError> for DecodeError {
    fn from(error: image::ImageError) -> Self {
        use image::ImageError;

        match error {
            ImageError::Unsupported(e) => Self::UnsupportedFormat(format!("不支持的图片特性：{}", e)),
            ImageError::Limits(e) => Self::ResourceLimit(format!("超出解码限制：{}", e)),
            ImageError::Decoding(e) => Self::Decode(format!("图片数据损坏：{}", e)),
            ImageError::IoError(e) => Self::Decode(format!("读取图片数据失败：{}", e)),
            other => Self::Decode(format!("图片解码失败：{}", other)),
        }
    }
}
