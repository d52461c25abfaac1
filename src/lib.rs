//! # image-decode — 库入口
//!
//! 将编码图片（PNG、JPEG、WebP、GIF、BMP、TIFF 等）解码为行优先、非预乘的 RGBA8 像素缓冲，
//! 并附带宽高信息。不做缩放、裁剪或色彩空间转换。
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  EncodedImageResource（字节 + 来源标识）                  │
//! │       │                                                  │
//! │       ↓  BitmapDecoder（阻塞线程，唯一挂起点）            │
//! │  DecodedBitmap（固有宽高 + 不透明句柄）                   │
//! │       │                                                  │
//! │       ↓  Rasterizer（等大透明画布，原点绘制，整幅回读）   │
//! │  PixelBuffer（width × height × 4 字节 RGBA）              │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`image_decoder`] | 加载、解码、光栅化与统一错误类型 `DecodeError` |
//!
//! 本库只通过 `log` 门面输出日志，不安装任何 logger。

pub mod image_decoder;

pub use image_decoder::{
    BitmapDecoder, CanvasRasterizer, DecodeError, DecodedBitmap, DecoderConfig,
    EncodedImageResource, ImageCrateBitmapDecoder, ImageDecoder, ImageSource, PixelBuffer,
    RasterSurface, Rasterizer,
};
