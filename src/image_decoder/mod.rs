//! # 图片解码模块（image_decoder）
//!
//! ## 设计思路
//!
//! 该模块将“来源加载 → 位图解码 → 画布绘制 → 像素回读”按职责拆分为多个子模块，
//! 避免单文件膨胀与耦合。
//!
//! - `handler`：编排整条处理流水线
//! - `loader`：负责内存字节/Base64/文件加载与体积校验
//! - `bitmap`：`BitmapDecoder` 能力与基于 `image` crate 的默认实现
//! - `raster`：`Rasterizer` 能力、`RasterSurface` 画布与默认光栅器
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 新同事快速上手
//!
//! ```text
//! 调用方
//!    ↓
//! handler.rs（配置快照 + 阶段耗时日志）
//!    ├─ loader.rs（可选：来源加载 + 体积校验）
//!    ├─ bitmap.rs（spawn_blocking 中解码，唯一挂起点）
//!    └─ raster.rs（等大画布 + 原点绘制 + 整幅回读）
//!    ↓
//! PixelBuffer 或 DecodeError
//! ```

mod bitmap;
mod config;
mod error;
mod handler;
mod loader;
mod raster;
mod source;

pub use bitmap::{BitmapDecoder, ImageCrateBitmapDecoder};
pub use config::DecoderConfig;
pub use error::DecodeError;
pub use handler::ImageDecoder;
pub use raster::{CanvasRasterizer, RasterSurface, Rasterizer};
pub use source::{DecodedBitmap, EncodedImageResource, ImageSource, PixelBuffer};
