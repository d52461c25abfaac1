//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `ImageDecoder` 只负责流程编排与配置管理，具体的解码与绘制由注入的
//! `BitmapDecoder` / `Rasterizer` 完成。处理链路固定为：
//! 1. 读取配置快照
//! 2. 在阻塞线程中把编码字节解码为位图（唯一的挂起点）
//! 3. 新建等大画布、原点绘制、整幅回读
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<DecoderConfig>>` 支持运行时调整。
//! - 单次调用内使用“同一配置快照”，避免处理中途配置漂移。
//! - 各调用之间没有共享的可变状态，可以并发调用。
//! - 记录 `decode/raster/total` 阶段耗时，便于性能诊断。

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use super::bitmap::{BitmapDecoder, ImageCrateBitmapDecoder};
use super::raster::{CanvasRasterizer, Rasterizer};
use super::source::{DecodedBitmap, EncodedImageResource, ImageSource, PixelBuffer};
use super::{DecodeError, DecoderConfig};

/// 图片解码器。
///
/// 默认使用 `image` crate 解码、`RasterSurface` 绘制；
/// 也可通过 [`ImageDecoder::with_capabilities`] 注入其他实现。
pub struct ImageDecoder<D = ImageCrateBitmapDecoder, R = CanvasRasterizer> {
    config: Arc<RwLock<DecoderConfig>>,
    bitmap_decoder: Arc<D>,
    rasterizer: R,
}

impl ImageDecoder {
    /// 使用默认解码与光栅化能力创建解码器。
    ///
    /// # 示例
    /// ```rust
    /// use image_decode::{DecoderConfig, ImageDecoder};
    ///
    /// let decoder = ImageDecoder::new(DecoderConfig::default())?;
    /// # Ok::<(), image_decode::DecodeError>(())
    /// ```
    pub fn new(config: DecoderConfig) -> Result<Self, DecodeError> {
        Self::with_capabilities(config, ImageCrateBitmapDecoder, CanvasRasterizer)
    }
}

impl<D, R> ImageDecoder<D, R> {
    /// 获取配置快照。
    pub fn config_snapshot(&self) -> Result<DecoderConfig, DecodeError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| DecodeError::Runtime("配置读取锁已中毒".to_string()))
    }

    /// 替换配置，对之后开始的调用生效。
    pub fn set_config(&self, config: DecoderConfig) -> Result<(), DecodeError> {
        config.validate()?;

        let mut current = self
            .config
            .write()
            .map_err(|_| DecodeError::Runtime("配置写入锁已中毒".to_string()))?;
        *current = config;

        log::info!(
            "⚙️ 已更新解码配置（max_file_size={}, max_pixels={}, max_bytes={}, orientation={}）",
            current.max_file_size,
            current.max_decoded_pixels,
            current.max_decoded_bytes,
            current.apply_orientation
        );

        Ok(())
    }
}

impl<D, R> ImageDecoder<D, R>
where
    D: BitmapDecoder,
    R: Rasterizer<D::Handle>,
{
    /// 使用注入的解码与光栅化能力创建解码器。
    pub fn with_capabilities(
        config: DecoderConfig,
        bitmap_decoder: D,
        rasterizer: R,
    ) -> Result<Self, DecodeError> {
        config.validate()?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            bitmap_decoder: Arc::new(bitmap_decoder),
            rasterizer,
        })
    }

    /// 处理主入口：将编码图片解码为 RGBA 像素缓冲。
    ///
    /// 位图解码在 tokio 阻塞线程池中执行；不在 tokio 运行时内调用时返回
    /// `DecodeError::Runtime`。绘制与回读在当前任务上同步完成。
    ///
    /// # 示例
    /// ```rust,ignore
    /// use image_decode::{DecoderConfig, EncodedImageResource, ImageDecoder};
    ///
    /// # async fn demo(png: Vec<u8>) -> Result<(), image_decode::DecodeError> {
    /// let decoder = ImageDecoder::new(DecoderConfig::default())?;
    /// let pixels = decoder.decode(EncodedImageResource::from_bytes(png)).await?;
    /// assert_eq!(pixels.len(), (pixels.width() * pixels.height() * 4) as usize);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn decode(&self, resource: EncodedImageResource) -> Result<PixelBuffer, DecodeError> {
        let config = self.config_snapshot()?;
        let total_start = Instant::now();
        let source_hint = resource.source_hint();
        config.check_file_size(resource.len() as u64)?;

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| DecodeError::Runtime(format!("当前线程没有可用的 tokio 运行时：{}", e)))?;

        let decode_start = Instant::now();
        let bitmap_decoder = Arc::clone(&self.bitmap_decoder);
        let decode_config = config.clone();
        let bitmap = runtime
            .spawn_blocking(move || {
                bitmap_decoder.decode_bitmap(resource.as_bytes(), &decode_config)
            })
            .await
            .map_err(|e| DecodeError::Runtime(format!("解码线程执行失败：{}", e)))??;
        let decode_elapsed = decode_start.elapsed();

        self.rasterize_bitmap(bitmap, &config, source_hint, decode_elapsed, total_start)
    }

    /// 同步版本：在当前线程完成整条链路，适用于没有事件循环的环境。
    pub fn decode_blocking(&self, resource: EncodedImageResource) -> Result<PixelBuffer, DecodeError> {
        let config = self.config_snapshot()?;
        let total_start = Instant::now();
        config.check_file_size(resource.len() as u64)?;

        let decode_start = Instant::now();
        let bitmap = self
            .bitmap_decoder
            .decode_bitmap(resource.as_bytes(), &config)?;
        let decode_elapsed = decode_start.elapsed();

        self.rasterize_bitmap(
            bitmap,
            &config,
            resource.source_hint(),
            decode_elapsed,
            total_start,
        )
    }

    /// 从任意来源加载并解码。
    pub async fn decode_source(&self, source: ImageSource) -> Result<PixelBuffer, DecodeError> {
        let resource = self.load(source)?;
        self.decode(resource).await
    }

    fn rasterize_bitmap(
        &self,
        bitmap: DecodedBitmap<D::Handle>,
        config: &DecoderConfig,
        source_hint: &'static str,
        decode_elapsed: Duration,
        total_start: Instant,
    ) -> Result<PixelBuffer, DecodeError> {
        let (width, height) = bitmap.dimensions();
        let mime_type = bitmap.mime_type().unwrap_or("unknown");
        config.check_dimensions(width, height)?;

        let raster_start = Instant::now();
        let pixels = self.rasterizer.rasterize(bitmap)?;
        let raster_elapsed = raster_start.elapsed();

        if pixels.dimensions() != (width, height) {
            return Err(DecodeError::Raster(format!(
                "光栅化输出尺寸 {}x{} 与位图尺寸 {}x{} 不一致",
                pixels.width(),
                pixels.height(),
                width,
                height
            )));
        }

        log::info!(
            "✅ 图片解码完成 - 来源: {} 格式: {} 尺寸: {}x{} decode={}ms raster={}ms total={}ms",
            source_hint,
            mime_type,
            width,
            height,
            decode_elapsed.as_millis(),
            raster_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(pixels)
    }
}
