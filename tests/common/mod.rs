// 该文件是 Yanhou （咽喉轮廓） 项目的一部分。
// tests/common/mod.rs - 测试夹具
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

#![allow(dead_code)]

use std::path::Path;

use image::{ImageBuffer, Luma, Rgb, RgbImage};
use yanhou::model::{
  Mask, Provider, ProviderError, SegmentItem, SegmentResult, SourceImage, Thresholds,
};

/// 每张图像都返回同一组实例
pub struct FixedMasks {
  pub items: Vec<SegmentItem>,
}

impl Provider for FixedMasks {
  fn predict(
    &self,
    _source: &SourceImage,
    _weights: &Path,
    _thresholds: &Thresholds,
  ) -> Result<SegmentResult, ProviderError> {
    Ok(SegmentResult::new(self.items.clone()))
  }
}

/// 指定文件名的图像推理失败，其他图像返回一个方形实例
pub struct FailOnName {
  pub name: String,
}

impl Provider for FailOnName {
  fn predict(
    &self,
    source: &SourceImage,
    _weights: &Path,
    _thresholds: &Thresholds,
  ) -> Result<SegmentResult, ProviderError> {
    if source.file_name() == self.name {
      return Err(ProviderError::Inference(format!("无法推理 {}", self.name)));
    }
    Ok(SegmentResult::new(vec![square_item(4, 16, 4, 12)]))
  }
}

pub fn square_mask(size: u32, from: u32, to: u32) -> Mask {
  ImageBuffer::from_fn(size, size, |x, y| {
    if (from..to).contains(&x) && (from..to).contains(&y) {
      Luma([1.0])
    } else {
      Luma([0.0])
    }
  })
}

pub fn square_item(class_id: u32, size: u32, from: u32, to: u32) -> SegmentItem {
  SegmentItem {
    class_id,
    score: Some(0.9),
    mask: square_mask(size, from, to),
  }
}

pub fn gradient_image(width: u32, height: u32) -> RgbImage {
  ImageBuffer::from_fn(width, height, |x, y| {
    Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8])
  })
}

pub fn write_png(path: &Path, width: u32, height: u32) {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  gradient_image(width, height).save(path).unwrap();
}
