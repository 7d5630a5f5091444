// 该文件是 Yanhou （咽喉轮廓） 项目的一部分。
// src/model.rs - 分割结果与模型提供者
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

use std::path::{Path, PathBuf};

use image::{ImageBuffer, Luma, RgbImage};
use thiserror::Error;

/// 单通道浮点掩码，取值范围 [0, 1]
pub type Mask = ImageBuffer<Luma<f32>, Vec<f32>>;

/// 已解码的源图像及其文件路径
#[derive(Debug, Clone)]
pub struct SourceImage {
  pub path: PathBuf,
  /// 批处理中相对输入根目录的路径
  pub relative: Option<PathBuf>,
  pub image: RgbImage,
}

impl SourceImage {
  pub fn new(path: impl Into<PathBuf>, image: RgbImage) -> Self {
    Self {
      path: path.into(),
      relative: None,
      image,
    }
  }

  pub fn with_relative(mut self, relative: Option<PathBuf>) -> Self {
    self.relative = relative;
    self
  }

  /// 以 `/` 连接的相对路径，例如 `series_a/1.png`
  pub fn relative_name(&self) -> Option<String> {
    let relative = self.relative.as_ref()?;
    let parts: Vec<_> = relative
      .components()
      .map(|c| c.as_os_str().to_string_lossy().into_owned())
      .collect();
    if parts.is_empty() {
      None
    } else {
      Some(parts.join("/"))
    }
  }

  pub fn file_name(&self) -> String {
    self
      .path
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_default()
  }
}

#[derive(Debug, Clone)]
pub struct SegmentItem {
  pub class_id: u32,
  pub score: Option<f32>,
  pub mask: Mask,
}

#[derive(Debug, Clone, Default)]
pub struct SegmentResult {
  pub items: Box<[SegmentItem]>,
}

impl SegmentResult {
  pub fn new(items: Vec<SegmentItem>) -> Self {
    Self {
      items: items.into_boxed_slice(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }
}

/// 置信度与 IoU 阈值，原样传递给模型提供者
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
  pub confidence: f32,
  pub iou: f32,
}

impl Default for Thresholds {
  fn default() -> Self {
    Self {
      confidence: 0.25,
      iou: 0.45,
    }
  }
}

#[derive(Error, Debug)]
pub enum ProviderError {
  #[error("模型加载错误: {0}")]
  ModelLoad(String),
  #[error("推理错误: {0}")]
  Inference(String),
}

/// 外部检测/分割能力。模型的加载与推理均在实现内部完成。
pub trait Provider {
  fn predict(
    &self,
    source: &SourceImage,
    weights: &Path,
    thresholds: &Thresholds,
  ) -> Result<SegmentResult, ProviderError>;
}

impl<P: Provider + ?Sized> Provider for &P {
  fn predict(
    &self,
    source: &SourceImage,
    weights: &Path,
    thresholds: &Thresholds,
  ) -> Result<SegmentResult, ProviderError> {
    (**self).predict(source, weights, thresholds)
  }
}

pub trait WithLabel: Sized + std::fmt::Debug {
  fn to_label_str(&self) -> String;
  fn from_label_id(id: u32) -> Self;
  fn to_label_id(&self) -> u32;
}

/// 训练数据集中的解剖结构类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnatomyLabel {
  ColonneCervicale,
  Epiglotte,
  Langue,
  OsHyoide,
  Pharynx,
  Unknown(u32),
}

impl WithLabel for AnatomyLabel {
  fn to_label_str(&self) -> String {
    match self {
      AnatomyLabel::ColonneCervicale => "colonne_cervicale".to_string(),
      AnatomyLabel::Epiglotte => "epiglotte".to_string(),
      AnatomyLabel::Langue => "langue".to_string(),
      AnatomyLabel::OsHyoide => "os_hyoide".to_string(),
      AnatomyLabel::Pharynx => "pharynx".to_string(),
      AnatomyLabel::Unknown(id) => format!("class_{}", id),
    }
  }

  fn from_label_id(id: u32) -> Self {
    match id {
      0 => AnatomyLabel::ColonneCervicale,
      1 => AnatomyLabel::Epiglotte,
      2 => AnatomyLabel::Langue,
      3 => AnatomyLabel::OsHyoide,
      4 => AnatomyLabel::Pharynx,
      other => AnatomyLabel::Unknown(other),
    }
  }

  fn to_label_id(&self) -> u32 {
    match self {
      AnatomyLabel::ColonneCervicale => 0,
      AnatomyLabel::Epiglotte => 1,
      AnatomyLabel::Langue => 2,
      AnatomyLabel::OsHyoide => 3,
      AnatomyLabel::Pharynx => 4,
      AnatomyLabel::Unknown(id) => *id,
    }
  }
}

mod precomputed;
pub use self::precomputed::{Manifest, ManifestItem, PrecomputedMasks};
