// 该文件是 Yanhou （咽喉轮廓） 项目的一部分。
// src/model/precomputed.rs - 预先计算的分割掩码
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

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
  sync::{Arc, Mutex},
};

use image::{ImageBuffer, ImageReader, Luma};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{Mask, Provider, ProviderError, SegmentItem, SegmentResult, SourceImage, Thresholds},
  url_file_path,
};

/// 掩码清单: 图像键 -> 该图像上的实例列表。
/// 键可以是相对批处理输入根目录的路径（`series_a/1.png`），也可以只是文件名。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
  pub images: HashMap<String, Vec<ManifestItem>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestItem {
  pub class_id: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub score: Option<f32>,
  /// 相对于清单所在目录的灰度掩码图像路径
  pub mask: PathBuf,
}

/// 读取外部模型已经导出的掩码，清单文件即“权重”文件。
#[derive(Debug, Clone)]
pub struct PrecomputedMasks {
  manifest: PathBuf,
  loaded: Arc<Mutex<HashMap<PathBuf, Arc<Manifest>>>>,
}

impl FromUrlWithScheme for PrecomputedMasks {
  const SCHEME: &'static str = "masks";
}

impl FromUrl for PrecomputedMasks {
  type Error = ProviderError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ProviderError::ModelLoad(format!(
        "模型路径必须使用 {} 方案, 实际为 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    Ok(PrecomputedMasks::new(url_file_path(url)))
  }
}

impl PrecomputedMasks {
  pub fn new(manifest: impl Into<PathBuf>) -> Self {
    Self {
      manifest: manifest.into(),
      loaded: Arc::default(),
    }
  }

  /// 清单文件路径，作为 `predict` 的权重参数传入
  pub fn weights(&self) -> &Path {
    &self.manifest
  }

  /// 每个清单文件只解析一次，加载失败不缓存
  fn manifest(&self, weights: &Path) -> Result<Arc<Manifest>, ProviderError> {
    let mut loaded = self
      .loaded
      .lock()
      .map_err(|_| ProviderError::ModelLoad("掩码清单缓存不可用".to_string()))?;
    if let Some(manifest) = loaded.get(weights) {
      return Ok(Arc::clone(manifest));
    }
    let manifest = Arc::new(Self::load_manifest(weights)?);
    loaded.insert(weights.to_path_buf(), Arc::clone(&manifest));
    Ok(manifest)
  }

  fn load_manifest(weights: &Path) -> Result<Manifest, ProviderError> {
    info!("加载掩码清单: {}", weights.display());
    let data = std::fs::read(weights)
      .map_err(|e| ProviderError::ModelLoad(format!("{}: {}", weights.display(), e)))?;
    serde_json::from_slice(&data)
      .map_err(|e| ProviderError::ModelLoad(format!("{}: {}", weights.display(), e)))
  }

  fn load_mask(path: &Path) -> Result<Mask, ProviderError> {
    let gray = ImageReader::open(path)
      .map_err(|e| ProviderError::Inference(format!("{}: {}", path.display(), e)))?
      .decode()
      .map_err(|e| ProviderError::Inference(format!("{}: {}", path.display(), e)))?
      .to_luma8();

    Ok(ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
      Luma([gray.get_pixel(x, y)[0] as f32 / 255.0])
    }))
  }
}

impl Provider for PrecomputedMasks {
  fn predict(
    &self,
    source: &SourceImage,
    weights: &Path,
    thresholds: &Thresholds,
  ) -> Result<SegmentResult, ProviderError> {
    let manifest = self.manifest(weights)?;
    let base = weights.parent().unwrap_or_else(|| Path::new(""));

    let file_name = source.file_name();
    let entries = source
      .relative_name()
      .and_then(|key| manifest.images.get(&key))
      .or_else(|| manifest.images.get(&file_name));
    let Some(entries) = entries else {
      debug!("清单中没有图像 {} 的记录", file_name);
      return Ok(SegmentResult::default());
    };

    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
      if entry.score.is_some_and(|score| score < thresholds.confidence) {
        debug!(
          "跳过类别 {} 的实例: 置信度 {:?} 低于阈值 {}",
          entry.class_id, entry.score, thresholds.confidence
        );
        continue;
      }
      let mask = Self::load_mask(&base.join(&entry.mask))?;
      items.push(SegmentItem {
        class_id: entry.class_id,
        score: entry.score,
        mask,
      });
    }

    debug!("图像 {} 读取到 {} 个实例", file_name, items.len());
    Ok(SegmentResult::new(items))
  }
}
