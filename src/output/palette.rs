// 该文件是 Yanhou （咽喉轮廓） 项目的一部分。
// src/output/palette.rs - 类别颜色映射
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

use std::{collections::HashMap, path::Path};

use image::Rgb;
use thiserror::Error;
use tracing::{info, warn};

use crate::model::{AnatomyLabel, WithLabel};

#[derive(Error, Debug)]
pub enum ColorMapError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("颜色表格式错误: {0}")]
  FormatError(#[from] serde_json::Error),
}

/// 类别 ID 到 RGB 颜色的映射
#[derive(Debug, Clone, PartialEq)]
pub struct ClassColorMap {
  colors: HashMap<u32, Rgb<u8>>,
}

impl Default for ClassColorMap {
  fn default() -> Self {
    Self::from_pairs([
      (0, [0, 0, 255]),   // colonne_cervicale 蓝色
      (1, [0, 255, 255]), // epiglotte
      (2, [0, 255, 0]),   // langue 绿色
      (3, [0, 255, 0]),   // os_hyoide 绿色
      (4, [255, 0, 0]),   // pharynx 红色
    ])
  }
}

impl ClassColorMap {
  pub fn empty() -> Self {
    Self {
      colors: HashMap::new(),
    }
  }

  pub fn from_pairs(pairs: impl IntoIterator<Item = (u32, [u8; 3])>) -> Self {
    Self {
      colors: pairs.into_iter().map(|(id, rgb)| (id, Rgb(rgb))).collect(),
    }
  }

  /// 从 JSON 文件加载颜色表，例如 `{"4": [255, 0, 0]}`
  pub fn from_json_file(path: &Path) -> Result<Self, ColorMapError> {
    let data = std::fs::read(path)?;
    let pairs: HashMap<u32, [u8; 3]> = serde_json::from_slice(&data)?;
    info!("从 {} 加载了 {} 个类别颜色", path.display(), pairs.len());
    Ok(Self::from_pairs(pairs))
  }

  pub fn insert(&mut self, class_id: u32, color: [u8; 3]) {
    self.colors.insert(class_id, Rgb(color));
  }

  pub fn get(&self, class_id: u32) -> Option<Rgb<u8>> {
    self.colors.get(&class_id).copied()
  }

  /// 未登记的类别每次调用都会得到一个新的随机颜色
  pub fn resolve(&self, class_id: u32) -> Rgb<u8> {
    match self.get(class_id) {
      Some(color) => color,
      None => {
        let color = Rgb(rand::random::<[u8; 3]>());
        warn!(
          "类别 {} ({}) 不在颜色表中，使用随机颜色 {:?}",
          class_id,
          AnatomyLabel::from_label_id(class_id).to_label_str(),
          color.0
        );
        color
      }
    }
  }
}
