// 该文件是 Yanhou （咽喉轮廓） 项目的一部分。
// src/output/annotate.rs - 绘制轮廓并保存标注图像
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

use image::{ImageFormat, ImageReader};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
  model::{ProviderError, SegmentResult, SourceImage},
  output::{
    draw::{Draw, DrawSegmentOnImage},
    palette::ClassColorMap,
  },
};

pub const ANNOTATED_PREFIX: &str = "annotated_contours_";

#[derive(Error, Debug)]
pub enum AnnotateError {
  #[error("图像加载错误 {0}: {1}")]
  ImageLoadError(PathBuf, String),
  #[error("{0}")]
  ModelLoadError(ProviderError),
  #[error("{0}")]
  InferenceError(ProviderError),
  #[error("写入错误 {0}: {1}")]
  WriteError(PathBuf, String),
}

impl From<ProviderError> for AnnotateError {
  fn from(err: ProviderError) -> Self {
    match err {
      ProviderError::ModelLoad(_) => AnnotateError::ModelLoadError(err),
      ProviderError::Inference(_) => AnnotateError::InferenceError(err),
    }
  }
}

/// 读取并解码源图像为 8 位 RGB
pub fn load_source_image(path: &Path) -> Result<SourceImage, AnnotateError> {
  let image = ImageReader::open(path)
    .map_err(|e| AnnotateError::ImageLoadError(path.to_path_buf(), e.to_string()))?
    .with_guessed_format()
    .map_err(|e| AnnotateError::ImageLoadError(path.to_path_buf(), e.to_string()))?
    .decode()
    .map_err(|e| AnnotateError::ImageLoadError(path.to_path_buf(), e.to_string()))?;

  Ok(SourceImage::new(path, image.to_rgb8()))
}

/// 标注图像的文件名保留完整的源文件名，统一保存为 PNG。
/// 源文件已是 `.png` 时不再追加扩展名，`scan.jpg` 则得到 `annotated_contours_scan.jpg.png`。
pub fn annotated_file_name(source: &Path) -> String {
  let name = source
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_default();
  if name.ends_with(".png") {
    format!("{}{}", ANNOTATED_PREFIX, name)
  } else {
    format!("{}{}.png", ANNOTATED_PREFIX, name)
  }
}

pub struct Annotator {
  draw: Draw,
}

impl Default for Annotator {
  fn default() -> Self {
    Self {
      draw: Draw::default(),
    }
  }
}

impl Annotator {
  pub fn new(colors: ClassColorMap) -> Self {
    Self {
      draw: Draw::new(colors),
    }
  }

  pub fn colors(&self) -> &ClassColorMap {
    self.draw.colors()
  }

  /// 在源图像副本上绘制全部实例的轮廓，写入 `output_dir` 并返回路径。
  /// `output_dir` 必须已经存在。
  pub fn annotate(
    &self,
    source: &SourceImage,
    result: &SegmentResult,
    output_dir: &Path,
  ) -> Result<PathBuf, AnnotateError> {
    let mut image = source.image.clone();

    if result.is_empty() {
      warn!(
        "图像 {} 的结果中没有分割掩码，模型可能不是分割模型或没有检测到目标",
        source.file_name()
      );
    } else {
      let passes = self.draw.draw_segments_on_image(&mut image, result);
      info!("图像 {} 绘制了 {} 个实例", source.file_name(), passes);
    }

    let path = output_dir.join(annotated_file_name(&source.path));
    if !output_dir.is_dir() {
      return Err(AnnotateError::WriteError(
        path,
        "输出目录不存在".to_string(),
      ));
    }

    image
      .save_with_format(&path, ImageFormat::Png)
      .map_err(|e| AnnotateError::WriteError(path.clone(), e.to_string()))?;

    info!("标注图像已保存: {}", path.display());
    Ok(path)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn output_name_keeps_source_extension() {
    assert_eq!(
      annotated_file_name(Path::new("/a/b/scan 01.jpg")),
      "annotated_contours_scan 01.jpg.png"
    );
    assert_eq!(
      annotated_file_name(Path::new("x.webp")),
      "annotated_contours_x.webp.png"
    );
    assert_eq!(
      annotated_file_name(Path::new("x.png")),
      "annotated_contours_x.png"
    );
    assert_eq!(
      annotated_file_name(Path::new("x.PNG")),
      "annotated_contours_x.PNG.png"
    );
  }

  #[test]
  fn same_stem_different_format_do_not_collide() {
    assert_ne!(
      annotated_file_name(Path::new("scan.png")),
      annotated_file_name(Path::new("scan.jpg"))
    );
  }

  #[test]
  fn provider_errors_keep_their_kind() {
    assert!(matches!(
      AnnotateError::from(ProviderError::ModelLoad("best.pt".into())),
      AnnotateError::ModelLoadError(_)
    ));
    assert!(matches!(
      AnnotateError::from(ProviderError::Inference("cuda".into())),
      AnnotateError::InferenceError(_)
    ));
  }

  #[test]
  fn corrupt_image_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"not a png").unwrap();
    assert!(matches!(
      load_source_image(&path),
      Err(AnnotateError::ImageLoadError(..))
    ));
    assert!(matches!(
      load_source_image(&dir.path().join("missing.png")),
      Err(AnnotateError::ImageLoadError(..))
    ));
  }

  #[test]
  fn missing_output_dir_is_write_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = SourceImage::new("a.png", image::RgbImage::new(3, 3));
    let result = Annotator::default().annotate(
      &source,
      &SegmentResult::default(),
      &dir.path().join("nope"),
    );
    assert!(matches!(result, Err(AnnotateError::WriteError(..))));
  }
}
