// 该文件是 Yanhou （咽喉轮廓） 项目的一部分。
// src/input.rs - 图像/压缩包输入
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

use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;
use walkdir::WalkDir;

use crate::{FromUrl, url_file_path};

/// 批处理接受的图像扩展名（不区分大小写）
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

#[cfg(feature = "zip_archive")]
mod zip_archive;
#[cfg(feature = "zip_archive")]
pub use self::zip_archive::extract_zip;

#[derive(Error, Debug)]
pub enum InputError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("目录遍历错误: {0}")]
  WalkError(#[from] walkdir::Error),
  #[cfg(feature = "zip_archive")]
  #[error("zip 错误: {0}")]
  ZipError(#[from] zip::result::ZipError),
  #[error("不支持的输入: {0}")]
  Unsupported(String),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub fn is_image_file(path: &Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(|ext| {
      let ext = ext.to_ascii_lowercase();
      IMAGE_EXTENSIONS.contains(&ext.as_str())
    })
    .unwrap_or(false)
}

/// 递归查找目录下的全部图像文件，按路径排序
pub fn discover_images(root: &Path) -> Result<Vec<PathBuf>, InputError> {
  discover_images_excluding(root, None)
}

/// 与 `discover_images` 相同，但跳过位于 `root` 之内的 `excluded` 目录（例如输出目录）
pub fn discover_images_excluding(
  root: &Path,
  excluded: Option<&Path>,
) -> Result<Vec<PathBuf>, InputError> {
  let skipped = excluded.and_then(|excluded| nested_relative(root, excluded));
  if let Some(skipped) = &skipped {
    debug!("遍历 {} 时跳过 {}", root.display(), skipped.display());
  }

  let mut images = Vec::new();
  let walker = WalkDir::new(root).sort_by_file_name().into_iter();
  for entry in walker.filter_entry(|entry| {
    skipped
      .as_deref()
      .is_none_or(|skipped| entry.path().strip_prefix(root).ok() != Some(skipped))
  }) {
    let entry = entry?;
    if entry.file_type().is_file() && is_image_file(entry.path()) {
      images.push(entry.into_path());
    }
  }
  info!("在 {} 中找到 {} 张图像", root.display(), images.len());
  Ok(images)
}

/// `inner` 严格位于 `root` 之内时返回其相对路径，两者都必须已存在
fn nested_relative(root: &Path, inner: &Path) -> Option<PathBuf> {
  let root = root.canonicalize().ok()?;
  let inner = inner.canonicalize().ok()?;
  inner
    .strip_prefix(&root)
    .ok()
    .filter(|relative| !relative.as_os_str().is_empty())
    .map(Path::to_path_buf)
}

/// 待处理的图像列表；`root` 存在时输出保留相对它的子目录结构
#[derive(Debug, Clone, Default)]
pub struct DiscoveredImages {
  pub root: Option<PathBuf>,
  pub images: Vec<PathBuf>,
}

impl DiscoveredImages {
  /// 图像相对 `root` 的路径，没有 `root` 时为 `None`
  pub fn relative_path(&self, image: &Path) -> Option<PathBuf> {
    self
      .root
      .as_deref()
      .and_then(|root| image.strip_prefix(root).ok())
      .map(Path::to_path_buf)
  }

  pub fn relative_parent(&self, image: &Path) -> PathBuf {
    self
      .relative_path(image)
      .and_then(|relative| relative.parent().map(Path::to_path_buf))
      .unwrap_or_default()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
  Image(PathBuf),
  Directory(PathBuf),
  #[cfg(feature = "zip_archive")]
  Zip(PathBuf),
}

impl FromUrl for InputSource {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    let path = url_file_path(url);
    match url.scheme() {
      "image" => Ok(InputSource::Image(path)),
      "folder" => Ok(InputSource::Directory(path)),
      #[cfg(feature = "zip_archive")]
      "zip" => Ok(InputSource::Zip(path)),
      other => {
        error!("不支持的输入方案: '{}'", other);
        Err(InputError::SchemeMismatch)
      }
    }
  }
}

impl InputSource {
  /// 按扩展名或目录判断输入类型
  pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, InputError> {
    let path = path.into();
    if path.is_dir() {
      return Ok(InputSource::Directory(path));
    }
    let is_zip = path
      .extension()
      .and_then(|ext| ext.to_str())
      .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
    if is_zip {
      #[cfg(feature = "zip_archive")]
      return Ok(InputSource::Zip(path));
      #[cfg(not(feature = "zip_archive"))]
      return Err(InputError::Unsupported(path.display().to_string()));
    }
    Ok(InputSource::Image(path))
  }

  /// 命令行参数既可以是 URL，也可以是普通路径
  pub fn parse(input: &str) -> Result<Self, InputError> {
    match Url::parse(input) {
      Ok(url) if url.scheme().len() > 1 => Self::from_url(&url),
      _ => Self::from_path(input),
    }
  }

  /// 列出待处理的图像，压缩包会先解压到 `extract_dir`
  pub fn collect(&self, extract_dir: &Path) -> Result<DiscoveredImages, InputError> {
    self.collect_excluding(extract_dir, None)
  }

  /// 与 `collect` 相同，但目录输入时跳过 `excluded`（通常是输出目录）
  #[cfg_attr(not(feature = "zip_archive"), allow(unused_variables))]
  pub fn collect_excluding(
    &self,
    extract_dir: &Path,
    excluded: Option<&Path>,
  ) -> Result<DiscoveredImages, InputError> {
    match self {
      InputSource::Image(path) => Ok(DiscoveredImages {
        root: None,
        images: vec![path.clone()],
      }),
      InputSource::Directory(path) => Ok(DiscoveredImages {
        root: Some(path.clone()),
        images: discover_images_excluding(path, excluded)?,
      }),
      #[cfg(feature = "zip_archive")]
      InputSource::Zip(path) => {
        Ok(DiscoveredImages {
          root: Some(extract_dir.to_path_buf()),
          images: extract_zip(path, extract_dir)?,
        })
      }
    }
  }
}
