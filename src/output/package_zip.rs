// 该文件是 Yanhou （咽喉轮廓） 项目的一部分。
// src/output/package_zip.rs - 标注结果打包
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
  fs::File,
  io::{BufWriter, Write},
  path::{Path, PathBuf},
};

use tracing::{debug, info};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::output::OutputError;

/// 将标注图像打包为 zip，条目名为相对 `root` 的路径
pub fn package_zip(
  annotated: &[PathBuf],
  root: &Path,
  zip_path: &Path,
) -> Result<PathBuf, OutputError> {
  if let Some(parent) = zip_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)?;
  }

  let file = File::create(zip_path)?;
  let mut writer = ZipWriter::new(BufWriter::new(file));
  let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

  for path in annotated {
    let relative = path
      .strip_prefix(root)
      .map_err(|_| OutputError::OutsideRoot(path.clone(), root.to_path_buf()))?;
    // zip 条目统一使用 '/' 分隔
    let name = relative
      .components()
      .map(|c| c.as_os_str().to_string_lossy())
      .collect::<Vec<_>>()
      .join("/");

    debug!("打包 {}", name);
    writer.start_file(name, options)?;
    writer.write_all(&std::fs::read(path)?)?;
  }

  let mut inner = writer.finish()?;
  inner.flush()?;

  info!("已打包 {} 个标注图像到 {}", annotated.len(), zip_path.display());
  Ok(zip_path.to_path_buf())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn keeps_relative_paths() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("annotated");
    std::fs::create_dir_all(root.join("series_a")).unwrap();
    let a = root.join("annotated_contours_1.png");
    let b = root.join("series_a/annotated_contours_2.png");
    std::fs::write(&a, b"1").unwrap();
    std::fs::write(&b, b"2").unwrap();

    let zip_path = tmp.path().join("out/annotated_images.zip");
    package_zip(&[a, b], &root, &zip_path).unwrap();

    let mut archive = zip::ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
    assert_eq!(archive.len(), 2);
    assert!(archive.by_name("annotated_contours_1.png").is_ok());
    assert!(archive.by_name("series_a/annotated_contours_2.png").is_ok());
  }

  #[test]
  fn rejects_files_outside_root() {
    let tmp = tempfile::tempdir().unwrap();
    let outside = tmp.path().join("x.png");
    std::fs::write(&outside, b"x").unwrap();
    let result = package_zip(
      &[outside],
      &tmp.path().join("annotated"),
      &tmp.path().join("o.zip"),
    );
    assert!(matches!(result, Err(OutputError::OutsideRoot(..))));
  }
}
