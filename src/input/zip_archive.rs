// 该文件是 Yanhou （咽喉轮廓） 项目的一部分。
// src/input/zip_archive.rs - zip 压缩包输入
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
  io::BufReader,
  path::{Path, PathBuf},
};

use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::input::{InputError, discover_images};

/// 清空 `extract_dir` 后解压压缩包，返回其中的全部图像
pub fn extract_zip(archive: &Path, extract_dir: &Path) -> Result<Vec<PathBuf>, InputError> {
  if extract_dir.exists() {
    debug!("清空解压目录: {}", extract_dir.display());
    std::fs::remove_dir_all(extract_dir)?;
  }
  std::fs::create_dir_all(extract_dir)?;

  info!("解压 {} 到 {}", archive.display(), extract_dir.display());
  let file = File::open(archive)?;
  let mut zip = ZipArchive::new(BufReader::new(file))?;

  for index in 0..zip.len() {
    let mut entry = zip.by_index(index)?;
    let Some(relative) = entry.enclosed_name() else {
      warn!("跳过不安全的压缩包条目: {}", entry.name());
      continue;
    };
    let target = extract_dir.join(relative);

    if entry.is_dir() {
      std::fs::create_dir_all(&target)?;
      continue;
    }
    if let Some(parent) = target.parent() {
      std::fs::create_dir_all(parent)?;
    }
    let mut out = File::create(&target)?;
    std::io::copy(&mut entry, &mut out)?;
  }

  discover_images(extract_dir)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;
  use zip::{ZipWriter, write::SimpleFileOptions};

  fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    for (name, data) in entries {
      writer.start_file(*name, SimpleFileOptions::default()).unwrap();
      writer.write_all(data).unwrap();
    }
    writer.finish().unwrap();
  }

  #[test]
  fn extracts_nested_images_only() {
    let tmp = tempfile::tempdir().unwrap();
    let archive = tmp.path().join("batch.zip");
    write_zip(
      &archive,
      &[
        ("a.png", b"1"),
        ("series/b.JPEG", b"2"),
        ("series/deep/c.webp", b"3"),
        ("series/notes.txt", b"4"),
      ],
    );

    let extract_dir = tmp.path().join("extracted");
    let images = extract_zip(&archive, &extract_dir).unwrap();
    assert_eq!(images.len(), 3);
    assert!(extract_dir.join("series/notes.txt").exists());
    assert!(images.contains(&extract_dir.join("series/deep/c.webp")));
  }

  #[test]
  fn clears_previous_extraction() {
    let tmp = tempfile::tempdir().unwrap();
    let extract_dir = tmp.path().join("extracted");
    std::fs::create_dir_all(&extract_dir).unwrap();
    std::fs::write(extract_dir.join("stale.png"), b"old").unwrap();

    let archive = tmp.path().join("batch.zip");
    write_zip(&archive, &[("fresh.png", b"1")]);

    let images = extract_zip(&archive, &extract_dir).unwrap();
    assert_eq!(images, vec![extract_dir.join("fresh.png")]);
  }

  #[test]
  fn invalid_archive_is_error() {
    let tmp = tempfile::tempdir().unwrap();
    let archive = tmp.path().join("batch.zip");
    std::fs::write(&archive, b"not a zip").unwrap();
    assert!(matches!(
      extract_zip(&archive, &tmp.path().join("x")),
      Err(InputError::ZipError(_))
    ));
  }
}
