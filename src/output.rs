// 该文件是 Yanhou （咽喉轮廓） 项目的一部分。
// src/output.rs - 输出定义
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

use std::path::PathBuf;

use thiserror::Error;

pub mod draw;
pub mod palette;

mod annotate;
pub use self::annotate::{
  ANNOTATED_PREFIX, AnnotateError, Annotator, annotated_file_name, load_source_image,
};

mod run_directory;
pub use self::run_directory::{OutputPolicy, RunDirectory};

#[cfg(feature = "zip_archive")]
mod package_zip;
#[cfg(feature = "zip_archive")]
pub use self::package_zip::package_zip;

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[cfg(feature = "zip_archive")]
  #[error("zip 错误: {0}")]
  ZipError(#[from] zip::result::ZipError),
  #[error("文件 {0} 不在输出目录 {1} 之下")]
  OutsideRoot(PathBuf, PathBuf),
  #[error("输入 {0} 位于输出目录 {1} 之内")]
  InputInsideOutput(PathBuf, PathBuf),
  #[error("无法在 {0} 下创建新的运行目录")]
  RunDirectoryExhausted(PathBuf),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}
