// 该文件是 Yanhou （咽喉轮廓） 项目的一部分。
// src/output/run_directory.rs - 批处理输出目录
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

use chrono::Utc;
use tracing::{info, warn};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, output::OutputError, url_file_path};

/// 每次批处理前如何准备输出目录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputPolicy {
  /// 清空整个输出目录后写入，同一目录不能同时运行多个批处理
  #[default]
  Clear,
  /// 在输出目录下新建唯一命名的子目录，不删除任何旧文件
  FreshRun,
}

#[derive(Debug, Clone)]
pub struct RunDirectory {
  root: PathBuf,
  policy: OutputPolicy,
}

impl FromUrlWithScheme for RunDirectory {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for RunDirectory {
  type Error = OutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(OutputError::SchemeMismatch);
    }

    let policy = if uri.query_pairs().any(|(k, _)| k == "fresh") {
      OutputPolicy::FreshRun
    } else {
      OutputPolicy::Clear
    };

    Ok(RunDirectory {
      root: url_file_path(uri),
      policy,
    })
  }
}

impl RunDirectory {
  pub fn new(root: impl Into<PathBuf>, policy: OutputPolicy) -> Self {
    Self {
      root: root.into(),
      policy,
    }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn policy(&self) -> OutputPolicy {
    self.policy
  }

  /// `path` 是否位于输出根目录之内（含根目录本身）；输出根目录尚不存在时总为 `false`
  pub fn contains(&self, path: &Path) -> bool {
    let Ok(root) = self.root.canonicalize() else {
      return false;
    };
    path
      .canonicalize()
      .is_ok_and(|path| path.starts_with(&root))
  }

  /// 按策略准备本次运行的目录并返回其路径
  pub fn prepare(&self) -> Result<PathBuf, OutputError> {
    match self.policy {
      OutputPolicy::Clear => {
        if self.root.exists() {
          warn!("清空输出目录: {}", self.root.display());
          std::fs::remove_dir_all(&self.root)?;
        }
        std::fs::create_dir_all(&self.root)?;
        Ok(self.root.clone())
      }
      OutputPolicy::FreshRun => {
        std::fs::create_dir_all(&self.root)?;
        let stamp = Utc::now().format("%Y%m%d-%H%M%S");
        for counter in 0..=u16::MAX {
          let directory = self.root.join(format!("run-{}-{:04X}", stamp, counter));
          match std::fs::create_dir(&directory) {
            Ok(()) => {
              info!("本次运行输出目录: {}", directory.display());
              return Ok(directory);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
          }
        }
        Err(OutputError::RunDirectoryExhausted(self.root.clone()))
      }
    }
  }
}
