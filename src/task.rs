// 该文件是 Yanhou （咽喉轮廓） 项目的一部分。
// src/task.rs - 单张与批量标注任务
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
  collections::HashSet,
  fmt,
  path::{Path, PathBuf},
};

use tracing::{error, info, warn};

use crate::{
  input::DiscoveredImages,
  model::{Provider, SourceImage, Thresholds},
  output::{
    AnnotateError, Annotator, OutputError, RunDirectory, annotated_file_name, load_source_image,
  },
};

pub trait Task<I, P>: Sized {
  type Output;
  fn run_task(self, input: I, provider: P) -> Self::Output;
}

/// 加载图像、调用模型并保存标注结果，错误原样返回
pub fn try_run_detection<P: Provider>(
  provider: &P,
  image_path: &Path,
  weights: &Path,
  thresholds: &Thresholds,
  annotator: &Annotator,
  output_dir: &Path,
) -> Result<PathBuf, AnnotateError> {
  let source = load_source_image(image_path)?;
  annotate_source(provider, &source, weights, thresholds, annotator, output_dir)
}

/// 对已加载的图像调用模型并保存标注结果
pub fn annotate_source<P: Provider>(
  provider: &P,
  source: &SourceImage,
  weights: &Path,
  thresholds: &Thresholds,
  annotator: &Annotator,
  output_dir: &Path,
) -> Result<PathBuf, AnnotateError> {
  info!("处理图像: {}", source.file_name());

  let now = std::time::Instant::now();
  let result = provider.predict(source, weights, thresholds)?;
  info!(
    "推理完成，耗时: {:.2?}，实例数: {}",
    now.elapsed(),
    result.len()
  );

  annotator.annotate(source, &result, output_dir)
}

/// 与 `try_run_detection` 相同，但任何错误都只记录日志并返回 `None`
pub fn run_detection<P: Provider>(
  provider: &P,
  image_path: &Path,
  weights: &Path,
  thresholds: &Thresholds,
  annotator: &Annotator,
  output_dir: &Path,
) -> Option<PathBuf> {
  match try_run_detection(provider, image_path, weights, thresholds, annotator, output_dir) {
    Ok(path) => Some(path),
    Err(e) => {
      error!("图像 {} 标注失败: {}", image_path.display(), e);
      None
    }
  }
}

pub struct OneShotTask<'a> {
  pub weights: &'a Path,
  pub thresholds: Thresholds,
  pub annotator: &'a Annotator,
  pub output_dir: &'a Path,
}

impl<'p, P: Provider> Task<&'p Path, P> for OneShotTask<'_> {
  type Output = Option<PathBuf>;

  fn run_task(self, input: &'p Path, provider: P) -> Self::Output {
    run_detection(
      &provider,
      input,
      self.weights,
      &self.thresholds,
      self.annotator,
      self.output_dir,
    )
  }
}

#[derive(Debug, Clone)]
pub struct Failure {
  pub image: PathBuf,
  pub reason: String,
}

#[derive(Debug, Clone)]
pub struct BatchReport {
  pub run_dir: PathBuf,
  pub total: usize,
  pub annotated: Vec<PathBuf>,
  pub failures: Vec<Failure>,
}

impl BatchReport {
  pub fn succeeded(&self) -> usize {
    self.annotated.len()
  }
}

impl fmt::Display for BatchReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.succeeded(), self.total)
  }
}

pub struct BatchTask {
  pub weights: PathBuf,
  pub thresholds: Thresholds,
  pub annotator: Annotator,
  pub output: RunDirectory,
}

impl BatchTask {
  fn annotate_one<P: Provider>(
    &self,
    provider: &P,
    input: &DiscoveredImages,
    image: &Path,
    output_dir: &Path,
  ) -> Result<PathBuf, AnnotateError> {
    let source = load_source_image(image)?.with_relative(input.relative_path(image));
    std::fs::create_dir_all(output_dir)
      .map_err(|e| AnnotateError::WriteError(output_dir.to_path_buf(), e.to_string()))?;
    annotate_source(
      provider,
      &source,
      &self.weights,
      &self.thresholds,
      &self.annotator,
      output_dir,
    )
  }

  /// 输入位于输出目录之内时，准备输出目录可能删除或重复读取输入
  fn check_input(&self, input: &DiscoveredImages) -> Result<(), OutputError> {
    let inside = input
      .root
      .iter()
      .chain(input.images.iter())
      .find(|path| self.output.contains(path));
    match inside {
      Some(path) => {
        error!(
          "输入 {} 位于输出目录 {} 之内，拒绝处理",
          path.display(),
          self.output.root().display()
        );
        Err(OutputError::InputInsideOutput(
          path.clone(),
          self.output.root().to_path_buf(),
        ))
      }
      None => Ok(()),
    }
  }
}

impl<'i, P: Provider> Task<&'i DiscoveredImages, P> for BatchTask {
  type Output = Result<BatchReport, OutputError>;

  fn run_task(self, input: &'i DiscoveredImages, provider: P) -> Self::Output {
    self.check_input(input)?;
    let run_dir = self.output.prepare()?;
    let total = input.images.len();
    info!("开始批量标注，共 {} 张图像", total);

    let mut report = BatchReport {
      run_dir: run_dir.clone(),
      total,
      annotated: Vec::with_capacity(total),
      failures: Vec::new(),
    };

    let mut claimed = HashSet::with_capacity(total);
    for (index, image) in input.images.iter().enumerate() {
      info!("处理第 {}/{} 张图像: {}", index + 1, total, image.display());
      let output_dir = run_dir.join(input.relative_parent(image));

      let target = output_dir.join(annotated_file_name(image));
      if claimed.contains(&target) {
        error!("图像 {} 的输出 {} 已被本批次占用", image.display(), target.display());
        report.failures.push(Failure {
          image: image.clone(),
          reason: format!("输出文件名冲突: {}", target.display()),
        });
        continue;
      }

      match self.annotate_one(&provider, input, image, &output_dir) {
        Ok(path) => {
          claimed.insert(path.clone());
          report.annotated.push(path);
        }
        Err(e) => {
          error!("图像 {} 标注失败: {}", image.display(), e);
          report.failures.push(Failure {
            image: image.clone(),
            reason: e.to_string(),
          });
        }
      }
    }

    if report.failures.is_empty() {
      info!("批量标注完成: {}", report);
    } else {
      warn!(
        "批量标注完成: {}，失败 {} 张",
        report,
        report.failures.len()
      );
    }

    Ok(report)
  }
}
