// 该文件是 Yanhou （咽喉轮廓） 项目的一部分。
// src/bin/annotate_batch.rs - 压缩包/目录批量标注
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

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use url::Url;

use yanhou::{
  FromUrl,
  input::InputSource,
  model::{PrecomputedMasks, Thresholds},
  output::{Annotator, OutputPolicy, RunDirectory, package_zip, palette::ClassColorMap},
  task::{BatchTask, Task},
};

/// 批量轮廓标注
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型来源，例如 masks:///data/manifest.json
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入来源（zip 压缩包、目录，或 zip:// / folder:// URL）
  #[arg(long, value_name = "SOURCE")]
  pub input: String,
  /// 标注图像输出根目录
  #[arg(long, value_name = "DIR", default_value = "uploaded_data/annotated_images")]
  pub output: PathBuf,
  /// 压缩包解压目录，每次运行前清空
  #[arg(long, value_name = "DIR", default_value = "uploaded_data/extracted_content")]
  pub extract_dir: PathBuf,
  /// 将标注结果打包为该 zip 文件
  #[arg(long, value_name = "FILE")]
  pub zip: Option<PathBuf>,
  /// 每次运行写入新的子目录，而不是清空输出目录
  #[arg(long)]
  pub fresh_run: bool,
  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.25", value_name = "THRESHOLD")]
  pub confidence: f32,
  /// IoU 阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.45", value_name = "THRESHOLD")]
  pub iou: f32,
  /// JSON 颜色表，缺省使用内置的解剖结构配色
  #[arg(long, value_name = "FILE")]
  pub colors: Option<PathBuf>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型来源: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出目录: {}", args.output.display());

  let provider = PrecomputedMasks::from_url(&args.model)?;
  let colors = match &args.colors {
    Some(path) => ClassColorMap::from_json_file(path)?,
    None => ClassColorMap::default(),
  };

  let discovered = InputSource::parse(&args.input)?
    .collect_excluding(&args.extract_dir, Some(&args.output))?;
  if discovered.images.is_empty() {
    warn!("没有找到任何有效的图像文件");
    return Ok(());
  }

  let policy = if args.fresh_run {
    OutputPolicy::FreshRun
  } else {
    OutputPolicy::Clear
  };

  let task = BatchTask {
    weights: provider.weights().to_path_buf(),
    thresholds: Thresholds {
      confidence: args.confidence,
      iou: args.iou,
    },
    annotator: Annotator::new(colors),
    output: RunDirectory::new(&args.output, policy),
  };

  let report = task.run_task(&discovered, &provider)?;

  for failure in &report.failures {
    warn!("失败: {} ({})", failure.image.display(), failure.reason);
  }
  println!(
    "标注完成: {} 张图像中成功 {} 张",
    report.total,
    report.succeeded()
  );

  match &args.zip {
    Some(zip_path) if !report.annotated.is_empty() => {
      package_zip(&report.annotated, &report.run_dir, zip_path)?;
      println!("{}", zip_path.display());
    }
    Some(_) => warn!("没有成功标注的图像，不生成压缩包"),
    None => {}
  }

  Ok(())
}
