// 该文件是 Yanhou （咽喉轮廓） 项目的一部分。
// src/bin/annotate_oneshot.rs - 单张图像标注
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

use anyhow::{Result, bail};
use clap::Parser;
use tracing::info;
use url::Url;

use yanhou::{
  FromUrl,
  input::InputSource,
  model::{PrecomputedMasks, Thresholds},
  output::{Annotator, palette::ClassColorMap},
  task::{OneShotTask, Task},
};

/// 单张图像轮廓标注
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型来源，例如 masks:///data/manifest.json
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入图像（路径或 image:// URL）
  #[arg(long, value_name = "SOURCE")]
  pub input: String,
  /// 标注图像输出目录
  #[arg(long, value_name = "DIR", default_value = "annotated_images")]
  pub output: PathBuf,
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
  info!("置信度阈值: {}, IoU 阈值: {}", args.confidence, args.iou);

  let image = match InputSource::parse(&args.input)? {
    InputSource::Image(path) => path,
    other => bail!("单张标注只接受图像文件, 实际为 {:?}", other),
  };

  let provider = PrecomputedMasks::from_url(&args.model)?;
  let colors = match &args.colors {
    Some(path) => ClassColorMap::from_json_file(path)?,
    None => ClassColorMap::default(),
  };
  let annotator = Annotator::new(colors);

  std::fs::create_dir_all(&args.output)?;

  let task = OneShotTask {
    weights: provider.weights(),
    thresholds: Thresholds {
      confidence: args.confidence,
      iou: args.iou,
    },
    annotator: &annotator,
    output_dir: &args.output,
  };

  match task.run_task(image.as_path(), &provider) {
    Some(path) => {
      info!("标注图像: {}", path.display());
      println!("{}", path.display());
      Ok(())
    }
    None => bail!("图像 {} 未能生成标注结果", image.display()),
  }
}
