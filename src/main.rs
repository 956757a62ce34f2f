// 该文件是 Gezi （格子） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use gezi::{
  FromUrl,
  input::FrameInput,
  model::GridBoxDecoderBuilder,
  output::OutputWrapper,
  task::{OneShotTask, Outcome, Task},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("解码器配置: {}", args.model);
  info!("原图: {}", args.image);
  info!("输出张量: {}", args.tensor);
  for output in &args.output {
    info!("输出路径: {}", output);
  }

  let mut builder = GridBoxDecoderBuilder::from_url(&args.model)?;
  if let Some(threshold) = args.threshold {
    builder = builder.probability_threshold(threshold);
  }
  let model = builder.build()?;

  let input = FrameInput::from_urls(&args.image, &args.tensor)?;
  let output = args
    .output
    .iter()
    .map(OutputWrapper::from_url)
    .collect::<Result<Vec<_>, _>>()?;

  match OneShotTask.run_task(input, model, output)? {
    Outcome::Detected(detection) => println!("{}", detection.description),
    Outcome::NoDetection => println!("No prediction for image"),
  }

  Ok(())
}
