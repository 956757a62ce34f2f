// 该文件是 Gezi （格子） 项目的一部分。
// src/bin/benchmark_repeatshot.rs - 重复解码测速
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

use anyhow::Result;
use clap::Parser;
use url::Url;

use gezi::{
  FromUrl,
  input::FrameInput,
  model::GridBoxDecoderBuilder,
  output::OutputWrapper,
  task::{RepeatShotTask, Task},
};
use tracing::info;

/// Gezi 解码测速参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 解码器配置
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 原图
  #[arg(long, value_name = "IMAGE")]
  pub image: Url,
  /// 模型原始输出张量
  #[arg(long, value_name = "TENSOR")]
  pub tensor: Url,
  /// 输出路径（可选，可重复）
  #[arg(long, value_name = "OUTPUT")]
  pub output: Vec<Url>,
  /// 重复次数
  #[arg(long, default_value = "1000", value_name = "COUNT")]
  pub times: usize,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("解码器配置: {}", args.model);
  info!("原图: {}", args.image);
  info!("输出张量: {}", args.tensor);
  info!("重复次数: {}", args.times);

  let model = GridBoxDecoderBuilder::from_url(&args.model)?.build()?;
  let input = FrameInput::from_urls(&args.image, &args.tensor)?;
  let output = args
    .output
    .iter()
    .map(OutputWrapper::from_url)
    .collect::<Result<Vec<_>, _>>()?;

  RepeatShotTask::default()
    .with_times(args.times)
    .run_task(input, model, output)?;

  Ok(())
}
