// 该文件是 Gezi （格子） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;
use url::Url;

/// Gezi 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 解码器配置，标签文件路径加可选参数
  /// 例如: gridbox:///models/labels.txt?threshold=0.5&config=/models/model.toml
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 原图，例如 image:///photos/wine.jpg
  #[arg(long, value_name = "IMAGE")]
  pub image: Url,

  /// 模型原始输出张量
  /// - 二进制小端 f32: tensor:///out/wine.bin
  /// - JSON 数组: tensor:///out/wine.json
  #[arg(long, value_name = "TENSOR")]
  pub tensor: Url,

  /// 输出路径，可重复
  /// - 图片: image:///out/wine.png?font=/fonts/DejaVuSans.ttf
  /// - 记录: json:///out/wine.json
  #[arg(long, value_name = "OUTPUT")]
  pub output: Vec<Url>,

  /// 概率阈值 (0.0 - 1.0)，覆盖 URL 中的 threshold
  #[arg(long, value_name = "THRESHOLD")]
  pub threshold: Option<f32>,
}
