// 该文件是 Gezi （格子） 项目的一部分。
// src/lib.rs - 库主文件
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

//! Gezi（格子）：网格锚框检测器输出的解码。
//!
//! 模型输出一个形状为 `[channels, rows, columns]` 的张量，每个网格单元
//! 每个锚框占 `5 + 类别数` 个通道。[`model::GridBoxDecoder`] 把它解码为带标签的
//! 候选框，选出置信度最高的一个并缩放回原图坐标；输入与输出都用 URL 描述：
//!
//! - `gridbox://` 解码器（标签文件、阈值、几何配置）
//! - `image://`、`tensor://` 原图与模型输出
//! - `image://`、`json://` 标注图像与检测记录

pub mod frame;
pub mod input;
pub mod model;
pub mod output;
pub mod task;
pub mod utils;

use url::Url;

pub use crate::model::{DetectResult, DetectedBox, GridBoxDecoder, GridBoxDecoderBuilder};

/// 从 URL 构造输入、输出或解码器
pub trait FromUrl {
  type Error;
  fn from_url(url: &Url) -> Result<Self, Self::Error>
  where
    Self: Sized;
}

/// 只接受一种 URL 方案的 [`FromUrl`]
pub trait FromUrlWithScheme: FromUrl {
  const SCHEME: &'static str;

  fn accepts(url: &Url) -> bool {
    url.scheme() == Self::SCHEME
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_only_its_own_scheme() {
    let labels = Url::parse("gridbox:///models/labels.txt").unwrap();
    let tensor = Url::parse("tensor:///out/output.bin").unwrap();
    assert!(GridBoxDecoderBuilder::accepts(&labels));
    assert!(!GridBoxDecoderBuilder::accepts(&tensor));
    assert!(input::TensorFileInput::accepts(&tensor));
  }
}
