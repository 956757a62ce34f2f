// 该文件是 Gezi （格子） 项目的一部分。
// src/model.rs - 模型输出后处理
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

use serde::Serialize;

pub mod activation;
pub mod geometry;
mod grid_box;
mod labels;

pub use self::geometry::{
  AnchorBox, BoundingBoxDimensions, BoundingBoxPrediction, GeometryError, Grid, ModelGeometry,
  rescale_to_original,
};
pub use self::grid_box::{
  DEFAULT_PROBABILITY_THRESHOLD, DecodeError, GridBoxDecoder, GridBoxDecoderBuilder, GridBoxError,
  decode, select_best,
};
pub use self::labels::{LabelError, LabelVocabulary};

/// 把推理得到的原始输出转换为检测结果
pub trait Model {
  type Input;
  type Output;
  type Error;

  fn postprocess(&self, output: &Self::Input) -> Result<Self::Output, Self::Error>;

  /// 模型输入分辨率 (宽, 高)
  fn input_size(&self) -> (u32, u32);
}

/// 一个检测框
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedBox {
  pub dimensions: BoundingBoxDimensions,
  pub confidence: f32,
  pub label: String,
  pub description: String,
}

impl DetectedBox {
  pub fn new(dimensions: BoundingBoxDimensions, confidence: f32, label: impl Into<String>) -> Self {
    let label = label.into();
    let description = format!("{} ({:.0}%)", label, confidence * 100.0);
    Self {
      dimensions,
      confidence,
      label,
      description,
    }
  }

  /// 缩放到原图坐标，见 [`rescale_to_original`]
  pub fn rescaled(&self, model_size: (u32, u32), original_size: (u32, u32)) -> Self {
    let dimensions = rescale_to_original(
      &self.dimensions,
      model_size.0 as f32,
      model_size.1 as f32,
      original_size.0 as f32,
      original_size.1 as f32,
    );
    Self {
      dimensions,
      ..self.clone()
    }
  }
}

/// 阈值过滤后的全部候选框
#[derive(Debug, Clone, Default)]
pub struct DetectResult {
  pub items: Box<[DetectedBox]>,
}

impl DetectResult {
  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  /// 置信度最高的一个，候选不足两个时为 `None`
  pub fn best(&self) -> Option<&DetectedBox> {
    select_best(&self.items)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn description_shows_percentage() {
    let item = DetectedBox::new(BoundingBoxDimensions::default(), 0.876, "merlot");
    assert_eq!(item.description, "merlot (88%)");
  }

  #[test]
  fn rescaled_keeps_label_and_confidence() {
    let item = DetectedBox::new(
      BoundingBoxDimensions {
        x: 208.0,
        y: 104.0,
        width: 104.0,
        height: 52.0,
      },
      0.9,
      "rose",
    );
    let rescaled = item.rescaled((416, 416), (832, 832));
    assert_eq!(rescaled.label, "rose");
    assert_eq!(rescaled.confidence, 0.9);
    assert_eq!(rescaled.description, item.description);
    assert_eq!(rescaled.dimensions.x, 416.0);
    assert_eq!(rescaled.dimensions.y, 208.0);
    assert_eq!(rescaled.dimensions.width, 208.0);
    assert_eq!(rescaled.dimensions.height, 104.0);
  }
}
