// 该文件是 Gezi （格子） 项目的一部分。
// src/frame.rs - 原图与原始输出张量
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

use image::RgbImage;

/// 模型输出的扁平 `f32` 张量，布局为 `[channels, rows, columns]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTensor {
  data: Box<[f32]>,
}

impl From<Vec<f32>> for RawTensor {
  fn from(data: Vec<f32>) -> Self {
    Self {
      data: data.into_boxed_slice(),
    }
  }
}

impl RawTensor {
  pub fn as_slice(&self) -> &[f32] {
    &self.data
  }

  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }
}

/// 一次检测的输入：原图及其对应的模型输出
#[derive(Debug, Clone)]
pub struct Frame {
  image: RgbImage,
  tensor: RawTensor,
}

impl Frame {
  pub fn new(image: RgbImage, tensor: RawTensor) -> Self {
    Self { image, tensor }
  }

  pub fn image(&self) -> &RgbImage {
    &self.image
  }

  pub fn tensor(&self) -> &RawTensor {
    &self.tensor
  }

  /// 原图尺寸 (宽, 高)
  pub fn original_size(&self) -> (u32, u32) {
    self.image.dimensions()
  }
}
