// 该文件是 Gezi （格子） 项目的一部分。
// src/output/draw.rs - 检测结果可视化
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

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_hollow_rect_mut, draw_text_mut},
  rect::Rect,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::model::DetectedBox;

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 30.0;
const LABEL_OFFSET: i32 = 5; // 文本相对框左上角的偏移
const BOX_THICKNESS: i32 = 3;
const BOX_COLOR: [u8; 3] = [255, 0, 0]; // 红色

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体无效: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// 在原图上画出检测框；配置了字体时在框内左上角写上描述
pub struct Draw {
  font: Option<FontVec>,
  font_size: f32,
  thickness: i32,
  color: [u8; 3],
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      font: None,
      font_size: LABEL_FONT_SIZE,
      thickness: BOX_THICKNESS,
      color: BOX_COLOR,
    }
  }
}

impl Draw {
  pub fn with_font(mut self, font: FontVec) -> Self {
    self.font = Some(font);
    self
  }

  pub fn with_font_file(self, path: impl AsRef<Path>) -> Result<Self, DrawError> {
    let path = path.as_ref();
    info!("加载字体文件: {}", path.display());
    let data = std::fs::read(path)?;
    let font = FontVec::try_from_vec(data)?;
    Ok(self.with_font(font))
  }

  pub fn font_size(mut self, font_size: f32) -> Self {
    self.font_size = font_size;
    self
  }

  pub fn color(mut self, color: [u8; 3]) -> Self {
    self.color = color;
    self
  }

  /// `detection` 必须已经在原图坐标系中
  pub fn draw_detection(&self, image: &mut RgbImage, detection: &DetectedBox) {
    let dims = &detection.dimensions;
    let x = dims.x.floor() as i32;
    let y = dims.y.floor() as i32;
    let width = dims.width.round() as i32;
    let height = dims.height.round() as i32;
    let color = Rgb(self.color);

    debug!(
      "绘制检测框 {} at ({}, {}, {}x{})",
      detection.description, x, y, width, height
    );

    // 向内加粗
    for t in 0..self.thickness {
      let w = width - 2 * t;
      let h = height - 2 * t;
      if w <= 0 || h <= 0 {
        break;
      }
      let rect = Rect::at(x + t, y + t).of_size(w as u32, h as u32);
      draw_hollow_rect_mut(image, rect, color);
    }

    if let Some(font) = &self.font {
      draw_text_mut(
        image,
        color,
        x + LABEL_OFFSET,
        y + LABEL_OFFSET,
        PxScale::from(self.font_size),
        font,
        &detection.description,
      );
    }
  }
}
