// 该文件是 Gezi （格子） 项目的一部分。
// src/model/geometry.rs - 网格、锚框与坐标变换
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

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::model::activation::sigmoid;

pub const DEFAULT_INPUT_WIDTH: u32 = 416;
pub const DEFAULT_INPUT_HEIGHT: u32 = 416;
pub const DEFAULT_GRID_ROWS: usize = 13;
pub const DEFAULT_GRID_COLUMNS: usize = 13;

/// x, y, width, height, objectness
pub const FEATURES_PER_BOX: usize = 5;

pub const DEFAULT_ANCHORS: [AnchorBox; 5] = [
  AnchorBox::new(0.573, 0.677),
  AnchorBox::new(1.87, 2.06),
  AnchorBox::new(3.34, 5.47),
  AnchorBox::new(7.88, 3.53),
  AnchorBox::new(9.77, 9.17),
];

#[derive(Error, Debug)]
pub enum GeometryError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("配置解析错误: {0}")]
  TomlError(#[from] toml::de::Error),
  #[error("几何配置无效: {0}")]
  Invalid(String),
}

/// 输出张量的空间网格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
  pub rows: usize,
  pub columns: usize,
}

impl Default for Grid {
  fn default() -> Self {
    Grid::new(DEFAULT_GRID_ROWS, DEFAULT_GRID_COLUMNS)
  }
}

impl Grid {
  pub const fn new(rows: usize, columns: usize) -> Self {
    Self { rows, columns }
  }

  pub fn cells(&self) -> usize {
    self.rows * self.columns
  }

  pub fn channel_stride(&self) -> usize {
    self.cells()
  }

  /// 张量 `[channels, rows, columns]` 中 (row, column, channel) 的扁平下标
  ///
  /// 列乘以 `columns` 而不是 `rows`，这与导出模型的布局一致；
  /// 只有 `rows == columns` 时才是双射。
  pub fn offset(&self, row: usize, column: usize, channel: usize) -> usize {
    channel * self.channel_stride() + column * self.columns + row
  }
}

/// 锚框先验（以网格单元为单位的宽高比例）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorBox {
  pub width_ratio: f32,
  pub height_ratio: f32,
}

impl AnchorBox {
  pub const fn new(width_ratio: f32, height_ratio: f32) -> Self {
    Self {
      width_ratio,
      height_ratio,
    }
  }
}

/// 模型输入分辨率、输出网格和锚框
///
/// 可以从 TOML 读取，缺失的字段取默认的 416x416 / 13x13 / 5 锚框配置：
///
/// ```toml
/// input_width = 416
/// input_height = 416
///
/// [grid]
/// rows = 13
/// columns = 13
///
/// [[anchors]]
/// width_ratio = 0.573
/// height_ratio = 0.677
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelGeometry {
  pub input_width: u32,
  pub input_height: u32,
  pub grid: Grid,
  pub anchors: Vec<AnchorBox>,
}

impl Default for ModelGeometry {
  fn default() -> Self {
    Self {
      input_width: DEFAULT_INPUT_WIDTH,
      input_height: DEFAULT_INPUT_HEIGHT,
      grid: Grid::default(),
      anchors: DEFAULT_ANCHORS.to_vec(),
    }
  }
}

impl ModelGeometry {
  pub fn from_toml_str(content: &str) -> Result<Self, GeometryError> {
    let geometry: ModelGeometry = toml::from_str(content)?;
    geometry.validate()?;
    Ok(geometry)
  }

  pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, GeometryError> {
    let path = path.as_ref();
    info!("加载模型几何配置: {}", path.display());
    let content = std::fs::read_to_string(path)?;
    let geometry = Self::from_toml_str(&content)?;
    debug!("模型几何配置: {:?}", geometry);
    Ok(geometry)
  }

  pub fn validate(&self) -> Result<(), GeometryError> {
    if self.input_width == 0 || self.input_height == 0 {
      return Err(GeometryError::Invalid(format!(
        "输入分辨率必须为正数, 实际为 {}x{}",
        self.input_width, self.input_height
      )));
    }
    if self.grid.rows == 0 || self.grid.columns == 0 {
      return Err(GeometryError::Invalid(format!(
        "网格尺寸必须为正数, 实际为 {}x{}",
        self.grid.rows, self.grid.columns
      )));
    }
    if self.anchors.is_empty() {
      return Err(GeometryError::Invalid("锚框列表为空".to_string()));
    }
    Ok(())
  }

  pub fn cell_width(&self) -> f32 {
    self.input_width as f32 / self.grid.columns as f32
  }

  pub fn cell_height(&self) -> f32 {
    self.input_height as f32 / self.grid.rows as f32
  }

  /// 每个锚框占用的通道数
  pub fn anchor_stride(&self, num_classes: usize) -> usize {
    FEATURES_PER_BOX + num_classes
  }

  pub fn channels(&self, num_classes: usize) -> usize {
    self.anchors.len() * self.anchor_stride(num_classes)
  }

  /// 合法输出张量的元素个数
  pub fn tensor_len(&self, num_classes: usize) -> usize {
    self.grid.cells() * self.channels(num_classes)
  }

  pub fn input_size(&self) -> (u32, u32) {
    (self.input_width, self.input_height)
  }
}

/// 网络原始输出的一个框（未做网格/锚框映射）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBoxPrediction {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
  /// 已经过 sigmoid 的 objectness
  pub confidence: f32,
}

/// 左上角坐标与宽高
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBoxDimensions {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
}

/// 把原始预测映射到模型输入像素空间
///
/// 注意 `row` 决定 X、`column` 决定 Y，与张量布局配套，不要交换。
pub fn map_to_cell(
  geometry: &ModelGeometry,
  row: usize,
  column: usize,
  anchor: &AnchorBox,
  prediction: &BoundingBoxPrediction,
) -> BoundingBoxDimensions {
  let cell_width = geometry.cell_width();
  let cell_height = geometry.cell_height();

  let width = prediction.width.exp() * cell_width * anchor.width_ratio;
  let height = prediction.height.exp() * cell_height * anchor.height_ratio;
  let center_x = (row as f32 + sigmoid(prediction.x)) * cell_width;
  let center_y = (column as f32 + sigmoid(prediction.y)) * cell_height;

  BoundingBoxDimensions {
    x: center_x - width / 2.0,
    y: center_y - height / 2.0,
    width,
    height,
  }
}

/// 把模型空间中的框缩放到原图尺寸
///
/// 裁剪在缩放之前进行，边界使用的是模型分辨率；
/// 模型与原图宽高比不同时，裁剪只是近似的。
pub fn rescale_to_original(
  dimensions: &BoundingBoxDimensions,
  model_width: f32,
  model_height: f32,
  original_width: f32,
  original_height: f32,
) -> BoundingBoxDimensions {
  let x = dimensions.x.max(0.0);
  let y = dimensions.y.max(0.0);
  let width = (model_width - x).min(dimensions.width);
  let height = (model_height - y).min(dimensions.height);

  let scale_x = original_width / model_width;
  let scale_y = original_height / model_height;

  BoundingBoxDimensions {
    x: x * scale_x,
    y: y * scale_y,
    width: width * scale_x,
    height: height * scale_y,
  }
}
