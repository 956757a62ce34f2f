// 该文件是 Gezi （格子） 项目的一部分。
// src/model/grid_box.rs - 网格锚框解码器
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

use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::RawTensor,
  model::{
    DetectResult, DetectedBox, Model,
    activation::{sigmoid, softmax_in_place},
    geometry::{
      BoundingBoxPrediction, FEATURES_PER_BOX, GeometryError, Grid, ModelGeometry, map_to_cell,
    },
    labels::{LabelError, LabelVocabulary},
  },
  utils::{query_value, url_path},
};

pub const DEFAULT_PROBABILITY_THRESHOLD: f32 = 0.5;

/// 解码输入不满足约束；全部在遍历网格之前检查
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
  #[error("张量长度不匹配: 期望 {expected}, 实际 {actual}")]
  TensorLength { expected: usize, actual: usize },
  #[error("标签表为空")]
  EmptyLabels,
  #[error("锚框列表为空")]
  EmptyAnchors,
  #[error("概率阈值必须在 [0, 1] 内, 实际为 {0}")]
  Threshold(f32),
  #[error("张量下标越界: {offset} >= {len}")]
  OffsetOutOfRange { offset: usize, len: usize },
}

#[inline]
fn read(tensor: &[f32], offset: usize) -> Result<f32, DecodeError> {
  tensor
    .get(offset)
    .copied()
    .ok_or(DecodeError::OffsetOutOfRange {
      offset,
      len: tensor.len(),
    })
}

fn extract_prediction(
  tensor: &[f32],
  grid: &Grid,
  row: usize,
  column: usize,
  channel: usize,
) -> Result<BoundingBoxPrediction, DecodeError> {
  Ok(BoundingBoxPrediction {
    x: read(tensor, grid.offset(row, column, channel))?,
    y: read(tensor, grid.offset(row, column, channel + 1))?,
    width: read(tensor, grid.offset(row, column, channel + 2))?,
    height: read(tensor, grid.offset(row, column, channel + 3))?,
    confidence: sigmoid(read(tensor, grid.offset(row, column, channel + 4))?),
  })
}

/// softmax 之后再乘以 objectness，结果写入 `scores`
fn extract_class_scores(
  tensor: &[f32],
  grid: &Grid,
  row: usize,
  column: usize,
  channel: usize,
  confidence: f32,
  scores: &mut [f32],
) -> Result<(), DecodeError> {
  let class_offset = channel + FEATURES_PER_BOX;
  for (class, score) in scores.iter_mut().enumerate() {
    *score = read(tensor, grid.offset(row, column, class_offset + class))?;
  }
  softmax_in_place(scores);
  for score in scores.iter_mut() {
    *score *= confidence;
  }
  Ok(())
}

/// 分数最高的类别，相同分数取下标较大的那个
fn top_class(scores: &[f32]) -> (usize, f32) {
  let mut top = (0, f32::NEG_INFINITY);
  for (index, &score) in scores.iter().enumerate() {
    if score >= top.1 {
      top = (index, score);
    }
  }
  top
}

/// 解码整个输出张量，返回通过阈值的全部候选框
///
/// 遍历顺序为 row、column、anchor。先算出映射后的框再检查 objectness，
/// 然后才计算类别概率。
pub fn decode(
  tensor: &[f32],
  geometry: &ModelGeometry,
  labels: &[String],
  probability_threshold: f32,
) -> Result<Vec<DetectedBox>, DecodeError> {
  if labels.is_empty() {
    return Err(DecodeError::EmptyLabels);
  }
  if geometry.anchors.is_empty() {
    return Err(DecodeError::EmptyAnchors);
  }
  if !(0.0..=1.0).contains(&probability_threshold) {
    return Err(DecodeError::Threshold(probability_threshold));
  }
  let expected = geometry.tensor_len(labels.len());
  if tensor.len() != expected {
    return Err(DecodeError::TensorLength {
      expected,
      actual: tensor.len(),
    });
  }

  let grid = geometry.grid;
  let anchor_stride = geometry.anchor_stride(labels.len());
  let mut scores = vec![0.0f32; labels.len()];
  let mut boxes = Vec::new();

  for row in 0..grid.rows {
    for column in 0..grid.columns {
      for (anchor_index, anchor) in geometry.anchors.iter().enumerate() {
        let channel = anchor_index * anchor_stride;

        let prediction = extract_prediction(tensor, &grid, row, column, channel)?;
        let mapped = map_to_cell(geometry, row, column, anchor, &prediction);

        if prediction.confidence < probability_threshold {
          continue;
        }

        extract_class_scores(
          tensor,
          &grid,
          row,
          column,
          channel,
          prediction.confidence,
          &mut scores,
        )?;
        let (top_index, top_score) = top_class(&scores);

        if top_score < probability_threshold {
          continue;
        }

        boxes.push(DetectedBox::new(mapped, top_score, labels[top_index].as_str()));
      }
    }
  }

  Ok(boxes)
}

/// 单框选择：候选不足两个视为没有检测结果，否则取置信度最高者（并列取最先出现的）
pub fn select_best(candidates: &[DetectedBox]) -> Option<&DetectedBox> {
  if candidates.len() < 2 {
    return None;
  }
  candidates.iter().fold(None, |best: Option<&DetectedBox>, item| match best {
    Some(b) if b.confidence >= item.confidence => Some(b),
    _ => Some(item),
  })
}

#[derive(Error, Debug)]
pub enum GridBoxError {
  #[error("标签加载错误: {0}")]
  LabelError(#[from] LabelError),
  #[error("几何配置错误: {0}")]
  GeometryError(#[from] GeometryError),
  #[error("解码参数错误: {0}")]
  DecodeError(#[from] DecodeError),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
}

/// 网格锚框解码器，构造后不可变，可在多个线程间共享
#[derive(Debug, Clone)]
pub struct GridBoxDecoder {
  geometry: ModelGeometry,
  labels: LabelVocabulary,
  probability_threshold: f32,
}

impl GridBoxDecoder {
  pub fn new(
    geometry: ModelGeometry,
    labels: LabelVocabulary,
    probability_threshold: f32,
  ) -> Result<Self, GridBoxError> {
    geometry.validate()?;
    if !(0.0..=1.0).contains(&probability_threshold) {
      return Err(DecodeError::Threshold(probability_threshold).into());
    }
    Ok(Self {
      geometry,
      labels,
      probability_threshold,
    })
  }

  pub fn geometry(&self) -> &ModelGeometry {
    &self.geometry
  }

  pub fn labels(&self) -> &LabelVocabulary {
    &self.labels
  }

  pub fn probability_threshold(&self) -> f32 {
    self.probability_threshold
  }

  /// 期望的输出张量长度
  pub fn tensor_len(&self) -> usize {
    self.geometry.tensor_len(self.labels.len())
  }

  pub fn decode(&self, tensor: &[f32]) -> Result<Vec<DetectedBox>, DecodeError> {
    decode(
      tensor,
      &self.geometry,
      &self.labels,
      self.probability_threshold,
    )
  }
}

impl Model for GridBoxDecoder {
  type Input = RawTensor;
  type Output = DetectResult;
  type Error = DecodeError;

  fn postprocess(&self, output: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("后处理模型输出, 张量长度 {}", output.len());
    let items = self.decode(output.as_slice())?;
    debug!("通过阈值的候选框: {} 个", items.len());
    Ok(DetectResult {
      items: items.into_boxed_slice(),
    })
  }

  fn input_size(&self) -> (u32, u32) {
    self.geometry.input_size()
  }
}

/// `gridbox:///path/to/labels.txt?threshold=0.5&config=/path/to/model.toml`
pub struct GridBoxDecoderBuilder {
  labels_path: PathBuf,
  geometry_path: Option<PathBuf>,
  geometry: ModelGeometry,
  probability_threshold: f32,
}

impl FromUrlWithScheme for GridBoxDecoderBuilder {
  const SCHEME: &'static str = "gridbox";
}

impl FromUrl for GridBoxDecoderBuilder {
  type Error = GridBoxError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if !Self::accepts(url) {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(GridBoxError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    let mut builder = GridBoxDecoderBuilder::new(url_path(url));
    if let Some(threshold) = query_value(url, "threshold") {
      let threshold = threshold.parse::<f32>().map_err(|e| {
        GridBoxError::ModelPathError(format!("无法解析阈值 '{}': {}", threshold, e))
      })?;
      builder = builder.probability_threshold(threshold);
    }
    if let Some(config) = query_value(url, "config") {
      builder = builder.geometry_file(config);
    }
    Ok(builder)
  }
}

impl GridBoxDecoderBuilder {
  pub fn new(labels_path: impl Into<PathBuf>) -> Self {
    Self {
      labels_path: labels_path.into(),
      geometry_path: None,
      geometry: ModelGeometry::default(),
      probability_threshold: DEFAULT_PROBABILITY_THRESHOLD,
    }
  }

  pub fn probability_threshold(mut self, threshold: f32) -> Self {
    self.probability_threshold = threshold;
    self
  }

  pub fn geometry(mut self, geometry: ModelGeometry) -> Self {
    self.geometry = geometry;
    self.geometry_path = None;
    self
  }

  pub fn geometry_file(mut self, path: impl Into<PathBuf>) -> Self {
    self.geometry_path = Some(path.into());
    self
  }

  pub fn build(self) -> Result<GridBoxDecoder, GridBoxError> {
    let labels = LabelVocabulary::from_file(&self.labels_path)?;
    let geometry = match self.geometry_path {
      Some(path) => ModelGeometry::from_toml_file(path)?,
      None => self.geometry,
    };

    let decoder = GridBoxDecoder::new(geometry, labels, self.probability_threshold)?;
    info!(
      "解码器就绪: 输入 {}x{}, 网格 {}x{}, {} 个锚框, {} 个类别, 阈值 {}",
      decoder.geometry.input_width,
      decoder.geometry.input_height,
      decoder.geometry.grid.rows,
      decoder.geometry.grid.columns,
      decoder.geometry.anchors.len(),
      decoder.labels.len(),
      decoder.probability_threshold
    );
    Ok(decoder)
  }
}
