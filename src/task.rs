// 该文件是 Gezi （格子） 项目的一部分。
// src/task.rs - 解码任务
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

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::{
  frame::{Frame, RawTensor},
  model::{DetectResult, DetectedBox, Model},
  output::Render,
};

/// 一次任务的结果
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
  /// 选中的检测框，已缩放到原图坐标
  Detected(DetectedBox),
  /// 候选框不足，未渲染
  NoDetection,
}

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<Outcome, Self::Error>;
}

/// 选出最佳框、缩放到原图并交给输出
fn select_and_render<M, O, RE>(
  frame: &Frame,
  model: &M,
  result: &DetectResult,
  output: &O,
) -> Result<Outcome, anyhow::Error>
where
  M: Model,
  RE: std::error::Error + Sync + Send + 'static,
  O: Render<Frame, DetectedBox, Error = RE>,
{
  let Some(best) = result.best() else {
    warn!("图像中没有检测结果 (候选框 {} 个)", result.len());
    return Ok(Outcome::NoDetection);
  };

  let detection = best.rescaled(model.input_size(), frame.original_size());
  info!(
    "检测结果: {} at ({:.0}, {:.0}, {:.0}x{:.0})",
    detection.description,
    detection.dimensions.x,
    detection.dimensions.y,
    detection.dimensions.width,
    detection.dimensions.height
  );
  output.render_result(frame, &detection)?;
  Ok(Outcome::Detected(detection))
}

pub struct OneShotTask;

impl<
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Frame>,
  M: Model<Input = RawTensor, Output = DetectResult, Error = ME>,
  O: Render<Frame, DetectedBox, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<Outcome, Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始解码...");
    let now = Instant::now();
    let result = model.postprocess(frame.tensor())?;
    let elapsed = now.elapsed();
    info!("解码完成，耗时: {:.2?}, 候选框 {} 个", elapsed, result.len());
    let outcome = select_and_render(&frame, &model, &result, &output)?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(outcome)
  }
}

/// 对同一帧重复解码，统计平均耗时
pub struct RepeatShotTask {
  times: usize,
}

impl Default for RepeatShotTask {
  fn default() -> Self {
    Self { times: 1000 }
  }
}

impl RepeatShotTask {
  pub fn with_times(mut self, times: usize) -> Self {
    self.times = times.max(1);
    self
  }
}

impl<
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Frame>,
  M: Model<Input = RawTensor, Output = DetectResult, Error = ME>,
  O: Render<Frame, DetectedBox, Error = RE>,
> Task<I, M, O> for RepeatShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<Outcome, Self::Error> {
    // 前两次视为预热，不计入平均值
    const WARMUP: usize = 2;

    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始解码...");
    let mut times = Vec::with_capacity(self.times);
    let mut last = None;
    for i in 0..self.times {
      let now = Instant::now();
      let result = model.postprocess(frame.tensor())?;
      let elapsed = now.elapsed();
      info!("({})解码完成，耗时: {:.2?}", i, elapsed);
      times.push(elapsed);
      last = Some(result);
    }

    let measured = if times.len() > WARMUP {
      &times[WARMUP..]
    } else {
      &times[..]
    };
    warn!(
      "平均解码时间: {:.2?}",
      measured.iter().sum::<Duration>() / measured.len() as u32
    );

    let result = last.ok_or_else(|| anyhow::anyhow!("没有解码结果"))?;
    select_and_render(&frame, &model, &result, &output)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::{cell::RefCell, convert::Infallible};

  use crate::{
    input::FrameInput,
    model::{AnchorBox, Grid, GridBoxDecoder, LabelVocabulary, ModelGeometry},
  };
  use image::{Rgb, RgbImage};

  #[derive(Default)]
  struct Capture {
    seen: RefCell<Vec<DetectedBox>>,
  }

  impl Render<Frame, DetectedBox> for &Capture {
    type Error = Infallible;

    fn render_result(&self, _frame: &Frame, result: &DetectedBox) -> Result<(), Self::Error> {
      self.seen.borrow_mut().push(result.clone());
      Ok(())
    }
  }

  fn decoder() -> GridBoxDecoder {
    let geometry = ModelGeometry {
      input_width: 64,
      input_height: 64,
      grid: Grid::new(2, 2),
      anchors: vec![AnchorBox::new(1.0, 1.0)],
    };
    let labels = LabelVocabulary::try_from(vec!["red".to_string(), "white".to_string()]).unwrap();
    GridBoxDecoder::new(geometry, labels, 0.5).unwrap()
  }

  /// (row, column) 处放一个 objectness 为 `objectness` 的 "white" 框
  fn tensor_with(cells: &[((usize, usize), f32)]) -> RawTensor {
    let decoder = decoder();
    let grid = decoder.geometry().grid;
    let mut tensor = vec![0.0; decoder.tensor_len()];
    for row in 0..2 {
      for column in 0..2 {
        tensor[grid.offset(row, column, 4)] = -20.0;
      }
    }
    for &((row, column), objectness) in cells {
      tensor[grid.offset(row, column, 4)] = objectness;
      tensor[grid.offset(row, column, 5)] = -20.0;
      tensor[grid.offset(row, column, 6)] = 20.0;
    }
    RawTensor::from(tensor)
  }

  fn frame(tensor: RawTensor) -> Frame {
    Frame::new(RgbImage::from_pixel(128, 32, Rgb([0, 0, 0])), tensor)
  }

  #[test]
  fn one_shot_renders_the_best_box_in_original_coordinates() {
    let capture = Capture::default();
    let input = FrameInput::new(frame(tensor_with(&[((0, 0), 1.0), ((1, 1), 3.0)])));

    let outcome = OneShotTask.run_task(input, decoder(), &capture).unwrap();

    let seen = capture.seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(outcome, Outcome::Detected(seen[0].clone()));
    let best = &seen[0];
    assert_eq!(best.label, "white");
    // 模型空间 (32, 32, 32x32) => 原图 128x32: x 乘 2, y 乘 0.5
    assert!((best.dimensions.x - 64.0).abs() < 1e-3);
    assert!((best.dimensions.y - 16.0).abs() < 1e-3);
    assert!((best.dimensions.width - 64.0).abs() < 1e-3);
    assert!((best.dimensions.height - 16.0).abs() < 1e-3);
  }

  #[test]
  fn one_shot_with_single_candidate_reports_no_detection() {
    let capture = Capture::default();
    let input = FrameInput::new(frame(tensor_with(&[((1, 0), 5.0)])));

    let outcome = OneShotTask.run_task(input, decoder(), &capture).unwrap();

    assert_eq!(outcome, Outcome::NoDetection);
    assert!(capture.seen.borrow().is_empty());
  }

  #[test]
  fn one_shot_without_frames_fails() {
    let capture = Capture::default();
    let result = OneShotTask.run_task(std::iter::empty::<Frame>(), decoder(), &capture);
    assert!(result.is_err());
  }

  #[test]
  fn one_shot_propagates_decode_errors() {
    let capture = Capture::default();
    let input = FrameInput::new(frame(RawTensor::from(vec![0.0; 3])));
    let err = OneShotTask.run_task(input, decoder(), &capture).unwrap_err();
    assert!(err.to_string().contains("张量长度不匹配"));
  }

  #[test]
  fn repeat_shot_renders_once() {
    let capture = Capture::default();
    let input = FrameInput::new(frame(tensor_with(&[((0, 1), 2.0), ((1, 0), 4.0)])));

    let outcome = RepeatShotTask::default()
      .with_times(5)
      .run_task(input, decoder(), &capture)
      .unwrap();

    assert!(matches!(outcome, Outcome::Detected(_)));
    assert_eq!(capture.seen.borrow().len(), 1);
  }
}
