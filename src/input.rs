// 该文件是 Gezi （格子） 项目的一部分。
// src/input.rs - 图像与张量输入
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

use thiserror::Error;
use url::Url;

use crate::frame::{Frame, RawTensor};

#[cfg(feature = "read_image_file")]
mod read_image_file;
#[cfg(feature = "read_image_file")]
pub use self::read_image_file::{ImageFileInput, ImageFileInputError};

mod read_tensor_file;
pub use self::read_tensor_file::{TensorFileInput, TensorFileInputError, TensorFormat, parse_tensor};

#[derive(Error, Debug)]
pub enum InputError {
  #[cfg(feature = "read_image_file")]
  #[error("Image file input error: {0}")]
  ImageFileInputError(#[from] ImageFileInputError),
  #[error("Tensor file input error: {0}")]
  TensorFileInputError(#[from] TensorFileInputError),
  #[error("URI scheme mismatch")]
  SchemeMismatch,
}

/// 把原图和模型输出配成一帧，只产出一次
pub struct FrameInput {
  frame: Option<Frame>,
}

impl FrameInput {
  pub fn new(frame: Frame) -> Self {
    Self { frame: Some(frame) }
  }

  #[cfg(feature = "read_image_file")]
  pub fn from_urls(image: &Url, tensor: &Url) -> Result<Self, InputError> {
    use crate::{FromUrl, FromUrlWithScheme};

    if !ImageFileInput::accepts(image) || !TensorFileInput::accepts(tensor) {
      return Err(InputError::SchemeMismatch);
    }

    let image = ImageFileInput::from_url(image)?.into_image();
    let tensor: RawTensor = TensorFileInput::from_url(tensor)?.into_tensor();
    Ok(Self::new(Frame::new(image, tensor)))
  }
}

impl Iterator for FrameInput {
  type Item = Frame;

  fn next(&mut self) -> Option<Self::Item> {
    self.frame.take()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{Rgb, RgbImage};

  #[test]
  fn yields_a_single_frame() {
    let frame = Frame::new(
      RgbImage::from_pixel(4, 3, Rgb([0, 0, 0])),
      RawTensor::from(vec![1.0, 2.0]),
    );
    let mut input = FrameInput::new(frame);
    let first = input.next().unwrap();
    assert_eq!(first.original_size(), (4, 3));
    assert_eq!(first.tensor().as_slice(), &[1.0, 2.0]);
    assert!(input.next().is_none());
  }

  #[cfg(feature = "read_image_file")]
  #[test]
  fn from_urls_checks_schemes() {
    let image = Url::parse("tensor:///a.png").unwrap();
    let tensor = Url::parse("tensor:///a.bin").unwrap();
    assert!(matches!(
      FrameInput::from_urls(&image, &tensor),
      Err(InputError::SchemeMismatch)
    ));
  }
}
