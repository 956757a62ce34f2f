// 该文件是 Gezi （格子） 项目的一部分。
// src/model/activation.rs - 激活函数
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

/// `exp(x) / (1 + exp(x))`
///
/// 与导出模型时使用的公式保持一致，对很大的负数会损失精度。
/// `exp(x)` 溢出时直接返回 1.0，避免 `inf / inf`。
pub fn sigmoid(x: f32) -> f32 {
  let k = x.exp();
  if k.is_infinite() {
    return 1.0;
  }
  k / (1.0 + k)
}

/// 原地 softmax，先减去最大值以保证数值稳定
pub fn softmax_in_place(values: &mut [f32]) {
  if values.is_empty() {
    return;
  }

  let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
  let mut sum = 0.0f32;
  for v in values.iter_mut() {
    *v = (*v - max).exp();
    sum += *v;
  }
  for v in values.iter_mut() {
    *v /= sum;
  }
}

pub fn softmax(values: &[f32]) -> Vec<f32> {
  let mut out = values.to_vec();
  softmax_in_place(&mut out);
  out
}
