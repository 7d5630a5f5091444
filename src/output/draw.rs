// 该文件是 Yanhou （咽喉轮廓） 项目的一部分。
// src/output/draw.rs - 分割结果轮廓可视化
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

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use imageproc::{
  contours::{BorderType, Contour, find_contours},
  drawing::BresenhamLineIter,
  point::Point,
};
use tracing::debug;

use crate::{
  model::{AnatomyLabel, Mask, SegmentItem, SegmentResult, WithLabel},
  output::palette::ClassColorMap,
};

/// 掩码二值化阈值，严格大于该值才算前景
pub const MASK_THRESHOLD: f32 = 0.5;
pub const CONTOUR_THICKNESS: u32 = 2;

/// 最近邻缩放掩码到目标尺寸
pub fn resize_mask_nearest(mask: &Mask, width: u32, height: u32) -> Mask {
  let (src_w, src_h) = mask.dimensions();
  if (src_w, src_h) == (width, height) {
    return mask.clone();
  }
  if src_w == 0 || src_h == 0 {
    return ImageBuffer::new(width, height);
  }

  ImageBuffer::from_fn(width, height, |x, y| {
    let sx = (x as u64 * src_w as u64 / width as u64) as u32;
    let sy = (y as u64 * src_h as u64 / height as u64) as u32;
    *mask.get_pixel(sx.min(src_w - 1), sy.min(src_h - 1))
  })
}

pub fn binarize_mask(mask: &Mask) -> GrayImage {
  ImageBuffer::from_fn(mask.width(), mask.height(), |x, y| {
    if mask.get_pixel(x, y)[0] > MASK_THRESHOLD {
      Luma([255u8])
    } else {
      Luma([0u8])
    }
  })
}

/// 只保留最外层轮廓：孔洞边界以及孔洞内部区域的边界都不绘制
pub fn outer_contours(binary: &GrayImage) -> Vec<Contour<i32>> {
  find_contours::<i32>(binary)
    .into_iter()
    .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
    .collect()
}

fn stamp(image: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, thickness: u32) {
  let (w, h) = (image.width() as i32, image.height() as i32);
  let before = (thickness / 2) as i32;
  let after = thickness as i32 - before;
  for dy in -before..after {
    for dx in -before..after {
      let (px, py) = (x + dx, y + dy);
      if px >= 0 && py >= 0 && px < w && py < h {
        image.put_pixel(px as u32, py as u32, color);
      }
    }
  }
}

/// 绘制闭合折线
pub fn draw_closed_polyline(
  image: &mut RgbImage,
  points: &[Point<i32>],
  color: Rgb<u8>,
  thickness: u32,
) {
  match points {
    [] => {}
    [p] => stamp(image, p.x, p.y, color, thickness),
    _ => {
      for (i, start) in points.iter().enumerate() {
        let end = points[(i + 1) % points.len()];
        let line = BresenhamLineIter::new(
          (start.x as f32, start.y as f32),
          (end.x as f32, end.y as f32),
        );
        for (x, y) in line {
          stamp(image, x, y, color, thickness);
        }
      }
    }
  }
}

pub struct Draw {
  colors: ClassColorMap,
  thickness: u32,
}

impl Default for Draw {
  fn default() -> Self {
    Self::new(ClassColorMap::default())
  }
}

impl Draw {
  pub fn new(colors: ClassColorMap) -> Self {
    Self {
      colors,
      thickness: CONTOUR_THICKNESS,
    }
  }

  pub fn colors(&self) -> &ClassColorMap {
    &self.colors
  }

  fn draw_item(&self, image: &mut RgbImage, item: &SegmentItem) {
    let color = self.colors.resolve(item.class_id);
    let mask = resize_mask_nearest(&item.mask, image.width(), image.height());
    let binary = binarize_mask(&mask);
    let contours = outer_contours(&binary);

    debug!(
      "绘制 {} 的 {} 条轮廓, 颜色 {:?}",
      AnatomyLabel::from_label_id(item.class_id).to_label_str(),
      contours.len(),
      color.0
    );

    for contour in contours.iter() {
      draw_closed_polyline(image, &contour.points, color, self.thickness);
    }
  }
}

pub trait DrawSegmentOnImage {
  /// 按实例顺序绘制，返回绘制次数
  fn draw_segments_on_image(&self, image: &mut RgbImage, result: &SegmentResult) -> usize;
}

impl DrawSegmentOnImage for Draw {
  fn draw_segments_on_image(&self, image: &mut RgbImage, result: &SegmentResult) -> usize {
    let mut passes = 0;
    for item in result.items.iter() {
      self.draw_item(image, item);
      passes += 1;
    }
    passes
  }
}
