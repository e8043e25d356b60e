use macroquad::math::{Rect, Vec2};
use macroquad::texture::Image;

// ==================== 像素遮罩 ====================

/// 不透明像素的位图，用于精确碰撞
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl Mask {
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width * height],
        }
    }

    #[cfg(test)]
    pub fn filled(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![true; width * height],
        }
    }

    /// alpha > 0 的像素视为实心
    pub fn from_image(image: &Image) -> Self {
        let width = image.width as usize;
        let height = image.height as usize;
        let bits = image.bytes.chunks_exact(4).map(|px| px[3] > 0).collect();
        Self { width, height, bits }
    }

    #[cfg(test)]
    pub fn width(&self) -> usize {
        self.width
    }

    #[cfg(test)]
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    #[cfg(test)]
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.bits[y * self.width + x]
    }

    #[cfg(test)]
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x < self.width && y < self.height {
            self.bits[y * self.width + x] = value;
        }
    }

    #[cfg(test)]
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    /// 最近邻缩放
    pub fn scaled(&self, factor: f32) -> Self {
        let width = (self.width as f32 * factor) as usize;
        let height = (self.height as f32 * factor) as usize;
        let mut out = Self::empty(width, height);
        if self.width == 0 || self.height == 0 {
            return out;
        }
        for y in 0..height {
            let sy = ((y as f32 / factor) as usize).min(self.height - 1);
            for x in 0..width {
                let sx = ((x as f32 / factor) as usize).min(self.width - 1);
                out.bits[y * width + x] = self.bits[sy * self.width + sx];
            }
        }
        out
    }

    /// 绕中心旋转（角度为屏幕坐标下的顺时针度数），包围盒随之扩大
    pub fn rotated(&self, degrees: f32) -> Self {
        if self.width == 0 || self.height == 0 {
            return self.clone();
        }
        let rad = degrees.to_radians();
        let (sin, cos) = rad.sin_cos();
        let (w, h) = (self.width as f32, self.height as f32);
        // 减去一点容差，避免 cos(90°) 的浮点误差多出一列
        let new_w = (w * cos.abs() + h * sin.abs() - 1e-3).ceil().max(1.0) as usize;
        let new_h = (w * sin.abs() + h * cos.abs() - 1e-3).ceil().max(1.0) as usize;

        let src_cx = w / 2.0;
        let src_cy = h / 2.0;
        let dst_cx = new_w as f32 / 2.0;
        let dst_cy = new_h as f32 / 2.0;

        let mut out = Self::empty(new_w, new_h);
        for y in 0..new_h {
            for x in 0..new_w {
                // 逆变换回原图采样
                let dx = x as f32 + 0.5 - dst_cx;
                let dy = y as f32 + 0.5 - dst_cy;
                let sx = dx * cos + dy * sin + src_cx;
                let sy = -dx * sin + dy * cos + src_cy;
                if sx >= 0.0 && sy >= 0.0 && sx < w && sy < h {
                    out.bits[y * new_w + x] = self.bits[sy as usize * self.width + sx as usize];
                }
            }
        }
        out
    }

    /// `other` 的左上角相对本遮罩左上角偏移 `offset` 时是否有重叠像素
    pub fn overlaps(&self, other: &Mask, offset: (i32, i32)) -> bool {
        let (ox, oy) = offset;
        let x_start = ox.max(0);
        let y_start = oy.max(0);
        let x_end = (ox + other.width as i32).min(self.width as i32);
        let y_end = (oy + other.height as i32).min(self.height as i32);

        for y in y_start..y_end {
            for x in x_start..x_end {
                if self.bits[y as usize * self.width + x as usize]
                    && other.bits[(y - oy) as usize * other.width + (x - ox) as usize]
                {
                    return true;
                }
            }
        }
        false
    }

    /// 把不透明像素全部涂白，其余透明，用于敌人死亡闪白
    pub fn silhouette(&self) -> Image {
        let mut bytes = Vec::with_capacity(self.bits.len() * 4);
        for bit in &self.bits {
            if *bit {
                bytes.extend_from_slice(&[255, 255, 255, 255]);
            } else {
                bytes.extend_from_slice(&[0, 0, 0, 0]);
            }
        }
        Image {
            bytes,
            width: self.width as u16,
            height: self.height as u16,
        }
    }
}

/// 两个遮罩分别锚定在各自矩形的左上角
pub fn collide_mask(rect_a: &Rect, mask_a: &Mask, rect_b: &Rect, mask_b: &Mask) -> bool {
    let offset = (
        (rect_b.x - rect_a.x).round() as i32,
        (rect_b.y - rect_a.y).round() as i32,
    );
    mask_a.overlaps(mask_b, offset)
}
