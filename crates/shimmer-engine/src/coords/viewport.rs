/// Container layout box in logical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Width over height; `1.0` for a degenerate box.
    #[inline]
    pub fn aspect_ratio(self) -> f32 {
        if self.is_valid() {
            self.width / self.height
        } else {
            1.0
        }
    }

    /// Backing-store size in physical pixels for the given device pixel ratio.
    pub fn physical_size(self, device_pixel_ratio: f32) -> (u32, u32) {
        let scale = |v: f32| (v * device_pixel_ratio).round().max(0.0) as u32;
        (scale(self.width), scale(self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physical_size_scales_by_ratio() {
        assert_eq!(Viewport::new(800.0, 600.0).physical_size(2.0), (1600, 1200));
        assert_eq!(Viewport::new(100.5, 10.0).physical_size(1.0), (101, 10));
    }

    #[test]
    fn degenerate_box_has_unit_aspect() {
        assert_eq!(Viewport::new(0.0, 600.0).aspect_ratio(), 1.0);
        assert_eq!(Viewport::new(800.0, 400.0).aspect_ratio(), 2.0);
    }
}
