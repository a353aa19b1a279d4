use bytemuck::{Pod, Zeroable};
use slideshow::LensState;

/// Uniform block shared with `crystal.wgsl`. Layout matches the WGSL
/// struct field for field; every member is a vec4 so no implicit
/// padding exists on either side.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy)]
pub(crate) struct CrystalUniforms {
    /// canvas width, canvas height, unused x2
    pub resolution: [f32; 4],
    /// lens centre x, centre y (pixels), radius (pixels), strength
    pub lens: [f32; 4],
    /// dissolve progress in [0, 1], unused x3
    pub fade: [f32; 4],
}

unsafe impl Zeroable for CrystalUniforms {}
unsafe impl Pod for CrystalUniforms {}

impl CrystalUniforms {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            resolution: [width, height, 0.0, 0.0],
            lens: [width * 0.5, height * 0.5, 0.2 * width.min(height), 2.5],
            fade: [0.0; 4],
        }
    }

    pub fn set_resolution(&mut self, width: f32, height: f32) {
        self.resolution[0] = width;
        self.resolution[1] = height;
    }

    pub fn set_lens(&mut self, lens: &LensState) {
        self.lens = [lens.center_x, lens.center_y, lens.radius, lens.strength];
    }

    pub fn set_fade(&mut self, progress: f32) {
        self.fade[0] = progress.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_size_is_three_vec4s() {
        assert_eq!(std::mem::size_of::<CrystalUniforms>(), 48);
    }

    #[test]
    fn fade_is_clamped() {
        let mut uniforms = CrystalUniforms::new(100.0, 100.0);
        uniforms.set_fade(1.5);
        assert_eq!(uniforms.fade[0], 1.0);
        uniforms.set_fade(-0.5);
        assert_eq!(uniforms.fade[0], 0.0);
    }
}
