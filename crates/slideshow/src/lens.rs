/// Instantaneous pose of the crystal ball, in pixels except for the
/// dimensionless refraction strength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LensState {
    pub center_x: f32,
    pub center_y: f32,
    pub radius: f32,
    pub strength: f32,
}

/// Lens pose at `seconds` of animation time over a `width` x `height`
/// canvas. Pure function of its inputs: the wander is a sum of
/// incommensurate sinusoids, the radius breathes at a faster rate and
/// the refraction strength swings around its base value.
pub fn lens_at(seconds: f32, width: f32, height: f32) -> LensState {
    let t = seconds;
    let center_x = width * 0.5 + (1.3 * t).sin() * width * 0.30 + (0.8 * t).cos() * width * 0.15;
    let center_y = height * 0.5 + (1.6 * t).cos() * height * 0.25 + (1.1 * t).sin() * height * 0.12;
    let radius = 0.2 * width.min(height) * (1.0 + 0.15 * (4.0 * t).sin());
    let strength = 2.5 + 0.5 * (2.0 * t).sin();
    LensState {
        center_x,
        center_y,
        radius,
        strength,
    }
}
