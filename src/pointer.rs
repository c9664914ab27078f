use std::f32::consts::PI;

use crate::viewport::ViewportState;

/// Total swing across the viewport, in radians (about ±9.9° each way).
pub const DEFAULT_SWING: f32 = PI * 0.11;


/// Rotation target derived from one pointer position.
/// `rotation_x` follows the horizontal pointer axis, `rotation_y` the vertical one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerTarget {
    pub rotation_x: f32,
    pub rotation_y: f32,
}


#[derive(Debug, Clone, Copy)]
pub struct PointerInputMapper {
    swing: f32,
}
impl PointerInputMapper {
    pub fn new(swing: f32) -> Self {
        Self { swing }
    }


    /// Largest magnitude either target can take for a pointer inside the viewport.
    pub fn bound(&self) -> f32 {
        self.swing * 0.5
    }


    /// Normalises client coordinates to `[0,1]`, recentres to `[-0.5,0.5]`
    /// and scales by the swing. Returns `None` for a zero-sized viewport.
    pub fn map(&self, client_x: f64, client_y: f64, viewport: &ViewportState) -> Option<PointerTarget> {
        if viewport.width == 0 || viewport.height == 0 {
            return None;
        }
        let nx = client_x / viewport.width as f64 - 0.5;
        let ny = client_y / viewport.height as f64 - 0.5;
        Some(PointerTarget {
            rotation_x: nx as f32 * self.swing,
            rotation_y: ny as f32 * self.swing,
        })
    }
}
impl Default for PointerInputMapper {
    fn default() -> Self {
        Self::new(DEFAULT_SWING)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    fn viewport(w: u32, h: u32) -> ViewportState {
        ViewportState::new(w, h, 1.0, 2.0)
    }

    #[test]
    fn corners_and_centre() {
        let mapper = PointerInputMapper::default();
        let vp = viewport(1280, 720);
        let b = 0.11 * PI / 2.0;

        let t = mapper.map(0.0, 0.0, &vp).unwrap();
        assert!((t.rotation_x + b).abs() < EPS && (t.rotation_y + b).abs() < EPS);

        let t = mapper.map(640.0, 360.0, &vp).unwrap();
        assert!(t.rotation_x.abs() < EPS && t.rotation_y.abs() < EPS);

        let t = mapper.map(1280.0, 720.0, &vp).unwrap();
        assert!((t.rotation_x - b).abs() < EPS && (t.rotation_y - b).abs() < EPS);
    }

    #[test]
    fn targets_stay_in_bounds() {
        let mapper = PointerInputMapper::default();
        let vp = viewport(977, 433);
        let b = mapper.bound() + EPS;
        for i in 0..=40 {
            for j in 0..=40 {
                let x = vp.width as f64 * i as f64 / 40.0;
                let y = vp.height as f64 * j as f64 / 40.0;
                let t = mapper.map(x, y, &vp).unwrap();
                assert!(t.rotation_x.abs() <= b, "x={} -> {}", x, t.rotation_x);
                assert!(t.rotation_y.abs() <= b, "y={} -> {}", y, t.rotation_y);
            }
        }
    }

    #[test]
    fn bound_is_about_ten_degrees() {
        let deg = PointerInputMapper::default().bound().to_degrees();
        assert!((deg - 9.9).abs() < 0.01);
    }

    #[test]
    fn empty_viewport_maps_to_nothing() {
        let mapper = PointerInputMapper::default();
        assert!(mapper.map(10.0, 10.0, &viewport(0, 720)).is_none());
    }
}
