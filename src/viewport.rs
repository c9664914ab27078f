//! Viewport state and the camera/surface updates that follow it.

use three_d::*;


/// Window client area in CSS pixels plus the capped device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub width: u32,
    pub height: u32,
    pub device_pixel_ratio: f64,
}
impl ViewportState {
    pub fn new(width: u32, height: u32, raw_pixel_ratio: f64, max_pixel_ratio: f64) -> Self {
        let ratio = if raw_pixel_ratio.is_finite() && raw_pixel_ratio > 0.0 {
            raw_pixel_ratio
        } else {
            1.0
        };
        Self {
            width,
            height,
            device_pixel_ratio: ratio.min(max_pixel_ratio),
        }
    }


    /// `None` while either side is zero (minimised tab, hidden iframe).
    pub fn aspect(&self) -> Option<f32> {
        if self.width == 0 || self.height == 0 {
            None
        } else {
            Some(self.width as f32 / self.height as f32)
        }
    }


    pub fn surface_size(&self) -> SurfaceSize {
        SurfaceSize {
            width: self.width,
            height: self.height,
            pixel_ratio: self.device_pixel_ratio,
        }
    }
}


#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}
impl SurfaceSize {
    /// Drawing-buffer size in device pixels, never smaller than 1x1.
    pub fn physical(&self) -> (u32, u32) {
        let w = (self.width as f64 * self.pixel_ratio).round() as u32;
        let h = (self.height as f64 * self.pixel_ratio).round() as u32;
        (w.max(1), h.max(1))
    }
}


/// Anything with a pixel size that must track the viewport: the canvas
/// drawing buffer and the postprocessing targets.
pub trait RenderSurface {
    fn set_size(&mut self, size: SurfaceSize);
}


/// The camera the scene is drawn with. Its viewport tracks the drawing
/// buffer, so the projection aspect is whatever the last good resize left.
///
/// Tone mapping and sRGB encoding are switched off: the scene is drawn into
/// an offscreen target and the final postprocessing pass does both once.
pub struct PerspectiveCamera {
    camera: Camera,
    aspect: f32,
}
impl PerspectiveCamera {
    pub fn new(fov_y: Deg<f32>, near: f32, far: f32, distance: f32) -> Self {
        let mut camera = Camera::new_perspective(
            Viewport::new_at_origo(1, 1),
            vec3(0.0, 0.0, distance),
            vec3(0.0, 0.0, 0.0),
            vec3(0.0, 1.0, 0.0),
            fov_y,
            near,
            far,
        );
        camera.disable_tone_and_color_mapping();
        Self { camera, aspect: 1.0 }
    }


    /// CSS width over CSS height of the last non-empty viewport.
    pub fn aspect(&self) -> f32 {
        self.aspect
    }


    /// Resizes the projection to the drawing buffer. An empty viewport
    /// leaves the camera untouched.
    pub fn set_viewport(&mut self, state: &ViewportState) {
        let Some(aspect) = state.aspect() else { return };
        let (width, height) = state.surface_size().physical();
        self.aspect = aspect;
        self.camera.set_viewport(Viewport::new_at_origo(width, height));
    }


    pub fn projection(&self) -> Mat4 {
        *self.camera.projection()
    }


    pub fn view_camera(&self) -> &Camera {
        &self.camera
    }
}


/// Owns the viewport and keeps the camera and every surface in step with it.
#[derive(Debug)]
pub struct ViewportController {
    state: ViewportState,
    max_pixel_ratio: f64,
}
impl ViewportController {
    pub fn new(width: u32, height: u32, raw_pixel_ratio: f64, max_pixel_ratio: f64) -> Self {
        Self {
            state: ViewportState::new(width, height, raw_pixel_ratio, max_pixel_ratio),
            max_pixel_ratio,
        }
    }


    pub fn state(&self) -> &ViewportState {
        &self.state
    }


    /// Records new window metrics. Applied by the next `apply` in the same tick.
    pub fn resize(&mut self, width: u32, height: u32, raw_pixel_ratio: f64) {
        self.state = ViewportState::new(width, height, raw_pixel_ratio, self.max_pixel_ratio);
    }


    /// Pushes the current state to the camera and to all surfaces identically.
    pub fn apply(&self, camera: &mut PerspectiveCamera, surfaces: &mut [&mut dyn RenderSurface]) {
        camera.set_viewport(&self.state);

        let size = self.state.surface_size();
        for surface in surfaces.iter_mut() {
            surface.set_size(size);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSurface {
        sizes: Vec<(u32, u32)>,
    }
    impl RenderSurface for RecordingSurface {
        fn set_size(&mut self, size: SurfaceSize) {
            self.sizes.push(size.physical());
        }
    }

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(degrees(40.0), 0.1, 100.0, 3.5)
    }

    #[test]
    fn resize_updates_aspect_and_both_surfaces() {
        let mut controller = ViewportController::new(800, 600, 1.0, 2.0);
        let mut camera = camera();
        let mut canvas = RecordingSurface::default();
        let mut composer = RecordingSurface::default();

        for &(w, h, dpr) in &[(1280u32, 720u32, 1.0f64), (375, 812, 3.0), (1920, 1080, 1.5), (1, 1, 2.0)] {
            controller.resize(w, h, dpr);
            controller.apply(&mut camera, &mut [&mut canvas, &mut composer]);

            let r = dpr.min(2.0);
            let expected = ((w as f64 * r).round() as u32, (h as f64 * r).round() as u32);
            assert!((camera.aspect() - w as f32 / h as f32).abs() < 1e-6);
            assert_eq!(canvas.sizes.last(), Some(&expected));
            assert_eq!(composer.sizes.last(), Some(&expected));
        }
        assert_eq!(canvas.sizes, composer.sizes);
    }

    #[test]
    fn pixel_ratio_is_capped_at_two() {
        let state = ViewportState::new(100, 100, 3.0, 2.0);
        assert_eq!(state.device_pixel_ratio, 2.0);
        assert_eq!(state.surface_size().physical(), (200, 200));
    }

    #[test]
    fn bogus_pixel_ratio_falls_back_to_one() {
        assert_eq!(ViewportState::new(10, 10, 0.0, 2.0).device_pixel_ratio, 1.0);
        assert_eq!(ViewportState::new(10, 10, f64::NAN, 2.0).device_pixel_ratio, 1.0);
    }

    #[test]
    fn projection_matrix_follows_aspect() {
        let mut controller = ViewportController::new(1000, 500, 1.0, 2.0);
        let mut camera = camera();
        controller.apply(&mut camera, &mut []);
        let wide = camera.projection();

        controller.resize(500, 1000, 1.0);
        controller.apply(&mut camera, &mut []);
        let tall = camera.projection();

        // x scale is f / aspect
        assert!((tall.x.x / wide.x.x - 4.0).abs() < 1e-4);
        assert!((tall.y.y - wide.y.y).abs() < 1e-6);
    }

    #[test]
    fn zero_sized_viewport_keeps_aspect() {
        let mut controller = ViewportController::new(800, 400, 1.0, 2.0);
        let mut camera = camera();
        let mut canvas = RecordingSurface::default();
        controller.apply(&mut camera, &mut [&mut canvas]);
        let before = camera.projection();

        controller.resize(0, 0, 1.0);
        controller.apply(&mut camera, &mut [&mut canvas]);
        assert!((camera.aspect() - 2.0).abs() < 1e-6);
        assert_eq!(canvas.sizes.last(), Some(&(1, 1)));

        // the camera that draws keeps the old viewport, not the 1x1 buffer
        let viewport = camera.view_camera().viewport();
        assert_eq!((viewport.width, viewport.height), (800, 400));
        assert_eq!(camera.projection(), before);
    }

    #[test]
    fn drawing_camera_matches_the_drawing_buffer() {
        let mut controller = ViewportController::new(1280, 720, 1.5, 2.0);
        let mut camera = camera();
        controller.apply(&mut camera, &mut []);

        let viewport = camera.view_camera().viewport();
        assert_eq!((viewport.width, viewport.height), (1920, 1080));
        let projection = camera.projection();
        assert!((projection.y.y / projection.x.x - 1280.0 / 720.0).abs() < 1e-4);
    }

    #[test]
    fn scene_pass_leaves_tone_and_color_mapping_to_postprocessing() {
        let camera = camera();
        assert!(matches!(camera.view_camera().tone_mapping, ToneMapping::None));
        assert!(matches!(camera.view_camera().color_mapping, ColorMapping::None));
    }
}
