//! Pointer-driven tilt of the loaded model.

use serde::{Deserialize, Serialize};

use crate::pointer::{PointerInputMapper, PointerTarget, DEFAULT_SWING};
use crate::tween::{Animator, Ease, Overwrite, TweenRequest, Tweenable};
use crate::viewport::ViewportState;


/// Euler rotation of the model in radians (XYZ order, z unused).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Orientation {
    /// pitch
    pub x: f32,
    /// yaw
    pub y: f32,
}
impl Tweenable for Orientation {
    fn lerp(self, to: Self, t: f32) -> Self {
        Self {
            x: Tweenable::lerp(self.x, to.x, t),
            y: Tweenable::lerp(self.y, to.y, t),
        }
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionSettings {
    /// Full swing across the viewport in radians.
    pub swing: f32,
    /// Seconds.
    pub duration: f32,
    pub ease: Ease,
    pub overwrite: Overwrite,
}
impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            swing: DEFAULT_SWING,
            duration: 0.9,
            ease: Ease::POWER2_OUT,
            overwrite: Overwrite::Auto,
        }
    }
}


pub struct InteractionAnimator {
    mapper: PointerInputMapper,
    duration: f32,
    ease: Ease,
    animator: Animator<Orientation>,
    orientation: Orientation,
    last_request: Option<TweenRequest<Orientation>>,
}
impl InteractionAnimator {
    pub fn new(settings: &InteractionSettings) -> Self {
        Self {
            mapper: PointerInputMapper::new(settings.swing),
            duration: settings.duration,
            ease: settings.ease,
            animator: Animator::new(settings.overwrite),
            orientation: Orientation::default(),
            last_request: None,
        }
    }


    pub fn orientation(&self) -> Orientation {
        self.orientation
    }


    pub fn last_request(&self) -> Option<&TweenRequest<Orientation>> {
        self.last_request.as_ref()
    }


    pub fn is_animating(&self) -> bool {
        self.animator.active() > 0
    }


    /// Handles one pointer move. Does nothing unless `model_ready`; there is
    /// no queue, so moves made before the model arrives are simply lost.
    pub fn pointer_moved(
        &mut self,
        client_x: f64,
        client_y: f64,
        viewport: &ViewportState,
        model_ready: bool,
    ) -> Option<PointerTarget> {
        if !model_ready {
            return None;
        }
        let target = self.mapper.map(client_x, client_y, viewport)?;

        // horizontal pointer motion turns the model about Y, vertical about X
        let request = TweenRequest {
            to: Orientation {
                x: target.rotation_y,
                y: target.rotation_x,
            },
            duration: self.duration,
            ease: self.ease,
        };
        self.animator.animate_to(&mut self.orientation, request);
        self.last_request = Some(request);
        Some(target)
    }


    /// Advances running tweens; returns the orientation to apply this frame.
    pub fn tick(&mut self, dt: f32) -> Orientation {
        self.animator.tick(dt, &mut self.orientation);
        self.orientation
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> ViewportState {
        ViewportState::new(1000, 800, 1.0, 2.0)
    }

    #[test]
    fn moves_before_load_change_nothing() {
        let mut interaction = InteractionAnimator::new(&InteractionSettings::default());
        for i in 0..10 {
            let t = interaction.pointer_moved(i as f64 * 100.0, 5.0, &viewport(), false);
            assert!(t.is_none());
        }
        assert!(interaction.last_request().is_none());
        assert!(!interaction.is_animating());
        assert_eq!(interaction.tick(1.0), Orientation::default());
    }

    #[test]
    fn centre_move_requests_rest_pose() {
        let mut interaction = InteractionAnimator::new(&InteractionSettings::default());
        interaction.pointer_moved(500.0, 400.0, &viewport(), true);

        let request = interaction.last_request().unwrap();
        assert!(request.to.x.abs() < 1e-6);
        assert!(request.to.y.abs() < 1e-6);
        assert!((request.duration - 0.9).abs() < 1e-6);
        assert!(request.ease.is_decelerating());
    }

    #[test]
    fn axes_are_cross_mapped() {
        let mut interaction = InteractionAnimator::new(&InteractionSettings::default());
        // far right, vertical centre: yaw only
        interaction.pointer_moved(1000.0, 400.0, &viewport(), true);
        let to = interaction.last_request().unwrap().to;
        assert!(to.x.abs() < 1e-6);
        assert!((to.y - DEFAULT_SWING / 2.0).abs() < 1e-6);

        // top edge, horizontal centre: pitch only
        interaction.pointer_moved(500.0, 0.0, &viewport(), true);
        let to = interaction.last_request().unwrap().to;
        assert!((to.x + DEFAULT_SWING / 2.0).abs() < 1e-6);
        assert!(to.y.abs() < 1e-6);
    }

    #[test]
    fn orientation_settles_on_target() {
        let mut interaction = InteractionAnimator::new(&InteractionSettings::default());
        interaction.pointer_moved(0.0, 800.0, &viewport(), true);
        let mut last = Orientation::default();
        for _ in 0..60 {
            last = interaction.tick(1.0 / 60.0);
        }
        let b = DEFAULT_SWING / 2.0;
        assert!((last.x - b).abs() < 1e-5);
        assert!((last.y + b).abs() < 1e-5);
        assert!(!interaction.is_animating());
    }
}
