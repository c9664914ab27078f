//! Application context tying viewport, assets, pointer tilt and the frame
//! loop together. All handlers run synchronously on the page's one thread.

use three_d::degrees;

use crate::asset::{AssetHandle, AssetSlot};
use crate::config::StageConfig;
use crate::error::LoadError;
use crate::interaction::{InteractionAnimator, Orientation};
use crate::viewport::{PerspectiveCamera, RenderSurface, ViewportController};
use crate::log;

/// Frame gaps longer than this (background tab, debugger) count as one short frame.
const LAG_THRESHOLD_MS: f64 = 500.0;
const LAG_STEP_MS: f64 = 33.0;


/// The scene graph and postprocessing chain behind the stage.
pub trait StageScene {
    type Model;
    type Environment;

    /// Takes ownership of a loaded model and returns the id used to pose it.
    fn attach_model(&mut self, model: Self::Model) -> AssetHandle;
    /// Replaces the ambient environment lighting.
    fn set_environment(&mut self, environment: Self::Environment) -> AssetHandle;
    fn set_orientation(&mut self, model: AssetHandle, orientation: Orientation);
    /// Canvas drawing buffer and postprocessing targets, in that order.
    fn surfaces(&mut self) -> (&mut dyn RenderSurface, &mut dyn RenderSurface);
    /// Produces one frame. Must cope with no model and no environment.
    fn render(&mut self, camera: &PerspectiveCamera);
}


pub struct Stage<S: StageScene> {
    viewport: ViewportController,
    camera: PerspectiveCamera,
    model: AssetSlot<AssetHandle>,
    environment: AssetSlot<AssetHandle>,
    interaction: InteractionAnimator,
    scene: S,
    last_timestamp: Option<f64>,
}
impl<S: StageScene> Stage<S> {
    pub fn new(config: &StageConfig, scene: S, width: u32, height: u32, pixel_ratio: f64) -> Self {
        let viewport = ViewportController::new(width, height, pixel_ratio, config.max_pixel_ratio);
        let camera = PerspectiveCamera::new(
            degrees(config.camera.fov_degrees),
            config.camera.near,
            config.camera.far,
            config.camera.distance,
        );

        let mut stage = Self {
            viewport,
            camera,
            model: AssetSlot::new("model"),
            environment: AssetSlot::new("environment"),
            interaction: InteractionAnimator::new(&config.interaction),
            scene,
            last_timestamp: None,
        };
        stage.apply_viewport();
        stage
    }


    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }


    pub fn scene(&self) -> &S {
        &self.scene
    }


    pub fn model(&self) -> &AssetSlot<AssetHandle> {
        &self.model
    }


    pub fn environment(&self) -> &AssetSlot<AssetHandle> {
        &self.environment
    }


    pub fn interaction(&self) -> &InteractionAnimator {
        &self.interaction
    }


    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }


    pub fn resize(&mut self, width: u32, height: u32, pixel_ratio: f64) {
        self.viewport.resize(width, height, pixel_ratio);
        self.apply_viewport();
    }


    fn apply_viewport(&mut self) {
        let (canvas, composer) = self.scene.surfaces();
        self.viewport.apply(&mut self.camera, &mut [canvas, composer]);
    }


    pub fn pointer_moved(&mut self, client_x: f64, client_y: f64) {
        self.interaction.pointer_moved(
            client_x,
            client_y,
            self.viewport.state(),
            self.model.is_ready(),
        );
    }


    pub fn model_progress(&self, ratio: f64) {
        self.model.progress(ratio);
    }


    pub fn model_loaded(&mut self, outcome: Result<S::Model, LoadError>) {
        if self.model.is_settled() {
            log!("Stage::model_loaded(): WARNING: model already settled, dropping result.");
            return;
        }
        let outcome = outcome.map(|model| self.scene.attach_model(model));
        self.model.settle(outcome);
    }


    pub fn environment_loaded(&mut self, outcome: Result<S::Environment, LoadError>) {
        if self.environment.is_settled() {
            log!("Stage::environment_loaded(): WARNING: environment already settled, dropping result.");
            return;
        }
        let outcome = outcome.map(|environment| self.scene.set_environment(environment));
        self.environment.settle(outcome);
    }


    /// One display frame: advance tweens, pose the model, render.
    pub fn frame(&mut self, timestamp_ms: f64) {
        let elapsed_ms = match self.last_timestamp {
            Some(last) => {
                let gap = (timestamp_ms - last).max(0.0);
                if gap > LAG_THRESHOLD_MS { LAG_STEP_MS } else { gap }
            },
            None => 0.0,
        };
        self.last_timestamp = Some(timestamp_ms);

        let orientation = self.interaction.tick((elapsed_ms / 1000.0) as f32);
        if let Some(&handle) = self.model.get() {
            self.scene.set_orientation(handle, orientation);
        }
        self.scene.render(&self.camera);
    }
}
