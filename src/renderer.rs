use std::{
    cell::RefCell,
    rc::Rc,
    sync::Arc,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, MouseEvent, WebGl2RenderingContext};
use three_d::*;

use crate::asset::AssetHandle;
use crate::composer::EffectComposer;
use crate::config::StageConfig;
use crate::error::{StageError, StageResult};
use crate::frame::{AnimationFrameHost, FrameScheduler};
use crate::interaction::Orientation;
use crate::loader::{load_environment, load_model, LoadedModel};
use crate::stage::{Stage, StageScene};
use crate::utils::*;
use crate::viewport::{PerspectiveCamera, RenderSurface, SurfaceSize};
use crate::log;

const MODEL_HANDLE: AssetHandle = AssetHandle(1);
const ENVIRONMENT_HANDLE: AssetHandle = AssetHandle(2);


/// The canvas drawing buffer (device pixels) and its CSS box.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
}
impl RenderSurface for CanvasSurface {
    fn set_size(&mut self, size: SurfaceSize) {
        let (width, height) = size.physical();
        self.canvas.set_width(width);
        self.canvas.set_height(height);

        let style = self.canvas.style();
        let _ = style.set_property("width", &format!("{}px", size.width));
        let _ = style.set_property("height", &format!("{}px", size.height));
    }
}


/// Scene graph: owns the model and the environment light, and draws them
/// through the postprocessing chain.
pub struct WebScene {
    canvas: CanvasSurface,
    composer: EffectComposer,
    model: Option<LoadedModel>,
    ambient: Option<AmbientLight>,
}
impl WebScene {
    pub fn new(canvas: HtmlCanvasElement, composer: EffectComposer) -> Self {
        Self {
            canvas: CanvasSurface { canvas },
            composer,
            model: None,
            ambient: None,
        }
    }
}
impl StageScene for WebScene {
    type Model = LoadedModel;
    type Environment = AmbientLight;

    fn attach_model(&mut self, model: Self::Model) -> AssetHandle {
        self.model = Some(model);
        MODEL_HANDLE
    }

    fn set_environment(&mut self, environment: Self::Environment) -> AssetHandle {
        self.ambient = Some(environment);
        ENVIRONMENT_HANDLE
    }

    fn set_orientation(&mut self, model: AssetHandle, orientation: Orientation) {
        if model != MODEL_HANDLE {
            return;
        }
        let Some(loaded) = self.model.as_mut() else { return };

        // XYZ Euler order
        let rotation = Mat4::from_angle_x(radians(orientation.x)) * Mat4::from_angle_y(radians(orientation.y));
        for (part, base) in loaded.model.iter_mut().zip(loaded.base_transforms.iter()) {
            part.set_transformation(rotation * *base);
        }
    }

    fn surfaces(&mut self) -> (&mut dyn RenderSurface, &mut dyn RenderSurface) {
        (&mut self.canvas, &mut self.composer)
    }

    fn render(&mut self, camera: &PerspectiveCamera) {
        let view = camera.view_camera();
        let model = self.model.as_ref();
        let lights: Vec<&dyn Light> = self.ambient.iter().map(|l| l as &dyn Light).collect();
        self.composer.render(|| {
            if let Some(loaded) = model {
                for part in loaded.model.iter() {
                    part.render(view, &lights);
                }
            }
        });
    }
}


fn create_context(canvas: &HtmlCanvasElement) -> StageResult<Context> {
    let options = js_sys::Object::new();
    js_sys::Reflect::set(&options, &"antialias".into(), &JsValue::TRUE)
        .map_err(|e| StageError::Dom(format!("{:?}", e)))?;
    js_sys::Reflect::set(&options, &"alpha".into(), &JsValue::TRUE)
        .map_err(|e| StageError::Dom(format!("{:?}", e)))?;

    let webgl2: WebGl2RenderingContext = canvas
        .get_context_with_context_options("webgl2", &options)
        .map_err(|e| StageError::WebGl(format!("{:?}", e)))?
        .ok_or_else(|| StageError::WebGl("getContext(\"webgl2\") returned null".to_string()))?
        .dyn_into()
        .map_err(|_| StageError::WebGl("not a WebGl2RenderingContext".to_string()))?;

    let gl = context::Context::from_webgl2_context(webgl2);
    Context::from_gl_context(Arc::new(gl)).map_err(|e| StageError::WebGl(e.to_string()))
}


fn find_canvas(window: &web_sys::Window, selector: &str) -> StageResult<HtmlCanvasElement> {
    let document = window.document().ok_or(StageError::NoDocument)?;
    document
        .query_selector(selector)
        .map_err(|e| StageError::Dom(format!("{:?}", e)))?
        .ok_or_else(|| StageError::CanvasNotFound(selector.to_string()))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| StageError::CanvasNotFound(format!("{} is not a canvas", selector)))
}


fn listen<E, F>(window: &web_sys::Window, event: &str, handler: F) -> StageResult<()>
where
    E: JsCast + 'static,
    F: FnMut(E) + 'static,
{
    let mut handler = handler;
    let callback = Closure::wrap(Box::new(move |e: web_sys::Event| {
        if let Ok(e) = e.dyn_into::<E>() {
            handler(e);
        }
    }) as Box<dyn FnMut(_)>);
    window
        .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
        .map_err(|e| StageError::Dom(format!("{:?}", e)))?;
    callback.forget(); // listeners live as long as the page

    Ok(())
}


pub async fn main() -> StageResult<()> {
    let window = get_window()?;
    let config = StageConfig::default().with_query(query_pairs(&window));
    log!("main(): model={}, environment={}", config.model_url, config.environment_url);

    let canvas = find_canvas(&window, &config.canvas_selector)?;
    let context = create_context(&canvas)?;
    let composer = EffectComposer::with_default_passes(&context, &config.post)?;
    let scene = WebScene::new(canvas, composer);

    let (width, height, pixel_ratio) = window_metrics(&window);
    let stage = Rc::new(RefCell::new(Stage::new(&config, scene, width, height, pixel_ratio)));

    {
        let stage = stage.clone();
        let win = window.clone();
        listen(&window, "resize", move |_: web_sys::Event| {
            let (width, height, pixel_ratio) = window_metrics(&win);
            stage.borrow_mut().resize(width, height, pixel_ratio);
        })?;
    }
    {
        let stage = stage.clone();
        listen(&window, "mousemove", move |e: MouseEvent| {
            stage
                .borrow_mut()
                .pointer_moved(e.client_x() as f64, e.client_y() as f64);
        })?;
    }

    // one attempt each; the frame loop does not wait for either
    {
        let stage = stage.clone();
        let context = context.clone();
        let url = config.model_url.clone();
        wasm_bindgen_futures::spawn_local(async move {
            stage.borrow().model_progress(0.0);
            let outcome = load_model(&context, &url).await;
            stage.borrow_mut().model_loaded(outcome);
        });
    }
    {
        let stage = stage.clone();
        let context = context.clone();
        let url = config.environment_url.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = load_environment(&context, &url).await;
            stage.borrow_mut().environment_loaded(outcome);
        });
    }

    let host = Rc::new(AnimationFrameHost::new(window.clone()));
    FrameScheduler::start(host, move |timestamp| stage.borrow_mut().frame(timestamp));
    log!("main(): frame loop started");

    Ok(())
}
