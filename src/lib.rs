pub mod utils;

pub mod asset;
pub mod config;
pub mod error;
pub mod frame;
pub mod interaction;
pub mod pointer;
pub mod stage;
pub mod tween;
pub mod viewport;

#[cfg(target_arch = "wasm32")]
mod composer;
#[cfg(target_arch = "wasm32")]
mod loader;
#[cfg(target_arch = "wasm32")]
mod renderer;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;


#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}


#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub async fn run() -> Result<(), JsValue> {
    utils::set_panic_hook();
    renderer::main().await?;
    Ok(())
}
