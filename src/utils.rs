pub fn set_panic_hook() {
    // When the `console_error_panic_hook` feature is enabled, we can call the
    // `set_panic_hook` function at least once during initialization, and then
    // we will get better error messages if our code ever panics.
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}


#[macro_export]
macro_rules! log {
    ( $( $t:tt )* ) => {
        $crate::utils::console_log(&format!( $( $t )* ))
    }
}


#[macro_export]
macro_rules! error {
    ( $( $t:tt )* ) => {
        $crate::utils::console_error(&format!( $( $t )* ))
    }
}


#[cfg(target_arch = "wasm32")]
pub fn console_log(msg: &str) {
    web_sys::console::log_1(&msg.into());
}


#[cfg(target_arch = "wasm32")]
pub fn console_error(msg: &str) {
    web_sys::console::error_1(&msg.into());
}


// native builds (unit tests) have no console object
#[cfg(not(target_arch = "wasm32"))]
pub fn console_log(msg: &str) {
    eprintln!("{}", msg);
}


#[cfg(not(target_arch = "wasm32"))]
pub fn console_error(msg: &str) {
    eprintln!("ERROR: {}", msg);
}


#[cfg(target_arch = "wasm32")]
pub fn get_window() -> Result<web_sys::Window, crate::error::StageError> {
    web_sys::window().ok_or(crate::error::StageError::NoWindow)
}


/// Reads `(innerWidth, innerHeight, devicePixelRatio)` from the window.
/// Missing or non-numeric values fall back to a 1x1 viewport at ratio 1.
#[cfg(target_arch = "wasm32")]
pub fn window_metrics(window: &web_sys::Window) -> (u32, u32, f64) {
    let width = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(1.0);
    let height = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(1.0);
    (
        width.max(0.0) as u32,
        height.max(0.0) as u32,
        window.device_pixel_ratio(),
    )
}


/// Collects the page's query string into key/value pairs.
#[cfg(target_arch = "wasm32")]
pub fn query_pairs(window: &web_sys::Window) -> Vec<(String, String)> {
    let search = match window.location().search() {
        Ok(search) => search,
        Err(_) => return Vec::new(),
    };
    let params = match web_sys::UrlSearchParams::new_with_str(&search) {
        Ok(params) => params,
        Err(_) => return Vec::new(),
    };

    let mut pairs = Vec::new();
    for entry in js_sys::try_iter(&params).ok().flatten().into_iter().flatten() {
        let Ok(entry) = entry else { continue };
        let entry = js_sys::Array::from(&entry);
        if let (Some(key), Some(value)) = (entry.get(0).as_string(), entry.get(1).as_string()) {
            pairs.push((key, value));
        }
    }
    pairs
}
