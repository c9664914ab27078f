//! Self-perpetuating per-display-frame loop.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};


/// Host primitive for "run this once on the next display refresh".
/// The timestamp passed to the frame is in milliseconds.
pub trait FrameHost {
    fn submit(&self, frame: Box<dyn FnOnce(f64)>);
}


/// Shared loop state. Nothing in the page calls `stop`; the loop ends when
/// the page is torn down.
#[derive(Debug, Default)]
pub struct FrameLoop {
    stopped: Cell<bool>,
    frames: Cell<u64>,
}
impl FrameLoop {
    pub fn stop(&self) {
        self.stopped.set(true);
    }


    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }


    pub fn frames(&self) -> u64 {
        self.frames.get()
    }
}


pub struct FrameScheduler;
impl FrameScheduler {
    /// Submits the first frame. Each frame re-submits itself before calling
    /// `callback`, so the loop keeps running at the host's refresh cadence.
    pub fn start<H, F>(host: Rc<H>, callback: F) -> Rc<FrameLoop>
    where
        H: FrameHost + 'static,
        F: FnMut(f64) + 'static,
    {
        let frame_loop = Rc::new(FrameLoop::default());
        let callback: Rc<RefCell<dyn FnMut(f64)>> = Rc::new(RefCell::new(callback));
        schedule(host, frame_loop.clone(), callback);
        frame_loop
    }
}


fn schedule<H: FrameHost + 'static>(
    host: Rc<H>,
    frame_loop: Rc<FrameLoop>,
    callback: Rc<RefCell<dyn FnMut(f64)>>,
) {
    let next_host = host.clone();
    host.submit(Box::new(move |timestamp: f64| {
        if frame_loop.is_stopped() {
            return;
        }
        schedule(next_host, frame_loop.clone(), callback.clone());

        frame_loop.frames.set(frame_loop.frames.get() + 1);
        let mut callback = callback.borrow_mut();
        (*callback)(timestamp);
    }));
}


#[cfg(target_arch = "wasm32")]
pub use self::web::AnimationFrameHost;

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;

    use super::FrameHost;
    use crate::error;

    /// `window.requestAnimationFrame` as a frame host.
    pub struct AnimationFrameHost {
        window: web_sys::Window,
    }
    impl AnimationFrameHost {
        pub fn new(window: web_sys::Window) -> Self {
            Self { window }
        }
    }
    impl FrameHost for AnimationFrameHost {
        fn submit(&self, frame: Box<dyn FnOnce(f64)>) {
            let callback = Closure::once_into_js(move |timestamp: f64| frame(timestamp));
            if let Err(e) = self.window.request_animation_frame(callback.unchecked_ref()) {
                error!("AnimationFrameHost::submit(): requestAnimationFrame failed: {:?}", e);
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    /// Holds submitted frames until the test fires them.
    #[derive(Default)]
    struct ManualHost {
        pending: RefCell<Vec<Box<dyn FnOnce(f64)>>>,
    }
    impl FrameHost for ManualHost {
        fn submit(&self, frame: Box<dyn FnOnce(f64)>) {
            self.pending.borrow_mut().push(frame);
        }
    }
    impl ManualHost {
        fn pending(&self) -> usize {
            self.pending.borrow().len()
        }

        /// Runs every frame queued before this call, like one display refresh.
        fn refresh(&self, timestamp: f64) {
            let frames: Vec<_> = self.pending.borrow_mut().drain(..).collect();
            for frame in frames {
                frame(timestamp);
            }
        }
    }

    #[test]
    fn loop_keeps_itself_alive() {
        let host = Rc::new(ManualHost::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_cb = seen.clone();
        let frame_loop = FrameScheduler::start(host.clone(), move |ts| seen_cb.borrow_mut().push(ts));

        assert_eq!(host.pending(), 1);
        for i in 0..5 {
            host.refresh(i as f64 * 16.0);
            // exactly one frame queued at any time
            assert_eq!(host.pending(), 1);
        }
        assert_eq!(*seen.borrow(), vec![0.0, 16.0, 32.0, 48.0, 64.0]);
        assert_eq!(frame_loop.frames(), 5);
    }

    #[test]
    fn next_frame_is_queued_before_the_callback_runs() {
        let host = Rc::new(ManualHost::default());
        let host_cb = host.clone();
        let queued = Rc::new(Cell::new(0usize));
        let queued_cb = queued.clone();
        FrameScheduler::start(host.clone(), move |_| queued_cb.set(host_cb.pending()));

        host.refresh(0.0);
        assert_eq!(queued.get(), 1);
    }

    #[test]
    fn stop_ends_the_loop() {
        let host = Rc::new(ManualHost::default());
        let frame_loop = FrameScheduler::start(host.clone(), |_| {});
        host.refresh(0.0);
        frame_loop.stop();
        host.refresh(16.0);
        assert_eq!(host.pending(), 0);
        assert_eq!(frame_loop.frames(), 1);
    }
}
