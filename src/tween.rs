//! Minimal tween engine: eased transitions of a value toward a target over
//! a fixed duration, advanced by the frame loop.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};


/// Values the engine can interpolate.
pub trait Tweenable: Copy {
    fn lerp(self, to: Self, t: f32) -> Self;
}
impl Tweenable for f32 {
    fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EaseKind {
    In,
    Out,
    InOut,
}


/// Power easing family with gsap naming: `powerN` raises progress to
/// `N + 1`, so `power0` is linear and `power2.out` is a cubic ease-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ease {
    power: u8,
    kind: EaseKind,
}
impl Ease {
    pub const LINEAR: Ease = Ease { power: 0, kind: EaseKind::Out };
    pub const POWER2_OUT: Ease = Ease { power: 2, kind: EaseKind::Out };

    /// `power0` has no direction; it always compares equal to `LINEAR`.
    pub fn new(power: u8, kind: EaseKind) -> Self {
        let power = power.min(4);
        let kind = if power == 0 { EaseKind::Out } else { kind };
        Self { power, kind }
    }


    /// Maps linear progress in `[0,1]` to eased progress in `[0,1]`.
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if self.power == 0 {
            return t;
        }
        let e = self.power as i32 + 1;
        match self.kind {
            EaseKind::In => t.powi(e),
            EaseKind::Out => 1.0 - (1.0 - t).powi(e),
            EaseKind::InOut => {
                if t < 0.5 {
                    (t * 2.0).powi(e) / 2.0
                } else {
                    1.0 - ((1.0 - t) * 2.0).powi(e) / 2.0
                }
            },
        }
    }


    /// True when the curve slows down toward the end of the tween.
    pub fn is_decelerating(&self) -> bool {
        self.power > 0 && self.kind == EaseKind::Out
    }
}
impl Default for Ease {
    fn default() -> Self {
        Self::POWER2_OUT
    }
}
impl FromStr for Ease {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (family, kind) = match s.split_once('.') {
            Some((family, kind)) => (family, Some(kind)),
            None => (s, None),
        };
        let power = match family.to_ascii_lowercase().as_str() {
            "none" | "linear" | "power0" => 0,
            "power1" | "quad" => 1,
            "power2" | "cubic" => 2,
            "power3" | "quart" => 3,
            "power4" | "quint" | "strong" => 4,
            _ => return Err(format!("unknown ease: {}", s)),
        };
        let kind = match kind {
            None | Some("out") => EaseKind::Out,
            Some("in") => EaseKind::In,
            Some("inOut") => EaseKind::InOut,
            Some(_) => return Err(format!("unknown ease direction: {}", s)),
        };
        Ok(Ease::new(power, kind))
    }
}
impl TryFrom<String> for Ease {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.power == 0 {
            return write!(f, "none");
        }
        let kind = match self.kind {
            EaseKind::In => "in",
            EaseKind::Out => "out",
            EaseKind::InOut => "inOut",
        };
        write!(f, "power{}.{}", self.power, kind)
    }
}
impl From<Ease> for String {
    fn from(ease: Ease) -> Self {
        ease.to_string()
    }
}


/// What happens to in-flight tweens when a new one is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Overwrite {
    /// The new tween replaces any running one, starting from the current value.
    #[default]
    Auto,
    /// Tweens run side by side; the newest writes last each tick.
    None,
}


#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenRequest<T> {
    pub to: T,
    pub duration: f32,
    pub ease: Ease,
}


#[derive(Debug, Clone)]
struct Tween<T> {
    from: T,
    to: T,
    duration: f32,
    ease: Ease,
    elapsed: f32,
}
impl<T: Tweenable> Tween<T> {
    fn advance(&mut self, dt: f32) -> T {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        let t = self.ease.apply(self.elapsed / self.duration);
        self.from.lerp(self.to, t)
    }


    fn finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}


#[derive(Debug, Clone)]
pub struct Animator<T> {
    overwrite: Overwrite,
    tweens: Vec<Tween<T>>,
}
impl<T: Tweenable> Animator<T> {
    pub fn new(overwrite: Overwrite) -> Self {
        Self {
            overwrite,
            tweens: Vec::new(),
        }
    }


    pub fn active(&self) -> usize {
        self.tweens.len()
    }


    /// Starts a tween from the current `value`. A non-positive duration
    /// writes the target immediately.
    pub fn animate_to(&mut self, value: &mut T, request: TweenRequest<T>) {
        if self.overwrite == Overwrite::Auto {
            self.tweens.clear();
        }
        if !(request.duration > 0.0) {
            *value = request.to;
            return;
        }
        self.tweens.push(Tween {
            from: *value,
            to: request.to,
            duration: request.duration,
            ease: request.ease,
            elapsed: 0.0,
        });
    }


    /// Advances every tween by `dt` seconds in creation order and drops
    /// the finished ones.
    pub fn tick(&mut self, dt: f32, value: &mut T) {
        if self.tweens.is_empty() {
            return;
        }
        let dt = dt.max(0.0);
        for tween in self.tweens.iter_mut() {
            *value = tween.advance(dt);
        }
        self.tweens.retain(|t| !t.finished());
    }
}
