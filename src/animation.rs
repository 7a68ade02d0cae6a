//! Animator – timed appear / hold / fade of a reaction icon.
//!
//! The animator only interpolates and paces frames onto a [`RenderLayer`];
//! it never touches game state.

use crate::config::ReactionConfig;
use crate::types::{AnimType, Point};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Render layer boundary
// ---------------------------------------------------------------------------

/// Handle of a sprite owned by a [`RenderLayer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteId(pub u64);

/// Visual state of one sampled frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub alpha: f64,
    pub scale: f64,
}

/// The scene's primary render layer. Sprites parented here pan with the
/// camera and are torn down with the scene.
pub trait RenderLayer: Send + Sync {
    fn spawn_sprite(&self, asset: &str, anchor: Point, size: f64) -> SpriteId;
    fn update_sprite(&self, sprite: SpriteId, frame: Frame);
    fn remove_sprite(&self, sprite: SpriteId);
}

// ---------------------------------------------------------------------------
// Easing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    EaseOutQuad,
    EaseInOutSine,
    EaseOutBack,
}

impl Easing {
    /// Map `t ∈ [0, 1]` onto the curve.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOutSine => -((std::f64::consts::PI * t).cos() - 1.0) / 2.0,
            Easing::EaseOutBack => {
                const C1: f64 = 1.70158;
                const C3: f64 = C1 + 1.0;
                1.0 + C3 * (t - 1.0).powi(3) + C1 * (t - 1.0).powi(2)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Animation kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationKind {
    Info,
    Question,
    Exclamation,
}

impl AnimationKind {
    pub fn from_anim_type(anim: AnimType) -> Option<Self> {
        match anim {
            AnimType::None => None,
            AnimType::Info => Some(AnimationKind::Info),
            AnimType::Question => Some(AnimationKind::Question),
            AnimType::Exclamation => Some(AnimationKind::Exclamation),
        }
    }

    pub fn asset(self) -> &'static str {
        match self {
            AnimationKind::Info => "modules/tripwire/img/reaction-info.svg",
            AnimationKind::Question => "modules/tripwire/img/reaction-question.svg",
            AnimationKind::Exclamation => "modules/tripwire/img/reaction-exclamation.svg",
        }
    }

    /// Curve used for the appear phase; the fade is always linear.
    pub fn easing(self) -> Easing {
        match self {
            AnimationKind::Info => Easing::EaseOutQuad,
            AnimationKind::Question => Easing::EaseInOutSine,
            AnimationKind::Exclamation => Easing::EaseOutBack,
        }
    }
}

// ---------------------------------------------------------------------------
// Animator
// ---------------------------------------------------------------------------

pub struct Animator {
    timing: ReactionConfig,
}

impl Animator {
    pub fn new(timing: ReactionConfig) -> Self {
        Self { timing }
    }

    /// Sampled frame at `elapsed` into the animation, or `None` once done.
    pub fn frame_at(&self, kind: AnimationKind, elapsed: Duration) -> Option<Frame> {
        let ms = elapsed.as_millis() as u64;
        let appear = self.timing.appear_ms;
        let hold_end = appear + self.timing.hold_ms;
        let fade_end = hold_end + self.timing.fade_ms;

        if ms < appear {
            let t = kind.easing().apply(ms as f64 / appear as f64);
            Some(Frame {
                alpha: t.min(1.0),
                scale: t,
            })
        } else if ms < hold_end {
            Some(Frame {
                alpha: 1.0,
                scale: 1.0,
            })
        } else if ms < fade_end {
            let t = (ms - hold_end) as f64 / self.timing.fade_ms as f64;
            Some(Frame {
                alpha: 1.0 - Easing::Linear.apply(t),
                scale: 1.0,
            })
        } else {
            None
        }
    }

    pub fn total_duration(&self) -> Duration {
        Duration::from_millis(self.timing.appear_ms + self.timing.hold_ms + self.timing.fade_ms)
    }

    /// Play `kind` at `anchor` on `layer`, resolving once the sprite is gone.
    pub async fn play(
        &self,
        layer: Arc<dyn RenderLayer>,
        kind: AnimationKind,
        anchor: Point,
        size: f64,
    ) {
        let sprite = layer.spawn_sprite(kind.asset(), anchor, size);
        let start = tokio::time::Instant::now();
        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.timing.frame_ms.max(1)));

        loop {
            ticker.tick().await;
            match self.frame_at(kind, start.elapsed()) {
                Some(frame) => layer.update_sprite(sprite, frame),
                None => break,
            }
        }

        layer.remove_sprite(sprite);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_curves_hit_both_ends() {
        for easing in [
            Easing::Linear,
            Easing::EaseOutQuad,
            Easing::EaseInOutSine,
            Easing::EaseOutBack,
        ] {
            assert!(easing.apply(0.0).abs() < 1e-9, "{:?} at 0", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-9, "{:?} at 1", easing);
        }
    }

    #[test]
    fn frames_follow_appear_hold_fade() {
        let animator = Animator::new(ReactionConfig::default());
        let kind = AnimationKind::Info;

        let start = animator.frame_at(kind, Duration::ZERO).unwrap();
        assert_eq!(start.alpha, 0.0);

        let hold = animator.frame_at(kind, Duration::from_millis(500)).unwrap();
        assert_eq!(hold, Frame { alpha: 1.0, scale: 1.0 });

        let fading = animator.frame_at(kind, Duration::from_millis(1400)).unwrap();
        assert!(fading.alpha > 0.0 && fading.alpha < 1.0);

        assert!(animator.frame_at(kind, animator.total_duration()).is_none());
    }
}
