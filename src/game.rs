//! GameChanger – shared camera and session clock side effects.

use crate::types::Point;
use async_trait::async_trait;
use std::sync::Arc;

/// Camera / view service of the host.
#[async_trait]
pub trait Camera: Send + Sync {
    /// Smoothly pan the shared viewport to centre on `to`; resolves when done.
    async fn pan_to(&self, to: Point);
}

/// Session clock of the host.
#[async_trait]
pub trait SessionClock: Send + Sync {
    async fn pause(&self);
}

#[derive(Clone)]
pub struct GameChanger {
    camera: Arc<dyn Camera>,
    clock: Arc<dyn SessionClock>,
}

impl GameChanger {
    pub fn new(camera: Arc<dyn Camera>, clock: Arc<dyn SessionClock>) -> Self {
        Self { camera, clock }
    }

    pub async fn pan(&self, coords: Point) {
        self.camera.pan_to(coords).await;
    }

    /// Start a pan without waiting for it to finish.
    pub fn pan_detached(&self, coords: Point) -> tokio::task::JoinHandle<()> {
        let camera = self.camera.clone();
        tokio::spawn(async move { camera.pan_to(coords).await })
    }

    pub async fn pause(&self) {
        self.clock.pause().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct Recorder {
        pans: Mutex<Vec<Point>>,
        paused: AtomicBool,
    }

    #[async_trait]
    impl Camera for Recorder {
        async fn pan_to(&self, to: Point) {
            self.pans.lock().push(to);
        }
    }

    #[async_trait]
    impl SessionClock for Recorder {
        async fn pause(&self) {
            self.paused.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn pan_and_pause_reach_the_host() {
        let recorder = Arc::new(Recorder::default());
        let game = GameChanger::new(recorder.clone(), recorder.clone());

        game.pan(Point::new(10.0, 20.0)).await;
        game.pan_detached(Point::new(30.0, 40.0)).await.unwrap();
        game.pause().await;

        assert_eq!(
            *recorder.pans.lock(),
            vec![Point::new(10.0, 20.0), Point::new(30.0, 40.0)]
        );
        assert!(recorder.paused.load(Ordering::SeqCst));
    }
}
