/// Smoothing factor of the frame time average.
const FPS_ALPHA: f32 = 1.0 / 100.0;

/// Frames per second from an exponential moving average of frame times.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FpsCounter {
    average_duration: f32,
    frame_count: u64,
    fps: u32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one frame time in seconds. Non-positive times are ignored.
    pub fn update(&mut self, delta_time: f32) {
        if !(delta_time > 0.0 && delta_time.is_finite()) {
            return;
        }
        self.average_duration = if self.frame_count == 0 {
            delta_time
        } else {
            self.average_duration * (1.0 - FPS_ALPHA) + delta_time * FPS_ALPHA
        };
        self.frame_count += 1;
        self.fps = (1.0 / self.average_duration) as u32;
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn average_duration(&self) -> f32 {
        self.average_duration
    }
}
