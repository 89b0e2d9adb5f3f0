/// Frames averaged before a new step time is published.
const WINDOW_FRAMES: u32 = 10;

/// Rolling average of physics step time.
///
/// The host measures each step with its own clock and feeds the result in
/// milliseconds; once more than `WINDOW_FRAMES` frames have been recorded
/// the window average is published and the window restarts.
#[derive(Clone, Copy, Debug, Default)]
pub struct StepTimings {
    sum_ms: f32,
    frames: u32,
    average_ms: Option<f32>,
}

impl StepTimings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one step. Returns the new average when a window closes.
    pub fn record(&mut self, step_ms: f32) -> Option<f32> {
        self.sum_ms += step_ms;
        self.frames += 1;

        if self.frames > WINDOW_FRAMES {
            let average = self.sum_ms / self.frames as f32;
            self.average_ms = Some(average);
            self.sum_ms = 0.0;
            self.frames = 0;
            return Some(average);
        }
        None
    }

    /// Last published window average.
    pub fn average_ms(&self) -> Option<f32> {
        self.average_ms
    }
}
