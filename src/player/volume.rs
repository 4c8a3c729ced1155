/// Output level with an explicit mute flag.
///
/// Muting never touches `level`, so unmuting restores exactly what was
/// there before.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume {
    level: f32,
    muted: bool,
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Volume {
    pub fn new(level: f32) -> Self {
        Self {
            level: clamp_level(level),
            muted: false,
        }
    }

    pub fn from_percent(percent: u8) -> Self {
        Self::new(f32::from(percent.min(100)) / 100.0)
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn percent(&self) -> u8 {
        (self.level * 100.0).round() as u8
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Silent either because muted or because the level is zero.
    pub fn is_silent(&self) -> bool {
        self.muted || self.level == 0.0
    }

    /// Sets the level and clears mute.
    pub fn set_level(&mut self, level: f32) {
        self.level = clamp_level(level);
        self.muted = false;
    }

    pub fn step_up(&mut self, step: f32) {
        self.set_level(self.level + step);
    }

    pub fn step_down(&mut self, step: f32) {
        self.set_level(self.level - step);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    /// Gain handed to the output.
    pub fn gain(&self) -> f32 {
        if self.muted { 0.0 } else { self.level }
    }
}

fn clamp_level(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}
