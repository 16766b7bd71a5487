use std::time::Duration;

/// Fixed pause after each remote operation. Not adaptive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle(pub Duration);

impl Default for Throttle {
    fn default() -> Self {
        Self(Duration::from_secs(1))
    }
}

impl Throttle {
    pub fn none() -> Self {
        Self(Duration::ZERO)
    }

    pub async fn pause(&self) {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
    }
}
