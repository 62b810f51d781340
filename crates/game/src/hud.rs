//! Score overlay boundary. The game only pushes values; it never reads them back.

/// Receiver of per-frame HUD values.
pub trait HudSink {
    fn set_collisions(&mut self, count: u32);
    fn set_bonus(&mut self, count: u32);
    /// Last frame duration in milliseconds.
    fn set_frame_time(&mut self, millis: f32);
    /// Damage flash intensity in [0, 1].
    fn set_damage(&mut self, amount: f32);
}

/// HUD that writes changes to the log.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LogHud {
    pub collisions: u32,
    pub bonus: u32,
    pub frame_time: f32,
    pub damage: f32,
}

impl LogHud {
    pub fn new() -> Self {
        Self::default()
    }

    /// One-line summary, e.g. for the window title.
    pub fn summary(&self) -> String {
        format!(
            "collisions {} | bonus {} | {:.1} ms",
            self.collisions, self.bonus, self.frame_time
        )
    }
}

impl HudSink for LogHud {
    fn set_collisions(&mut self, count: u32) {
        if count != self.collisions {
            log::debug!("Collisions: {}", count);
        }
        self.collisions = count;
    }

    fn set_bonus(&mut self, count: u32) {
        if count != self.bonus {
            log::debug!("Bonus: {}", count);
        }
        self.bonus = count;
    }

    fn set_frame_time(&mut self, millis: f32) {
        self.frame_time = millis;
    }

    fn set_damage(&mut self, amount: f32) {
        self.damage = amount.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_hud_keeps_latest_values() {
        let mut hud = LogHud::new();
        hud.set_collisions(3);
        hud.set_bonus(1);
        hud.set_frame_time(16.7);
        hud.set_damage(2.0);
        assert_eq!(hud.collisions, 3);
        assert_eq!(hud.bonus, 1);
        assert_eq!(hud.damage, 1.0);
        assert_eq!(hud.summary(), "collisions 3 | bonus 1 | 16.7 ms");
    }
}
