use crate::constants::DEFAULT_INSTRUCTIONS_PER_TICK;

/// # Quirks
/// Interpreters have historically disagreed on a handful of instructions.
/// Each disagreement is a toggle here rather than a hard-coded choice.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Quirks {
    /// 8XY6/8XYE shift Vy into Vx instead of shifting Vx in place
    pub shift_uses_vy: bool,
    /// 8XY1/8XY2/8XY3 clear VF
    pub logic_resets_vf: bool,
    /// FX55/FX65 leave I pointing just past the last register transferred
    pub load_store_increments_i: bool,
}

impl Quirks {
    /// CHIP-48 / SUPER-CHIP era behaviour, which most ROMs written since expect
    pub fn modern() -> Self {
        Quirks {
            shift_uses_vy: false,
            logic_resets_vf: false,
            load_store_increments_i: false,
        }
    }

    /// The original COSMAC VIP interpreter
    pub fn cosmac_vip() -> Self {
        Quirks {
            shift_uses_vy: true,
            logic_resets_vf: true,
            load_store_increments_i: true,
        }
    }
}

impl Default for Quirks {
    fn default() -> Self {
        Self::modern()
    }
}

/// Knobs for the cycle driver.
///
/// ```
/// use chip8_vm::{Config, Quirks};
///
/// let config = Config::default()
///     .with_quirks(Quirks::cosmac_vip())
///     .with_instructions_per_tick(12)
///     .with_rng_seed(0xC8);
/// assert_eq!(config.instructions_per_tick, 12);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub quirks: Quirks,
    /// How many instructions `run_frame` executes before ticking the timers once
    pub instructions_per_tick: usize,
    /// Seed for `RND`; entropy from the OS when `None`
    pub rng_seed: Option<u64>,
}

impl Config {
    pub fn with_quirks(mut self, quirks: Quirks) -> Self {
        self.quirks = quirks;
        self
    }

    pub fn with_instructions_per_tick(mut self, instructions_per_tick: usize) -> Self {
        self.instructions_per_tick = instructions_per_tick;
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            quirks: Quirks::default(),
            instructions_per_tick: DEFAULT_INSTRUCTIONS_PER_TICK,
            rng_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_quirks_are_modern() {
        assert_eq!(Quirks::default(), Quirks::modern());
        assert!(!Quirks::default().shift_uses_vy);
    }

    #[test]
    fn test_cosmac_vip_enables_every_quirk() {
        let quirks = Quirks::cosmac_vip();
        assert!(quirks.shift_uses_vy);
        assert!(quirks.logic_resets_vf);
        assert!(quirks.load_store_increments_i);
    }

    #[test]
    fn test_builder_overrides_defaults() {
        let config = Config::default().with_rng_seed(7).with_instructions_per_tick(1);
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.instructions_per_tick, 1);
        assert_eq!(config.quirks, Quirks::modern());
    }
}
