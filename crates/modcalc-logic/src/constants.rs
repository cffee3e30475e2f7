//! Calculator constants — form limits and stat formula coefficients.
//!
//! Plain numeric constants with no UI dependency. Both the CLI front-end
//! and the simtest harness read these.

pub mod limits {
    /// Maximum modules installed at once, summed across every kind and tier.
    pub const MAX_TOTAL_MODULES: u32 = 9;
    pub const MIN_TIER: u32 = 1;
    pub const MAX_TIER: u32 = 40;
    /// Tier given to a freshly added entry.
    pub const DEFAULT_TIER: u32 = 1;
}

pub mod coefficients {
    // Processing speed: 1 + S - 0.25P
    pub const SPEED_PRODUCTIVITY_PENALTY: f64 = 0.25;

    // Energy consumption (machines): (1 + 2S + 0.5P) * 0.85^E
    pub const CONSUMPTION_PER_SPEED: f64 = 2.0;
    pub const CONSUMPTION_PER_PRODUCTIVITY: f64 = 0.5;
    pub const CONSUMPTION_EFFICIENCY_BASE: f64 = 0.85;

    // Energy production (generators): (1 + 0.5E) * 0.9^S * 0.8^P
    pub const PRODUCTION_PER_EFFICIENCY: f64 = 0.5;
    pub const PRODUCTION_SPEED_BASE: f64 = 0.9;
    pub const PRODUCTION_PRODUCTIVITY_BASE: f64 = 0.8;

    // Product waste: 100 - 10S * 0.75^P
    pub const WASTE_CEILING: f64 = 100.0;
    pub const WASTE_PER_SPEED: f64 = 10.0;
    pub const WASTE_PRODUCTIVITY_BASE: f64 = 0.75;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_range_is_ordered() {
        assert!(limits::MIN_TIER <= limits::DEFAULT_TIER);
        assert!(limits::DEFAULT_TIER <= limits::MAX_TIER);
    }

    #[test]
    fn decay_bases_shrink() {
        for base in [
            coefficients::CONSUMPTION_EFFICIENCY_BASE,
            coefficients::PRODUCTION_SPEED_BASE,
            coefficients::PRODUCTION_PRODUCTIVITY_BASE,
            coefficients::WASTE_PRODUCTIVITY_BASE,
        ] {
            assert!(base > 0.0 && base < 1.0, "{base} should be a decay factor");
        }
    }
}
