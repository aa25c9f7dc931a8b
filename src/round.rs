//! Round generation: a square grid of identical tiles with one odd tile.

use crate::difficulty::{color_contrast, grid_dimension};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Base colour channels are drawn from this range, away from black and white.
const BASE_CHANNEL_MIN: u8 = 50;
const BASE_CHANNEL_MAX: u8 = 205;

/// One colour channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Self; 3] = [Self::Red, Self::Green, Self::Blue];
}

/// 8-bit RGB colour. Channels are clamped to 0..=255 by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub fn channel(&self, channel: Channel) -> u8 {
        match channel {
            Channel::Red => self.r,
            Channel::Green => self.g,
            Channel::Blue => self.b,
        }
    }

    #[inline]
    pub fn with_channel(mut self, channel: Channel, value: u8) -> Self {
        match channel {
            Channel::Red => self.r = value,
            Channel::Green => self.g = value,
            Channel::Blue => self.b = value,
        }
        self
    }

    /// Brighten `channel` by `delta`, clamped at 255. If the clamp swallows the
    /// whole delta (channel already at 255) the channel is darkened instead, so
    /// the result differs from `self` whenever `delta > 0`.
    pub fn shifted(self, channel: Channel, delta: u8) -> Self {
        let value = self.channel(channel);
        let up = value.saturating_add(delta);
        if up != value {
            return self.with_channel(channel, up);
        }
        self.with_channel(channel, value.saturating_sub(delta))
    }
}

/// One cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Position in row-major order.
    pub id: usize,
    pub color: Rgb,
    pub is_target: bool,
}

/// A generated grid. Never edited after generation; a new stage gets a new round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    stage: u32,
    dimension: usize,
    tiles: Vec<Tile>,
    target_index: usize,
    base: Rgb,
    target: Rgb,
    channel: Channel,
}

impl Round {
    pub fn stage(&self) -> u32 {
        self.stage
    }

    /// Side length; `tiles().len() == dimension() * dimension()`.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn target_index(&self) -> usize {
        self.target_index
    }

    pub fn base_color(&self) -> Rgb {
        self.base
    }

    pub fn target_color(&self) -> Rgb {
        self.target
    }

    /// Channel the target colour was shifted along.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        index < self.tiles.len()
    }
}

/// Produces rounds from an injected random source.
#[derive(Debug, Clone)]
pub struct RoundGenerator<R = StdRng> {
    rng: R,
}

impl RoundGenerator<StdRng> {
    /// Reproducible generator: the same seed yields the same rounds.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> RoundGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn generate(&mut self, stage: u32) -> Round {
        let stage = stage.max(1);
        let dimension = grid_dimension(stage);
        let total = dimension * dimension;

        let base = Rgb::new(
            self.rng.random_range(BASE_CHANNEL_MIN..=BASE_CHANNEL_MAX),
            self.rng.random_range(BASE_CHANNEL_MIN..=BASE_CHANNEL_MAX),
            self.rng.random_range(BASE_CHANNEL_MIN..=BASE_CHANNEL_MAX),
        );
        let channel = Channel::ALL[self.rng.random_range(0..Channel::ALL.len())];
        let target = base.shifted(channel, color_contrast(stage));
        let target_index = self.rng.random_range(0..total);

        let tiles = (0..total)
            .map(|id| {
                let is_target = id == target_index;
                Tile {
                    id,
                    color: if is_target { target } else { base },
                    is_target,
                }
            })
            .collect();

        Round {
            stage,
            dimension,
            tiles,
            target_index,
            base,
            target,
            channel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::MIN_CONTRAST;

    fn assert_well_formed(round: &Round) {
        let dim = grid_dimension(round.stage());
        assert_eq!(round.dimension(), dim);
        assert_eq!(round.len(), dim * dim);
        assert!(round.contains(round.target_index()));

        let targets: Vec<_> = round.tiles().iter().filter(|t| t.is_target).collect();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].id, round.target_index());

        for (i, tile) in round.tiles().iter().enumerate() {
            assert_eq!(tile.id, i);
            if !tile.is_target {
                assert_eq!(tile.color, round.base_color());
            }
        }
        assert_ne!(round.target_color(), round.base_color());
    }

    #[test]
    fn test_rounds_are_well_formed() {
        let mut generator = RoundGenerator::seeded(7);
        for stage in 1..60 {
            for _ in 0..20 {
                assert_well_formed(&generator.generate(stage));
            }
        }
    }

    #[test]
    fn test_delta_is_on_one_channel() {
        let mut generator = RoundGenerator::seeded(99);
        for stage in 1..40 {
            let round = generator.generate(stage);
            let base = round.base_color();
            let target = round.target_color();
            for channel in Channel::ALL {
                if channel == round.channel() {
                    let value = base.channel(channel);
                    let delta = value.abs_diff(target.channel(channel));
                    assert_eq!(delta, color_contrast(stage).min(255 - value));
                    assert!(delta > 0);
                } else {
                    assert_eq!(base.channel(channel), target.channel(channel));
                }
            }
        }
    }

    #[test]
    fn test_base_channels_in_range() {
        let mut generator = RoundGenerator::seeded(3);
        for _ in 0..500 {
            let base = generator.generate(1).base_color();
            for channel in Channel::ALL {
                let v = base.channel(channel);
                assert!((BASE_CHANNEL_MIN..=BASE_CHANNEL_MAX).contains(&v));
            }
        }
    }

    #[test]
    fn test_same_seed_same_rounds() {
        let mut a = RoundGenerator::seeded(1234);
        let mut b = RoundGenerator::seeded(1234);
        for stage in 1..20 {
            assert_eq!(a.generate(stage), b.generate(stage));
        }
    }

    #[test]
    fn test_target_position_varies() {
        let mut generator = RoundGenerator::seeded(5);
        let first = generator.generate(10).target_index();
        let varies = (0..50).any(|_| generator.generate(10).target_index() != first);
        assert!(varies);
    }

    #[test]
    fn test_shift_at_upper_boundary_flips_direction() {
        let base = Rgb::new(255, 255, 255);
        for channel in Channel::ALL {
            let shifted = base.shifted(channel, MIN_CONTRAST);
            assert_ne!(shifted, base);
            assert_eq!(shifted.channel(channel), 255 - MIN_CONTRAST);
        }
    }

    #[test]
    fn test_shift_at_lower_boundary_adds() {
        let base = Rgb::new(0, 0, 0);
        let shifted = base.shifted(Channel::Green, 72);
        assert_eq!(shifted, Rgb::new(0, 72, 0));
    }

    #[test]
    fn test_shift_near_top_clamps_but_stays_distinct() {
        let base = Rgb::new(10, 253, 10);
        let shifted = base.shifted(Channel::Green, 72);
        assert_eq!(shifted, Rgb::new(10, 255, 10));
    }

    #[test]
    fn test_shift_never_degenerate_for_any_value() {
        for value in 0..=255u8 {
            for delta in [MIN_CONTRAST, 30, 72] {
                let base = Rgb::new(value, value, value);
                for channel in Channel::ALL {
                    assert_ne!(base.shifted(channel, delta), base, "value {value} delta {delta}");
                }
            }
        }
    }
}
