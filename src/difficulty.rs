//! Difficulty curve: grid size and colour contrast as a function of stage.

/// Contrast never drops below this, so the odd tile stays visible at any stage.
pub const MIN_CONTRAST: u8 = 5;
/// Contrast before any stage reduction is applied.
pub const BASE_CONTRAST: u32 = 75;
/// Contrast lost per stage.
pub const CONTRAST_STEP: u32 = 3;
/// Grid dimension at stage 1.
pub const BASE_DIMENSION: usize = 2;
/// Number of stages that share one grid dimension.
pub const STAGES_PER_DIMENSION: u32 = 3;

/// Side length of the square grid for `stage`: 2 at stage 1, +1 every 3 stages.
/// Stage 0 is treated as stage 1.
#[inline]
pub fn grid_dimension(stage: u32) -> usize {
    BASE_DIMENSION + (stage.max(1) - 1) as usize / STAGES_PER_DIMENSION as usize
}

/// Magnitude of the single-channel delta applied to the odd tile at `stage`.
#[inline]
pub fn color_contrast(stage: u32) -> u8 {
    let reduced = BASE_CONTRAST.saturating_sub(stage.max(1).saturating_mul(CONTRAST_STEP));
    reduced.max(u32::from(MIN_CONTRAST)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_dimension_steps() {
        assert_eq!(grid_dimension(1), 2);
        assert_eq!(grid_dimension(3), 2);
        assert_eq!(grid_dimension(4), 3);
        assert_eq!(grid_dimension(7), 4);
        assert_eq!(grid_dimension(9), 4);
        assert_eq!(grid_dimension(10), 5);
    }

    #[test]
    fn test_grid_dimension_monotonic() {
        let mut prev = grid_dimension(1);
        for stage in 2..500 {
            let d = grid_dimension(stage);
            assert!(d >= 2);
            assert!(d == prev || d == prev + 1, "stage {stage}: {prev} -> {d}");
            if (stage - 1) % 3 == 0 {
                assert_eq!(d, prev + 1);
            } else {
                assert_eq!(d, prev);
            }
            prev = d;
        }
    }

    #[test]
    fn test_color_contrast_values() {
        assert_eq!(color_contrast(1), 72);
        assert_eq!(color_contrast(10), 45);
        assert_eq!(color_contrast(23), 6);
        assert_eq!(color_contrast(24), 5);
        assert_eq!(color_contrast(100), 5);
        assert_eq!(color_contrast(u32::MAX), MIN_CONTRAST);
    }

    #[test]
    fn test_color_contrast_non_increasing() {
        let mut prev = color_contrast(1);
        for stage in 2..200 {
            let c = color_contrast(stage);
            assert!(c <= prev);
            assert!(c >= MIN_CONTRAST);
            prev = c;
        }
    }

    #[test]
    fn test_stage_zero_is_stage_one() {
        assert_eq!(grid_dimension(0), grid_dimension(1));
        assert_eq!(color_contrast(0), color_contrast(1));
    }
}
