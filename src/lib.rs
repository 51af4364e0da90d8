pub mod cic;
pub mod config;
pub mod decimator;
pub mod fifo;
pub mod harness;
pub mod report;
pub mod scenario;
pub mod stimulus;
pub mod trace;

/// Most negative representable PCM value for the given data width.
pub fn pcm_min(width: u32) -> i64 {
    -(1i64 << (width - 1))
}

/// Most positive representable PCM value for the given data width.
pub fn pcm_max(width: u32) -> i64 {
    (1i64 << (width - 1)) - 1
}

/// Map the ones count of one decimation window onto the signed PCM range.
///
/// All-zero windows land on the most negative value, all-one windows on the
/// most positive, 50% duty cycle within one LSB of zero. Both the device model
/// and the checker use this mapping, so deterministic patterns compare exactly.
pub fn pcm_from_ones(ones: u32, ratio: u32, width: u32) -> i64 {
    debug_assert!(ones <= ratio);
    let full_range = (1u64 << width) - 1;
    (ones as u64 * full_range / ratio as u64) as i64 + pcm_min(width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duty_cycle_mapping_endpoints() {
        assert_eq!(pcm_from_ones(0, 16, 16), -32768);
        assert_eq!(pcm_from_ones(16, 16, 16), 32767);
        // 50% duty cycle sits within one LSB of zero
        assert_eq!(pcm_from_ones(8, 16, 16), -1);
    }

    #[test]
    fn duty_cycle_mapping_is_monotonic() {
        let mut last = i64::MIN;
        for ones in 0..=16 {
            let pcm = pcm_from_ones(ones, 16, 16);
            assert!(pcm >= last);
            last = pcm;
        }
    }

    #[test]
    fn mapping_stays_in_range_at_width_extremes() {
        for width in [8, 16, 24, 32] {
            assert_eq!(pcm_from_ones(0, 48, width), pcm_min(width));
            assert_eq!(pcm_from_ones(48, 48, width), pcm_max(width));
        }
    }
}
