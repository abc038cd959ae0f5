use crate::I2cError;
use crate::registers::{MAX_DIVISOR_A, MAX_DIVISOR_B};

/// The two stage clock divisor of the controller.
///
/// The bus runs at `input / (22 * (a + 1) * (b + 1))`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct BusDivisors {
    a: u8,
    b: u8,
}

impl BusDivisors {
    /// Slowest setting.
    pub const MAX: Self = Self {
        a: MAX_DIVISOR_A,
        b: MAX_DIVISOR_B,
    };

    /// Returns `None` if either divisor is out of range.
    #[must_use]
    pub const fn new(a: u8, b: u8) -> Option<Self> {
        if a <= MAX_DIVISOR_A && b <= MAX_DIVISOR_B {
            Some(Self { a, b })
        } else {
            None
        }
    }

    #[must_use]
    pub const fn a(self) -> u8 {
        self.a
    }

    #[must_use]
    pub const fn b(self) -> u8 {
        self.b
    }

    /// Picks the divisors giving the fastest bus clock that does not exceed
    /// `requested_hz`, returning them together with that clock.
    ///
    /// The search starts from the direct estimate `input / (22 * requested) - 1`
    /// split into its two fields, then walks towards slower settings: `a` is
    /// stepped first, and once it saturates `b` moves up and `a` restarts at
    /// half its range.
    ///
    /// # Errors
    /// - [`I2cError::UnsupportedFrequency`] for a zero request.
    /// - [`I2cError::FrequencyTooLow`] if even [`BusDivisors::MAX`] is too fast.
    #[allow(clippy::cast_possible_truncation)]
    pub fn for_frequency(input_hz: u32, requested_hz: u32) -> Result<(Self, u32), I2cError> {
        if requested_hz == 0 {
            return Err(I2cError::UnsupportedFrequency);
        }

        let estimate = u64::from(input_hz) / (22 * u64::from(requested_hz));
        let (mut a, mut b) = if estimate > 0 {
            let divisor = estimate - 1;
            let a = divisor & u64::from(MAX_DIVISOR_A);
            let b = divisor >> 6;
            if b > u64::from(MAX_DIVISOR_B) {
                (MAX_DIVISOR_A, MAX_DIVISOR_B)
            } else {
                (a as u8, b as u8)
            }
        } else {
            (0, 0)
        };

        while b <= MAX_DIVISOR_B {
            let divisors = Self { a, b };
            let actual = actual_bus_frequency(input_hz, divisors);
            if actual <= requested_hz {
                return Ok((divisors, actual));
            }

            if a == MAX_DIVISOR_A {
                b += 1;
                a = a / 2 + 1;
            } else {
                a += 1;
            }
        }

        Err(I2cError::FrequencyTooLow {
            requested: requested_hz,
            slowest: actual_bus_frequency(input_hz, Self::MAX),
        })
    }
}

/// Bus clock produced by `divisors` from an `input_hz` input clock.
#[must_use]
#[allow(clippy::cast_lossless)]
pub const fn actual_bus_frequency(input_hz: u32, divisors: BusDivisors) -> u32 {
    let denominator = 22 * (divisors.a as u32 + 1) * (divisors.b as u32 + 1);
    input_hz / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: u32 = 100_000_000;

    #[test]
    fn standard_mode_at_100mhz() {
        let (div, actual) = BusDivisors::for_frequency(INPUT, 100_000).unwrap();
        assert_eq!((div.a(), div.b()), (45, 0));
        assert_eq!(actual, 98_814);
    }

    #[test]
    fn fast_mode_at_100mhz() {
        // estimate 11 -> a = 10 gives 413_223; a = 11 gives 378_787
        let (div, actual) = BusDivisors::for_frequency(INPUT, 400_000).unwrap();
        assert_eq!((div.a(), div.b()), (11, 0));
        assert_eq!(actual, 378_787);
        assert!(actual <= 400_000);
    }

    #[test]
    fn exact_division_is_taken() {
        // 22 * 10 = 220 -> 100 MHz / 220 = 454_545
        let (div, actual) = BusDivisors::for_frequency(INPUT, 454_545).unwrap();
        assert_eq!((div.a(), div.b()), (9, 0));
        assert_eq!(actual, 454_545);
    }

    #[test]
    fn requests_above_input_use_fastest_setting() {
        let (div, actual) = BusDivisors::for_frequency(1_000_000, 10_000_000).unwrap();
        assert_eq!(div, BusDivisors::default());
        assert_eq!(actual, 45_454);
    }

    #[test]
    fn crossing_into_second_stage() {
        // estimate 64 -> divisor 63: a = 63, b = 0 gives exactly 1_000, so the
        // search moves on to a = 32, b = 1
        let input = 22 * 64 * 1_000;
        let (div, actual) = BusDivisors::for_frequency(input, 999).unwrap();
        assert_eq!(div.b(), 1);
        assert!(actual <= 999);
        assert_eq!(actual, actual_bus_frequency(input, div));
    }

    #[test]
    fn slower_than_slowest() {
        assert_eq!(actual_bus_frequency(INPUT, BusDivisors::MAX), 17_755);
        assert_eq!(
            BusDivisors::for_frequency(INPUT, 1_000),
            Err(I2cError::FrequencyTooLow {
                requested: 1_000,
                slowest: 17_755
            })
        );
        assert_eq!(BusDivisors::for_frequency(INPUT, 17_755).map(|(_, hz)| hz), Ok(17_755));
    }

    #[test]
    fn zero_is_unsupported() {
        assert_eq!(
            BusDivisors::for_frequency(INPUT, 0),
            Err(I2cError::UnsupportedFrequency)
        );
    }

    #[test]
    fn divisor_bounds() {
        assert!(BusDivisors::new(63, 3).is_some());
        assert!(BusDivisors::new(64, 0).is_none());
        assert!(BusDivisors::new(0, 4).is_none());
    }
}
