//! Factory calibration
//!
//! The DS1922L and DS1922T carry two factory calibration points on page
//! 0x0240. Together with a fixed reference point whose error is taken equal to
//! the first measured point, they define a quadratic error curve
//!
//! ```text
//! error(t) = c0 * t^2 + c1 * t + c2
//! ```
//!
//! and a corrected temperature is `t - error(t)`.
//!
//! Page layout, each value is a high/low byte pair decoded like a 16-bit
//! sample:
//!
//! | Bytes | Meaning                          |
//! |-------|----------------------------------|
//! | 0-1   | Tr2, reference temperature 2     |
//! | 2-3   | Tc2, temperature measured at Tr2 |
//! | 4-5   | Tr3, reference temperature 3     |
//! | 6-7   | Tc3, temperature measured at Tr3 |

use super::registers::DeviceType;
use super::samples::raw_to_celsius;

/// Quadratic error correction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// c0, c1, c2
    coefficients: [f64; 3],
}

impl Calibration {
    /// Calibration that leaves values unchanged
    pub const IDENTITY: Calibration = Calibration {
        coefficients: [0.0; 3],
    };

    /// Derive the correction from the calibration page of a device
    ///
    /// Returns `None` when the page is too short or the points are
    /// degenerate (erased page, equal references).
    pub fn from_page(page: &[u8], device: DeviceType) -> Option<Self> {
        if page.len() < 8 {
            return None;
        }
        let value = |i: usize| raw_to_celsius(page[i], page[i + 1], device);

        let tr2 = value(0);
        let tc2 = value(2);
        let tr3 = value(4);
        let tc3 = value(6);
        log::debug!(
            "calibration points: Tr2={} Tc2={} Tr3={} Tc3={}",
            tr2,
            tc2,
            tr3,
            tc3
        );

        Self::from_points(device.calibration_reference(), (tr2, tc2), (tr3, tc3))
    }

    /// Fit the error curve through the reference temperature `tr1` and two
    /// `(reference, measured)` points
    ///
    /// The error at `tr1` is assumed equal to the error at the first point.
    pub fn from_points(tr1: f64, (tr2, tc2): (f64, f64), (tr3, tc3): (f64, f64)) -> Option<Self> {
        let err2 = tc2 - tr2;
        let err3 = tc3 - tr3;
        let err1 = err2;

        let sq21 = tr2 * tr2 - tr1 * tr1;
        let sq31 = tr3 * tr3 - tr1 * tr1;
        let denominator = sq21 * (tr3 - tr1) + sq31 * (tr1 - tr2);
        if sq21 == 0.0 || denominator == 0.0 {
            return None;
        }

        let c1 = sq21 * (err3 - err1) / denominator;
        let c0 = c1 * (tr1 - tr2) / sq21;
        let c2 = err1 - c0 * tr1 * tr1 - c1 * tr1;

        let calibration = Calibration {
            coefficients: [c0, c1, c2],
        };
        if !calibration.coefficients.iter().all(|c| c.is_finite()) {
            return None;
        }
        Some(calibration)
    }

    /// Coefficients c0, c1 and c2
    pub fn coefficients(&self) -> [f64; 3] {
        self.coefficients
    }

    /// Estimated measurement error at `celsius`
    pub fn error_at(&self, celsius: f64) -> f64 {
        let [c0, c1, c2] = self.coefficients;
        c0 * celsius * celsius + c1 * celsius + c2
    }

    /// Apply the correction to a measured temperature
    pub fn correct(&self, celsius: f64) -> f64 {
        celsius - self.error_at(celsius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        let diff = if a > b { a - b } else { b - a };
        assert!(diff < 1e-9, "{} != {}", a, b);
    }

    // Tr2 = 25 - offset, Tc2 = Tr2 + 0.5, Tr3 = 60 - offset, Tc3 = Tr3 + 1
    const PAGE: [u8; 8] = [50, 0, 51, 0, 120, 0, 122, 0];

    #[test]
    fn test_ds1922t_correction() {
        let cal = Calibration::from_page(&PAGE, DeviceType::Ds1922T).unwrap();
        // Reference points: (90, 0.5), (24, 0.5), (59, 1.0)
        assert_close(cal.correct(24.0), 23.5);
        assert_close(cal.correct(59.0), 58.0);
        assert_close(cal.correct(90.0), 89.5);
    }

    #[test]
    fn test_ds1922l_correction() {
        let cal = Calibration::from_page(&PAGE, DeviceType::Ds1922L).unwrap();
        // Reference points: (60, 0.5), (-16, 0.5), (19, 1.0)
        assert_close(cal.correct(-16.0), -16.5);
        assert_close(cal.correct(19.0), 18.0);
        assert_close(cal.correct(60.0), 59.5);

        let t = Calibration::from_page(&PAGE, DeviceType::Ds1922T).unwrap();
        assert_ne!(cal.coefficients(), t.coefficients());
    }

    #[test]
    fn test_fractional_bytes() {
        // 0x80 in the low byte adds a quarter degree
        let page = [50, 0x80, 51, 0x80, 120, 0, 122, 0];
        let cal = Calibration::from_page(&page, DeviceType::Ds1922T).unwrap();
        assert_close(cal.correct(24.25), 23.75);
    }

    #[test]
    fn test_degenerate_page() {
        assert_eq!(Calibration::from_page(&[0; 8], DeviceType::Ds1922T), None);
        assert_eq!(Calibration::from_page(&[0; 4], DeviceType::Ds1922T), None);
        // Tr2 equal to the fixed reference
        assert_eq!(
            Calibration::from_points(90.0, (90.0, 90.5), (59.0, 60.0)),
            None
        );
    }

    #[test]
    fn test_identity() {
        assert_eq!(Calibration::IDENTITY.correct(21.5), 21.5);
    }
}
