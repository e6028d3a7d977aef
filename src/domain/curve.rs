//! Acceleration curves.
//!
//! A curve maps input speed (mm/s on the pad, always >= 0) to output speed
//! via a piecewise ratio. Each segment is valid up to its `x_max`; the last
//! segment of every usable curve has `x_max = INFINITY`.

/// One piece of an acceleration curve. For a speed `s <= x_max` the applied
/// ratio is `sqr * s + mul + icept / s`, i.e. output speed
/// `y = sqr * s^2 + mul * s + icept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSegment {
    pub x_max: f64,
    pub sqr: f64,
    pub mul: f64,
    pub icept: f64,
}

impl CurveSegment {
    pub const fn new(x_max: f64, sqr: f64, mul: f64, icept: f64) -> Self {
        Self {
            x_max,
            sqr,
            mul,
            icept,
        }
    }

    /// `y = x`, the sensitivity-1 curve.
    pub const IDENTITY: CurveSegment = CurveSegment::new(f64::INFINITY, 0.0, 1.0, 0.0);
}

/// Number of discrete sensitivity levels.
pub const SENSITIVITY_LEVELS: usize = 5;

/// Evaluate a curve at `speed`: the first segment whose `x_max` covers the
/// speed wins. Zero or negative speed, or a speed past a finite final
/// segment, yields ratio 0 (the gesture is discarded downstream).
pub fn ratio_from_curve<I>(segs: I, speed: f64) -> f64
where
    I: IntoIterator<Item = CurveSegment>,
{
    if speed <= 0.0 {
        return 0.0;
    }
    for seg in segs {
        if speed <= seg.x_max {
            return seg.sqr * speed + seg.mul + seg.icept / speed;
        }
    }
    0.0
}

/// Flatten a curve for the property surface: four reals per segment, in
/// `(x_max, sqr, mul, icept)` order.
pub fn pack_curve(segs: &[CurveSegment]) -> Vec<f64> {
    let mut flat = Vec::with_capacity(segs.len() * 4);
    for seg in segs {
        flat.extend_from_slice(&[seg.x_max, seg.sqr, seg.mul, seg.icept]);
    }
    flat
}

/// Inverse of `pack_curve`. A trailing partial segment is ignored; callers
/// validate lengths before storing a curve.
pub fn unpack_curve(flat: &[f64]) -> impl Iterator<Item = CurveSegment> + '_ {
    flat.chunks_exact(4)
        .map(|c| CurveSegment::new(c[0], c[1], c[2], c[3]))
}

/// Touchpad pointer curves per sensitivity, in mm/s:
///
/// 1: y = x (no acceleration)
/// 2: y = 32x/60   (x <= 32), x^2/60   (x <= 150), linear with same slope after
/// 3: y = 32x/37.5 (x <= 32), x^2/37.5 (x <= 150), linear with same slope after
/// 4: y = 32x/30   (x <= 32), x^2/30   (x <= 150), linear with same slope after
/// 5: y = 32x/25   (x <= 32), x^2/25   (x <= 150), linear with same slope after
pub fn touchpad_point_curves() -> Vec<Vec<CurveSegment>> {
    const POINT_DIVISORS: [f64; SENSITIVITY_LEVELS] = [0.0 /* unused */, 60.0, 37.5, 30.0, 25.0];

    let mut curves = vec![vec![CurveSegment::IDENTITY]];
    for divisor in &POINT_DIVISORS[1..] {
        let linear_until_x = 32.0;
        let init_slope = linear_until_x / divisor;
        let x_border = 150.0;
        let slope = x_border * 2.0 / divisor;
        let y_at_border = x_border * x_border / divisor;
        let icept = y_at_border - slope * x_border;
        curves.push(vec![
            CurveSegment::new(linear_until_x, 0.0, init_slope, 0.0),
            CurveSegment::new(x_border, 1.0 / divisor, 0.0, 0.0),
            CurveSegment::new(f64::INFINITY, 0.0, slope, icept),
        ]);
    }
    curves
}

/// Touchpad scroll curves per sensitivity, in mm/s. Unlike the pointer
/// family, past the parabolic region the output levels off: the final
/// linear segment reuses the *initial* slope.
///
/// 1: y = x (no acceleration)
/// 2: y = 75x/150 (x <= 75), x^2/150 (x <= 600), linear (initial slope)
/// 3: y = 75x/75  (x <= 75), x^2/75  (x <= 600), linear (initial slope)
/// 4: y = 75x/70  (x <= 75), x^2/70  (x <= 600), linear (initial slope)
/// 5: y = 75x/65  (x <= 75), x^2/65  (x <= 600), linear (initial slope)
pub fn touchpad_scroll_curves() -> Vec<Vec<CurveSegment>> {
    const SCROLL_DIVISORS: [f64; SENSITIVITY_LEVELS] = [0.0 /* unused */, 150.0, 75.0, 70.0, 65.0];

    let mut curves = vec![vec![CurveSegment::IDENTITY]];
    for divisor in &SCROLL_DIVISORS[1..] {
        let linear_until_x = 75.0;
        let init_slope = linear_until_x / divisor;
        let x_border = 600.0;
        let slope = init_slope;
        let y_at_border = x_border * x_border / divisor;
        let icept = y_at_border - slope * x_border;
        curves.push(vec![
            CurveSegment::new(linear_until_x, 0.0, init_slope, 0.0),
            CurveSegment::new(x_border, 1.0 / divisor, 0.0, 0.0),
            CurveSegment::new(f64::INFINITY, 0.0, slope, icept),
        ]);
    }
    curves
}

/// Current mouse pointer curves: a parabola tuned in user studies, with a
/// linear continuation past the cutoff.
pub fn mouse_point_curves() -> Vec<Vec<CurveSegment>> {
    const MULTIPLIER_A: f64 = 0.0311;
    const MULTIPLIER_B: f64 = 3.26;
    const CUTOFF: f64 = 195.0;
    const MULTIPLIERS: [f64; SENSITIVITY_LEVELS] = [1.2, 1.4, 1.6, 1.8, 2.0];

    MULTIPLIERS
        .iter()
        .map(|k| {
            let mouse_a = MULTIPLIER_A * k * k;
            let mouse_b = MULTIPLIER_B * k;
            let cutoff = CUTOFF / k;
            let second_slope = (2.0 * MULTIPLIER_A * CUTOFF + MULTIPLIER_B) * k;
            vec![
                CurveSegment::new(cutoff, mouse_a, mouse_b, 0.0),
                CurveSegment::new(f64::INFINITY, 0.0, second_slope, -1182.0),
            ]
        })
        .collect()
}

/// Legacy mouse pointer curves: parabola `1.3x^2 + 0.2x` in inches/s up to
/// a per-sensitivity cutoff, extended linearly with matching value and
/// slope, all scaled by a per-sensitivity gain and converted to mm.
pub fn old_mouse_point_curves() -> Vec<Vec<CurveSegment>> {
    const MM_PER_INCH: f64 = 25.4;
    const PARABOLA_A: f64 = 1.3;
    const PARABOLA_B: f64 = 0.2;
    const STRAIGHT_CUTOFF: [f64; SENSITIVITY_LEVELS] = [5.0, 5.0, 5.0, 8.0, 8.0];
    const SPEED_ACCEL: [f64; SENSITIVITY_LEVELS] = [1.0, 1.4, 1.8, 2.0, 2.2];

    (0..SENSITIVITY_LEVELS)
        .map(|i| {
            let cutoff_x = STRAIGHT_CUTOFF[i];
            let cutoff_y = PARABOLA_A * cutoff_x * cutoff_x + PARABOLA_B * cutoff_x;
            let line_m = 2.0 * PARABOLA_A * cutoff_x + PARABOLA_B;
            let line_b = cutoff_y - cutoff_x * line_m;
            let out_mult = SPEED_ACCEL[i];
            vec![
                CurveSegment::new(
                    cutoff_x * MM_PER_INCH,
                    PARABOLA_A * out_mult / MM_PER_INCH,
                    PARABOLA_B * out_mult,
                    0.0,
                ),
                CurveSegment::new(
                    f64::INFINITY,
                    0.0,
                    line_m * out_mult,
                    line_b * out_mult * MM_PER_INCH,
                ),
            ]
        })
        .collect()
}

/// Single linear segment per sensitivity, used when pointer acceleration
/// is switched off on touchpads.
pub fn unaccel_point_curves() -> Vec<CurveSegment> {
    [1.0, 2.0, 3.0, 4.0, 5.0]
        .iter()
        .map(|slope| CurveSegment::new(f64::INFINITY, 0.0, *slope, 0.0))
        .collect()
}

/// Same, for mice.
pub fn unaccel_mouse_curves() -> Vec<CurveSegment> {
    [2.0, 4.0, 8.0, 16.0, 24.0]
        .iter()
        .map(|slope| CurveSegment::new(f64::INFINITY, 0.0, *slope, 0.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output_at(segs: &[CurveSegment], speed: f64) -> f64 {
        ratio_from_curve(segs.iter().copied(), speed) * speed
    }

    #[test]
    fn test_ratio_degenerate_inputs() {
        let segs = touchpad_point_curves();
        assert_eq!(ratio_from_curve(segs[2].iter().copied(), 0.0), 0.0);
        assert_eq!(ratio_from_curve(segs[2].iter().copied(), -4.0), 0.0);
        // Truncated to one finite segment, a huge speed falls off the end.
        assert_eq!(
            ratio_from_curve(segs[2][..1].iter().copied(), f64::INFINITY),
            0.0
        );
    }

    #[test]
    fn test_point_curve_identity_at_sensitivity_one() {
        let segs = &touchpad_point_curves()[0];
        assert_eq!(segs[0], CurveSegment::IDENTITY);
        for x in 1..1000 {
            let x = x as f64;
            assert_eq!(output_at(segs, x), x);
        }
    }

    #[test]
    fn test_point_curve_shapes() {
        let curves = touchpad_point_curves();
        let divisors = [60.0, 37.5, 30.0, 25.0];
        for (sens, divisor) in (2usize..=5).zip(divisors) {
            let segs = &curves[sens - 1];

            // y = 32x/divisor below the linear border.
            assert_eq!(segs[0].x_max, 32.0);
            assert_eq!(segs[0].mul, 32.0 / divisor);
            for i in 1..32 {
                let x = i as f64;
                let expected = 32.0 * x / divisor;
                assert!((output_at(segs, x) - expected).abs() < 0.001);
            }

            // y = x^2/divisor in the parabolic region.
            assert_eq!(segs[1].x_max, 150.0);
            assert_eq!(segs[1].sqr, 1.0 / divisor);
            for i in 33..150 {
                let x = i as f64;
                let expected = x * x / divisor;
                assert!((output_at(segs, x) - expected).abs() < 0.001);
            }

            // Linear continuation with the parabola's exit slope.
            let slope = 300.0 / divisor;
            let icept = -22500.0 / divisor;
            assert_eq!(segs[2].x_max, f64::INFINITY);
            assert_eq!(segs[2].mul, slope);
            assert_eq!(segs[2].icept, icept);
            for i in 150..1000 {
                let x = i as f64;
                let expected = slope * x + icept;
                assert!((output_at(segs, x) - expected).abs() < 0.001);
            }
        }
    }

    #[test]
    fn test_scroll_curve_shapes() {
        let curves = touchpad_scroll_curves();
        assert_eq!(curves[0][0], CurveSegment::IDENTITY);

        let divisors = [150.0, 75.0, 70.0, 65.0];
        for (sens, divisor) in (2usize..=5).zip(divisors) {
            let segs = &curves[sens - 1];
            let init_slope = 75.0 / divisor;

            assert_eq!(segs[0].x_max, 75.0);
            assert_eq!(segs[0].mul, init_slope);
            assert_eq!(segs[1].x_max, 600.0);
            assert_eq!(segs[1].sqr, 1.0 / divisor);

            // Scrolling levels off: the tail reuses the initial slope.
            assert_eq!(segs[2].mul, init_slope);
            assert_eq!(segs[2].icept, 600.0 * 600.0 / divisor - init_slope * 600.0);

            for i in 1..1000 {
                let x = i as f64;
                let expected = if x <= 75.0 {
                    init_slope * x
                } else if x <= 600.0 {
                    x * x / divisor
                } else {
                    init_slope * x + segs[2].icept
                };
                assert!((output_at(segs, x) - expected).abs() < 0.001);
            }
        }
    }

    #[test]
    fn test_curves_continuous_at_borders() {
        for curves in [touchpad_point_curves(), touchpad_scroll_curves()] {
            for segs in &curves[1..] {
                for pair in segs.windows(2) {
                    let border = pair[0].x_max;
                    let below = output_at(segs, border);
                    let above = output_at(segs, border + 1e-9);
                    assert!((below - above).abs() < 1e-3);
                }
            }
        }
        // Legacy mouse curves are continuous by construction.
        for segs in &old_mouse_point_curves() {
            let border = segs[0].x_max;
            let below = output_at(segs, border);
            let above = output_at(segs, border + 1e-9);
            assert!((below - above).abs() < 1e-3);
        }
    }

    #[test]
    fn test_curves_finite_and_non_negative() {
        let families = [
            touchpad_point_curves(),
            touchpad_scroll_curves(),
            mouse_point_curves(),
            old_mouse_point_curves(),
        ];
        for family in &families {
            for segs in family {
                for i in 1..2000 {
                    let ratio = ratio_from_curve(segs.iter().copied(), i as f64);
                    assert!(ratio.is_finite());
                    assert!(ratio >= 0.0);
                }
            }
        }
    }

    #[test]
    fn test_mouse_point_curve_construction() {
        let curves = mouse_point_curves();
        let multipliers = [1.2, 1.4, 1.6, 1.8, 2.0];
        for (segs, k) in curves.iter().zip(multipliers) {
            assert_eq!(segs[0].x_max, 195.0 / k);
            assert_eq!(segs[0].sqr, 0.0311 * k * k);
            assert_eq!(segs[0].mul, 3.26 * k);
            assert_eq!(segs[1].mul, (2.0 * 0.0311 * 195.0 + 3.26) * k);
            assert_eq!(segs[1].icept, -1182.0);
            // The hand-tuned intercept keeps the join near-continuous.
            let border = segs[0].x_max;
            let below = output_at(segs, border);
            let above = output_at(segs, border + 1e-9);
            assert!((below - above).abs() < 1.0);
        }
    }

    #[test]
    fn test_pack_unpack_round_trip() {
        let segs = vec![
            CurveSegment::new(2.0, 0.0, 0.5, 0.0),
            CurveSegment::new(f64::INFINITY, 0.0, 0.0, 3.0),
        ];
        let flat = pack_curve(&segs);
        assert_eq!(flat.len(), 8);
        assert_eq!(flat[0], 2.0);
        let back: Vec<CurveSegment> = unpack_curve(&flat).collect();
        assert_eq!(back, segs);
    }
}
