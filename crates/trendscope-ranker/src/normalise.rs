//! Rating normalisation.
//! Each rating scale is mapped linearly onto [0, 1].

/// TRL scale: 1 (basic principles) to 9 (proven in operation).
pub const TRL_RANGE: (f64, f64) = (1.0, 9.0);
/// Technical and Social Feasibility scale.
pub const FEASIBILITY_RANGE: (f64, f64) = (1.0, 5.0);

/// Min-max normalisation within a given range [min_val, max_val].
pub fn minmax_normalise(value: f64, min_val: f64, max_val: f64) -> f64 {
    if (max_val - min_val).abs() < 1e-10 {
        return 0.5; // degenerate case
    }
    ((value - min_val) / (max_val - min_val)).clamp(0.0, 1.0)
}

/// `(TRL - 1) / 8`
pub fn normalise_trl(trl: f64) -> f64 {
    minmax_normalise(trl, TRL_RANGE.0, TRL_RANGE.1)
}

/// `(Technical_Feasibility - 1) / 4`
pub fn normalise_technical(technical_feasibility: f64) -> f64 {
    minmax_normalise(technical_feasibility, FEASIBILITY_RANGE.0, FEASIBILITY_RANGE.1)
}

/// `1 - (Social_Feasibility - 1) / 4`
///
/// Inverted: a high social-feasibility rating means fewer social obstacles,
/// which lowers the difficulty contribution.
pub fn normalise_social_inverted(social_feasibility: f64) -> f64 {
    1.0 - minmax_normalise(social_feasibility, FEASIBILITY_RANGE.0, FEASIBILITY_RANGE.1)
}

/// Whether a rating lies on its scale.
pub fn in_range(value: f64, range: (f64, f64)) -> bool {
    value >= range.0 && value <= range.1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trl_endpoints() {
        assert_eq!(normalise_trl(1.0), 0.0);
        assert_eq!(normalise_trl(9.0), 1.0);
        assert!((normalise_trl(5.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_feasibility_and_inversion() {
        assert_eq!(normalise_technical(1.0), 0.0);
        assert_eq!(normalise_technical(5.0), 1.0);
        assert_eq!(normalise_social_inverted(1.0), 1.0);
        assert_eq!(normalise_social_inverted(5.0), 0.0);
        assert!((normalise_social_inverted(2.0) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_every_in_range_rating_maps_into_unit_interval() {
        for trl in 1..=9 {
            let n = normalise_trl(trl as f64);
            assert!((0.0..=1.0).contains(&n));
        }
        for rating in 1..=5 {
            let r = rating as f64;
            assert!((0.0..=1.0).contains(&normalise_technical(r)));
            assert!((0.0..=1.0).contains(&normalise_social_inverted(r)));
        }
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        assert_eq!(normalise_trl(12.0), 1.0);
        assert_eq!(normalise_technical(0.0), 0.0);
        assert!(!in_range(0.0, FEASIBILITY_RANGE));
        assert!(in_range(9.0, TRL_RANGE));
    }
}
