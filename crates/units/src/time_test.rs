mod tests {
    use approx::assert_relative_eq;

    use crate::time::{Time, SECONDS_PER_YEAR};

    #[test]
    fn test_years_to_seconds() {
        assert_relative_eq!(Time::from_years(1.0).to_seconds(), SECONDS_PER_YEAR);

        // Reservoir drain timescale
        let drain = Time::from_years(4.2e7);
        assert_relative_eq!(drain.to_seconds(), 4.2e7 * SECONDS_PER_YEAR);
    }
}
