use earwise_types::FeedbackTier;

/// Upper bound of the Perfect tier (50ms).
pub const PERFECT_WINDOW_US: i64 = 50_000;

/// Upper bound of the Good tier (100ms).
pub const GOOD_WINDOW_US: i64 = 100_000;

/// Grade an absolute timing error against the tier bounds and the hit window.
pub fn classify(error_us: i64, hit_window_us: i64) -> FeedbackTier {
    let error_us = error_us.abs();
    if error_us > hit_window_us {
        FeedbackTier::Miss
    } else if error_us <= PERFECT_WINDOW_US {
        FeedbackTier::Perfect
    } else if error_us <= GOOD_WINDOW_US {
        FeedbackTier::Good
    } else {
        FeedbackTier::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries() {
        assert_eq!(classify(0, 150_000), FeedbackTier::Perfect);
        assert_eq!(classify(50_000, 150_000), FeedbackTier::Perfect);
        assert_eq!(classify(50_001, 150_000), FeedbackTier::Good);
        assert_eq!(classify(100_000, 150_000), FeedbackTier::Good);
        assert_eq!(classify(100_001, 150_000), FeedbackTier::Ok);
        assert_eq!(classify(150_000, 150_000), FeedbackTier::Ok);
        assert_eq!(classify(150_001, 150_000), FeedbackTier::Miss);
    }

    #[test]
    fn sign_does_not_matter() {
        assert_eq!(classify(-70_000, 150_000), FeedbackTier::Good);
    }

    #[test]
    fn narrow_window_caps_tiers() {
        assert_eq!(classify(60_000, 50_000), FeedbackTier::Miss);
        assert_eq!(classify(50_000, 50_000), FeedbackTier::Perfect);
    }
}
