use crate::Rate;

/// Pure arithmetic between the three equivalent views of bucket state:
/// a token count, a duration in seconds and an absolute timestamp.
///
/// `now` is always an explicit argument so the conversions stay pure;
/// the bucket supplies one snapshot per operation.
///
/// Conversions to token counts truncate instead of rounding: a partially
/// earned token must never be usable, otherwise repeated rounding would
/// hand out free capacity.
#[derive(Debug, Clone, Copy)]
pub struct TokenConverter {
    tokens_per_second: f64,
}

impl TokenConverter {
    pub fn new(rate: Rate) -> Self {
        Self {
            tokens_per_second: rate.tokens_per_second(),
        }
    }

    /// Seconds needed to produce `tokens`.
    pub fn tokens_to_seconds(&self, tokens: u64) -> f64 {
        tokens as f64 / self.tokens_per_second
    }

    /// Whole tokens produced in `seconds`. Negative durations yield zero.
    pub fn seconds_to_tokens(&self, seconds: f64) -> u64 {
        let tokens = seconds * self.tokens_per_second;
        if tokens <= 0.0 { 0 } else { tokens.floor() as u64 }
    }

    /// The virtual timestamp at which a bucket holding `tokens` right
    /// `now` would have been empty.
    pub fn tokens_to_timestamp(&self, tokens: u64, now: f64) -> f64 {
        now - self.tokens_to_seconds(tokens)
    }

    /// Whole tokens accumulated since the virtual timestamp `timestamp`.
    pub fn timestamp_to_tokens(&self, timestamp: f64, now: f64) -> u64 {
        self.seconds_to_tokens(now - timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Unit;

    fn converter(amount: u64, unit: Unit) -> TokenConverter {
        TokenConverter::new(Rate::new(amount, unit).unwrap())
    }

    #[test]
    fn it_round_trips_whole_tokens() {
        let conv = converter(5, Unit::Second);
        for tokens in [0, 1, 7, 100, 12_345] {
            let seconds = conv.tokens_to_seconds(tokens);
            assert_eq!(conv.seconds_to_tokens(seconds), tokens);
        }
    }

    #[test]
    fn it_truncates_partial_tokens() {
        let conv = converter(1, Unit::Second);
        assert_eq!(conv.seconds_to_tokens(0.999_999), 0);
        assert_eq!(conv.seconds_to_tokens(1.0), 1);
        assert_eq!(conv.seconds_to_tokens(1.999), 1);
    }

    #[test]
    fn it_clamps_negative_durations_to_zero() {
        let conv = converter(10, Unit::Second);
        assert_eq!(conv.seconds_to_tokens(-0.5), 0);
        assert_eq!(conv.timestamp_to_tokens(150.0, 100.0), 0);
    }

    #[test]
    fn test_timestamp_conversions_are_inverses() {
        let conv = converter(2, Unit::Second);
        let now = 1_000.0;

        // 6 tokens at 2/s puts the empty point 3 seconds in the past.
        let timestamp = conv.tokens_to_timestamp(6, now);
        assert_eq!(timestamp, 997.0);
        assert_eq!(conv.timestamp_to_tokens(timestamp, now), 6);
    }

    #[test]
    fn test_sub_second_rates() {
        // 1 token per minute.
        let conv = converter(1, Unit::Minute);
        assert_eq!(conv.tokens_to_seconds(3), 180.0);
        assert_eq!(conv.seconds_to_tokens(59.9), 0);
        assert_eq!(conv.seconds_to_tokens(60.0), 1);
    }
}
