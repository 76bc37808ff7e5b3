use crate::Error;

/// Time units a [`Rate`] can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    /// Mean Gregorian month (30.44 days).
    Month,
    /// Mean tropical year.
    Year,
}

impl Unit {
    /// Length of the unit in seconds.
    pub fn seconds(self) -> f64 {
        match self {
            Unit::Microsecond => 0.000_001,
            Unit::Millisecond => 0.001,
            Unit::Second => 1.0,
            Unit::Minute => 60.0,
            Unit::Hour => 3_600.0,
            Unit::Day => 86_400.0,
            Unit::Week => 604_800.0,
            Unit::Month => 2_629_743.83,
            Unit::Year => 31_556_926.0,
        }
    }
}

/// A replenishment speed: `amount` tokens per `unit`.
///
/// E.g. `Rate::new(100, Unit::Second)` produces 100 tokens per second.
/// Immutable once constructed.
///
/// # Examples
///
/// ```rust
/// use drip_limit::{Rate, Unit};
///
/// let rate = Rate::new(30, Unit::Minute).unwrap();
/// assert_eq!(rate.tokens_per_second(), 0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    amount: u64,
    unit: Unit,
}

impl Rate {
    /// Creates a rate of `amount` tokens per `unit`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `amount` is zero.
    pub fn new(amount: u64, unit: Unit) -> Result<Self, Error> {
        if amount == 0 {
            return Err(Error::InvalidArgument(
                "rate amount must be greater than zero",
            ));
        }
        Ok(Self { amount, unit })
    }

    /// The amount of tokens produced per [`Unit`].
    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// The unit the amount refers to.
    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// The rate normalized to tokens per second.
    pub fn tokens_per_second(&self) -> f64 {
        self.amount as f64 / self.unit.seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_normalizes_to_tokens_per_second() {
        assert_eq!(Rate::new(1, Unit::Second).unwrap().tokens_per_second(), 1.0);
        assert_eq!(
            Rate::new(2, Unit::Minute).unwrap().tokens_per_second(),
            2.0 / 60.0
        );
        assert_eq!(
            Rate::new(1, Unit::Millisecond).unwrap().tokens_per_second(),
            1000.0
        );
        assert_eq!(
            Rate::new(500, Unit::Hour).unwrap().tokens_per_second(),
            500.0 / 3600.0
        );
    }

    #[test]
    fn it_rejects_a_zero_amount() {
        assert!(matches!(
            Rate::new(0, Unit::Second),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_calendar_units_use_mean_lengths() {
        let month = Rate::new(1, Unit::Month).unwrap();
        assert_eq!(month.tokens_per_second(), 1.0 / 2_629_743.83);

        let year = Rate::new(1, Unit::Year).unwrap();
        assert_eq!(year.tokens_per_second(), 1.0 / 31_556_926.0);
    }

    #[test]
    fn test_accessors() {
        let rate = Rate::new(7, Unit::Day).unwrap();
        assert_eq!(rate.amount(), 7);
        assert_eq!(rate.unit(), Unit::Day);
    }
}
