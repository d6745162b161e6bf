//! Date/time and identifier validators

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::EvaluationResult;
use crate::message_args;
use crate::outcome::ValidationOutcome;
use crate::traits::{Configurable, Rule, RuleContext, RuleOptions};
use crate::value::{Present, TextValue};

/// Constraint applied by [`DateTimeRule`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moment {
    Future,
    FutureOrPresent,
    Past,
    PastOrPresent,
    After(DateTime<Utc>),
    AfterOrEqual(DateTime<Utc>),
    Before(DateTime<Utc>),
    BeforeOrEqual(DateTime<Utc>),
}

impl Moment {
    fn key(&self) -> &'static str {
        match self {
            Moment::Future => "Future",
            Moment::FutureOrPresent => "FutureOrPresent",
            Moment::Past => "Past",
            Moment::PastOrPresent => "PastOrPresent",
            Moment::After(_) => "After",
            Moment::AfterOrEqual(_) => "AfterOrEqual",
            Moment::Before(_) => "Before",
            Moment::BeforeOrEqual(_) => "BeforeOrEqual",
        }
    }

    fn reference(&self) -> Option<DateTime<Utc>> {
        match *self {
            Moment::After(at) | Moment::AfterOrEqual(at) | Moment::Before(at) | Moment::BeforeOrEqual(at) => Some(at),
            _ => None,
        }
    }

    fn holds(&self, value: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match *self {
            Moment::Future => value > now,
            Moment::FutureOrPresent => value >= now,
            Moment::Past => value < now,
            Moment::PastOrPresent => value <= now,
            Moment::After(at) => value > at,
            Moment::AfterOrEqual(at) => value >= at,
            Moment::Before(at) => value < at,
            Moment::BeforeOrEqual(at) => value <= at,
        }
    }
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Timestamp position relative to now or to a fixed instant
///
/// "Now" is read from the clock on every evaluation.
#[derive(Clone)]
pub struct DateTimeRule {
    moment: Moment,
    clock: Clock,
    options: RuleOptions,
}

impl DateTimeRule {
    pub fn new(moment: Moment) -> Self {
        Self {
            moment,
            clock: Arc::new(Utc::now),
            options: RuleOptions::default(),
        }
    }

    pub fn future() -> Self {
        Self::new(Moment::Future)
    }

    pub fn past() -> Self {
        Self::new(Moment::Past)
    }

    /// Replace the system clock
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }
}

impl fmt::Debug for DateTimeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DateTimeRule")
            .field("moment", &self.moment)
            .field("options", &self.options)
            .finish()
    }
}

impl Configurable for DateTimeRule {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T> Rule<P, T> for DateTimeRule
where
    P: ?Sized + Sync + 'static,
    T: Present<DateTime<Utc>> + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        let Some(at) = value.present() else {
            return Ok(ValidationOutcome::success());
        };
        if self.moment.holds(*at, (self.clock)()) {
            return Ok(ValidationOutcome::success());
        }

        let reference = self.moment.reference().map(|at| at.to_rfc3339());
        let args = message_args!(
            "ComparisonValue" => reference,
            "PropertyValue" => at.to_rfc3339(),
        );
        Ok(self.options.fail(ctx, self.moment.key(), args))
    }

    fn rule_name(&self) -> &'static str {
        "date_time"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}

/// Bounds on a time span
///
/// Zero is allowed and negative spans are rejected by default. Bounds are
/// inclusive and rendered in ISO 8601 seconds form (`PT1800S`) in messages.
#[derive(Debug, Clone)]
pub struct DurationRule {
    min: Option<Duration>,
    max: Option<Duration>,
    allow_zero: bool,
    allow_negative: bool,
    options: RuleOptions,
}

impl Default for DurationRule {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            allow_zero: true,
            allow_negative: false,
            options: RuleOptions::default(),
        }
    }
}

impl DurationRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min(mut self, min: Duration) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: Duration) -> Self {
        self.max = Some(max);
        self
    }

    pub fn reject_zero(mut self) -> Self {
        self.allow_zero = false;
        self
    }

    pub fn allow_negative(mut self) -> Self {
        self.allow_negative = true;
        self
    }

    fn violation(&self, span: Duration) -> Option<&'static str> {
        if span == Duration::zero() && !self.allow_zero {
            Some("DurationZero")
        } else if span < Duration::zero() && !self.allow_negative {
            Some("DurationNegative")
        } else if self.min.map_or(false, |min| span < min) {
            Some("DurationMinimum")
        } else if self.max.map_or(false, |max| span > max) {
            Some("DurationMaximum")
        } else {
            None
        }
    }
}

impl Configurable for DurationRule {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T> Rule<P, T> for DurationRule
where
    P: ?Sized + Sync + 'static,
    T: Present<Duration> + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        let Some(span) = value.present() else {
            return Ok(ValidationOutcome::success());
        };
        match self.violation(*span) {
            Some(key) => {
                let args = message_args!(
                    "MinDuration" => self.min.map(|min| min.to_string()),
                    "MaxDuration" => self.max.map(|max| max.to_string()),
                    "PropertyValue" => span.to_string(),
                );
                Ok(self.options.fail(ctx, key, args))
            }
            None => Ok(ValidationOutcome::success()),
        }
    }

    fn rule_name(&self) -> &'static str {
        "duration"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}

/// Text that parses as a UUID; the nil UUID is rejected unless allowed
#[derive(Debug, Clone, Default)]
pub struct UuidRule {
    allow_nil: bool,
    options: RuleOptions,
}

impl UuidRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_nil(mut self) -> Self {
        self.allow_nil = true;
        self
    }

    fn accepts(&self, text: &str) -> bool {
        match Uuid::parse_str(text) {
            Ok(id) => self.allow_nil || !id.is_nil(),
            Err(_) => false,
        }
    }
}

impl Configurable for UuidRule {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T> Rule<P, T> for UuidRule
where
    P: ?Sized + Sync + 'static,
    T: TextValue + ?Sized + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        match value.non_empty_text() {
            Some(text) if !self.accepts(text) => Ok(self.options.fail(ctx, "Uuid", message_args!())),
            _ => Ok(ValidationOutcome::success()),
        }
    }

    fn rule_name(&self) -> &'static str {
        "uuid"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::RuleExt;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_future_and_past() {
        let future = DateTimeRule::future().with_clock(fixed_now);
        let past = DateTimeRule::past().with_clock(fixed_now);
        let tomorrow = fixed_now() + Duration::days(1);

        assert!(future.check(&tomorrow).unwrap().is_valid());
        assert!(!past.check(&tomorrow).unwrap().is_valid());
        assert_eq!(
            future.check(&fixed_now()).unwrap().failures()[0].message,
            "Value must be in the future"
        );
        assert!(DateTimeRule::new(Moment::FutureOrPresent)
            .with_clock(fixed_now)
            .check(&fixed_now())
            .unwrap()
            .is_valid());
    }

    #[test]
    fn test_fixed_reference() {
        let cutoff = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let rule = DateTimeRule::new(Moment::Before(cutoff));

        assert!(rule.check(&fixed_now()).unwrap().is_valid());
        let outcome = rule.check(&Some(cutoff)).unwrap();
        assert_eq!(
            outcome.failures()[0].message,
            "Value must be before 2030-01-01T00:00:00+00:00"
        );
        assert!(rule.check(&None::<DateTime<Utc>>).unwrap().is_valid());
    }

    #[test]
    fn test_duration_bounds() {
        let rule = DurationRule::new().min(Duration::minutes(5)).max(Duration::hours(2));

        assert!(rule.check(&Duration::minutes(30)).unwrap().is_valid());
        assert!(rule.check(&None::<Duration>).unwrap().is_valid());

        let outcome = rule.check(&Duration::minutes(1)).unwrap();
        assert_eq!(outcome.failures()[0].message, "Value must be at least PT300S");

        let outcome = rule.check(&Duration::hours(3)).unwrap();
        assert_eq!(outcome.failures()[0].error_code.as_deref(), Some("DurationMaximum"));
    }

    #[test]
    fn test_duration_sign() {
        let rule = DurationRule::new();
        assert!(rule.check(&Duration::zero()).unwrap().is_valid());

        let outcome = rule.check(&Duration::seconds(-1)).unwrap();
        assert_eq!(outcome.failures()[0].message, "Value must not be negative");
        assert!(DurationRule::new().allow_negative().check(&Duration::seconds(-1)).unwrap().is_valid());

        let outcome = DurationRule::new().reject_zero().check(&Duration::zero()).unwrap();
        assert_eq!(outcome.failures()[0].error_code.as_deref(), Some("DurationZero"));
    }

    #[test]
    fn test_uuid_rule() {
        let rule = UuidRule::new();
        assert!(rule.check("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap().is_valid());
        assert!(!rule.check("not-a-uuid").unwrap().is_valid());
        assert!(!rule.check("00000000-0000-0000-0000-000000000000").unwrap().is_valid());
        assert!(UuidRule::new()
            .allow_nil()
            .check("00000000-0000-0000-0000-000000000000")
            .unwrap()
            .is_valid());
    }
}
