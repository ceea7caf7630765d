//! Soak-time requirements and what remains of them.
//!
//! The requirement belongs to the consuming stage: it is read from the target
//! stage's request for the freight's origin, never from the source stage.

use crate::model::{Freight, Stage};
use crate::utils::{format_duration, parse_duration, DurationError, Timestamp};
use chrono::Duration;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// Reads the soak time `target` requires for freight from `origin` arriving
/// via `source_stage`.
///
/// Returns `Ok(None)` when no request for `origin` lists `source_stage` or no
/// requirement is set.
///
/// # Errors
///
/// Returns an error if the requirement is not a valid duration.
pub fn try_required_soak_time(
    target: &Stage,
    origin: &str,
    source_stage: &str,
) -> Result<Option<Duration>, DurationError> {
    let requirement = target
        .requests_for(origin)
        .filter(|r| r.sources.stages.iter().any(|s| s == source_stage))
        .find_map(|r| r.sources.required_soak_time.as_deref());
    requirement.map(parse_duration).transpose()
}

/// Like [`try_required_soak_time`], treating an invalid requirement as none.
#[must_use]
pub fn required_soak_time(target: &Stage, origin: &str, source_stage: &str) -> Option<Duration> {
    try_required_soak_time(target, origin, source_stage).unwrap_or_else(|err| {
        warn!(stage = %target.name, origin, error = %err, "Ignoring invalid soak time requirement");
        None
    })
}

/// Returns how much longer `freight` must soak in `source_stage`.
///
/// While the freight is current in the source stage the clock runs from its
/// `since` timestamp. A recorded longest soak counts too, so freight that has
/// moved on keeps the soak it earned. Freight with no record at all still owes
/// the full requirement. `None` means fully soaked.
#[must_use]
pub fn soak_time_remaining(
    freight: &Freight,
    source_stage: &str,
    required: Duration,
    now: Timestamp,
) -> Option<Duration> {
    if required <= Duration::zero() {
        return None;
    }

    let from_current = freight
        .current_since(source_stage)
        .map(|since| since + required - now);
    let from_longest = freight
        .status
        .verified_in
        .get(source_stage)
        .and_then(|v| v.longest_soak.as_deref())
        .and_then(|soak| parse_duration(soak).ok())
        .map(|soaked| required - soaked);

    let remaining = match (from_current, from_longest) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) | (None, Some(a)) => a,
        (None, None) => required,
    };
    (remaining > Duration::zero()).then_some(remaining)
}

/// Remaining soak before `freight` may enter `target`.
///
/// Looks at every upstream stage the target takes the freight's origin from.
/// `None` when there is no requirement or any source has satisfied it.
#[must_use]
pub fn soak_time_remaining_for(freight: &Freight, target: &Stage, now: Timestamp) -> Option<Duration> {
    let origin = freight.origin.name.as_str();
    let mut shortest: Option<Duration> = None;
    for source in target
        .requests_for(origin)
        .flat_map(|r| r.sources.stages.iter())
    {
        let Some(required) = required_soak_time(target, origin, source) else {
            return None;
        };
        let remaining = soak_time_remaining(freight, source, required, now)?;
        shortest = Some(shortest.map_or(remaining, |s| s.min(remaining)));
    }
    shortest
}

/// Hours, minutes and seconds of a duration, for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SoakBreakdown {
    /// Whole hours.
    pub hours: i64,
    /// Minutes past the hour.
    pub minutes: i64,
    /// Seconds past the minute.
    pub seconds: i64,
}

impl From<Duration> for SoakBreakdown {
    fn from(duration: Duration) -> Self {
        let total = duration.num_seconds().max(0);
        Self {
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }
}

impl fmt::Display for SoakBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hours > 0 {
            write!(f, "{}h {}m {}s", self.hours, self.minutes, self.seconds)
        } else if self.minutes > 0 {
            write!(f, "{}m {}s", self.minutes, self.seconds)
        } else {
            write!(f, "{}s", self.seconds)
        }
    }
}

pub(crate) fn serialize_soak_map<S: Serializer>(
    map: &BTreeMap<String, Option<Duration>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(map.iter().map(|(k, v)| (k, v.map(format_duration))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CurrentStage, FreightRequest, VerifiedStage};
    use chrono::{TimeZone, Utc};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn freight_in(stage: &str, since: Timestamp) -> Freight {
        let mut freight = Freight::new("f1", "w");
        freight
            .status
            .currently_in
            .insert(stage.to_string(), CurrentStage { since: Some(since) });
        freight
    }

    fn target(soak: &str) -> Stage {
        let mut b = Stage::new("b");
        b.spec.requested_freight = vec![FreightRequest::from_warehouse("w")
            .from_stage("a")
            .with_required_soak_time(soak)];
        b
    }

    #[test]
    fn test_soak_remaining_counts_down() {
        let freight = freight_in("a", t0());
        let required = required_soak_time(&target("30m"), "w", "a").unwrap();

        assert_eq!(
            soak_time_remaining(&freight, "a", required, t0() + Duration::minutes(10)),
            Some(Duration::minutes(20))
        );
        assert_eq!(
            soak_time_remaining(&freight, "a", required, t0() + Duration::minutes(31)),
            None
        );
    }

    #[test]
    fn test_requirement_read_from_target() {
        let b = target("1h");
        assert_eq!(required_soak_time(&b, "w", "a"), Some(Duration::hours(1)));
        assert_eq!(required_soak_time(&b, "w", "other"), None);
        assert_eq!(required_soak_time(&b, "other", "a"), None);
        assert_eq!(required_soak_time(&Stage::new("a"), "w", "a"), None);
    }

    #[test]
    fn test_invalid_requirement() {
        let b = target("soon");
        assert!(try_required_soak_time(&b, "w", "a").is_err());
        assert_eq!(required_soak_time(&b, "w", "a"), None);
    }

    #[test]
    fn test_longest_soak_after_leaving() {
        let mut freight = Freight::new("f1", "w");
        freight.status.verified_in.insert(
            "a".into(),
            VerifiedStage {
                verified_at: None,
                longest_soak: Some("20m".into()),
            },
        );

        assert_eq!(
            soak_time_remaining(&freight, "a", Duration::minutes(30), t0()),
            Some(Duration::minutes(10))
        );
        assert_eq!(soak_time_remaining(&freight, "a", Duration::minutes(15), t0()), None);
    }

    #[test]
    fn test_no_record_owes_full_requirement() {
        let freight = Freight::new("f1", "w");
        assert_eq!(
            soak_time_remaining(&freight, "a", Duration::minutes(30), t0()),
            Some(Duration::minutes(30))
        );
        assert_eq!(soak_time_remaining(&freight, "a", Duration::zero(), t0()), None);
    }

    #[test]
    fn test_remaining_for_target() {
        let freight = freight_in("a", t0());
        assert_eq!(
            soak_time_remaining_for(&freight, &target("30m"), t0() + Duration::minutes(5)),
            Some(Duration::minutes(25))
        );

        let mut no_soak = Stage::new("b");
        no_soak.spec.requested_freight = vec![FreightRequest::from_warehouse("w").from_stage("a")];
        assert_eq!(soak_time_remaining_for(&freight, &no_soak, t0()), None);
    }

    #[test]
    fn test_breakdown() {
        let breakdown = SoakBreakdown::from(Duration::seconds(3 * 3600 + 5 * 60 + 7));
        assert_eq!(
            breakdown,
            SoakBreakdown {
                hours: 3,
                minutes: 5,
                seconds: 7
            }
        );
        assert_eq!(breakdown.to_string(), "3h 5m 7s");
        assert_eq!(SoakBreakdown::from(Duration::seconds(65)).to_string(), "1m 5s");
    }
}
