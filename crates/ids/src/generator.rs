//! Identifier generators and the record UUID wrapper.

use crate::{IdError, IdResult};
use chrono::{DateTime, Utc};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Number of timestamp digits kept in a timestamp id.
const TIMESTAMP_DIGITS: usize = 8;
const TIMESTAMP_MODULUS: u64 = 100_000_000;

fn validate_prefix(prefix: &str) -> IdResult<()> {
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(IdError::InvalidInput(format!(
            "id prefix must be one or more ASCII uppercase letters, got: '{}'",
            prefix
        )));
    }
    Ok(())
}

/// Allocates `<prefix><zero-padded counter>` identifiers.
///
/// The counter only moves forward. Seeding from existing ids (see
/// [`SequentialIdGenerator::observe`]) makes sure a freshly added entry can never reuse the
/// id of an entry that was deleted earlier in the session.
#[derive(Clone, Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    width: usize,
    last: u32,
}

impl SequentialIdGenerator {
    /// Creates a generator whose first id is `<prefix>` followed by `1` padded to `width`.
    pub fn new(prefix: &str, width: usize) -> Self {
        Self {
            prefix: prefix.to_owned(),
            width,
            last: 0,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the next id and advances the counter.
    pub fn next_id(&mut self) -> String {
        self.last = self.last.saturating_add(1);
        self.format(self.last)
    }

    /// Records an id that was assigned elsewhere (seed data, imports).
    ///
    /// Ids with a different prefix or a non-numeric suffix are ignored; they cannot collide
    /// with anything this generator produces.
    pub fn observe(&mut self, id: &str) {
        if let Ok(n) = self.parse_counter(id) {
            self.last = self.last.max(n);
        }
    }

    /// Extracts the numeric counter from an id produced with this generator's prefix.
    pub fn parse_counter(&self, id: &str) -> IdResult<u32> {
        let digits = id.strip_prefix(&self.prefix).ok_or_else(|| {
            IdError::InvalidInput(format!("id '{}' does not start with '{}'", id, self.prefix))
        })?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdError::InvalidInput(format!(
                "id '{}' has a non-numeric suffix",
                id
            )));
        }
        digits
            .parse::<u32>()
            .map_err(|e| IdError::InvalidInput(format!("id '{}' is out of range: {}", id, e)))
    }

    fn format(&self, n: u32) -> String {
        format!("{}{:0width$}", self.prefix, n, width = self.width)
    }
}

/// Allocates `<prefix><8 digits>` identifiers derived from wall-clock time.
///
/// The digits are the low eight decimal digits of the epoch-millisecond timestamp. When
/// two ids are requested within the same millisecond (or the clock steps backwards) the
/// generator bumps the timestamp by one millisecond past the previous id, so successive
/// ids from one generator are always distinct.
#[derive(Clone, Debug)]
pub struct TimestampIdGenerator {
    prefix: String,
    last_millis: Option<i64>,
}

impl TimestampIdGenerator {
    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] if the prefix is empty or not ASCII uppercase.
    pub fn new(prefix: &str) -> IdResult<Self> {
        validate_prefix(prefix)?;
        Ok(Self {
            prefix: prefix.to_owned(),
            last_millis: None,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Generates an id for the current instant.
    pub fn next_id(&mut self) -> String {
        self.next_id_at(Utc::now())
    }

    /// Generates an id for `now`, never repeating the previous one.
    pub fn next_id_at(&mut self, now: DateTime<Utc>) -> String {
        let now_millis = now.timestamp_millis();
        let millis = match self.last_millis {
            Some(prev) if now_millis <= prev => prev + 1,
            _ => now_millis,
        };
        self.last_millis = Some(millis);

        let suffix = millis.rem_euclid(TIMESTAMP_MODULUS as i64);
        format!(
            "{}{:0width$}",
            self.prefix,
            suffix,
            width = TIMESTAMP_DIGITS
        )
    }

    /// Returns true if `input` has the shape `<prefix><8 digits>`.
    pub fn matches(&self, input: &str) -> bool {
        input
            .strip_prefix(&self.prefix)
            .map(|digits| {
                digits.len() == TIMESTAMP_DIGITS && digits.bytes().all(|b| b.is_ascii_digit())
            })
            .unwrap_or(false)
    }
}

/// Canonical UUID used for result sets (32 lowercase hex characters, no hyphens).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordUuid(Uuid);

impl Default for RecordUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordUuid {
    /// Generates a fresh random (v4) UUID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an id that must already be in canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] for hyphenated, uppercase or wrong-length input.
    pub fn parse(input: &str) -> IdResult<Self> {
        if !Self::is_canonical(input) {
            return Err(IdError::InvalidInput(format!(
                "UUID must be 32 lowercase hex characters without hyphens, got: '{}'",
                input
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| IdError::InvalidInput(format!("invalid UUID '{}': {}", input, e)))
    }

    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for RecordUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for RecordUuid {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordUuid::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RecordUuid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RecordUuid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RecordUuid::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn sequential_ids_are_zero_padded() {
        let mut ids = SequentialIdGenerator::new("T", 3);
        assert_eq!(ids.next_id(), "T001");
        assert_eq!(ids.next_id(), "T002");
    }

    #[test]
    fn sequential_ids_widen_past_padding() {
        let mut ids = SequentialIdGenerator::new("P", 3);
        for _ in 0..999 {
            ids.next_id();
        }
        assert_eq!(ids.next_id(), "P1000");
    }

    #[test]
    fn observe_moves_counter_past_seeded_ids() {
        let mut ids = SequentialIdGenerator::new("T", 3);
        ids.observe("T001");
        ids.observe("T007");
        ids.observe("T003");
        assert_eq!(ids.next_id(), "T008");
    }

    #[test]
    fn observe_ignores_foreign_ids() {
        let mut ids = SequentialIdGenerator::new("T", 3);
        ids.observe("P900");
        ids.observe("Tabc");
        ids.observe("T");
        assert_eq!(ids.next_id(), "T001");
    }

    #[test]
    fn timestamp_generator_rejects_bad_prefix() {
        assert!(TimestampIdGenerator::new("sam").is_err());
        assert!(TimestampIdGenerator::new("").is_err());
    }

    #[test]
    fn timestamp_id_uses_last_eight_millisecond_digits() {
        let mut ids = TimestampIdGenerator::new("SAM").unwrap();
        let at = Utc.timestamp_millis_opt(1_705_312_345_678).unwrap();
        assert_eq!(ids.next_id_at(at), "SAM12345678");
    }

    #[test]
    fn timestamp_ids_within_same_millisecond_are_distinct() {
        let mut ids = TimestampIdGenerator::new("SAM").unwrap();
        let at = Utc.timestamp_millis_opt(1_705_312_345_678).unwrap();
        let first = ids.next_id_at(at);
        let second = ids.next_id_at(at);
        assert_eq!(first, "SAM12345678");
        assert_eq!(second, "SAM12345679");
    }

    #[test]
    fn timestamp_ids_survive_clock_stepping_back() {
        let mut ids = TimestampIdGenerator::new("SAM").unwrap();
        let later = Utc.timestamp_millis_opt(1_705_312_345_678).unwrap();
        let earlier = Utc.timestamp_millis_opt(1_705_312_340_000).unwrap();
        ids.next_id_at(later);
        assert_eq!(ids.next_id_at(earlier), "SAM12345679");
    }

    #[test]
    fn matches_checks_shape() {
        let ids = TimestampIdGenerator::new("SAM").unwrap();
        assert!(ids.matches("SAM00000001"));
        assert!(!ids.matches("SAM0000001"));
        assert!(!ids.matches("SAMX0000001"));
        assert!(!ids.matches("T001"));
    }

    #[test]
    fn record_uuid_round_trips_through_display() {
        let id = RecordUuid::new();
        let parsed = RecordUuid::parse(&id.to_string()).expect("canonical");
        assert_eq!(id, parsed);
    }

    #[test]
    fn record_uuid_rejects_hyphenated() {
        let err = RecordUuid::parse("550e8400-e29b-41d4-a716-446655440000").unwrap_err();
        match err {
            IdError::InvalidInput(msg) => assert!(msg.contains("32 lowercase hex")),
        }
    }

    proptest! {
        #[test]
        fn sequential_ids_never_repeat(seeds in proptest::collection::vec(1u32..500, 0..20), n in 1usize..200) {
            let mut ids = SequentialIdGenerator::new("T", 3);
            let mut seen: HashSet<String> = HashSet::new();
            for seed in &seeds {
                let id = format!("T{:03}", seed);
                ids.observe(&id);
                seen.insert(id);
            }
            for _ in 0..n {
                prop_assert!(seen.insert(ids.next_id()));
            }
        }

        #[test]
        fn timestamp_ids_never_repeat(offsets in proptest::collection::vec(-5i64..5, 1..200)) {
            let mut ids = TimestampIdGenerator::new("SAM").unwrap();
            let base = 1_705_312_345_678i64;
            let mut seen: HashSet<String> = HashSet::new();
            for offset in offsets {
                let at = Utc.timestamp_millis_opt(base + offset).unwrap();
                prop_assert!(seen.insert(ids.next_id_at(at)));
            }
        }
    }
}
