//! Validated primitive types shared by the LIMS crates.
//!
//! Values of these types can only be obtained through their checked constructors,
//! so downstream code never re-validates blank names or negative prices.

use std::fmt;

/// Errors raised when building one of the validated types.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TextError {
    /// The input was empty or only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The amount was negative, NaN or infinite
    #[error("Amount must be a finite, non-negative number (got {0})")]
    InvalidAmount(f64),
}

/// A trimmed string holding at least one non-whitespace character.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Trims `input` and rejects the result if nothing is left.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A monetary amount in the lab's billing currency.
///
/// Only finite, non-negative values are representable. Arithmetic and rounding
/// are left to callers; the catalog only stores and displays prices.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Price(f64);

impl Price {
    pub fn new(amount: f64) -> Result<Self, TextError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(TextError::InvalidAmount(amount));
        }
        Ok(Self(amount))
    }

    pub fn amount(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl serde::Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let amount = f64::deserialize(deserializer)?;
        Price::new(amount).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Hematology \n").expect("valid text");
        assert_eq!(text.as_str(), "Hematology");
    }

    #[test]
    fn non_empty_text_rejects_blank() {
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
        assert_eq!(NonEmptyText::new(""), Err(TextError::Empty));
    }

    #[test]
    fn non_empty_text_deserialize_rejects_blank() {
        let err = serde_json::from_str::<NonEmptyText>("\"  \"").expect_err("blank rejected");
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn price_rejects_negative_and_non_finite() {
        assert!(Price::new(-0.01).is_err());
        assert!(Price::new(f64::NAN).is_err());
        assert!(Price::new(f64::INFINITY).is_err());
        assert_eq!(Price::new(0.0).expect("zero is valid").amount(), 0.0);
    }

    #[test]
    fn price_displays_two_decimals() {
        let price = Price::new(2500.0).expect("valid price");
        assert_eq!(price.to_string(), "2500.00");
    }

    #[test]
    fn price_deserialize_validates() {
        let price: Price = serde_json::from_str("3500.5").expect("valid price");
        assert_eq!(price.amount(), 3500.5);
        assert!(serde_json::from_str::<Price>("-1").is_err());
    }
}
