use std::fmt;
use std::str::FromStr;

/// Sentiment label used both for the overall review and for each category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    /// Canonical capitalised label, as written to output tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Negative => "Negative",
        }
    }

    /// Merit contribution of this sentiment.
    pub fn merit_delta(&self) -> i64 {
        merit_delta(self.as_str())
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sentiment label '{0}'")]
pub struct UnknownSentiment(pub String);

impl FromStr for Sentiment {
    type Err = UnknownSentiment;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Sentiment::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownSentiment(s.to_string()))
    }
}

/// Merit adjustment for a raw sentiment label.
///
/// A label containing "positive" (any case) scores +1, otherwise one
/// containing "negative" scores -1, anything else scores 0.
pub fn merit_delta(label: &str) -> i64 {
    let lower = label.to_lowercase();
    if lower.contains("positive") {
        1
    } else if lower.contains("negative") {
        -1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("positive".parse::<Sentiment>().unwrap(), Sentiment::Positive);
        assert_eq!("NEGATIVE".parse::<Sentiment>().unwrap(), Sentiment::Negative);
        assert_eq!(" Neutral\n".parse::<Sentiment>().unwrap(), Sentiment::Neutral);
    }

    #[test]
    fn test_parse_rejects_unknown_label() {
        let err = "Mixed".parse::<Sentiment>().unwrap_err();
        assert_eq!(err, UnknownSentiment("Mixed".to_string()));
    }

    #[test]
    fn test_display_is_canonical() {
        let s: Sentiment = "pOsItIvE".parse().unwrap();
        assert_eq!(s.to_string(), "Positive");
    }

    #[test]
    fn test_merit_delta_substring_match() {
        assert_eq!(merit_delta("Positive"), 1);
        assert_eq!(merit_delta("mostly POSITIVE"), 1);
        assert_eq!(merit_delta("Negative"), -1);
        assert_eq!(merit_delta("somewhat negative"), -1);
        assert_eq!(merit_delta("Neutral"), 0);
        assert_eq!(merit_delta("unsure"), 0);
        assert_eq!(merit_delta(""), 0);
    }

    #[test]
    fn test_merit_delta_prefers_positive() {
        assert_eq!(merit_delta("positive and negative"), 1);
    }

    #[test]
    fn test_enum_merit_delta() {
        assert_eq!(Sentiment::Positive.merit_delta(), 1);
        assert_eq!(Sentiment::Neutral.merit_delta(), 0);
        assert_eq!(Sentiment::Negative.merit_delta(), -1);
    }
}
