//! Card decks offered to voters.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Sizing method (card deck) used by a session
///
/// Estimates are free-form tokens, so the deck is what a client offers as
/// cards rather than a constraint on what a ballot may contain.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingMethod {
    #[default]
    Fibonacci,
    TShirt,
    PowersOfTwo,
    Linear,
    Custom(Vec<String>),
}

impl SizingMethod {
    /// Cards offered for this method
    pub fn cards(&self) -> Vec<String> {
        let fixed: &[&str] = match self {
            SizingMethod::Fibonacci => &["1", "2", "3", "5", "8", "13", "21", "∞", "?", "☕"],
            SizingMethod::TShirt => &["XS", "S", "M", "L", "XL", "XXL", "∞", "?", "☕"],
            SizingMethod::PowersOfTwo => &["1", "2", "4", "8", "16", "32", "64", "∞", "?", "☕"],
            SizingMethod::Linear => &[
                "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "∞", "?", "☕",
            ],
            SizingMethod::Custom(values) => return values.clone(),
        };
        fixed.iter().map(|s| s.to_string()).collect()
    }

    pub fn display_name(&self) -> &str {
        match self {
            SizingMethod::Fibonacci => "Fibonacci",
            SizingMethod::TShirt => "T-Shirt Sizes",
            SizingMethod::PowersOfTwo => "Powers of 2",
            SizingMethod::Linear => "Linear Scale",
            SizingMethod::Custom(_) => "Custom",
        }
    }
}

impl std::fmt::Display for SizingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for SizingMethod {
    type Err = String;

    /// Accepts the fixed deck names, or `custom:a,b,c`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "fibonacci" => Ok(SizingMethod::Fibonacci),
            "t_shirt" | "tshirt" | "t-shirt" => Ok(SizingMethod::TShirt),
            "powers_of_two" | "powers_of_2" | "pow2" => Ok(SizingMethod::PowersOfTwo),
            "linear" => Ok(SizingMethod::Linear),
            other if other.starts_with("custom:") => {
                let values: Vec<String> = s.trim()["custom:".len()..]
                    .split(',')
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .collect();
                if values.is_empty() {
                    return Err("Custom sizing needs at least one card".to_string());
                }
                Ok(SizingMethod::Custom(values))
            }
            _ => Err(format!(
                "Unknown sizing method: {}. Valid: fibonacci, t_shirt, powers_of_two, linear, custom:a,b,c",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_decks_end_with_sentinels() {
        for method in [
            SizingMethod::Fibonacci,
            SizingMethod::TShirt,
            SizingMethod::PowersOfTwo,
            SizingMethod::Linear,
        ] {
            let cards = method.cards();
            assert_eq!(&cards[cards.len() - 3..], &["∞", "?", "☕"]);
        }
    }

    #[test]
    fn test_parse_custom_deck() {
        let method: SizingMethod = "custom: 0.5, 1 ,2,".parse().unwrap();
        assert_eq!(method.cards(), vec!["0.5", "1", "2"]);
        assert!("custom:".parse::<SizingMethod>().is_err());
    }

    #[test]
    fn test_parse_named_decks() {
        assert_eq!("Fibonacci".parse::<SizingMethod>(), Ok(SizingMethod::Fibonacci));
        assert_eq!("t-shirt".parse::<SizingMethod>(), Ok(SizingMethod::TShirt));
        assert!("dice".parse::<SizingMethod>().is_err());
    }
}
