//! Currency rendering for display prices.
//!
//! Formatting is presentation-only: stored prices stay `f64` and no
//! currency-safe arithmetic is attempted here.

use serde::{Deserialize, Serialize};

/// Where the currency symbol is placed relative to the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolPosition {
    /// `$1.00`
    Prefix,
    /// `1,00 €`
    Suffix,
}

/// Locale-like description of how to render a monetary amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub decimal_separator: char,
    pub grouping_separator: char,
    pub fraction_digits: u8,
    pub symbol_position: SymbolPosition,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self::en_us()
    }
}

impl CurrencyFormat {
    /// US dollars: `$1,234.56`.
    pub fn en_us() -> Self {
        Self {
            symbol: "$".to_string(),
            decimal_separator: '.',
            grouping_separator: ',',
            fraction_digits: 2,
            symbol_position: SymbolPosition::Prefix,
        }
    }

    /// Euro with continental separators: `1.234,56 €`.
    pub fn eu() -> Self {
        Self {
            symbol: "€".to_string(),
            decimal_separator: ',',
            grouping_separator: '.',
            fraction_digits: 2,
            symbol_position: SymbolPosition::Suffix,
        }
    }

    /// Formats `amount`, rounding half away from zero to `fraction_digits`.
    pub fn format(&self, amount: f64) -> String {
        if !amount.is_finite() {
            return amount.to_string();
        }

        let scale = 10u64.pow(u32::from(self.fraction_digits));
        let scaled = (amount.abs() * scale as f64).round() as u64;
        let whole = scaled / scale;
        let fraction = scaled % scale;
        // -0.001 rounds to zero and must not print a sign.
        let negative = amount.is_sign_negative() && scaled != 0;

        let mut number = group_digits(whole, self.grouping_separator);
        if self.fraction_digits > 0 {
            number.push(self.decimal_separator);
            number.push_str(&format!(
                "{fraction:0width$}",
                width = usize::from(self.fraction_digits)
            ));
        }

        let sign = if negative { "-" } else { "" };
        match self.symbol_position {
            SymbolPosition::Prefix => format!("{sign}{}{number}", self.symbol),
            SymbolPosition::Suffix => format!("{sign}{number} {}", self.symbol),
        }
    }
}

fn group_digits(value: u64, separator: char) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(digit);
    }
    grouped
}
