//! Password strength meter shown while composing an encode.
//!
//! One point each for length, an uppercase letter, a digit and a symbol. The meter
//! is advisory; it never blocks a submit.

use strum::{EnumIter, IntoStaticStr};

/// Minimum length that earns the length point.
const MIN_STRONG_LEN: usize = 8;

/// Maximum score.
pub const MAX_SCORE: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, EnumIter, IntoStaticStr)]
pub enum StrengthLevel {
    Weak,
    Fair,
    Good,
    Strong,
}

impl StrengthLevel {
    #[inline]
    pub fn label(self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordStrength {
    score: u8,
}

impl PasswordStrength {
    pub fn of(password: &str) -> Self {
        let criteria = [
            password.chars().count() >= MIN_STRONG_LEN,
            password.chars().any(|c| c.is_ascii_uppercase()),
            password.chars().any(|c| c.is_ascii_digit()),
            password.chars().any(|c| !c.is_ascii_alphanumeric()),
        ];

        Self { score: criteria.into_iter().map(u8::from).sum() }
    }

    #[inline]
    pub fn score(self) -> u8 {
        self.score
    }

    /// `None` for a password that meets no criterion, including the empty one.
    pub fn level(self) -> Option<StrengthLevel> {
        match self.score {
            1 => Some(StrengthLevel::Weak),
            2 => Some(StrengthLevel::Fair),
            3 => Some(StrengthLevel::Good),
            4 => Some(StrengthLevel::Strong),
            _ => None,
        }
    }
}
