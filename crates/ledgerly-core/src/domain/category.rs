//! Expense categories
//!
//! The category set is closed: the remote schema constrains the `category`
//! column to these values, so parsing rejects anything else.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Closed set of expense categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Transport,
    Academics,
    Entertainment,
    Misc,
}

impl Category {
    /// All categories, in display order
    pub const ALL: [Category; 5] = [
        Category::Food,
        Category::Transport,
        Category::Academics,
        Category::Entertainment,
        Category::Misc,
    ];

    /// The canonical name stored in the remote `category` column
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Academics => "Academics",
            Category::Entertainment => "Entertainment",
            Category::Misc => "Misc",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Food" => Ok(Category::Food),
            "Transport" => Ok(Category::Transport),
            "Academics" => Ok(Category::Academics),
            "Entertainment" => Ok(Category::Entertainment),
            "Misc" => Ok(Category::Misc),
            other => Err(DomainError::UnknownCategory(other.to_string())),
        }
    }
}
