//! Action Space
//!
//! Discrete rebalancing actions and the sizing table they execute with.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Discrete portfolio rebalancing action
///
/// Buy actions spend a fraction of cash, sell actions liquidate a fraction
/// of held shares. The fraction comes from [`ActionSizing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Leave the portfolio untouched
    #[default]
    Nothing,
    BuySmall,
    BuyMedium,
    BuyLarge,
    SellSmall,
    SellMedium,
    SellLarge,
}

impl Action {
    /// Check if this is a buy action
    pub fn is_buy(&self) -> bool {
        matches!(self, Self::BuySmall | Self::BuyMedium | Self::BuyLarge)
    }

    /// Check if this is a sell action
    pub fn is_sell(&self) -> bool {
        matches!(self, Self::SellSmall | Self::SellMedium | Self::SellLarge)
    }

    /// Check if this action trades at all
    pub fn is_trade(&self) -> bool {
        self.is_buy() || self.is_sell()
    }

    /// Size bucket of a trading action, `None` for [`Action::Nothing`]
    pub fn size(&self) -> Option<TradeSize> {
        match self {
            Self::Nothing => None,
            Self::BuySmall | Self::SellSmall => Some(TradeSize::Small),
            Self::BuyMedium | Self::SellMedium => Some(TradeSize::Medium),
            Self::BuyLarge | Self::SellLarge => Some(TradeSize::Large),
        }
    }

    /// Stable name used in exports and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nothing => "nothing",
            Self::BuySmall => "buy-small",
            Self::BuyMedium => "buy-medium",
            Self::BuyLarge => "buy-large",
            Self::SellSmall => "sell-small",
            Self::SellMedium => "sell-medium",
            Self::SellLarge => "sell-large",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nothing" => Ok(Self::Nothing),
            "buy-small" => Ok(Self::BuySmall),
            "buy-medium" => Ok(Self::BuyMedium),
            "buy-large" => Ok(Self::BuyLarge),
            "sell-small" => Ok(Self::SellSmall),
            "sell-medium" => Ok(Self::SellMedium),
            "sell-large" => Ok(Self::SellLarge),
            _ => Err(format!("Invalid action: {}", s)),
        }
    }
}

/// Size bucket shared by buy and sell actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeSize {
    Small,
    Medium,
    Large,
}

/// Fractions applied to cash (buys) or shares (sells) per size bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionSizing {
    pub small: f64,
    pub medium: f64,
    pub large: f64,
}

impl Default for ActionSizing {
    fn default() -> Self {
        Self {
            small: 0.1,
            medium: 0.3,
            large: 0.5,
        }
    }
}

impl ActionSizing {
    /// Fraction traded by `action`, zero for [`Action::Nothing`]
    pub fn fraction(&self, action: Action) -> f64 {
        match action.size() {
            None => 0.0,
            Some(TradeSize::Small) => self.small,
            Some(TradeSize::Medium) => self.medium,
            Some(TradeSize::Large) => self.large,
        }
    }
}

/// Ordered set of actions available to an agent
///
/// The position of an action in the space is its Q-table column and the
/// action code written to series exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpace {
    actions: Vec<Action>,
}

impl ActionSpace {
    /// Build a space from an explicit action list
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    /// Five-action space: nothing, buy/sell small and large
    pub fn basic() -> Self {
        Self::new(vec![
            Action::Nothing,
            Action::BuySmall,
            Action::BuyLarge,
            Action::SellSmall,
            Action::SellLarge,
        ])
    }

    /// Seven-action space including the medium sizes
    pub fn extended() -> Self {
        Self::new(vec![
            Action::Nothing,
            Action::BuySmall,
            Action::BuyMedium,
            Action::BuyLarge,
            Action::SellSmall,
            Action::SellMedium,
            Action::SellLarge,
        ])
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Action at column `index`
    pub fn action(&self, index: usize) -> Option<Action> {
        self.actions.get(index).copied()
    }

    /// Column of `action`, `None` if the space does not contain it
    pub fn index_of(&self, action: Action) -> Option<usize> {
        self.actions.iter().position(|a| *a == action)
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }
}

impl Default for ActionSpace {
    fn default() -> Self {
        Self::basic()
    }
}
