// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub balance: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Income,
    Outcome,
}

/// A spending or income category. The glyph is a single grapheme cluster
/// (usually an emoji) shown next to the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "CategoryRecord")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub is_income: bool,
    #[serde(rename = "emoji")]
    pub glyph: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryRecord {
    id: i64,
    name: String,
    is_income: bool,
    emoji: String,
}

impl TryFrom<CategoryRecord> for Category {
    type Error = String;

    fn try_from(r: CategoryRecord) -> Result<Self, Self::Error> {
        Category::new(r.id, r.name, r.is_income, &r.emoji)
    }
}

impl Category {
    /// Keeps only the first grapheme of `glyph`; an empty glyph is rejected.
    pub fn new(
        id: i64,
        name: impl Into<String>,
        is_income: bool,
        glyph: &str,
    ) -> Result<Self, String> {
        let first = glyph
            .graphemes(true)
            .next()
            .ok_or_else(|| format!("category {} has an empty glyph", id))?;
        Ok(Self {
            id,
            name: name.into(),
            is_income,
            glyph: first.to_string(),
        })
    }

    pub fn direction(&self) -> Direction {
        if self.is_income {
            Direction::Income
        } else {
            Direction::Outcome
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Currency {
    Rub,
    Usd,
    Eur,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Rub, Currency::Usd, Currency::Eur];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Rub => "RUB",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Rub => "₽",
            Currency::Usd => "$",
            Currency::Eur => "€",
        }
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| format!("Unsupported currency '{}'", s))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol(), self.code())
    }
}

/// A transaction as it is stored locally: account and category by id only.
///
/// The JSON form is the on-disk record of the file store. `amount` is written
/// as a decimal string and every timestamp as RFC 3339, so a save/load cycle
/// is exact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    pub category_id: i64,
    pub amount: Decimal,
    pub transaction_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// A fresh client-side record; `created_at` and `updated_at` are both `now`
    /// until the server confirms it.
    pub fn new_local(
        id: i64,
        account_id: i64,
        category_id: i64,
        amount: Decimal,
        transaction_date: DateTime<Utc>,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            account_id,
            category_id,
            amount,
            transaction_date,
            comment,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A transaction joined with its account and category for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetails {
    pub id: i64,
    pub account: Account,
    pub category: Category,
    pub amount: Decimal,
    pub transaction_date: DateTime<Utc>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionDetails {
    pub fn direction(&self) -> Direction {
        self.category.direction()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupAction {
    Create,
    Update,
    Delete,
}

impl BackupAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupAction::Create => "create",
            BackupAction::Update => "update",
            BackupAction::Delete => "delete",
        }
    }

    /// Folds a new action into the one already pending for the same
    /// transaction. A record the server never saw stays a create when edited
    /// and leaves nothing to send once deleted (`None`). A record re-created
    /// under an id whose delete is still pending replaces the server copy.
    pub fn merge(pending: BackupAction, next: BackupAction) -> Option<BackupAction> {
        match (pending, next) {
            (BackupAction::Create, BackupAction::Update) => Some(BackupAction::Create),
            (BackupAction::Create, BackupAction::Delete) => None,
            (BackupAction::Delete, BackupAction::Create) => Some(BackupAction::Update),
            (_, next) => Some(next),
        }
    }
}

impl FromStr for BackupAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(BackupAction::Create),
            "update" => Ok(BackupAction::Update),
            "delete" => Ok(BackupAction::Delete),
            other => Err(format!("Unknown backup action '{}'", other)),
        }
    }
}

impl fmt::Display for BackupAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote mutation that failed after its local write succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupOperation {
    pub transaction_id: i64,
    pub action: BackupAction,
    pub timestamp: DateTime<Utc>,
}
