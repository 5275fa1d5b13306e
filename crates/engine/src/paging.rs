//! Pagination and whitelisted sorting for list queries.

use std::str::FromStr;

use crate::{EngineError, ResultEngine};

/// Largest page a list query returns.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Sort key plus direction, parsed from `"key"` (ascending) or `"-key"`
/// (descending).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortOrder<K> {
    pub key: K,
    pub descending: bool,
}

impl<K> FromStr for SortOrder<K>
where
    K: FromStr<Err = EngineError>,
{
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (raw_key, descending) = match trimmed.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (trimmed, false),
        };
        Ok(Self {
            key: raw_key.parse()?,
            descending,
        })
    }
}

/// Sortable fields of the ledger. Ties are always broken by id ascending.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransactionSort {
    #[default]
    Id,
    Title,
    Payday,
    Amount,
    CreatedAt,
}

impl FromStr for TransactionSort {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "title" => Ok(Self::Title),
            "payday" => Ok(Self::Payday),
            "amount" => Ok(Self::Amount),
            "created_at" => Ok(Self::CreatedAt),
            other => Err(EngineError::InvalidInput(format!(
                "unsupported sort key: {other}"
            ))),
        }
    }
}

/// Sortable fields of accounts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AccountSort {
    #[default]
    Id,
    Title,
    CreatedAt,
}

impl FromStr for AccountSort {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "title" => Ok(Self::Title),
            "created_at" => Ok(Self::CreatedAt),
            other => Err(EngineError::InvalidInput(format!(
                "unsupported sort key: {other}"
            ))),
        }
    }
}

/// One page of a list query: 1-based `page`, `limit` rows, and a raw sort
/// expression validated against the whitelist of the listed entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub limit: u64,
    pub sort: String,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            sort: "id".to_string(),
        }
    }
}

impl Page {
    #[must_use]
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page,
            limit,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = sort.into();
        self
    }

    /// Validates bounds and parses the sort expression.
    pub(crate) fn resolve<K>(&self) -> ResultEngine<SortOrder<K>>
    where
        K: FromStr<Err = EngineError>,
    {
        if self.page == 0 {
            return Err(EngineError::InvalidInput("page must be >= 1".to_string()));
        }
        if self.limit == 0 || self.limit > MAX_PAGE_SIZE {
            return Err(EngineError::InvalidInput(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        self.sort.parse()
    }

    pub(crate) fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_prefix_selects_direction() {
        let order: SortOrder<TransactionSort> = "-payday".parse().unwrap();
        assert_eq!(order.key, TransactionSort::Payday);
        assert!(order.descending);

        let order: SortOrder<AccountSort> = "title".parse().unwrap();
        assert_eq!(order.key, AccountSort::Title);
        assert!(!order.descending);
    }

    #[test]
    fn sort_rejects_keys_outside_whitelist() {
        assert!("-password".parse::<SortOrder<TransactionSort>>().is_err());
        assert!("payday".parse::<SortOrder<AccountSort>>().is_err());
        assert!("--id".parse::<SortOrder<TransactionSort>>().is_err());
    }

    #[test]
    fn page_bounds_are_enforced() {
        assert!(Page::new(0, 10).resolve::<TransactionSort>().is_err());
        assert!(Page::new(1, 0).resolve::<TransactionSort>().is_err());
        assert!(Page::new(1, 101).resolve::<TransactionSort>().is_err());
        assert_eq!(Page::new(3, 25).offset(), 50);
        assert!(Page::new(1, 100).resolve::<TransactionSort>().is_ok());
    }
}
