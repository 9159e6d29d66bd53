use serde::{Deserialize, Serialize};

use crate::db_types::{Price, Product};

pub const DEFAULT_PAGE_LIMIT: i64 = 20;

/// Conjunctive product search criteria. Every field that is `Some` narrows the result set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductQueryFilter {
    pub seller_id: Option<i64>,
    pub category_id: Option<i64>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
    pub is_active: Option<bool>,
    pub disposable: Option<bool>,
    /// Case-insensitive substring matched against the title or the description.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ProductQueryFilter {
    pub fn with_seller_id(mut self, seller_id: i64) -> Self {
        self.seller_id = Some(seller_id);
        self
    }

    pub fn with_category_id(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_price_range(mut self, min: Option<Price>, max: Option<Price>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn with_disposable(mut self, disposable: bool) -> Self {
        self.disposable = Some(disposable);
        self
    }

    pub fn with_search<S: Into<String>>(mut self, search: S) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// The search term, if it contains anything other than whitespace.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn has_conditions(&self) -> bool {
        self.seller_id.is_some() ||
            self.category_id.is_some() ||
            self.min_price.is_some() ||
            self.max_price.is_some() ||
            self.is_active.is_some() ||
            self.disposable.is_some() ||
            self.search_term().is_some()
    }

    pub fn page(&self) -> Pagination {
        Pagination::normalized(self.limit, self.offset, DEFAULT_PAGE_LIMIT)
    }
}

/// One page of product search results, with the total number of matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// A normalized limit/offset pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    /// A non-positive or missing limit becomes `default_limit`; a negative or missing offset becomes zero.
    pub fn normalized(limit: Option<i64>, offset: Option<i64>, default_limit: i64) -> Self {
        let limit = limit.filter(|l| *l > 0).unwrap_or(default_limit);
        let offset = offset.unwrap_or(0).max(0);
        Self { limit, offset }
    }
}
