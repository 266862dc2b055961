//! Product catalog: listing, filtering, sorting and admin deletes.

use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use thiserror::Error;
use tracing::{error, info, warn};

use eshop_core::{Privilege, Product, ProductId, compare_ids};

use super::{
    FetchState, InFlight, Navigation, Notice, SESSION_ENDED_MESSAGE, SessionBinding,
    clear_expired,
};
use crate::guard::{Access, RoleGuard};
use crate::state::Storefront;

/// Category sentinel that disables the category filter.
pub const ALL_CATEGORIES: &str = "ALL";

// =============================================================================
// Query pipeline
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl CategoryFilter {
    /// `"ALL"` or a blank value select everything.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALL_CATEGORIES {
            Self::All
        } else {
            Self::Named(value.to_string())
        }
    }

    fn matches(&self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::Named(category) => product.category == *category,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOption {
    #[default]
    Default,
    PriceHighToLow,
    PriceLowToHigh,
    Newest,
}

#[derive(Debug, Error)]
#[error("unknown sort option: {0}")]
pub struct UnknownSortOption(String);

impl SortOption {
    pub const ALL: [Self; 4] = [
        Self::Default,
        Self::PriceHighToLow,
        Self::PriceLowToHigh,
        Self::Newest,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::PriceHighToLow => "Price: High to Low",
            Self::PriceLowToHigh => "Price: Low to High",
            Self::Newest => "Newest",
        }
    }

    /// Short form accepted on the command line.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::PriceHighToLow => "price-desc",
            Self::PriceLowToHigh => "price-asc",
            Self::Newest => "newest",
        }
    }

    fn compare(self, a: &Product, b: &Product) -> CmpOrdering {
        match self {
            Self::Default => compare_ids(a.id.as_str(), b.id.as_str()),
            Self::PriceHighToLow => b.price.cmp(&a.price),
            Self::PriceLowToHigh => a.price.cmp(&b.price),
            Self::Newest => match (a.created_at, b.created_at) {
                (Some(a), Some(b)) => b.cmp(&a),
                (Some(_), None) => CmpOrdering::Less,
                (None, Some(_)) => CmpOrdering::Greater,
                (None, None) => CmpOrdering::Equal,
            },
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortOption {
    type Err = UnknownSortOption;

    /// Accepts either the slug or the label, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|o| o.slug().eq_ignore_ascii_case(s) || o.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownSortOption(s.to_string()))
    }
}

/// Category filter, then keyword filter, then sort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub category: CategoryFilter,
    pub keyword: String,
    pub sort: SortOption,
}

impl CatalogQuery {
    /// Products that pass the filters, in display order. Sorting is stable.
    ///
    /// A blank keyword disables the keyword filter; any other keyword is
    /// matched as typed, surrounding spaces included.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        let filter_by_keyword = !self.keyword.trim().is_empty();
        let needle = self.keyword.to_lowercase();

        let mut visible: Vec<&Product> = products
            .iter()
            .filter(|p| self.category.matches(p))
            .filter(|p| !filter_by_keyword || p.matches_keyword(&needle))
            .collect();

        visible.sort_by(|a, b| self.sort.compare(a, b));
        visible
    }
}

// =============================================================================
// CatalogView
// =============================================================================

/// Which admin controls to render next to each product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogAffordances {
    pub can_edit: bool,
    pub can_delete: bool,
}

/// State of the product listing screen.
pub struct CatalogView {
    storefront: Storefront,
    binding: SessionBinding,
    products: FetchState<Vec<Product>>,
    categories: FetchState<Vec<String>>,
    pub query: CatalogQuery,
    pending_delete: Option<Product>,
    deleting: Arc<AtomicBool>,
    notice: Option<Notice>,
}

impl CatalogView {
    #[must_use]
    pub fn new(storefront: Storefront) -> Self {
        Self {
            binding: SessionBinding::bind(&storefront),
            storefront,
            products: FetchState::Idle,
            categories: FetchState::Idle,
            query: CatalogQuery::default(),
            pending_delete: None,
            deleting: Arc::new(AtomicBool::new(false)),
            notice: None,
        }
    }

    /// Fetch categories and products concurrently.
    ///
    /// Each request lands in its own section; one failing leaves the other
    /// usable. Returns a redirect to sign-in instead when logged out.
    /// Loading replaces all state, so it also binds the view to the current
    /// session.
    pub async fn load(&mut self) -> Option<Navigation> {
        if let Access::RedirectTo(to) = RoleGuard::authenticated(&self.storefront.snapshot()) {
            if !self.binding.is_current(&self.storefront) {
                self.discard();
            }
            return Some(Navigation::now(to));
        }
        self.binding = SessionBinding::bind(&self.storefront);

        self.products = FetchState::Loading;
        self.categories = FetchState::Loading;

        let storefront = self.storefront.clone();
        let api = storefront.api();
        let (products, categories) = tokio::join!(
            storefront
                .authorized()
                .run(Privilege::User, |token| async move {
                    api.list_products(&token).await
                }),
            api.list_categories(),
        );

        self.products = FetchState::from_result(products, |e| {
            error!(error = %e, "Failed to fetch products");
            "Failed to fetch products".to_string()
        });
        self.categories = FetchState::from_result(categories, |e| {
            error!(error = %e, "Failed to fetch categories");
            "Failed to fetch categories. Please try again later.".to_string()
        });
        None
    }

    async fn refetch_products(&mut self) {
        self.products = FetchState::Loading;
        let storefront = self.storefront.clone();
        let api = storefront.api();
        let result = storefront
            .authorized()
            .run(Privilege::User, |token| async move {
                api.list_products(&token).await
            })
            .await;
        self.products = FetchState::from_result(result, |e| {
            error!(error = %e, "Failed to refetch products");
            "Failed to fetch products".to_string()
        });
    }

    #[must_use]
    pub const fn products(&self) -> &FetchState<Vec<Product>> {
        &self.products
    }

    #[must_use]
    pub const fn categories(&self) -> &FetchState<Vec<String>> {
        &self.categories
    }

    /// Category choices with the `ALL` sentinel first.
    #[must_use]
    pub fn category_options(&self) -> Vec<String> {
        std::iter::once(ALL_CATEGORIES.to_string())
            .chain(self.categories.loaded().into_iter().flatten().cloned())
            .collect()
    }

    /// Products after the current query.
    #[must_use]
    pub fn visible_products(&self) -> Vec<&Product> {
        self.products
            .loaded()
            .map(|products| self.query.apply(products))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn affordances(&self) -> CatalogAffordances {
        let is_admin = self.storefront.snapshot().is_admin();
        CatalogAffordances {
            can_edit: is_admin,
            can_delete: is_admin,
        }
    }

    // =========================================================================
    // Delete flow
    // =========================================================================

    /// Open the delete confirmation for `id`.
    ///
    /// Returns `false`, without opening anything, for non-admins or unknown
    /// products.
    pub fn request_delete(&mut self, id: &ProductId) -> bool {
        if !self.ensure_session() {
            return false;
        }
        if !self.storefront.snapshot().is_admin() {
            warn!(product_id = %id, "Non-admin delete attempt ignored");
            return false;
        }
        let Some(product) = self
            .products
            .loaded()
            .and_then(|products| products.iter().find(|p| p.id == *id))
        else {
            return false;
        };
        self.pending_delete = Some(product.clone());
        true
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    #[must_use]
    pub const fn pending_delete(&self) -> Option<&Product> {
        self.pending_delete.as_ref()
    }

    #[must_use]
    pub fn is_deleting(&self) -> bool {
        InFlight::is_pending(&self.deleting)
    }

    /// Delete the product awaiting confirmation, then refetch the catalog.
    ///
    /// Returns whether the product was deleted. The outcome is also shown as
    /// a notice.
    pub async fn confirm_delete(&mut self) -> bool {
        if !self.ensure_session() {
            return false;
        }
        let Some(product) = self.pending_delete.take() else {
            return false;
        };
        if !self.storefront.snapshot().is_admin() {
            warn!(product_id = %product.id, "Delete confirmed without admin role");
            return false;
        }
        let Some(_in_flight) = InFlight::acquire(&self.deleting) else {
            return false;
        };

        let storefront = self.storefront.clone();
        let api = storefront.api();
        let id = &product.id;
        let result = storefront
            .authorized()
            .run(Privilege::Admin, |token| async move {
                api.delete_product(id, &token).await
            })
            .await;

        match result {
            Ok(()) => {
                info!(product_id = %product.id, "Product deleted");
                self.notice = Some(Notice::success("Product deleted successfully"));
                self.refetch_products().await;
                true
            }
            Err(e) => {
                error!(product_id = %product.id, error = %e, "Failed to delete product");
                self.notice = Some(Notice::error(e.user_message("delete product")));
                false
            }
        }
    }

    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Drop the notice once it has expired.
    pub fn tick(&mut self, now: Instant) {
        clear_expired(&mut self.notice, now);
    }

    /// Whether the view still belongs to the current session. A stale view
    /// drops everything it loaded.
    fn ensure_session(&mut self) -> bool {
        if self.binding.is_current(&self.storefront) {
            return true;
        }
        info!("Session ended, discarding catalog");
        self.discard();
        false
    }

    fn discard(&mut self) {
        self.products = FetchState::Idle;
        self.categories = FetchState::Idle;
        self.pending_delete = None;
        self.notice = Some(Notice::error(SESSION_ENDED_MESSAGE));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: &str, category: &str, price: u32, created: Option<&str>) -> Product {
        let created = created.map_or("null".to_string(), |c| format!("\"{c}\""));
        serde_json::from_str(&format!(
            r#"{{"id":"{id}","name":"Item {id}","category":"{category}","manufacturer":"M",
                "availableItems":3,"price":{price},"imageUrl":"",
                "description":"A {category} thing","createdAt":{created}}}"#
        ))
        .unwrap()
    }

    fn ids(products: &[&Product]) -> Vec<String> {
        products.iter().map(|p| p.id.to_string()).collect()
    }

    fn fixture() -> Vec<Product> {
        vec![
            product("10", "Apparel", 500, Some("2024-03-01T00:00:00Z")),
            product("2", "Electronics", 1500, None),
            product("1", "Apparel", 100, Some("2024-05-01T00:00:00Z")),
            product("3", "Furniture", 100, Some("2024-01-01T00:00:00Z")),
        ]
    }

    #[test]
    fn test_all_category_is_a_no_op() {
        let products = fixture();
        let query = CatalogQuery {
            category: CategoryFilter::parse("ALL"),
            ..CatalogQuery::default()
        };
        assert_eq!(query.apply(&products).len(), products.len());
    }

    #[test]
    fn test_default_sort_is_ascending_numeric_id() {
        let products = fixture();
        let visible = CatalogQuery::default().apply(&products);
        assert_eq!(ids(&visible), ["1", "2", "3", "10"]);
    }

    #[test]
    fn test_category_then_keyword() {
        let products = fixture();
        let query = CatalogQuery {
            category: CategoryFilter::parse("Apparel"),
            keyword: "ITEM 1".to_string(),
            sort: SortOption::Default,
        };
        assert_eq!(ids(&query.apply(&products)), ["1", "10"]);
    }

    #[test]
    fn test_keyword_spaces_are_significant() {
        let products = fixture();
        let blank = CatalogQuery {
            keyword: "   ".to_string(),
            ..CatalogQuery::default()
        };
        assert_eq!(blank.apply(&products).len(), products.len());

        let padded = CatalogQuery {
            keyword: "item 1 ".to_string(),
            ..CatalogQuery::default()
        };
        assert!(padded.apply(&products).is_empty());
    }

    #[test]
    fn test_keyword_matches_description() {
        let products = fixture();
        let query = CatalogQuery {
            keyword: "electronics THING".to_string(),
            ..CatalogQuery::default()
        };
        assert_eq!(ids(&query.apply(&products)), ["2"]);
    }

    #[test]
    fn test_price_low_to_high_is_non_decreasing_and_stable() {
        let products = fixture();
        let query = CatalogQuery {
            sort: SortOption::PriceLowToHigh,
            ..CatalogQuery::default()
        };
        let visible = query.apply(&products);
        assert!(visible.windows(2).all(|w| w[0].price <= w[1].price));
        assert_eq!(ids(&visible), ["1", "3", "10", "2"]);
    }

    #[test]
    fn test_price_high_to_low() {
        let products = fixture();
        let query = CatalogQuery {
            sort: SortOption::PriceHighToLow,
            ..CatalogQuery::default()
        };
        assert_eq!(ids(&query.apply(&products)), ["2", "10", "1", "3"]);
    }

    #[test]
    fn test_newest_puts_missing_timestamps_last() {
        let products = fixture();
        let query = CatalogQuery {
            sort: SortOption::Newest,
            ..CatalogQuery::default()
        };
        assert_eq!(ids(&query.apply(&products)), ["1", "10", "3", "2"]);
    }

    #[test]
    fn test_sort_option_parsing() {
        assert_eq!("price-asc".parse::<SortOption>().unwrap(), SortOption::PriceLowToHigh);
        assert_eq!(
            "Price: High to Low".parse::<SortOption>().unwrap(),
            SortOption::PriceHighToLow
        );
        assert!("cheapest".parse::<SortOption>().is_err());
        assert_eq!(SortOption::Newest.to_string(), "Newest");
    }
}
