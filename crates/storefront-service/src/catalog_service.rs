//! Catalog service: products, categories, search, reviews.

use crate::repository::{CategoryRepository, ProductRepository, ReviewRepository};
use async_trait::async_trait;
use std::sync::Arc;
use storefront_cache::{
    normalize_query, CategoriesParams, ChangeEvent, Filters, KeyParams, ProductListParams, ReviewsParams,
    SearchResultsParams, StorefrontCache, SuggestionParams,
};
use storefront_core::{
    Category, CategoryId, Interface, Page, PageRequest, Product, ProductDraft, ProductId, Review, SearchResults,
    StorefrontError, StorefrontResult, Suggestion, UserId,
};
use tracing::{debug, info};

/// Catalog service trait.
#[async_trait]
pub trait CatalogService: Interface + Send + Sync {
    /// Lists products, optionally filtered by category name and sorted.
    async fn list_products(
        &self,
        page: PageRequest,
        category: Option<String>,
        sort: Option<String>,
    ) -> StorefrontResult<Page<Product>>;

    /// Gets a product by ID.
    async fn get_product(&self, id: ProductId) -> StorefrontResult<Product>;

    /// Searches products by free text.
    async fn search_products(&self, query: &str, page: PageRequest) -> StorefrontResult<Page<Product>>;

    /// Search-as-you-type suggestions.
    async fn suggestions(&self, prefix: &str, limit: Option<u32>) -> StorefrontResult<Vec<Suggestion>>;

    /// Lists the children of a category, or the roots.
    async fn categories(&self, parent: Option<CategoryId>) -> StorefrontResult<Vec<Category>>;

    /// Site-wide search over products and categories.
    async fn search(&self, query: &str, page: PageRequest, filters: Filters) -> StorefrontResult<SearchResults>;

    /// Lists a product's reviews.
    async fn reviews(&self, product_id: ProductId, page: PageRequest) -> StorefrontResult<Page<Review>>;

    /// Creates a product.
    async fn create_product(&self, draft: ProductDraft) -> StorefrontResult<Product>;

    /// Updates a product.
    async fn update_product(&self, id: ProductId, draft: ProductDraft) -> StorefrontResult<Product>;

    /// Deletes a product.
    async fn delete_product(&self, id: ProductId) -> StorefrontResult<()>;

    /// Creates or replaces a category.
    async fn upsert_category(&self, category: Category) -> StorefrontResult<Category>;

    /// Adds a review to a product.
    async fn add_review(&self, product_id: ProductId, user_id: UserId, rating: u8, comment: String)
        -> StorefrontResult<Review>;
}

/// Catalog service over repositories and the shared cache.
pub struct CatalogServiceImpl {
    products: Arc<dyn ProductRepository>,
    categories: Arc<dyn CategoryRepository>,
    reviews: Arc<dyn ReviewRepository>,
    cache: StorefrontCache,
}

impl CatalogServiceImpl {
    /// Creates a new catalog service.
    pub fn new(
        products: Arc<dyn ProductRepository>,
        categories: Arc<dyn CategoryRepository>,
        reviews: Arc<dyn ReviewRepository>,
        cache: StorefrontCache,
    ) -> Self {
        Self {
            products,
            categories,
            reviews,
            cache,
        }
    }

    fn validate_draft(draft: &ProductDraft) -> StorefrontResult<()> {
        if draft.name.trim().is_empty() {
            return Err(StorefrontError::validation("Product name must not be empty"));
        }
        if draft.price < 0 {
            return Err(StorefrontError::validation("Product price must not be negative"));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogService for CatalogServiceImpl {
    async fn list_products(
        &self,
        page: PageRequest,
        category: Option<String>,
        sort: Option<String>,
    ) -> StorefrontResult<Page<Product>> {
        let page = page.normalized();
        debug!("Listing products, page: {}, limit: {}, category: {:?}", page.page, page.limit, category);

        let params = KeyParams::ProductList(ProductListParams {
            page: Some(page.page),
            limit: Some(page.limit),
            category: category.clone(),
            sort: sort.clone(),
            filters: Filters::new(),
        });

        self.cache
            .get_or_load(&params, || self.products.list(page, category.as_deref(), sort.as_deref()))
            .await
    }

    async fn get_product(&self, id: ProductId) -> StorefrontResult<Product> {
        debug!("Getting product: {}", id);

        self.cache
            .get_or_load(&KeyParams::product_detail(id), || async {
                self.products
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| StorefrontError::not_found("Product", id))
            })
            .await
    }

    async fn search_products(&self, query: &str, page: PageRequest) -> StorefrontResult<Page<Product>> {
        let query = normalize_query(query);
        let page = page.normalized();
        debug!("Searching products: '{}'", query);

        self.cache
            .get_or_load(&KeyParams::product_search(query.as_str(), page), || {
                self.products.search(&query, page)
            })
            .await
    }

    async fn suggestions(&self, prefix: &str, limit: Option<u32>) -> StorefrontResult<Vec<Suggestion>> {
        let prefix = normalize_query(prefix);
        let params = SuggestionParams {
            query: prefix.clone(),
            limit,
        };
        let limit = params.effective_limit();

        self.cache
            .get_or_load(&KeyParams::Suggestions(params), || self.products.suggest(&prefix, limit))
            .await
    }

    async fn categories(&self, parent: Option<CategoryId>) -> StorefrontResult<Vec<Category>> {
        self.cache
            .get_or_load(&KeyParams::Categories(CategoriesParams { parent }), || {
                self.categories.children(parent)
            })
            .await
    }

    async fn search(&self, query: &str, page: PageRequest, filters: Filters) -> StorefrontResult<SearchResults> {
        let query = normalize_query(query);
        let page = page.normalized();
        debug!("Site search: '{}'", query);

        let params = KeyParams::SearchResults(SearchResultsParams {
            query: query.clone(),
            page: Some(page.page),
            limit: Some(page.limit),
            filters: filters.clone(),
        });

        self.cache
            .get_or_load(&params, || async {
                let products = self.products.search_filtered(&query, page, &filters).await?;
                let categories = self.categories.search(&query).await?;
                Ok::<_, StorefrontError>(SearchResults {
                    total: products.total_elements,
                    products: products.content,
                    categories,
                })
            })
            .await
    }

    async fn reviews(&self, product_id: ProductId, page: PageRequest) -> StorefrontResult<Page<Review>> {
        let page = page.normalized();
        let params = KeyParams::Reviews(ReviewsParams {
            product_id,
            page: Some(page.page),
            limit: Some(page.limit),
        });

        self.cache
            .get_or_load(&params, || self.reviews.list_for_product(product_id, page))
            .await
    }

    async fn create_product(&self, draft: ProductDraft) -> StorefrontResult<Product> {
        Self::validate_draft(&draft)?;

        let product = self.products.create(&draft).await?;
        self.cache
            .invalidate(&ChangeEvent::ProductChanged { product_id: product.id })
            .await;

        info!("Product created: {}", product.id);
        Ok(product)
    }

    async fn update_product(&self, id: ProductId, draft: ProductDraft) -> StorefrontResult<Product> {
        debug!("Updating product: {}", id);
        Self::validate_draft(&draft)?;

        let product = self.products.update(id, &draft).await?;
        self.cache
            .invalidate(&ChangeEvent::ProductChanged { product_id: id })
            .await;

        info!("Product updated: {}", id);
        Ok(product)
    }

    async fn delete_product(&self, id: ProductId) -> StorefrontResult<()> {
        if !self.products.delete(id).await? {
            return Err(StorefrontError::not_found("Product", id));
        }
        self.cache
            .invalidate(&ChangeEvent::ProductChanged { product_id: id })
            .await;

        info!("Product deleted: {}", id);
        Ok(())
    }

    async fn upsert_category(&self, category: Category) -> StorefrontResult<Category> {
        if category.name.trim().is_empty() || category.slug.trim().is_empty() {
            return Err(StorefrontError::validation("Category name and slug must not be empty"));
        }

        let saved = self.categories.upsert(&category).await?;
        self.cache
            .invalidate(&ChangeEvent::CategoryChanged { category_id: saved.id })
            .await;

        info!("Category saved: {}", saved.id);
        Ok(saved)
    }

    async fn add_review(
        &self,
        product_id: ProductId,
        user_id: UserId,
        rating: u8,
        comment: String,
    ) -> StorefrontResult<Review> {
        if !(1..=5).contains(&rating) {
            return Err(StorefrontError::validation(format!("Rating must be between 1 and 5, got {}", rating)));
        }

        let review = self.reviews.add(product_id, user_id, rating, &comment).await?;
        self.cache
            .invalidate(&ChangeEvent::ReviewChanged { product_id })
            .await;

        info!("Review {} added to product {}", review.id, product_id);
        Ok(review)
    }
}

impl std::fmt::Debug for CatalogServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogServiceImpl").finish_non_exhaustive()
    }
}
