//! Repository contracts for the system of record.
//!
//! Each method is one authoritative query or one committed write. The cache
//! layer never talks to these directly; services pass them to the cache as
//! loaders.

use async_trait::async_trait;
use storefront_cache::Filters;
use storefront_core::{
    Cart, Category, CategoryId, Interface, LineItem, Order, OrderId, OrderStatus, Page, PageRequest, PaymentStatus,
    Product, ProductDraft, ProductId, Review, StorefrontResult, Suggestion, UserId, UserProfile,
};

/// Product repository trait.
#[async_trait]
pub trait ProductRepository: Interface + Send + Sync {
    /// Finds a product by ID.
    async fn find_by_id(&self, id: ProductId) -> StorefrontResult<Option<Product>>;

    /// Lists products, optionally restricted to one category by name.
    async fn list(&self, page: PageRequest, category: Option<&str>, sort: Option<&str>) -> StorefrontResult<Page<Product>>;

    /// Full-text product search.
    async fn search(&self, query: &str, page: PageRequest) -> StorefrontResult<Page<Product>>;

    /// Full-text product search with attribute filters.
    async fn search_filtered(
        &self,
        query: &str,
        page: PageRequest,
        filters: &Filters,
    ) -> StorefrontResult<Page<Product>>;

    /// Products whose name starts with `prefix`.
    async fn suggest(&self, prefix: &str, limit: u32) -> StorefrontResult<Vec<Suggestion>>;

    /// Inserts a new product.
    async fn create(&self, draft: &ProductDraft) -> StorefrontResult<Product>;

    /// Replaces a product's editable fields.
    async fn update(&self, id: ProductId, draft: &ProductDraft) -> StorefrontResult<Product>;

    /// Deletes a product. Returns false if it did not exist.
    async fn delete(&self, id: ProductId) -> StorefrontResult<bool>;
}

/// Category repository trait.
#[async_trait]
pub trait CategoryRepository: Interface + Send + Sync {
    /// Direct children of `parent`, or the roots when `None`.
    async fn children(&self, parent: Option<CategoryId>) -> StorefrontResult<Vec<Category>>;

    /// Categories whose name matches `query`.
    async fn search(&self, query: &str) -> StorefrontResult<Vec<Category>>;

    /// Inserts or replaces a category.
    async fn upsert(&self, category: &Category) -> StorefrontResult<Category>;
}

/// Review repository trait.
#[async_trait]
pub trait ReviewRepository: Interface + Send + Sync {
    /// Reviews of one product, newest first.
    async fn list_for_product(&self, product_id: ProductId, page: PageRequest) -> StorefrontResult<Page<Review>>;

    /// Stores a new review.
    async fn add(&self, product_id: ProductId, user_id: UserId, rating: u8, comment: &str) -> StorefrontResult<Review>;
}

/// Order repository trait.
#[async_trait]
pub trait OrderRepository: Interface + Send + Sync {
    /// Finds an order by ID.
    async fn find_by_id(&self, id: OrderId) -> StorefrontResult<Option<Order>>;

    /// A user's orders, newest first.
    async fn list_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
        status: Option<OrderStatus>,
    ) -> StorefrontResult<Page<Order>>;

    /// Inserts a pending order.
    async fn create(&self, user_id: UserId, items: &[LineItem]) -> StorefrontResult<Order>;

    /// Sets an order's status.
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> StorefrontResult<Order>;
}

/// Payment repository trait.
#[async_trait]
pub trait PaymentRepository: Interface + Send + Sync {
    /// Latest payment status of an order.
    async fn find_for_order(&self, order_id: OrderId) -> StorefrontResult<Option<PaymentStatus>>;

    /// Records a payment status change.
    async fn record(&self, status: &PaymentStatus) -> StorefrontResult<PaymentStatus>;
}

/// Cart repository trait.
#[async_trait]
pub trait CartRepository: Interface + Send + Sync {
    /// A user's cart; empty if they never added anything.
    async fn find(&self, user_id: UserId) -> StorefrontResult<Cart>;

    /// Replaces a user's cart.
    async fn save(&self, user_id: UserId, cart: &Cart) -> StorefrontResult<Cart>;
}

/// User repository trait.
#[async_trait]
pub trait UserRepository: Interface + Send + Sync {
    /// Finds a profile by user ID.
    async fn find_profile(&self, id: UserId) -> StorefrontResult<Option<UserProfile>>;

    /// Saves a profile.
    async fn update_profile(&self, profile: &UserProfile) -> StorefrontResult<UserProfile>;
}
