//! In-memory repositories for service tests.

use crate::repository::{
    CartRepository, CategoryRepository, OrderRepository, PaymentRepository, ProductRepository, ReviewRepository,
    UserRepository,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use storefront_cache::{Filters, InMemoryCacheStore, StorefrontCache};
use storefront_config::CacheConfig;
use storefront_core::{
    Cart, Category, CategoryId, LineItem, Order, OrderId, OrderStatus, Page, PageRequest, PaymentStatus, Product,
    ProductDraft, ProductId, Review, ReviewId, StorefrontError, StorefrontResult, Suggestion, UserId, UserProfile,
};

pub fn memory_cache() -> (StorefrontCache, Arc<InMemoryCacheStore>) {
    let store = Arc::new(InMemoryCacheStore::new());
    let cache = StorefrontCache::new(store.clone(), &CacheConfig::default()).unwrap();
    (cache, store)
}

fn paginate<T: Clone>(items: &[T], page: PageRequest) -> Page<T> {
    let start = usize::try_from(page.offset()).unwrap().min(items.len());
    let end = (start + page.limit as usize).min(items.len());
    Page::new(items[start..end].to_vec(), page, items.len() as u64)
}

fn write_failure() -> StorefrontError {
    StorefrontError::Database("write rejected".to_string())
}

/// Products, categories and reviews.
#[derive(Default)]
pub struct InMemoryCatalog {
    products: Mutex<BTreeMap<ProductId, Product>>,
    product_categories: Mutex<HashMap<ProductId, String>>,
    categories: Mutex<BTreeMap<CategoryId, Category>>,
    reviews: Mutex<Vec<Review>>,
    next_id: AtomicI64,
    product_reads: AtomicUsize,
    fail_writes: AtomicBool,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Self::default()
        }
    }

    pub fn insert_product(&self, name: &str, price: i64) -> Product {
        let product = Product::new(ProductId::new(self.next_id.fetch_add(1, Ordering::SeqCst)), name, price);
        self.products.lock().insert(product.id, product.clone());
        product
    }

    pub fn assign_category(&self, id: ProductId, category: &str) {
        self.product_categories.lock().insert(id, category.to_string());
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn product_reads(&self) -> usize {
        self.product_reads.load(Ordering::SeqCst)
    }

    pub fn product_count(&self) -> usize {
        self.products.lock().len()
    }

    fn check_writable(&self) -> StorefrontResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(write_failure());
        }
        Ok(())
    }

    fn matching(&self, query: &str) -> Vec<Product> {
        let query = query.to_lowercase();
        self.products
            .lock()
            .values()
            .filter(|p| p.name.to_lowercase().contains(&query))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ProductRepository for InMemoryCatalog {
    async fn find_by_id(&self, id: ProductId) -> StorefrontResult<Option<Product>> {
        self.product_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.products.lock().get(&id).cloned())
    }

    async fn list(&self, page: PageRequest, category: Option<&str>, _sort: Option<&str>) -> StorefrontResult<Page<Product>> {
        let assigned = self.product_categories.lock().clone();
        let products: Vec<Product> = self
            .products
            .lock()
            .values()
            .filter(|p| category.map_or(true, |c| assigned.get(&p.id).map(String::as_str) == Some(c)))
            .cloned()
            .collect();
        Ok(paginate(&products, page))
    }

    async fn search(&self, query: &str, page: PageRequest) -> StorefrontResult<Page<Product>> {
        Ok(paginate(&self.matching(query), page))
    }

    async fn search_filtered(&self, query: &str, page: PageRequest, _filters: &Filters) -> StorefrontResult<Page<Product>> {
        Ok(paginate(&self.matching(query), page))
    }

    async fn suggest(&self, prefix: &str, limit: u32) -> StorefrontResult<Vec<Suggestion>> {
        let prefix = prefix.to_lowercase();
        Ok(self
            .products
            .lock()
            .values()
            .filter(|p| p.name.to_lowercase().starts_with(&prefix))
            .take(limit as usize)
            .map(|p| Suggestion {
                product_id: p.id,
                label: p.name.clone(),
            })
            .collect())
    }

    async fn create(&self, draft: &ProductDraft) -> StorefrontResult<Product> {
        self.check_writable()?;
        let mut product = self.insert_product(&draft.name, draft.price);
        product.description = draft.description.clone();
        product.stock = draft.stock;
        product.category_id = draft.category_id;
        self.products.lock().insert(product.id, product.clone());
        Ok(product)
    }

    async fn update(&self, id: ProductId, draft: &ProductDraft) -> StorefrontResult<Product> {
        self.check_writable()?;
        let mut products = self.products.lock();
        let product = products
            .get_mut(&id)
            .ok_or_else(|| StorefrontError::not_found("Product", id))?;
        product.name = draft.name.clone();
        product.description = draft.description.clone();
        product.price = draft.price;
        product.stock = draft.stock;
        product.category_id = draft.category_id;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn delete(&self, id: ProductId) -> StorefrontResult<bool> {
        self.check_writable()?;
        Ok(self.products.lock().remove(&id).is_some())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCatalog {
    async fn children(&self, parent: Option<CategoryId>) -> StorefrontResult<Vec<Category>> {
        Ok(self
            .categories
            .lock()
            .values()
            .filter(|c| c.parent_id == parent)
            .cloned()
            .collect())
    }

    async fn search(&self, query: &str) -> StorefrontResult<Vec<Category>> {
        let query = query.to_lowercase();
        Ok(self
            .categories
            .lock()
            .values()
            .filter(|c| c.name.to_lowercase().contains(&query))
            .cloned()
            .collect())
    }

    async fn upsert(&self, category: &Category) -> StorefrontResult<Category> {
        self.check_writable()?;
        self.categories.lock().insert(category.id, category.clone());
        Ok(category.clone())
    }
}

#[async_trait]
impl ReviewRepository for InMemoryCatalog {
    async fn list_for_product(&self, product_id: ProductId, page: PageRequest) -> StorefrontResult<Page<Review>> {
        let reviews: Vec<Review> = self
            .reviews
            .lock()
            .iter()
            .rev()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect();
        Ok(paginate(&reviews, page))
    }

    async fn add(&self, product_id: ProductId, user_id: UserId, rating: u8, comment: &str) -> StorefrontResult<Review> {
        self.check_writable()?;
        let review = Review {
            id: ReviewId::new(self.next_id.fetch_add(1, Ordering::SeqCst)),
            product_id,
            user_id,
            rating,
            comment: comment.to_string(),
            created_at: Utc::now(),
        };
        self.reviews.lock().push(review.clone());
        Ok(review)
    }
}

/// Orders, payments and carts.
#[derive(Default)]
pub struct InMemoryOrders {
    orders: Mutex<BTreeMap<OrderId, Order>>,
    payments: Mutex<HashMap<OrderId, PaymentStatus>>,
    carts: Mutex<HashMap<UserId, Cart>>,
    next_id: AtomicI64,
    order_reads: AtomicUsize,
    fail_writes: AtomicBool,
}

impl InMemoryOrders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn order_reads(&self) -> usize {
        self.order_reads.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> StorefrontResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(write_failure());
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrders {
    async fn find_by_id(&self, id: OrderId) -> StorefrontResult<Option<Order>> {
        self.order_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.orders.lock().get(&id).cloned())
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
        status: Option<OrderStatus>,
    ) -> StorefrontResult<Page<Order>> {
        let orders: Vec<Order> = self
            .orders
            .lock()
            .values()
            .rev()
            .filter(|o| o.user_id == user_id && status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        Ok(paginate(&orders, page))
    }

    async fn create(&self, user_id: UserId, items: &[LineItem]) -> StorefrontResult<Order> {
        self.check_writable()?;
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1),
            user_id,
            items: items.to_vec(),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.orders.lock().insert(order.id, order.clone());
        Ok(order)
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> StorefrontResult<Order> {
        self.check_writable()?;
        let mut orders = self.orders.lock();
        let order = orders.get_mut(&id).ok_or_else(|| StorefrontError::not_found("Order", id))?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }
}

#[async_trait]
impl PaymentRepository for InMemoryOrders {
    async fn find_for_order(&self, order_id: OrderId) -> StorefrontResult<Option<PaymentStatus>> {
        Ok(self.payments.lock().get(&order_id).cloned())
    }

    async fn record(&self, status: &PaymentStatus) -> StorefrontResult<PaymentStatus> {
        self.check_writable()?;
        self.payments.lock().insert(status.order_id, status.clone());
        Ok(status.clone())
    }
}

#[async_trait]
impl CartRepository for InMemoryOrders {
    async fn find(&self, user_id: UserId) -> StorefrontResult<Cart> {
        Ok(self.carts.lock().get(&user_id).cloned().unwrap_or_default())
    }

    async fn save(&self, user_id: UserId, cart: &Cart) -> StorefrontResult<Cart> {
        self.check_writable()?;
        self.carts.lock().insert(user_id, cart.clone());
        Ok(cart.clone())
    }
}

/// User profiles.
#[derive(Default)]
pub struct InMemoryUsers {
    profiles: Mutex<HashMap<UserId, UserProfile>>,
    reads: AtomicUsize,
    fail_writes: AtomicBool,
}

impl InMemoryUsers {
    pub fn with_profile(profile: UserProfile) -> Self {
        let users = Self::default();
        users.profiles.lock().insert(profile.id, profile);
        users
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_profile(&self, id: UserId) -> StorefrontResult<Option<UserProfile>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.profiles.lock().get(&id).cloned())
    }

    async fn update_profile(&self, profile: &UserProfile) -> StorefrontResult<UserProfile> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(write_failure());
        }
        self.profiles.lock().insert(profile.id, profile.clone());
        Ok(profile.clone())
    }
}
