//! Order service: order history, payments, carts.

use crate::repository::{CartRepository, OrderRepository, PaymentRepository};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use storefront_cache::{
    CartParams, ChangeEvent, KeyParams, OrderDetailParams, OrderListParams, PaymentStatusParams, StorefrontCache,
};
use storefront_core::{
    Cart, Interface, LineItem, Order, OrderId, OrderStatus, Page, PageRequest, PaymentState, PaymentStatus,
    StorefrontError, StorefrontResult, UserId,
};
use tracing::{debug, info};

/// Order service trait.
#[async_trait]
pub trait OrderService: Interface + Send + Sync {
    /// Lists a user's orders, optionally by status.
    async fn list_orders(
        &self,
        user_id: UserId,
        page: PageRequest,
        status: Option<OrderStatus>,
    ) -> StorefrontResult<Page<Order>>;

    /// Gets an order by ID.
    async fn get_order(&self, id: OrderId) -> StorefrontResult<Order>;

    /// Gets the payment status of an order.
    async fn payment_status(&self, order_id: OrderId) -> StorefrontResult<PaymentStatus>;

    /// Gets a user's cart.
    async fn cart(&self, user_id: UserId) -> StorefrontResult<Cart>;

    /// Places a pending order.
    async fn place_order(&self, user_id: UserId, items: Vec<LineItem>) -> StorefrontResult<Order>;

    /// Moves an order to a new status.
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> StorefrontResult<Order>;

    /// Records a payment provider update for an order.
    async fn record_payment(&self, order_id: OrderId, state: PaymentState) -> StorefrontResult<PaymentStatus>;

    /// Replaces a user's cart.
    async fn update_cart(&self, user_id: UserId, cart: Cart) -> StorefrontResult<Cart>;
}

/// Order service over repositories and the shared cache.
pub struct OrderServiceImpl {
    orders: Arc<dyn OrderRepository>,
    payments: Arc<dyn PaymentRepository>,
    carts: Arc<dyn CartRepository>,
    cache: StorefrontCache,
}

impl OrderServiceImpl {
    /// Creates a new order service.
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        payments: Arc<dyn PaymentRepository>,
        carts: Arc<dyn CartRepository>,
        cache: StorefrontCache,
    ) -> Self {
        Self {
            orders,
            payments,
            carts,
            cache,
        }
    }

    /// Reads the order from the system of record, bypassing the cache.
    async fn load_order(&self, id: OrderId) -> StorefrontResult<Order> {
        self.orders
            .find_by_id(id)
            .await?
            .ok_or_else(|| StorefrontError::not_found("Order", id))
    }

    fn validate_items(items: &[LineItem]) -> StorefrontResult<()> {
        if items.is_empty() {
            return Err(StorefrontError::validation("An order needs at least one item"));
        }
        if let Some(item) = items.iter().find(|i| i.quantity == 0 || i.unit_price < 0) {
            return Err(StorefrontError::validation(format!(
                "Invalid line for product {}: quantity {} at {}",
                item.product_id, item.quantity, item.unit_price
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderService for OrderServiceImpl {
    async fn list_orders(
        &self,
        user_id: UserId,
        page: PageRequest,
        status: Option<OrderStatus>,
    ) -> StorefrontResult<Page<Order>> {
        let page = page.normalized();
        debug!("Listing orders for user: {}", user_id);

        let params = KeyParams::OrderList(OrderListParams {
            user_id,
            page: Some(page.page),
            limit: Some(page.limit),
            status: status.map(|s| s.as_str().to_string()),
        });

        self.cache
            .get_or_load(&params, || self.orders.list_for_user(user_id, page, status))
            .await
    }

    async fn get_order(&self, id: OrderId) -> StorefrontResult<Order> {
        debug!("Getting order: {}", id);

        self.cache
            .get_or_load(&KeyParams::OrderDetail(OrderDetailParams { order_id: id }), || {
                self.load_order(id)
            })
            .await
    }

    async fn payment_status(&self, order_id: OrderId) -> StorefrontResult<PaymentStatus> {
        self.cache
            .get_or_load(&KeyParams::PaymentStatus(PaymentStatusParams { order_id }), || async {
                self.payments
                    .find_for_order(order_id)
                    .await?
                    .ok_or_else(|| StorefrontError::not_found("PaymentStatus", order_id))
            })
            .await
    }

    async fn cart(&self, user_id: UserId) -> StorefrontResult<Cart> {
        self.cache
            .get_or_load(&KeyParams::Cart(CartParams { user_id }), || self.carts.find(user_id))
            .await
    }

    async fn place_order(&self, user_id: UserId, items: Vec<LineItem>) -> StorefrontResult<Order> {
        Self::validate_items(&items)?;

        let order = self.orders.create(user_id, &items).await?;
        self.cache
            .invalidate(&ChangeEvent::OrderChanged {
                order_id: order.id,
                user_id,
            })
            .await;

        info!("Order {} placed by {}", order.id, user_id);
        Ok(order)
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> StorefrontResult<Order> {
        let current = self.load_order(id).await?;
        if !current.status.can_transition_to(status) {
            return Err(StorefrontError::Conflict(format!(
                "Order {} cannot move from {} to {}",
                id, current.status, status
            )));
        }

        let order = self.orders.update_status(id, status).await?;
        self.cache
            .invalidate(&ChangeEvent::OrderChanged {
                order_id: id,
                user_id: order.user_id,
            })
            .await;

        info!("Order {} moved to {}", id, status);
        Ok(order)
    }

    async fn record_payment(&self, order_id: OrderId, state: PaymentState) -> StorefrontResult<PaymentStatus> {
        let order = self.load_order(order_id).await?;
        let status = PaymentStatus {
            order_id,
            state,
            amount: order.total(),
            updated_at: Utc::now(),
        };

        let recorded = self.payments.record(&status).await?;
        self.cache
            .invalidate(&ChangeEvent::PaymentChanged {
                order_id,
                user_id: order.user_id,
            })
            .await;

        info!("Payment for order {} recorded as {:?}", order_id, state);
        Ok(recorded)
    }

    async fn update_cart(&self, user_id: UserId, cart: Cart) -> StorefrontResult<Cart> {
        let saved = self.carts.save(user_id, &cart).await?;
        self.cache.invalidate(&ChangeEvent::CartChanged { user_id }).await;

        debug!("Cart updated for user: {}", user_id);
        Ok(saved)
    }
}

impl std::fmt::Debug for OrderServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderServiceImpl").finish_non_exhaustive()
    }
}
