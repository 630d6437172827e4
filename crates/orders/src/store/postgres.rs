//! `PostgreSQL` store adapters.
//!
//! Queries use the runtime API with `FromRow` row types converted into
//! domain models; the inventory adapter keeps one JSONB document per product
//! and mutates it only with single-statement conditional writes, so no
//! transaction ever spans the two stores.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use matchday_core::{OrderId, OrderLineId, OrderStatus, ProductId, Size, UserId};

use crate::models::{InventoryRecord, NewOrder, Order, OrderLine};

use super::{InventoryStore, OrderStore, StoreError};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for order header queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    created_at: DateTime<Utc>,
    status: String,
    total: Decimal,
    shipping_address: Option<String>,
    phone: Option<String>,
    notes: Option<String>,
}

/// Internal row type for order line queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    product_name: String,
    size: String,
    quantity: i32,
    unit_price: Decimal,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        Self {
            id: OrderLineId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            size: Size::from(row.size),
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

fn order_from_rows(row: OrderRow, line_rows: Vec<OrderLineRow>) -> Result<Order, StoreError> {
    let status: OrderStatus = row
        .status
        .parse()
        .map_err(StoreError::DataCorruption)?;

    Ok(Order {
        id: OrderId::new(row.id),
        user_id: UserId::new(row.user_id),
        created_at: row.created_at,
        status,
        total: row.total,
        shipping_address: row.shipping_address,
        phone: row.phone,
        notes: row.notes,
        lines: line_rows.into_iter().map(OrderLine::from).collect(),
    })
}

const SELECT_ORDER: &str = "SELECT id, user_id, created_at, status, total, \
     shipping_address, phone, notes FROM orders";

const SELECT_LINES: &str = "SELECT id, order_id, product_id, product_name, size, \
     quantity, unit_price FROM order_lines WHERE order_id = $1 ORDER BY id";

// =============================================================================
// Order Store
// =============================================================================

/// `PostgreSQL`-backed order store.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_lines(&self, order_id: i32) -> Result<Vec<OrderLineRow>, StoreError> {
        let rows = sqlx::query_as::<_, OrderLineRow>(SELECT_LINES)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn hydrate(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, StoreError> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let lines = self.load_lines(row.id).await?;
            orders.push(order_from_rows(row, lines)?);
        }
        Ok(orders)
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create(&self, order: &NewOrder) -> Result<OrderId, StoreError> {
        let mut tx = self.pool.begin().await?;

        let (order_id,): (i32,) = sqlx::query_as(
            "INSERT INTO orders (user_id, status, total, shipping_address, phone, notes) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(order.user_id)
        .bind(order.status.to_string())
        .bind(order.total)
        .bind(order.shipping_address.as_deref())
        .bind(order.phone.as_deref())
        .bind(order.notes.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        for line in order.lines() {
            sqlx::query(
                "INSERT INTO order_lines \
                 (order_id, product_id, product_name, size, quantity, unit_price) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(&line.product_name)
            .bind(line.size.as_str())
            .bind(line.quantity)
            .bind(line.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(OrderId::new(order_id))
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{SELECT_ORDER} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let lines = self.load_lines(row.id).await?;
                Ok(Some(order_from_rows(row, lines)?))
            }
            None => Ok(None),
        }
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{SELECT_ORDER} WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, StoreError> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, OrderRow>(&format!(
                    "{SELECT_ORDER} WHERE status = $1 ORDER BY created_at DESC, id DESC"
                ))
                .bind(status.to_string())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, OrderRow>(&format!(
                    "{SELECT_ORDER} ORDER BY created_at DESC, id DESC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        self.hydrate(rows).await
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

// =============================================================================
// Inventory Store
// =============================================================================

/// `PostgreSQL`-backed inventory store.
///
/// Each product's counts live in one JSONB document
/// (`inventory.sizes = {"M": 5, ...}`). Decrement is a single `UPDATE` whose
/// `WHERE` clause re-checks availability, so the condition and the write are
/// atomic per document.
#[derive(Clone)]
pub struct PgInventoryStore {
    pool: PgPool,
}

impl PgInventoryStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryStore for PgInventoryStore {
    async fn record(&self, product_id: ProductId) -> Result<Option<InventoryRecord>, StoreError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT sizes FROM inventory WHERE product_id = $1")
                .bind(product_id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((value,)) => {
                let sizes: HashMap<Size, i32> = serde_json::from_value(value)
                    .map_err(|e| StoreError::DataCorruption(e.to_string()))?;
                Ok(Some(InventoryRecord::with_sizes(product_id, sizes)))
            }
            None => Ok(None),
        }
    }

    async fn count(&self, product_id: ProductId, size: &Size) -> Result<i32, StoreError> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT COALESCE((sizes->>$2)::int, 0) FROM inventory WHERE product_id = $1",
        )
        .bind(product_id)
        .bind(size.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map_or(0, |(count,)| count))
    }

    async fn put(&self, record: InventoryRecord) -> Result<(), StoreError> {
        let sizes = serde_json::to_value(&record.sizes)
            .map_err(|e| StoreError::DataCorruption(e.to_string()))?;

        sqlx::query(
            "INSERT INTO inventory (product_id, sizes) VALUES ($1, $2) \
             ON CONFLICT (product_id) DO UPDATE SET sizes = EXCLUDED.sizes",
        )
        .bind(record.product_id)
        .bind(sizes)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn decrement(
        &self,
        product_id: ProductId,
        size: &Size,
        quantity: i32,
    ) -> Result<Option<i32>, StoreError> {
        let row: Option<(i32,)> = sqlx::query_as(
            "UPDATE inventory \
             SET sizes = jsonb_set(sizes, ARRAY[$2], \
                 to_jsonb(COALESCE((sizes->>$2)::int, 0) - $3)) \
             WHERE product_id = $1 AND COALESCE((sizes->>$2)::int, 0) >= $3 \
             RETURNING (sizes->>$2)::int",
        )
        .bind(product_id)
        .bind(size.as_str())
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(remaining,)| remaining))
    }

    async fn increment(
        &self,
        product_id: ProductId,
        size: &Size,
        quantity: i32,
    ) -> Result<i32, StoreError> {
        let (updated,): (i32,) = sqlx::query_as(
            "INSERT INTO inventory (product_id, sizes) \
             VALUES ($1, jsonb_build_object($2::text, $3::int)) \
             ON CONFLICT (product_id) DO UPDATE \
             SET sizes = jsonb_set(inventory.sizes, ARRAY[$2], \
                 to_jsonb(COALESCE((inventory.sizes->>$2)::int, 0) + $3)) \
             RETURNING (sizes->>$2)::int",
        )
        .bind(product_id)
        .bind(size.as_str())
        .bind(quantity)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }
}
