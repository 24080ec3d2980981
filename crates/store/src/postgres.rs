//! PostgreSQL-backed store implementations.
//!
//! Queries are runtime-checked (`sqlx::query(...).bind(...)`); every query
//! addresses records by primary key or an indexed column. Order line items
//! live in their own table and are re-joined on read, ordered by line
//! number so the stored item sequence survives the round trip.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use stockroom_auth::{Role, User, UserStore};
use stockroom_core::{OrderId, ProductId, StoreError, UserId};
use stockroom_orders::{Order, OrderFilter, OrderLineItem, OrderStore};
use stockroom_products::{Product, ProductStore, Sku};

/// Create the schema when it does not exist yet. Called once at startup.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    const STATEMENTS: &[&str] = &[
        "CREATE TABLE IF NOT EXISTS products (
            id UUID PRIMARY KEY,
            name TEXT NOT NULL,
            sku TEXT NOT NULL UNIQUE,
            price BIGINT NOT NULL,
            category TEXT NOT NULL,
            stock BIGINT NOT NULL,
            in_stock BOOLEAN NOT NULL,
            description TEXT,
            created_at TIMESTAMPTZ NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS orders (
            id UUID PRIMARY KEY,
            total_amount BIGINT NOT NULL,
            status TEXT NOT NULL,
            user_id UUID NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS order_items (
            order_id UUID NOT NULL REFERENCES orders (id) ON DELETE CASCADE,
            line_no INT NOT NULL,
            product_id UUID NOT NULL,
            quantity BIGINT NOT NULL,
            unit_price BIGINT NOT NULL,
            PRIMARY KEY (order_id, line_no)
        )",
        "CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            role TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS orders_status_idx ON orders (status)",
    ];

    for statement in STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(map_store_err)?;
    }
    Ok(())
}

fn map_store_err(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::duplicate(db.message().to_string());
        }
    }
    StoreError::backend(err.to_string())
}

fn row_to_product(row: &PgRow) -> Result<Product, StoreError> {
    let sku: String = row.try_get("sku").map_err(map_store_err)?;
    let sku = Sku::new(sku).map_err(|e| StoreError::backend(format!("corrupt sku: {e}")))?;
    let price: i64 = row.try_get("price").map_err(map_store_err)?;

    Ok(Product {
        id: ProductId::from_uuid(row.try_get("id").map_err(map_store_err)?),
        name: row.try_get("name").map_err(map_store_err)?,
        sku,
        price: price.max(0) as u64,
        category: row.try_get("category").map_err(map_store_err)?,
        stock: row.try_get("stock").map_err(map_store_err)?,
        in_stock: row.try_get("in_stock").map_err(map_store_err)?,
        description: row.try_get("description").map_err(map_store_err)?,
        created_at: row.try_get("created_at").map_err(map_store_err)?,
    })
}

pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, name, sku, price, category, stock, in_stock, description, created_at";

#[async_trait]
impl ProductStore for PgProductStore {
    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
        ))
        .bind(uuids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_store_err)?;

        rows.iter().map(row_to_product).collect()
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_store_err)?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn find_by_sku(&self, sku: &Sku) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = $1"
        ))
        .bind(sku.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_store_err)?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn list(&self, skip: u64, limit: u64) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             ORDER BY created_at DESC, id DESC OFFSET $1 LIMIT $2"
        ))
        .bind(skip as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_store_err)?;

        rows.iter().map(row_to_product).collect()
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM products")
            .fetch_one(&self.pool)
            .await
            .map_err(map_store_err)?;
        let n: i64 = row.try_get("n").map_err(map_store_err)?;
        Ok(n.max(0) as u64)
    }

    async fn insert(&self, product: Product) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO products
                 (id, name, sku, price, category, stock, in_stock, description, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.sku.as_str())
        .bind(product.price as i64)
        .bind(&product.category)
        .bind(product.stock)
        .bind(product.in_stock)
        .bind(&product.description)
        .bind(product.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_store_err)?;
        Ok(())
    }

    async fn save(&self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE products SET
                 name = $2, price = $3, category = $4,
                 stock = $5, in_stock = $6, description = $7
             WHERE id = $1",
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.price as i64)
        .bind(&product.category)
        .bind(product.stock)
        .bind(product.in_stock)
        .bind(&product.description)
        .execute(&self.pool)
        .await
        .map_err(map_store_err)?;
        Ok(())
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_store_err)?;
        Ok(result.rows_affected() > 0)
    }
}

pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load line items for a batch of orders, keyed later by order id.
    async fn load_items(
        &self,
        order_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, OrderLineItem)>, StoreError> {
        let rows = sqlx::query(
            "SELECT order_id, product_id, quantity, unit_price
             FROM order_items WHERE order_id = ANY($1)
             ORDER BY order_id, line_no",
        )
        .bind(order_ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(map_store_err)?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let order_id: Uuid = row.try_get("order_id").map_err(map_store_err)?;
            let unit_price: i64 = row.try_get("unit_price").map_err(map_store_err)?;
            items.push((
                order_id,
                OrderLineItem {
                    product_id: ProductId::from_uuid(
                        row.try_get("product_id").map_err(map_store_err)?,
                    ),
                    quantity: row.try_get("quantity").map_err(map_store_err)?,
                    unit_price: unit_price.max(0) as u64,
                },
            ));
        }
        Ok(items)
    }

    fn row_to_order(row: &PgRow, line_items: Vec<OrderLineItem>) -> Result<Order, StoreError> {
        let status: String = row.try_get("status").map_err(map_store_err)?;
        let status = status
            .parse()
            .map_err(|e| StoreError::backend(format!("corrupt order status: {e}")))?;
        let total_amount: i64 = row.try_get("total_amount").map_err(map_store_err)?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get("id").map_err(map_store_err)?),
            line_items,
            total_amount: total_amount.max(0) as u64,
            status,
            user_id: UserId::from_uuid(row.try_get("user_id").map_err(map_store_err)?),
            created_at: row.try_get("created_at").map_err(map_store_err)?,
        })
    }

    async fn hydrate(&self, rows: Vec<PgRow>) -> Result<Vec<Order>, StoreError> {
        let ids: Vec<Uuid> = rows
            .iter()
            .map(|row| row.try_get("id").map_err(map_store_err))
            .collect::<Result<_, _>>()?;
        let mut items = self.load_items(&ids).await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: Uuid = row.try_get("id").map_err(map_store_err)?;
            let mut line_items = Vec::new();
            items.retain(|(order_id, item)| {
                if *order_id == id {
                    line_items.push(item.clone());
                    false
                } else {
                    true
                }
            });
            orders.push(Self::row_to_order(row, line_items)?);
        }
        Ok(orders)
    }

    async fn write_items(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        order: &Order,
    ) -> Result<(), sqlx::Error> {
        for (line_no, item) in order.line_items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_items (order_id, line_no, product_id, quantity, unit_price)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(order.id.as_uuid())
            .bind(line_no as i32)
            .bind(item.product_id.as_uuid())
            .bind(item.quantity)
            .bind(item.unit_price as i64)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn find(
        &self,
        filter: &OrderFilter,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Order>, StoreError> {
        let rows = match filter.status {
            Some(status) => {
                sqlx::query(
                    "SELECT id, total_amount, status, user_id, created_at FROM orders
                     WHERE status = $1
                     ORDER BY created_at DESC, id DESC OFFSET $2 LIMIT $3",
                )
                .bind(status.as_str())
                .bind(skip as i64)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT id, total_amount, status, user_id, created_at FROM orders
                     ORDER BY created_at DESC, id DESC OFFSET $1 LIMIT $2",
                )
                .bind(skip as i64)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_store_err)?;

        self.hydrate(rows).await
    }

    async fn count(&self, filter: &OrderFilter) -> Result<u64, StoreError> {
        let row = match filter.status {
            Some(status) => {
                sqlx::query("SELECT COUNT(*) AS n FROM orders WHERE status = $1")
                    .bind(status.as_str())
                    .fetch_one(&self.pool)
                    .await
            }
            None => {
                sqlx::query("SELECT COUNT(*) AS n FROM orders")
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .map_err(map_store_err)?;

        let n: i64 = row.try_get("n").map_err(map_store_err)?;
        Ok(n.max(0) as u64)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(
            "SELECT id, total_amount, status, user_id, created_at FROM orders WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_store_err)?;

        let Some(row) = row else { return Ok(None) };
        let items = self.load_items(&[*id.as_uuid()]).await?;
        let line_items = items.into_iter().map(|(_, item)| item).collect();
        Ok(Some(Self::row_to_order(&row, line_items)?))
    }

    async fn insert(&self, order: Order) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_store_err)?;

        sqlx::query(
            "INSERT INTO orders (id, total_amount, status, user_id, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(order.id.as_uuid())
        .bind(order.total_amount as i64)
        .bind(order.status.as_str())
        .bind(order.user_id.as_uuid())
        .bind(order.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_store_err)?;

        Self::write_items(&mut tx, &order)
            .await
            .map_err(map_store_err)?;

        tx.commit().await.map_err(map_store_err)
    }

    async fn save(&self, order: &Order) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_store_err)?;

        sqlx::query("UPDATE orders SET total_amount = $2, status = $3 WHERE id = $1")
            .bind(order.id.as_uuid())
            .bind(order.total_amount as i64)
            .bind(order.status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(map_store_err)?;

        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(map_store_err)?;

        Self::write_items(&mut tx, order)
            .await
            .map_err(map_store_err)?;

        tx.commit().await.map_err(map_store_err)
    }

    async fn delete(&self, id: OrderId) -> Result<(), StoreError> {
        // order_items rows go with the order (ON DELETE CASCADE).
        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_store_err)?;
        Ok(())
    }
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT id, email, name, role FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_store_err)?;

        let Some(row) = row else { return Ok(None) };
        let role: String = row.try_get("role").map_err(map_store_err)?;
        Ok(Some(User {
            id: UserId::from_uuid(row.try_get("id").map_err(map_store_err)?),
            email: row.try_get("email").map_err(map_store_err)?,
            name: row.try_get("name").map_err(map_store_err)?,
            role: Role::new(role),
        }))
    }

    async fn insert(&self, user: User) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO users (id, email, name, role) VALUES ($1, $2, $3, $4)")
            .bind(user.id.as_uuid())
            .bind(&user.email)
            .bind(&user.name)
            .bind(user.role.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_store_err)?;
        Ok(())
    }
}
