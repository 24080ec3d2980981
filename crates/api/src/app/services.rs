//! Service wiring: store backends + the reconciliation service.

use std::sync::Arc;

use anyhow::Context;

use stockroom_auth::UserStore;
use stockroom_orders::{OrderService, OrderStore};
use stockroom_products::ProductStore;
use stockroom_store::{
    InMemoryOrderStore, InMemoryProductStore, InMemoryUserStore, PgOrderStore, PgProductStore,
    PgUserStore, ensure_schema,
};

/// Everything the routes need, behind store-contract trait objects so the
/// backend is decided once, here.
#[derive(Clone)]
pub struct AppServices {
    pub orders: OrderService,
    pub products: Arc<dyn ProductStore>,
    pub users: Arc<dyn UserStore>,
}

impl AppServices {
    fn assemble(
        products: Arc<dyn ProductStore>,
        orders: Arc<dyn OrderStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            orders: OrderService::new(products.clone(), orders, users.clone()),
            products,
            users,
        }
    }

    /// In-memory backend (tests/dev).
    pub fn in_memory() -> Self {
        Self::assemble(
            Arc::new(InMemoryProductStore::new()),
            Arc::new(InMemoryOrderStore::new()),
            Arc::new(InMemoryUserStore::new()),
        )
    }

    /// PostgreSQL backend; creates the schema on first run.
    pub async fn postgres(database_url: &str) -> anyhow::Result<Self> {
        let pool = sqlx::PgPool::connect(database_url)
            .await
            .context("connecting to postgres")?;
        ensure_schema(&pool).await.context("creating schema")?;

        Ok(Self::assemble(
            Arc::new(PgProductStore::new(pool.clone())),
            Arc::new(PgOrderStore::new(pool.clone())),
            Arc::new(PgUserStore::new(pool)),
        ))
    }
}

/// Pick the backend from the environment: `DATABASE_URL` set means Postgres,
/// otherwise in-memory.
pub async fn build_services() -> anyhow::Result<AppServices> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => {
            tracing::info!("using postgres store backend");
            AppServices::postgres(&url).await
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores");
            Ok(AppServices::in_memory())
        }
    }
}
