use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

use warehouse_types::domain::order::{LineItem, Order, OrderStatus};
use warehouse_types::domain::user::{Role, User};
use warehouse_types::ports::order_store::OrderStore;
use warehouse_types::ports::user_store::UserStore;
use warehouse_types::ports::StoreError;

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

fn backend(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[derive(FromRow)]
struct DbOrder {
    id: String,
    number: i64,
    owner_user_id: String,
    total_cents: i64,
    status: String,
    created_date: String,
    last_modified_date: String,
    items_json: String,
}

const ORDER_COLUMNS: &str =
    "id, number, owner_user_id, total_cents, status, created_date, last_modified_date, items_json";

impl DbOrder {
    fn into_order(self) -> Result<Order, StoreError> {
        let status = parse_status(&self.status)?;
        let items: Vec<LineItem> = serde_json::from_str(&self.items_json).map_err(backend)?;
        let created_date = parse_date(&self.created_date)?;
        let last_modified_date = parse_date(&self.last_modified_date)?;
        let id = Uuid::parse_str(&self.id).map_err(backend)?;
        let owner_user_id = Uuid::parse_str(&self.owner_user_id).map_err(backend)?;
        Ok(Order {
            id,
            number: u64::try_from(self.number).map_err(backend)?,
            owner_user_id,
            items,
            total_cents: u64::try_from(self.total_cents).map_err(backend)?,
            status,
            created_date,
            last_modified_date,
        })
    }
}

#[derive(FromRow)]
struct DbUser {
    id: String,
    login: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    email: String,
    role: String,
}

impl DbUser {
    fn into_user(self) -> Result<User, StoreError> {
        let role = match self.role.as_str() {
            "Client" => Role::Client,
            "Employee" => Role::Employee,
            other => return Err(StoreError::Backend(format!("unknown role: {other}"))),
        };
        Ok(User {
            id: Uuid::parse_str(&self.id).map_err(backend)?,
            login: self.login,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            role,
        })
    }
}

fn parse_status(status: &str) -> Result<OrderStatus, StoreError> {
    match status {
        "Active" => Ok(OrderStatus::Active),
        "Executed" => Ok(OrderStatus::Executed),
        "Deleted" => Ok(OrderStatus::Deleted),
        other => Err(StoreError::Backend(format!("unknown status: {other}"))),
    }
}

fn parse_date(value: &str) -> Result<DateTime<Utc>, StoreError> {
    Ok(DateTime::parse_from_rfc3339(value)
        .map_err(backend)?
        .with_timezone(&Utc))
}

fn money_to_db(value: u64) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(backend)
}

impl SqliteStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure the on-disk target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        let ddl = include_str!("../migrations/0001_create_tables.sql");
        for statement in ddl.split(';').filter(|s| !s.trim().is_empty()) {
            sqlx::query(statement).execute(&pool).await?;
        }

        Ok(Self { pool })
    }
}

#[async_trait]
impl OrderStore for SqliteStore {
    async fn create(&self, order: Order) -> Result<Order, StoreError> {
        let items_json = serde_json::to_string(&order.items).map_err(backend)?;
        sqlx::query(
            "INSERT INTO orders (id, number, owner_user_id, total_cents, status, created_date, last_modified_date, items_json)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(order.id.to_string())
        .bind(i64::try_from(order.number).map_err(backend)?)
        .bind(order.owner_user_id.to_string())
        .bind(money_to_db(order.total_cents)?)
        .bind(format!("{:?}", order.status))
        .bind(order.created_date.to_rfc3339())
        .bind(order.last_modified_date.to_rfc3339())
        .bind(items_json)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(order)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let row: Option<DbOrder> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;
        row.map(DbOrder::into_order).transpose()
    }

    async fn list(&self) -> Result<Vec<Order>, StoreError> {
        let rows: Vec<DbOrder> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY number"))
                .fetch_all(&self.pool)
                .await
                .map_err(backend)?;
        rows.into_iter().map(DbOrder::into_order).collect()
    }

    async fn update_items(
        &self,
        id: Uuid,
        items: Vec<LineItem>,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let row: Option<DbOrder> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&mut *tx)
                .await
                .map_err(backend)?;
        let Some(row) = row else { return Ok(None) };

        let mut order = row.into_order()?;
        order.replace_items(items, now)?;

        sqlx::query(
            "UPDATE orders SET items_json = ?, total_cents = ?, last_modified_date = ? WHERE id = ?",
        )
        .bind(serde_json::to_string(&order.items).map_err(backend)?)
        .bind(money_to_db(order.total_cents)?)
        .bind(order.last_modified_date.to_rfc3339())
        .bind(id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(backend)?;
        tx.commit().await.map_err(backend)?;
        Ok(Some(order))
    }

    async fn change_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let row: Option<DbOrder> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&mut *tx)
                .await
                .map_err(backend)?;
        let Some(row) = row else { return Ok(None) };

        let mut order = row.into_order()?;
        order.change_status(status, now)?;

        sqlx::query("UPDATE orders SET status = ?, last_modified_date = ? WHERE id = ?")
            .bind(format!("{:?}", order.status))
            .bind(order.last_modified_date.to_rfc3339())
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        tx.commit().await.map_err(backend)?;
        Ok(Some(order))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(res.rows_affected() > 0)
    }

    async fn next_number(&self) -> Result<u64, StoreError> {
        let (value,): (i64,) =
            sqlx::query_as("UPDATE order_counter SET value = value + 1 WHERE id = 1 RETURNING value")
                .fetch_one(&self.pool)
                .await
                .map_err(backend)?;
        u64::try_from(value).map_err(backend)
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn create_user(&self, user: User) -> Result<User, StoreError> {
        let result = sqlx::query(
            "INSERT INTO users (id, login, password_hash, first_name, last_name, email, role)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.login)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(format!("{:?}", user.role))
        .execute(&self.pool)
        .await;
        match result {
            Ok(_) => Ok(user),
            Err(e) => {
                let unique = e
                    .as_database_error()
                    .is_some_and(|db| db.is_unique_violation());
                if unique {
                    Err(StoreError::DuplicateLogin(user.login))
                } else {
                    Err(backend(e))
                }
            }
        }
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row: Option<DbUser> = sqlx::query_as(
            "SELECT id, login, password_hash, first_name, last_name, email, role FROM users WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(DbUser::into_user).transpose()
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, StoreError> {
        let row: Option<DbUser> = sqlx::query_as(
            "SELECT id, login, password_hash, first_name, last_name, email, role FROM users WHERE login = ?",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(DbUser::into_user).transpose()
    }

    async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<User>, StoreError> {
        let res = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
            .bind(format!("{role:?}"))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if res.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_user(id).await
    }
}
