use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use futures_util::TryStreamExt;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    FoodId, FoodRecord, InventoryRecord, OrderId, OrderLine, OrderQuery, OrderRecord, OwnerId,
    Result, StockChange, StockDemand, StoreError, Version, store::Store,
};

/// PostgreSQL-backed store implementation.
///
/// The inventory is a single row locked with `SELECT ... FOR UPDATE` by every
/// stock-changing write, so those writes run one after another. Order
/// placement takes `FOR SHARE` locks on the foods it references, which a
/// food deletion's `FOR UPDATE` waits on.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_food(row: PgRow) -> Result<FoodRecord> {
        Ok(FoodRecord {
            id: FoodId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            price: to_u32(row.try_get("price")?)?,
            allergens: row.try_get("allergens")?,
        })
    }

    fn row_to_order(row: &PgRow, lines: Vec<OrderLine>) -> Result<OrderRecord> {
        Ok(OrderRecord {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            owner: OwnerId::new(row.try_get::<String, _>("owner")?),
            lines,
            fulfilled: row.try_get("fulfilled")?,
            created_at: row.try_get("created_at")?,
        })
    }

    /// Ensures the inventory row exists and locks it for the transaction.
    async fn lock_or_create_inventory(tx: &mut Transaction<'_, Postgres>) -> Result<Version> {
        sqlx::query("INSERT INTO inventory (id, version) VALUES (1, 0) ON CONFLICT (id) DO NOTHING")
            .execute(&mut **tx)
            .await?;

        Self::lock_inventory(tx)
            .await?
            .ok_or(StoreError::InventoryMissing)
    }

    async fn lock_inventory(tx: &mut Transaction<'_, Postgres>) -> Result<Option<Version>> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM inventory WHERE id = 1 FOR UPDATE")
                .fetch_optional(&mut **tx)
                .await?;

        Ok(version.map(Version::new))
    }

    async fn bump_version(tx: &mut Transaction<'_, Postgres>) -> Result<Version> {
        let version: i64 = sqlx::query_scalar(
            "UPDATE inventory SET version = version + 1, updated_at = NOW() WHERE id = 1 RETURNING version",
        )
        .fetch_one(&mut **tx)
        .await?;

        Ok(Version::new(version))
    }

    /// Reads the stock entries for the given foods with their rows locked.
    async fn lock_stock(
        tx: &mut Transaction<'_, Postgres>,
        food_ids: Vec<Uuid>,
    ) -> Result<BTreeMap<FoodId, u32>> {
        let rows = sqlx::query(
            "SELECT food_id, quantity FROM inventory_stock WHERE food_id = ANY($1) FOR UPDATE",
        )
        .bind(food_ids)
        .fetch_all(&mut **tx)
        .await?;

        let mut stock = BTreeMap::new();
        for row in rows {
            let food_id = FoodId::from_uuid(row.try_get::<Uuid, _>("food_id")?);
            stock.insert(food_id, to_u32(row.try_get("quantity")?)?);
        }
        Ok(stock)
    }

    /// Loads the lines for a set of orders, keyed by order id.
    async fn load_lines(&self, order_ids: Vec<Uuid>) -> Result<HashMap<Uuid, Vec<OrderLine>>> {
        let mut lines: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
        if order_ids.is_empty() {
            return Ok(lines);
        }

        let mut rows = sqlx::query(
            r#"
            SELECT order_id, food_id, food_name
            FROM order_lines
            WHERE order_id = ANY($1)
            ORDER BY order_id, position ASC
            "#,
        )
        .bind(order_ids)
        .fetch(&self.pool);

        while let Some(row) = rows.try_next().await? {
            let order_id: Uuid = row.try_get("order_id")?;
            let line = OrderLine::new(
                FoodId::from_uuid(row.try_get::<Uuid, _>("food_id")?),
                row.try_get::<String, _>("food_name")?,
            );
            lines.entry(order_id).or_default().push(line);
        }

        Ok(lines)
    }
}

fn to_u32(value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|e| StoreError::Database(sqlx::Error::Decode(Box::new(e))))
}

fn map_name_conflict(e: sqlx::Error, name: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.constraint() == Some("unique_food_name")
    {
        return StoreError::DuplicateName(name.to_string());
    }
    StoreError::Database(e)
}

#[async_trait]
impl Store for PostgresStore {
    async fn insert_food(&self, food: FoodRecord, quantity: u32) -> Result<Version> {
        let mut tx = self.pool.begin().await?;

        Self::lock_or_create_inventory(&mut tx).await?;

        sqlx::query(
            r#"
            INSERT INTO foods (id, name, price, allergens)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(food.id.as_uuid())
        .bind(&food.name)
        .bind(i64::from(food.price))
        .bind(&food.allergens)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_name_conflict(e, &food.name))?;

        sqlx::query("INSERT INTO inventory_stock (food_id, quantity) VALUES ($1, $2)")
            .bind(food.id.as_uuid())
            .bind(i64::from(quantity))
            .execute(&mut *tx)
            .await?;

        let version = Self::bump_version(&mut tx).await?;
        tx.commit().await?;

        tracing::debug!(food = %food.name, %version, "food inserted");
        Ok(version)
    }

    async fn get_food(&self, id: FoodId) -> Result<Option<FoodRecord>> {
        let row: Option<PgRow> =
            sqlx::query("SELECT id, name, price, allergens FROM foods WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        row.map(Self::row_to_food).transpose()
    }

    async fn get_food_by_name(&self, name: &str) -> Result<Option<FoodRecord>> {
        let row: Option<PgRow> =
            sqlx::query("SELECT id, name, price, allergens FROM foods WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Self::row_to_food).transpose()
    }

    async fn list_foods(&self) -> Result<Vec<FoodRecord>> {
        let rows = sqlx::query("SELECT id, name, price, allergens FROM foods ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_food).collect()
    }

    async fn delete_food(&self, id: FoodId) -> Result<Version> {
        let mut tx = self.pool.begin().await?;

        Self::lock_or_create_inventory(&mut tx).await?;

        // Waits for any order placement holding a share lock on this food
        let name: Option<String> =
            sqlx::query_scalar("SELECT name FROM foods WHERE id = $1 FOR UPDATE")
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;
        let Some(name) = name else {
            return Err(StoreError::FoodNotFound(id));
        };

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT o.id)
            FROM orders o
            JOIN order_lines l ON l.order_id = o.id
            WHERE l.food_id = $1 AND NOT o.fulfilled
            "#,
        )
        .bind(id.as_uuid())
        .fetch_one(&mut *tx)
        .await?;

        if count > 0 {
            return Err(StoreError::FoodInUse {
                name,
                count: count as usize,
            });
        }

        // Stock entry goes with it via ON DELETE CASCADE
        sqlx::query("DELETE FROM foods WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;

        let version = Self::bump_version(&mut tx).await?;
        tx.commit().await?;
        Ok(version)
    }

    async fn get_inventory(&self) -> Result<Option<InventoryRecord>> {
        let version: Option<i64> = sqlx::query_scalar("SELECT version FROM inventory WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        let Some(version) = version else {
            return Ok(None);
        };

        let rows = sqlx::query("SELECT food_id, quantity FROM inventory_stock")
            .fetch_all(&self.pool)
            .await?;

        let mut stock = BTreeMap::new();
        for row in rows {
            let food_id = FoodId::from_uuid(row.try_get::<Uuid, _>("food_id")?);
            stock.insert(food_id, to_u32(row.try_get("quantity")?)?);
        }

        Ok(Some(InventoryRecord {
            version: Version::new(version),
            stock,
        }))
    }

    async fn create_inventory(&self) -> Result<InventoryRecord> {
        sqlx::query("INSERT INTO inventory (id, version) VALUES (1, 0) ON CONFLICT (id) DO NOTHING")
            .execute(&self.pool)
            .await?;

        self.get_inventory()
            .await?
            .ok_or(StoreError::InventoryMissing)
    }

    async fn apply(&self, change: StockChange) -> Result<Version> {
        let mut tx = self.pool.begin().await?;

        Self::lock_inventory(&mut tx)
            .await?
            .ok_or(StoreError::InventoryMissing)?;

        for food in &change.foods {
            let updated = sqlx::query(
                r#"
                UPDATE foods SET name = $2, price = $3, allergens = $4
                WHERE id = $1
                "#,
            )
            .bind(food.id.as_uuid())
            .bind(&food.name)
            .bind(i64::from(food.price))
            .bind(&food.allergens)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_name_conflict(e, &food.name))?
            .rows_affected();

            if updated == 0 {
                return Err(StoreError::FoodNotFound(food.id));
            }
        }

        for (food_id, quantity) in &change.quantities {
            let updated =
                sqlx::query("UPDATE inventory_stock SET quantity = $2 WHERE food_id = $1")
                    .bind(food_id.as_uuid())
                    .bind(i64::from(*quantity))
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();

            if updated == 0 {
                return Err(StoreError::FoodNotFound(*food_id));
            }
        }

        let version = Self::bump_version(&mut tx).await?;
        tx.commit().await?;
        Ok(version)
    }

    async fn fulfill_order(&self, order_id: OrderId, demand: &[StockDemand]) -> Result<Version> {
        let mut tx = self.pool.begin().await?;

        Self::lock_or_create_inventory(&mut tx).await?;

        let fulfilled: Option<bool> =
            sqlx::query_scalar("SELECT fulfilled FROM orders WHERE id = $1 FOR UPDATE")
                .bind(order_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;

        match fulfilled {
            None => return Err(StoreError::OrderNotFound(order_id)),
            Some(true) => return Err(StoreError::OrderAlreadyFulfilled(order_id)),
            Some(false) => {}
        }

        let food_ids = demand.iter().map(|item| item.food_id.as_uuid()).collect();
        let inventory = InventoryRecord {
            version: Version::initial(),
            stock: Self::lock_stock(&mut tx, food_ids).await?,
        };
        let change = inventory.reserve(demand)?;

        for (food_id, quantity) in &change.quantities {
            sqlx::query("UPDATE inventory_stock SET quantity = $2 WHERE food_id = $1")
                .bind(food_id.as_uuid())
                .bind(i64::from(*quantity))
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE orders SET fulfilled = TRUE WHERE id = $1")
            .bind(order_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        let version = Self::bump_version(&mut tx).await?;
        tx.commit().await?;

        tracing::debug!(order = %order_id, %version, "order fulfilled");
        Ok(version)
    }

    async fn insert_order(&self, order: OrderRecord) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let mut wanted: Vec<Uuid> = order.lines.iter().map(|l| l.food_id.as_uuid()).collect();
        wanted.sort();
        wanted.dedup();

        // Share locks keep the foods from being deleted until this commits
        let present: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM foods WHERE id = ANY($1) FOR SHARE")
                .bind(&wanted[..])
                .fetch_all(&mut *tx)
                .await?;

        if let Some(missing) = wanted.iter().find(|id| !present.contains(id)) {
            return Err(StoreError::FoodNotFound(FoodId::from_uuid(*missing)));
        }

        sqlx::query(
            r#"
            INSERT INTO orders (id, name, owner, fulfilled, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.name)
        .bind(order.owner.as_str())
        .bind(order.fulfilled)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        for (position, line) in order.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_lines (order_id, position, food_id, food_name)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order.id.as_uuid())
            .bind(position as i32)
            .bind(line.food_id.as_uuid())
            .bind(&line.food_name)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        let row: Option<PgRow> = sqlx::query(
            "SELECT id, name, owner, fulfilled, created_at FROM orders WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut lines = self.load_lines(vec![id.as_uuid()]).await?;
        let lines = lines.remove(&id.as_uuid()).unwrap_or_default();
        Self::row_to_order(&row, lines).map(Some)
    }

    async fn query_orders(&self, query: OrderQuery) -> Result<Vec<OrderRecord>> {
        let mut sql =
            String::from("SELECT id, name, owner, fulfilled, created_at FROM orders WHERE 1=1");
        let mut param_count = 0;

        // Build dynamic query
        if query.owner.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND owner = ${param_count}"));
        }
        if query.fulfilled.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND fulfilled = ${param_count}"));
        }
        if query.references_food.is_some() {
            param_count += 1;
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM order_lines l WHERE l.order_id = orders.id AND l.food_id = ${param_count})"
            ));
        }

        sql.push_str(" ORDER BY created_at ASC, seq ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);

        if let Some(owner) = query.owner {
            sqlx_query = sqlx_query.bind(owner.as_str().to_string());
        }
        if let Some(fulfilled) = query.fulfilled {
            sqlx_query = sqlx_query.bind(fulfilled);
        }
        if let Some(food_id) = query.references_food {
            sqlx_query = sqlx_query.bind(food_id.as_uuid());
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(offset as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;

        let ids = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut lines = self.load_lines(ids).await?;

        rows.iter()
            .map(|row| {
                let id: Uuid = row.try_get("id")?;
                Self::row_to_order(row, lines.remove(&id).unwrap_or_default())
            })
            .collect()
    }

    async fn delete_orders_for_owner(&self, owner: &OwnerId) -> Result<u64> {
        let deleted = sqlx::query("DELETE FROM orders WHERE owner = $1")
            .bind(owner.as_str())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}
