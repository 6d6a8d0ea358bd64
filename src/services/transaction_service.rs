use std::collections::HashMap;

use crate::database::DbPool;
use crate::entities::{
    Role, product_entity as products, transaction_entity as transactions,
    transaction_item_entity as transaction_items, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::middlewares::AuthUser;
use crate::models::*;
use crate::utils::generate_transaction_code;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};

const MAX_CODE_ATTEMPTS: usize = 10;

#[derive(Clone)]
pub struct TransactionService {
    pool: DbPool,
    decrement_on_sale: bool,
}

impl TransactionService {
    pub fn new(pool: DbPool, decrement_on_sale: bool) -> Self {
        Self {
            pool,
            decrement_on_sale,
        }
    }

    /// Records a sale rung up by `actor`.
    ///
    /// The request is validated and priced before the database is touched.
    /// Everything after that runs in one database transaction: product
    /// lookup, the optional stock decrement, code allocation and the header
    /// and item inserts.
    pub async fn create_transaction(
        &self,
        actor: &AuthUser,
        request: CheckoutRequest,
    ) -> AppResult<TransactionDetailResponse> {
        let priced = request.validate_and_price()?;

        let txn = self.pool.begin().await?;
        let names = load_products(&txn, &priced).await?;
        if self.decrement_on_sale {
            take_stock(&txn, &priced).await?;
        }
        let kode_transaksi = allocate_code(&txn).await?;

        let header = transactions::ActiveModel {
            kode_transaksi: Set(kode_transaksi),
            kasir_id: Set(Some(actor.id)),
            total_harga: Set(priced.total_harga),
            jumlah_bayar: Set(priced.jumlah_bayar),
            kembalian: Set(priced.kembalian),
            tanggal: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(code_conflict_or)?;

        let items = insert_items(&txn, header.id, &priced).await?;
        txn.commit().await?;

        log::info!(
            "Transaction {} recorded by user {}: total {}",
            header.kode_transaksi,
            actor.id,
            header.total_harga
        );

        Ok(detail(header, Some(actor.nama.clone()), items, &names))
    }

    /// Newest first. Customers only see their own transactions.
    pub async fn list_transactions(&self, viewer: &AuthUser) -> AppResult<Vec<TransactionResponse>> {
        let mut select = transactions::Entity::find();
        if viewer.role == Role::Pelanggan {
            select = select.filter(transactions::Column::KasirId.eq(viewer.id));
        }
        let rows = select
            .order_by_desc(transactions::Column::Tanggal)
            .all(self.pool.as_ref())
            .await?;
        Ok(rows.into_iter().map(TransactionResponse::from).collect())
    }

    pub async fn get_transaction(
        &self,
        id: i64,
        viewer: &AuthUser,
    ) -> AppResult<TransactionDetailResponse> {
        let header = transactions::Entity::find_by_id(id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(transaction_not_found)?;

        if viewer.role == Role::Pelanggan && header.kasir_id != Some(viewer.id) {
            return Err(AppError::Forbidden(
                "You can only view your own transactions".to_string(),
            ));
        }

        self.load_detail(header).await
    }

    pub async fn get_by_code(&self, kode: &str) -> AppResult<TransactionDetailResponse> {
        let header = transactions::Entity::find()
            .filter(transactions::Column::KodeTransaksi.eq(kode))
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(transaction_not_found)?;
        self.load_detail(header).await
    }

    /// Re-prices the transaction from the new item list and replaces its
    /// items. The editor becomes the transaction's `kasir_id`. Stock is not
    /// adjusted.
    pub async fn update_transaction(
        &self,
        id: i64,
        actor: &AuthUser,
        request: CheckoutRequest,
    ) -> AppResult<TransactionDetailResponse> {
        let priced = request.validate_and_price()?;

        let txn = self.pool.begin().await?;
        let existing = transactions::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(transaction_not_found)?;
        let names = load_products(&txn, &priced).await?;

        let mut model = existing.into_active_model();
        model.kasir_id = Set(Some(actor.id));
        model.total_harga = Set(priced.total_harga);
        model.jumlah_bayar = Set(priced.jumlah_bayar);
        model.kembalian = Set(priced.kembalian);
        model.tanggal = Set(Utc::now());
        let header = model.update(&txn).await?;

        transaction_items::Entity::delete_many()
            .filter(transaction_items::Column::TransactionId.eq(id))
            .exec(&txn)
            .await?;
        let items = insert_items(&txn, id, &priced).await?;
        txn.commit().await?;

        log::info!("Transaction {} updated by user {}", header.kode_transaksi, actor.id);
        Ok(detail(header, Some(actor.nama.clone()), items, &names))
    }

    /// Items go with it through the cascading foreign key.
    pub async fn delete_transaction(&self, id: i64) -> AppResult<()> {
        let res = transactions::Entity::delete_by_id(id).exec(self.pool.as_ref()).await?;
        if res.rows_affected == 0 {
            return Err(transaction_not_found());
        }
        log::info!("Transaction {id} deleted");
        Ok(())
    }

    async fn load_detail(
        &self,
        header: transactions::Model,
    ) -> AppResult<TransactionDetailResponse> {
        let kasir_nama = match header.kasir_id {
            Some(kasir_id) => users::Entity::find_by_id(kasir_id)
                .one(self.pool.as_ref())
                .await?
                .map(|u| u.nama),
            None => None,
        };

        let items = transaction_items::Entity::find()
            .filter(transaction_items::Column::TransactionId.eq(header.id))
            .order_by_asc(transaction_items::Column::Id)
            .all(self.pool.as_ref())
            .await?;

        let mut product_ids: Vec<i64> = items.iter().filter_map(|i| i.product_id).collect();
        product_ids.sort_unstable();
        product_ids.dedup();
        let names = if product_ids.is_empty() {
            HashMap::new()
        } else {
            products::Entity::find()
                .filter(products::Column::Id.is_in(product_ids))
                .all(self.pool.as_ref())
                .await?
                .into_iter()
                .map(|p| (p.id, p))
                .collect()
        };

        Ok(detail(header, kasir_nama, items, &names))
    }
}

fn transaction_not_found() -> AppError {
    AppError::NotFound("Transaction not found".to_string())
}

/// A concurrent sale that won the race for the same code surfaces as a
/// unique violation on insert.
fn code_conflict_or(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => CheckoutError::CodeExhausted.into(),
        _ => AppError::DatabaseError(err),
    }
}

fn detail(
    header: transactions::Model,
    kasir_nama: Option<String>,
    items: Vec<transaction_items::Model>,
    products_by_id: &HashMap<i64, products::Model>,
) -> TransactionDetailResponse {
    let items = items
        .into_iter()
        .map(|item| {
            let product = item
                .product_id
                .and_then(|id| products_by_id.get(&id))
                .cloned();
            TransactionItemResponse::with_product(item, product)
        })
        .collect();

    TransactionDetailResponse {
        transaction: TransactionResponse::from(header),
        kasir_nama,
        items,
    }
}

/// Every referenced product must exist.
async fn load_products<C: ConnectionTrait>(
    conn: &C,
    priced: &PricedCheckout,
) -> AppResult<HashMap<i64, products::Model>> {
    let ids = priced.product_ids();
    let found: HashMap<i64, products::Model> = products::Entity::find()
        .filter(products::Column::Id.is_in(ids.clone()))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    if let Some(missing) = ids.into_iter().find(|id| !found.contains_key(id)) {
        return Err(CheckoutError::UnknownProduct {
            product_id: missing,
        }
        .into());
    }
    Ok(found)
}

/// Conditional decrement: a row is only touched while it still has enough
/// stock, so concurrent sales cannot drive it negative.
async fn take_stock<C: ConnectionTrait>(conn: &C, priced: &PricedCheckout) -> AppResult<()> {
    for (product_id, qty) in priced.quantities() {
        let res = products::Entity::update_many()
            .col_expr(
                products::Column::Stok,
                Expr::col(products::Column::Stok).sub(qty),
            )
            .filter(products::Column::Id.eq(product_id))
            .filter(products::Column::Stok.gte(qty))
            .exec(conn)
            .await?;
        if res.rows_affected == 0 {
            return Err(CheckoutError::InsufficientStock { product_id }.into());
        }
    }
    Ok(())
}

async fn allocate_code<C: ConnectionTrait>(conn: &C) -> AppResult<String> {
    let today = Utc::now().date_naive();
    for _ in 0..MAX_CODE_ATTEMPTS {
        let candidate = generate_transaction_code(today);
        let taken = transactions::Entity::find()
            .filter(transactions::Column::KodeTransaksi.eq(candidate.as_str()))
            .one(conn)
            .await?
            .is_some();
        if !taken {
            return Ok(candidate);
        }
    }
    log::error!("No free transaction code after {MAX_CODE_ATTEMPTS} attempts");
    Err(CheckoutError::CodeExhausted.into())
}

async fn insert_items<C: ConnectionTrait>(
    conn: &C,
    transaction_id: i64,
    priced: &PricedCheckout,
) -> AppResult<Vec<transaction_items::Model>> {
    let rows = priced.lines.iter().map(|line| transaction_items::ActiveModel {
        transaction_id: Set(transaction_id),
        product_id: Set(Some(line.product_id)),
        qty: Set(line.qty),
        harga_satuan: Set(line.harga_satuan),
        subtotal: Set(line.subtotal),
        ..Default::default()
    });
    transaction_items::Entity::insert_many(rows)
        .exec_without_returning(conn)
        .await?;

    Ok(transaction_items::Entity::find()
        .filter(transaction_items::Column::TransactionId.eq(transaction_id))
        .order_by_asc(transaction_items::Column::Id)
        .all(conn)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::executed_statements;
    use chrono::{DateTime, TimeZone};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 1, 9, 30, 0).unwrap()
    }

    fn actor(id: i64, role: Role) -> AuthUser {
        AuthUser {
            id,
            role,
            nama: format!("user-{id}"),
        }
    }

    fn product(id: i64, harga: i64) -> products::Model {
        products::Model {
            id,
            nama_produk: format!("Produk {id}"),
            harga,
            stok: 100,
            kategori_id: None,
            image: None,
            deskripsi: None,
            created_at: at(),
            updated_at: at(),
        }
    }

    fn header(id: i64, kasir_id: Option<i64>) -> transactions::Model {
        transactions::Model {
            id,
            kode_transaksi: "TRX-20251101-0042".to_string(),
            kasir_id,
            total_harga: 125_000,
            jumlah_bayar: 150_000,
            kembalian: 25_000,
            tanggal: at(),
        }
    }

    fn item(id: i64, transaction_id: i64, product_id: i64, qty: i32, harga: i64) -> transaction_items::Model {
        transaction_items::Model {
            id,
            transaction_id,
            product_id: Some(product_id),
            qty,
            harga_satuan: harga,
            subtotal: harga * i64::from(qty),
        }
    }

    fn sale_request(paid: i64) -> CheckoutRequest {
        serde_json::from_value(serde_json::json!({
            "jumlah_bayar": paid,
            "items": [
                {"product_id": 1, "qty": 2, "harga_satuan": 50000},
                {"product_id": 2, "qty": 1, "harga_satuan": 25000}
            ]
        }))
        .unwrap()
    }

    fn insert_statements(statements: &[String]) -> Vec<&String> {
        statements.iter().filter(|s| s.starts_with("INSERT")).collect()
    }

    #[tokio::test]
    async fn test_checkout_persists_header_and_items() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // referenced products
                .append_query_results([vec![product(1, 50_000), product(2, 25_000)]])
                // code lookup: free
                .append_query_results([Vec::<transactions::Model>::new()])
                // header insert
                .append_query_results([vec![header(11, Some(4))]])
                // items read back
                .append_query_results([vec![
                    item(1, 11, 1, 2, 50_000),
                    item(2, 11, 2, 1, 25_000),
                ]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );
        let service = TransactionService::new(db.clone(), false);

        let created = service
            .create_transaction(&actor(4, Role::Kasir), sale_request(150_000))
            .await
            .unwrap();
        assert_eq!(created.items[1].nama_produk.as_deref(), Some("Produk 2"));
        assert_eq!(created.kasir_nama.as_deref(), Some("user-4"));
        drop(service);

        let statements = executed_statements(db);
        assert!(statements.first().is_some_and(|s| s.starts_with("BEGIN")));
        assert!(statements.last().is_some_and(|s| s.starts_with("COMMIT")));

        let inserts = insert_statements(&statements);
        assert_eq!(inserts.len(), 2);

        let header_insert = inserts[0];
        assert!(header_insert.starts_with(r#"INSERT INTO "transactions""#));
        assert!(header_insert.contains("BigInt(Some(4))"), "kasir_id: {header_insert}");
        assert!(header_insert.contains("BigInt(Some(125000))"), "total_harga: {header_insert}");
        assert!(header_insert.contains("BigInt(Some(150000))"), "jumlah_bayar: {header_insert}");
        assert!(header_insert.contains("BigInt(Some(25000))"), "kembalian: {header_insert}");

        let items = inserts[1];
        assert!(items.starts_with(r#"INSERT INTO "transaction_items""#));
        assert_eq!(items.matches("), (").count(), 1, "two value rows: {items}");
        assert_eq!(items.matches("BigInt(Some(11))").count(), 2);
        assert!(items.contains("BigInt(Some(100000))"), "first subtotal: {items}");
    }

    #[tokio::test]
    async fn test_underpayment_touches_nothing() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = TransactionService::new(db.clone(), false);

        let err = service
            .create_transaction(&actor(4, Role::Kasir), sale_request(100_000))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Checkout(CheckoutError::InsufficientPayment {
                total: 125_000,
                paid: 100_000
            })
        ));
        drop(service);
        assert!(executed_statements(db).is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product_is_rejected() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![product(1, 50_000)]])
                .into_connection(),
        );
        let service = TransactionService::new(db.clone(), false);

        let err = service
            .create_transaction(&actor(4, Role::Kasir), sale_request(150_000))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Checkout(CheckoutError::UnknownProduct { product_id: 2 })
        ));
        drop(service);

        let statements = executed_statements(db);
        assert!(insert_statements(&statements).is_empty());
        assert!(statements.last().is_some_and(|s| s.starts_with("ROLLBACK")));
    }

    #[tokio::test]
    async fn test_insufficient_stock_when_decrementing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![product(1, 50_000), product(2, 25_000)]])
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );
        let service = TransactionService::new(db.clone(), true);

        let err = service
            .create_transaction(&actor(4, Role::Kasir), sale_request(150_000))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Checkout(CheckoutError::InsufficientStock { product_id: 2 })
        ));
        drop(service);

        let statements = executed_statements(db);
        assert!(insert_statements(&statements).is_empty());
        let updates = statements.iter().filter(|s| s.starts_with("UPDATE")).count();
        assert_eq!(updates, 2);
        assert!(statements.last().is_some_and(|s| s.starts_with("ROLLBACK")));
    }

    #[tokio::test]
    async fn test_customer_cannot_read_someone_elses_transaction() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![header(11, Some(8))]])
                .into_connection(),
        );
        let service = TransactionService::new(db, false);

        let err = service
            .get_transaction(11, &actor(5, Role::Pelanggan))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_customer_reads_own_transaction() {
        let owner = users::Model {
            id: 5,
            nama: "Rina".to_string(),
            email: "rina@mail.com".to_string(),
            password: "hash".to_string(),
            role: Role::Pelanggan,
            is_active: true,
            created_at: at(),
            updated_at: at(),
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![header(11, Some(5))]])
                .append_query_results([vec![owner]])
                .append_query_results([vec![item(1, 11, 1, 2, 50_000)]])
                .append_query_results([vec![product(1, 50_000)]])
                .into_connection(),
        );
        let service = TransactionService::new(db, false);

        let detail = service
            .get_transaction(11, &actor(5, Role::Pelanggan))
            .await
            .unwrap();
        assert_eq!(detail.kasir_nama.as_deref(), Some("Rina"));
        assert_eq!(detail.items[0].nama_produk.as_deref(), Some("Produk 1"));
    }

    #[tokio::test]
    async fn test_delete_missing_transaction_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );
        let service = TransactionService::new(db, false);

        let err = service.delete_transaction(1).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
