use crate::database::DbPool;
use crate::entities::{
    product_entity as products, transaction_entity as transactions,
    transaction_item_entity as transaction_items,
};
use crate::error::AppResult;
use crate::models::*;
use chrono::{DateTime, Days, Local, NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};

#[derive(Debug, FromQueryResult)]
struct RevenueRow {
    revenue: i64,
}

#[derive(Debug, FromQueryResult)]
struct BestSellerRow {
    id: i64,
    nama_produk: String,
    image: Option<String>,
    total_qty: i64,
    total_revenue: i64,
}

/// UTC bounds `[start, end)` of a calendar day in the server's local zone.
pub fn local_day_bounds(day: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = day.and_hms_opt(0, 0, 0)?.and_local_timezone(Local).earliest()?;
    let next = day.checked_add_days(Days::new(1))?;
    let end = next.and_hms_opt(0, 0, 0)?.and_local_timezone(Local).earliest()?;
    Some((start.with_timezone(&Utc), end.with_timezone(&Utc)))
}

#[derive(Clone)]
pub struct ReportService {
    pool: DbPool,
}

impl ReportService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn sales_report(&self) -> AppResult<SalesReport> {
        let today = Local::now().date_naive();
        let yesterday = today.pred_opt().unwrap_or(today);

        let total_revenue = self.revenue_between(None).await?;
        let today_revenue = self.revenue_between(local_day_bounds(today)).await?;
        let yesterday_revenue = self.revenue_between(local_day_bounds(yesterday)).await?;
        let best_seller = self.best_seller().await?;

        Ok(SalesReport {
            total_revenue,
            today_revenue,
            yesterday_revenue,
            percentage_change: percentage_change(today_revenue, yesterday_revenue),
            best_seller,
        })
    }

    async fn revenue_between(
        &self,
        bounds: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> AppResult<i64> {
        let mut select = transactions::Entity::find()
            .select_only()
            .column_as(Expr::cust("COALESCE(SUM(total_harga), 0)::BIGINT"), "revenue");
        if let Some((start, end)) = bounds {
            select = select
                .filter(transactions::Column::Tanggal.gte(start))
                .filter(transactions::Column::Tanggal.lt(end));
        }

        Ok(select
            .into_model::<RevenueRow>()
            .one(self.pool.as_ref())
            .await?
            .map(|r| r.revenue)
            .unwrap_or(0))
    }

    /// Product with the most units sold. Items of deleted products are
    /// skipped by the inner join.
    async fn best_seller(&self) -> AppResult<Option<BestSeller>> {
        let row = transaction_items::Entity::find()
            .select_only()
            .column_as(products::Column::Id, "id")
            .column_as(products::Column::NamaProduk, "nama_produk")
            .column_as(products::Column::Image, "image")
            .column_as(Expr::cust("SUM(transaction_items.qty)::BIGINT"), "total_qty")
            .column_as(
                Expr::cust("SUM(transaction_items.subtotal)::BIGINT"),
                "total_revenue",
            )
            .join(JoinType::InnerJoin, transaction_items::Relation::Products.def())
            .group_by(products::Column::Id)
            .order_by_desc(Expr::cust("SUM(transaction_items.qty)"))
            .limit(1)
            .into_model::<BestSellerRow>()
            .one(self.pool.as_ref())
            .await?;

        Ok(row.map(|r| BestSeller {
            id: r.id,
            nama_produk: r.nama_produk,
            image: r.image,
            total_qty: r.total_qty,
            total_revenue: r.total_revenue,
        }))
    }
}
