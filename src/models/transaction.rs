use crate::entities::{product_entity, transaction_entity, transaction_item_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub id: i64,
    #[schema(example = "TRX-20251101-0042")]
    pub kode_transaksi: String,
    pub kasir_id: Option<i64>,
    pub total_harga: i64,
    pub jumlah_bayar: i64,
    pub kembalian: i64,
    pub tanggal: DateTime<Utc>,
}

impl From<transaction_entity::Model> for TransactionResponse {
    fn from(m: transaction_entity::Model) -> Self {
        Self {
            id: m.id,
            kode_transaksi: m.kode_transaksi,
            kasir_id: m.kasir_id,
            total_harga: m.total_harga,
            jumlah_bayar: m.jumlah_bayar,
            kembalian: m.kembalian,
            tanggal: m.tanggal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionItemResponse {
    pub id: i64,
    pub product_id: Option<i64>,
    /// `None` when the product was deleted after the sale
    pub nama_produk: Option<String>,
    pub qty: i32,
    pub harga_satuan: i64,
    pub subtotal: i64,
}

impl TransactionItemResponse {
    pub fn with_product(
        item: transaction_item_entity::Model,
        product: Option<product_entity::Model>,
    ) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            nama_produk: product.map(|p| p.nama_produk),
            qty: item.qty,
            harga_satuan: item.harga_satuan,
            subtotal: item.subtotal,
        }
    }
}

/// A transaction with its payer's name and line items.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionDetailResponse {
    #[serde(flatten)]
    pub transaction: TransactionResponse,
    pub kasir_nama: Option<String>,
    pub items: Vec<TransactionItemResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_detail_flattens_transaction_fields() {
        let detail = TransactionDetailResponse {
            transaction: TransactionResponse {
                id: 9,
                kode_transaksi: "TRX-20251101-0001".into(),
                kasir_id: Some(2),
                total_harga: 125_000,
                jumlah_bayar: 150_000,
                kembalian: 25_000,
                tanggal: Utc.with_ymd_and_hms(2025, 11, 1, 8, 0, 0).unwrap(),
            },
            kasir_nama: Some("Budi".into()),
            items: vec![TransactionItemResponse {
                id: 1,
                product_id: None,
                nama_produk: None,
                qty: 2,
                harga_satuan: 50_000,
                subtotal: 100_000,
            }],
        };

        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["kode_transaksi"], "TRX-20251101-0001");
        assert_eq!(value["kembalian"], 25_000);
        assert_eq!(value["kasir_nama"], "Budi");
        assert!(value["items"][0]["nama_produk"].is_null());
    }
}
