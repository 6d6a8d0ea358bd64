//! Checkout request contract and pricing.
//!
//! A raw [`CheckoutRequest`] is turned into a [`ValidatedCheckout`] at the
//! boundary, then priced into a [`PricedCheckout`]. Both steps are pure and
//! run before anything touches the database, so a rejected checkout never
//! writes a row.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Why a checkout was rejected. `index` fields are 1-based item positions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Item list must not be empty")]
    EmptyItems,

    #[error("jumlah_bayar must be a positive number")]
    NonPositivePayment,

    #[error("Item {index}: product_id is not valid")]
    InvalidProduct { index: usize },

    #[error("Item {index}: qty must be a positive number")]
    InvalidQuantity { index: usize },

    #[error("Item {index}: harga_satuan is not valid")]
    InvalidUnitPrice { index: usize },

    #[error("Transaction amount is too large")]
    AmountOverflow,

    #[error("jumlah_bayar ({paid}) is less than the total ({total})")]
    InsufficientPayment { total: i64, paid: i64 },

    #[error("Product {product_id} does not exist")]
    UnknownProduct { product_id: i64 },

    #[error("Not enough stock for product {product_id}")]
    InsufficientStock { product_id: i64 },

    #[error("Could not allocate a unique transaction code")]
    CodeExhausted,
}

impl CheckoutError {
    /// Stable machine-readable tag for API clients.
    pub fn reason(&self) -> &'static str {
        match self {
            CheckoutError::EmptyItems => "empty_items",
            CheckoutError::NonPositivePayment => "non_positive_payment",
            CheckoutError::InvalidProduct { .. } => "invalid_product",
            CheckoutError::InvalidQuantity { .. } => "invalid_quantity",
            CheckoutError::InvalidUnitPrice { .. } => "invalid_unit_price",
            CheckoutError::AmountOverflow => "amount_overflow",
            CheckoutError::InsufficientPayment { .. } => "insufficient_payment",
            CheckoutError::UnknownProduct { .. } => "unknown_product",
            CheckoutError::InsufficientStock { .. } => "insufficient_stock",
            CheckoutError::CodeExhausted => "code_exhausted",
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, CheckoutError::CodeExhausted)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutItemRequest {
    #[schema(example = 1)]
    pub product_id: i64,
    #[schema(example = 2)]
    pub qty: i64,
    #[schema(example = 50000)]
    pub harga_satuan: i64,
}

/// Body of `POST /transactions` and `PUT /transactions/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    #[serde(default)]
    #[schema(example = 150000)]
    pub jumlah_bayar: Option<i64>,
    #[serde(default)]
    pub items: Vec<CheckoutItemRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
    pub product_id: i64,
    pub qty: i32,
    pub harga_satuan: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCheckout {
    pub jumlah_bayar: i64,
    pub lines: Vec<CheckoutLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: i64,
    pub qty: i32,
    pub harga_satuan: i64,
    pub subtotal: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedCheckout {
    pub lines: Vec<PricedLine>,
    pub total_harga: i64,
    pub jumlah_bayar: i64,
    pub kembalian: i64,
}

impl PricedCheckout {
    /// Distinct product ids in first-seen order.
    pub fn product_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            if !ids.contains(&line.product_id) {
                ids.push(line.product_id);
            }
        }
        ids
    }

    /// Quantity per product, summed over repeated lines.
    pub fn quantities(&self) -> Vec<(i64, i32)> {
        let mut totals: Vec<(i64, i32)> = Vec::new();
        for line in &self.lines {
            match totals.iter_mut().find(|(id, _)| *id == line.product_id) {
                Some((_, qty)) => *qty = qty.saturating_add(line.qty),
                None => totals.push((line.product_id, line.qty)),
            }
        }
        totals
    }
}

impl CheckoutRequest {
    /// Checks run in order: items present, payment positive, then each item's
    /// product, quantity and unit price.
    pub fn validate(self) -> Result<ValidatedCheckout, CheckoutError> {
        if self.items.is_empty() {
            return Err(CheckoutError::EmptyItems);
        }

        let jumlah_bayar = match self.jumlah_bayar {
            Some(amount) if amount > 0 => amount,
            _ => return Err(CheckoutError::NonPositivePayment),
        };

        let mut lines = Vec::with_capacity(self.items.len());
        for (i, item) in self.items.into_iter().enumerate() {
            let index = i + 1;
            if item.product_id <= 0 {
                return Err(CheckoutError::InvalidProduct { index });
            }
            let qty = match i32::try_from(item.qty) {
                Ok(qty) if qty > 0 => qty,
                _ => return Err(CheckoutError::InvalidQuantity { index }),
            };
            if item.harga_satuan < 0 {
                return Err(CheckoutError::InvalidUnitPrice { index });
            }
            lines.push(CheckoutLine {
                product_id: item.product_id,
                qty,
                harga_satuan: item.harga_satuan,
            });
        }

        Ok(ValidatedCheckout {
            jumlah_bayar,
            lines,
        })
    }
}

impl ValidatedCheckout {
    pub fn price(self) -> Result<PricedCheckout, CheckoutError> {
        let mut total_harga: i64 = 0;
        let mut lines = Vec::with_capacity(self.lines.len());

        for line in self.lines {
            let subtotal = line
                .harga_satuan
                .checked_mul(i64::from(line.qty))
                .ok_or(CheckoutError::AmountOverflow)?;
            total_harga = total_harga
                .checked_add(subtotal)
                .ok_or(CheckoutError::AmountOverflow)?;
            lines.push(PricedLine {
                product_id: line.product_id,
                qty: line.qty,
                harga_satuan: line.harga_satuan,
                subtotal,
            });
        }

        let kembalian = self.jumlah_bayar - total_harga;
        if kembalian < 0 {
            return Err(CheckoutError::InsufficientPayment {
                total: total_harga,
                paid: self.jumlah_bayar,
            });
        }

        Ok(PricedCheckout {
            lines,
            total_harga,
            jumlah_bayar: self.jumlah_bayar,
            kembalian,
        })
    }
}

impl CheckoutRequest {
    pub fn validate_and_price(self) -> Result<PricedCheckout, CheckoutError> {
        self.validate()?.price()
    }
}
