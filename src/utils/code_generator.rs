use chrono::NaiveDate;
use rand::Rng;

/// Builds a human-readable transaction code, e.g. `TRX-20251116-0247`.
pub fn format_transaction_code(date: NaiveDate, suffix: u16) -> String {
    format!("TRX-{}-{:04}", date.format("%Y%m%d"), suffix % 10_000)
}

pub fn generate_transaction_code(date: NaiveDate) -> String {
    let mut rng = rand::thread_rng();
    format_transaction_code(date, rng.gen_range(0..10_000))
}
