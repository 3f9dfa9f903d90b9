//! Fixed price list: coin packs and the yearly plan. Prices are in rubles.

use rust_decimal::Decimal;

/// Coins consumed by one utility payment. The smallest pack covers exactly
/// one payment; status checks compare balances against this.
pub const MIN_PAYMENT_BALANCE: i64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinPackage {
    pub id: &'static str,
    pub coins: i64,
    pub price: i64,
}

pub const PACKAGES: [CoinPackage; 3] = [
    CoinPackage {
        id: "basic",
        coins: 200,
        price: 400,
    },
    CoinPackage {
        id: "economy",
        coins: 600,
        price: 1150,
    },
    CoinPackage {
        id: "profitable",
        coins: 1200,
        price: 2200,
    },
];

pub fn find_package(id: &str) -> Option<&'static CoinPackage> {
    PACKAGES.iter().find(|p| p.id == id)
}

/// Yearly plan price, 3000.00 rubles.
pub fn yearly_price() -> Decimal {
    Decimal::new(300000, 2)
}
