// Subscriptions and the coin wallet: trial/yearly grants, coin pack purchases.
// Payment confirmation goes through the PaymentGateway seam on AppState; no
// database write happens before the gateway confirms.

pub mod catalog;
pub mod handlers;
pub mod payments;
