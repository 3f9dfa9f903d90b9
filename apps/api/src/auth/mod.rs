// Phone-number authentication: one-time SMS codes, verification, onboarding.
// The code store and SMS delivery are trait seams injected through AppState.

pub mod codes;
pub mod handlers;
pub mod sms;
