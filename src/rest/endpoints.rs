//! FreeKassa endpoint constants.

/// Base URL for the FreeKassa API.
pub const FREEKASSA_API_URL: &str = "https://api.freekassa.ru/v1/";

/// Base URL of the hosted payment form.
pub const FREEKASSA_FORM_URL: &str = "https://pay.freekassa.ru/";

/// Signed API endpoint paths, relative to [`FREEKASSA_API_URL`](super::FREEKASSA_API_URL).
pub mod paths {
    // Orders
    /// List orders.
    pub const ORDERS: &str = "orders";
    /// Create an order.
    pub const ORDERS_CREATE: &str = "orders/create";

    // Withdrawals
    /// List withdrawals.
    pub const WITHDRAWALS: &str = "withdrawals";
    /// Create a withdrawal.
    pub const WITHDRAWALS_CREATE: &str = "withdrawals/create";
    /// Payment systems available for withdrawals.
    pub const WITHDRAWALS_CURRENCIES: &str = "withdrawals/currencies";

    // Shop
    /// Shop balance.
    pub const BALANCE: &str = "balance";
    /// Payment systems available for payments.
    pub const CURRENCIES: &str = "currencies";
    /// Merchant shops.
    pub const SHOPS: &str = "shops";

    /// Availability of a single payment system.
    pub fn currency_status(payment_system: u32) -> String {
        format!("currencies/{payment_system}/status")
    }
}
