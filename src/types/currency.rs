//! Payment systems known to the gateway.
//!
//! The numeric id is what the API expects in the `i` parameter of the payment
//! form, order creation and withdrawal requests.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FreekassaError;

macro_rules! payment_systems {
    ($($(#[$doc:meta])* $variant:ident = $id:literal,)+) => {
        /// A payment system (currency method) accepted by the gateway.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum PaymentSystem {
            $($(#[$doc])* $variant,)+
        }

        impl PaymentSystem {
            /// Every known payment system, in id order.
            pub const ALL: &'static [PaymentSystem] = &[$(PaymentSystem::$variant,)+];

            /// Gateway id of this payment system.
            pub fn id(&self) -> u32 {
                match self {
                    $(PaymentSystem::$variant => $id,)+
                }
            }

            /// Look up a payment system by gateway id.
            pub fn from_id(id: u32) -> Option<Self> {
                match id {
                    $($id => Some(PaymentSystem::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

payment_systems! {
    /// FKWallet, RUB.
    FkWalletRub = 1,
    /// FKWallet, USD.
    FkWalletUsd = 2,
    /// FKWallet, EUR.
    FkWalletEur = 3,
    /// Visa, RUB.
    VisaRub = 4,
    /// YooMoney.
    YooMoney = 6,
    /// Visa, UAH.
    VisaUah = 7,
    /// MasterCard, RUB.
    MastercardRub = 8,
    /// MasterCard, UAH.
    MastercardUah = 9,
    /// QIWI.
    Qiwi = 10,
    /// Visa, EUR.
    VisaEur = 11,
    /// MIR cards.
    Mir = 12,
    /// Online banking.
    OnlineBank = 13,
    /// USDT on Ethereum.
    UsdtErc20 = 14,
    /// USDT on Tron.
    UsdtTrc20 = 15,
    /// Bitcoin Cash.
    BitcoinCash = 16,
    /// BNB.
    Bnb = 17,
    /// Dash.
    Dash = 18,
    /// Dogecoin.
    Dogecoin = 19,
    /// Zcash.
    Zcash = 20,
    /// Monero.
    Monero = 21,
    /// Waves.
    Waves = 22,
    /// Ripple.
    Ripple = 23,
    /// Bitcoin.
    Bitcoin = 24,
    /// Litecoin.
    Litecoin = 25,
    /// Ethereum.
    Ethereum = 26,
    /// SteamPay.
    SteamPay = 27,
    /// Megafon mobile payments.
    Megafon = 28,
    /// Visa, USD.
    VisaUsd = 32,
    /// Perfect Money, USD.
    PerfectMoneyUsd = 33,
    /// Shiba Inu.
    ShibaInu = 34,
    /// QIWI through the API.
    QiwiApi = 35,
    /// RUB cards through the API.
    CardRubApi = 36,
    /// Google Pay.
    GooglePay = 37,
    /// Apple Pay.
    ApplePay = 38,
    /// Tron.
    Tron = 39,
    /// WebMoney WMZ.
    WebmoneyWmz = 40,
    /// Visa / MasterCard, KZT.
    VisaMastercardKzt = 41,
    /// Faster Payments System (SBP).
    Sbp = 42,
}

impl From<PaymentSystem> for u32 {
    fn from(system: PaymentSystem) -> Self {
        system.id()
    }
}

impl TryFrom<u32> for PaymentSystem {
    type Error = FreekassaError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        Self::from_id(id)
            .ok_or_else(|| FreekassaError::InvalidRequest(format!("unknown payment system id: {id}")))
    }
}

impl std::fmt::Display for PaymentSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl Serialize for PaymentSystem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.id())
    }
}

impl<'de> Deserialize<'de> for PaymentSystem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = crate::types::serde_helpers::lenient_u64::deserialize(deserializer)?;
        u32::try_from(id)
            .ok()
            .and_then(Self::from_id)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown payment system id: {id}")))
    }
}
