pub mod check_mac;
pub mod request;

pub use check_mac::{CheckMacCodec, GatewayParams, CHECK_MAC_FIELD};
pub use request::{build_payment_request, GatewayRedirect};
