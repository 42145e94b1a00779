pub mod callback_service;
pub mod checkout_service;
pub mod result_poller;

pub use callback_service::{CallbackAck, CallbackService};
pub use checkout_service::{CheckoutOutcome, CheckoutService};
pub use result_poller::{PaymentTracked, PollOutcome, ResultPoller};
