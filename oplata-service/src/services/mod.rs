pub mod checksum;
pub mod error;
pub mod gateway;
pub mod oplata;
pub mod store;

pub use checksum::{generate_checksum, InvoiceFields, InvoiceKind};
pub use error::{GatewayError, OplataError};
pub use gateway::{CallbackOutcome, PaymentGateway, Receipt, ReceiptOutcome};
pub use oplata::OplataClient;
pub use store::{InMemoryOrderStore, OrderProvider, PaymentResultSink, TransactionStore};
