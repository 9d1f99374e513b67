mod fill;
mod order;
mod trade;

pub use fill::RawFill;
pub use order::{OrderDetail, OrderInfo, OrderParty, OrderSignature, PortalOrder, TokenRef, TxInfo};
pub use trade::Trade;
