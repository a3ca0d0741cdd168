//! Domain entities - the state a gateway client carries between connections

mod gateway_info;
mod session;
mod user;

pub use gateway_info::{GatewayInfo, SessionStartLimit};
pub use session::{Session, Token};
pub use user::GatewayUser;
