mod client;
mod errors;
mod parse;
pub mod types;
mod user_agent;
pub use self::client::Client;
pub use self::errors::Error;
pub use self::parse::parse_dividend_table;
