// Price data ingestion: CSV loading, validation and date lookups
pub mod loader;
pub mod series;
pub mod validator;

pub use loader::{load_prices_csv, read_prices_csv};
pub use series::PriceSeries;
pub use validator::PriceValidator;
