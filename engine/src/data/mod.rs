// Data acquisition: CSV loading and the in-memory market data store.
pub mod csv_parser;
pub mod market_data;
