// Market data module entrypoint
pub mod adapters;     // transport boundary + Bittrex endpoint functions
pub mod envelope;     // {success, message, result} wrapper
pub mod normaliser;   // raw records -> uniform tables
pub mod order_book;   // buy/sell legs -> one tagged table
pub mod router;       // envelope dispatch per endpoint shape
pub mod table;        // uniform table + cell types
pub mod timestamp;    // exchange timestamp strings -> UTC instants
