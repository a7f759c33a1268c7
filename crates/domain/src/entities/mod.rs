pub mod address;
pub mod pool;
pub mod position;
pub mod token;

// Re-export for easier access
pub use address::Address;
pub use pool::{PoolState, TickInfo};
pub use position::PositionRaw;
pub use token::{Token, normalize_symbol};
