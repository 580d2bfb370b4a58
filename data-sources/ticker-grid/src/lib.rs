pub mod grid;
pub mod poll;
pub mod source;

pub use grid::{changed_symbols, shape_for_grid, DataRow, DisplayRow, HeaderRow, DEFAULT_COLUMNS};
pub use poll::{PollConfig, PollController, PollHandle, PollState};
pub use source::TickerSource;
