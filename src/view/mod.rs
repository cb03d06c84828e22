//! Account balance view: the balance state machine, the task that keeps
//! it in step with the wallet session and ledger connection, and the
//! terminal card that displays it.

pub mod render;
pub mod state;
pub mod sync;

pub use render::{render_card, Theme, ThemeMode};
pub use state::BalanceState;
pub use sync::{AccountBalanceView, SupersedePolicy, ViewOptions};
