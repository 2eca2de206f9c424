// ── Device controls ──
//
// Mounted panels that pair a status query with local edits and
// fire-and-forget mutations. Dropping a control unmounts it.

mod buffer;
mod inverter;
mod led;

pub use buffer::EditBuffer;
pub use inverter::InverterControl;
pub use led::{LedController, LedSettings, SleepTimer};
