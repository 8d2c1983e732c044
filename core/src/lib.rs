//! Cycle-level emulation core for the JR-100 8-bit microcomputer: the
//! MB8861 CPU, its 16-bit memory bus, the VIA6522 peripheral, the font
//! cache the renderer reads from, and the machine assembly that wires them
//! together and drives them one frame at a time.

pub mod bus;
pub mod cpu;
pub mod error;
pub mod event_queue;
pub mod font_cache;
pub mod keyboard;
pub mod machine;
pub mod via;

pub mod prelude {
    pub use crate::bus::{Addressable, AddressableHandle, MemoryBus};
    pub use crate::cpu::Mb8861;
    pub use crate::error::{ConfigurationError, FormatError, IllegalOpcode};
    pub use crate::event_queue::{Event, EventQueue};
    pub use crate::font_cache::FontCache;
    pub use crate::keyboard::KeyboardMatrix;
    pub use crate::machine::{Jr100, RamSize};
}
