pub mod interrupt;
pub mod mb8861;
pub mod state;

pub use interrupt::InterruptLatches;
pub use mb8861::Mb8861;
pub use state::{CpuStateTrait, Mb8861State};
