use std::cell::Cell;
use std::rc::Rc;

/// Shared NMI/IRQ latch pair.
///
/// The VIA never holds a reference to the CPU and the CPU never looks up
/// the VIA: both sides are handed a clone of the same `InterruptLatches`,
/// so the interrupt coupling has no cyclic ownership. The VIA calls
/// [`request_irq`](Self::request_irq)/[`clear_irq`](Self::clear_irq) on
/// rising/falling transitions of `IFR.IRQ`; the CPU samples and clears the
/// latches itself at the start of every `step()`.
#[derive(Clone, Default)]
pub struct InterruptLatches(Rc<Latches>);

#[derive(Default)]
struct Latches {
    nmi: Cell<bool>,
    irq: Cell<bool>,
}

impl InterruptLatches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the level-sensitive IRQ line (VIA: rising edge of `IFR.IRQ`).
    pub fn request_irq(&self) {
        self.0.irq.set(true);
    }

    /// Drop the IRQ line (VIA: falling edge of `IFR.IRQ`).
    pub fn clear_irq(&self) {
        self.0.irq.set(false);
    }

    /// Latch an edge-triggered NMI request.
    pub fn request_nmi(&self) {
        self.0.nmi.set(true);
    }

    pub(crate) fn irq_pending(&self) -> bool {
        self.0.irq.get()
    }

    pub(crate) fn nmi_pending(&self) -> bool {
        self.0.nmi.get()
    }

    pub(crate) fn take_nmi(&self) {
        self.0.nmi.set(false);
    }

    pub(crate) fn take_irq(&self) {
        self.0.irq.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_clone_observes_same_state() {
        let a = InterruptLatches::new();
        let b = a.clone();
        a.request_irq();
        assert!(b.irq_pending());
        b.clear_irq();
        assert!(!a.irq_pending());
    }

    #[test]
    fn nmi_and_irq_latches_are_independent() {
        let latches = InterruptLatches::new();
        latches.request_nmi();
        assert!(latches.nmi_pending());
        assert!(!latches.irq_pending());
    }
}
