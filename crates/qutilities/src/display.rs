//! Debug rendering of built circuits.

use qutil_ir::{Circuit, draw};
use tracing::info;

/// Log a text drawing of `circuit` when `enabled`.
pub(crate) fn debug_render(circuit: &Circuit, enabled: bool) {
    if enabled {
        info!(
            "{} (depth {}, {} ops)\n{}",
            circuit.name(),
            circuit.depth(),
            circuit.size(),
            draw::text(circuit)
        );
    }
}

/// Barrier across every qubit of `circuit` when `enabled`.
pub(crate) fn barrier(circuit: &mut Circuit, enabled: bool) -> qutil_ir::IrResult<()> {
    if enabled {
        circuit.barrier_all()?;
    }
    Ok(())
}
