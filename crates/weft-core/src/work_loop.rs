//! The synchronous render work loop.
//!
//! Depth-first over the work-in-progress tree: begin descends into the
//! first child a fiber produces, complete runs when a fiber has no next
//! child and climbs until it finds a sibling. Rendering is run-to-completion
//! per pass; there is no yielding.

use crate::begin::begin_work;
use crate::complete::complete_work;
use crate::fiber::{FiberArena, FiberId};
use crate::host::{HostAdapter, HostError};
use crate::root::RootHandle;

/// Mutable context for one render pass, threaded through begin and
/// complete.
pub(crate) struct RenderPass<'a> {
    pub arena: &'a mut FiberArena,
    pub host: &'a mut dyn HostAdapter,
    pub handle: RootHandle,
}

pub(crate) fn render_root_sync(pass: &mut RenderPass<'_>, wip_root: FiberId) -> Result<(), HostError> {
    let mut next = Some(wip_root);
    while let Some(unit) = next {
        next = perform_unit_of_work(pass, unit)?;
    }
    Ok(())
}

fn perform_unit_of_work(pass: &mut RenderPass<'_>, unit: FiberId) -> Result<Option<FiberId>, HostError> {
    let current = pass.arena[unit].alternate;
    let next = begin_work(pass, current, unit);

    // Begin has consumed the pending input; memoize it for the next diff.
    let fiber = &mut pass.arena[unit];
    fiber.memoized_props = fiber.pending_props.clone();
    fiber.memoized_text = fiber.text.clone();

    match next {
        Some(child) => Ok(Some(child)),
        None => complete_unit_of_work(pass, unit),
    }
}

fn complete_unit_of_work(
    pass: &mut RenderPass<'_>,
    unit: FiberId,
) -> Result<Option<FiberId>, HostError> {
    let mut completed = unit;
    loop {
        let current = pass.arena[completed].alternate;
        complete_work(pass, current, completed)?;
        if let Some(sibling) = pass.arena[completed].sibling {
            return Ok(Some(sibling));
        }
        match pass.arena[completed].return_ {
            Some(parent) => completed = parent,
            None => return Ok(None),
        }
    }
}
