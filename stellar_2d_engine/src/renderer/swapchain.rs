//! Swapchain recreation hooks

use crate::error::Result;

/// Object owning per-swapchain-image state that must be rebuilt on recreation
///
/// The render pass implements this to rebuild its framebuffers and frame data.
pub trait SwapchainDependent<S: ?Sized> {
    /// Called after `swapchain` was recreated, before it is used for rendering
    fn on_swapchain_recreated(&mut self, swapchain: &S) -> Result<()>;

    /// Called when recreation failed after the old per-image state was destroyed
    ///
    /// Anything built on the old images must be released; rendering stays off
    /// until a later recreation succeeds.
    fn on_swapchain_lost(&mut self) {}
}

/// Notify every dependent in order, stopping at the first failure
pub fn notify_dependents<S: ?Sized>(
    swapchain: &S,
    dependents: &mut [&mut dyn SwapchainDependent<S>],
) -> Result<()> {
    for dependent in dependents.iter_mut() {
        dependent.on_swapchain_recreated(swapchain)?;
    }
    Ok(())
}

/// Tell every dependent the swapchain images are gone
pub fn notify_lost<S: ?Sized>(dependents: &mut [&mut dyn SwapchainDependent<S>]) {
    for dependent in dependents.iter_mut() {
        dependent.on_swapchain_lost();
    }
}

/// Run `rebuild` on the swapchain, then notify the dependents
///
/// If either step fails every dependent is told the swapchain was lost, so
/// none of them keeps state built on destroyed images.
pub fn recreate_with_dependents<S: ?Sized>(
    swapchain: &mut S,
    rebuild: impl FnOnce(&mut S) -> Result<()>,
    dependents: &mut [&mut dyn SwapchainDependent<S>],
) -> Result<()> {
    let result = rebuild(&mut *swapchain).and_then(|()| notify_dependents(&*swapchain, dependents));
    if result.is_err() {
        notify_lost(dependents);
    }
    result
}

#[cfg(test)]
#[path = "swapchain_tests.rs"]
mod tests;
