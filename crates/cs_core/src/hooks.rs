//! Optional device side-effect hooks.
//!
//! Share sheet and haptics are cosmetic; nothing in the ledgers depends
//! on them. Platforms without the capability use [`NoopHooks`].

/// Result of handing text to the platform share sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    CopiedToClipboard,
    Cancelled,
}

pub trait DeviceHooks {
    /// Hand text to the share sheet, or copy it as a fallback.
    fn share_text(&self, text: &str) -> ShareOutcome {
        let _ = text;
        ShareOutcome::Cancelled
    }

    /// Short haptic pulse after a tap.
    fn vibrate(&self, _millis: u32) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl DeviceHooks for NoopHooks {}
