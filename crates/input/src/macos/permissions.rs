#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    pub fn AXIsProcessTrusted() -> bool;
}

pub const ACCESSIBILITY_GUIDANCE: &str =
    "Auto-paste disabled: enable Accessibility for this app in 'System Settings > Privacy & Security > Accessibility'.";

pub fn check_accessibility_trusted() -> bool {
    unsafe { AXIsProcessTrusted() }
}
