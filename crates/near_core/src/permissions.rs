//! Permission nodes checked by the proximity feature.

/// Use `/near`
pub const NEAR: &str = "nearmanager.near";
pub const BYPASS_COOLDOWN: &str = "nearmanager.near.bypass-cooldown";
/// See vanished and invisible players in scans
pub const BYPASS_VANISH: &str = "nearmanager.near.bypass-vanish";
/// Pass an explicit radius to `/near`
pub const CUSTOM_RADIUS: &str = "nearmanager.near.custom-radius";
/// `nearmanager.near-radius.<number>` overrides the viewer's radius
pub const RADIUS_PREFIX: &str = "nearmanager.near-radius.";
pub const RELOAD: &str = "nearmanager.reload";
pub const BOSSBAR: &str = "nearmanager.bossbar";
pub const BUTTON_OPEN_INVENTORY: &str = "nearmanager.near-buttons.open-inventory";
pub const BUTTON_TELEPORT: &str = "nearmanager.near-buttons.teleport";
pub const BUTTON_BOSSBAR: &str = "nearmanager.near-buttons.bossbar";

/// Radius encoded in a `nearmanager.near-radius.<number>` node.
///
/// Returns `None` for nodes outside the prefix and for suffixes that are not
/// a finite, non-negative number.
pub fn parse_radius_node(node: &str) -> Option<f64> {
    let suffix = node.strip_prefix(RADIUS_PREFIX)?;
    let radius: f64 = suffix.trim().parse().ok()?;
    (radius.is_finite() && radius >= 0.0).then_some(radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_suffixes() {
        assert_eq!(parse_radius_node("nearmanager.near-radius.50"), Some(50.0));
        assert_eq!(parse_radius_node("nearmanager.near-radius.12.5"), Some(12.5));
    }

    #[test]
    fn rejects_malformed_suffixes() {
        assert_eq!(parse_radius_node("nearmanager.near-radius.big"), None);
        assert_eq!(parse_radius_node("nearmanager.near-radius."), None);
        assert_eq!(parse_radius_node("nearmanager.near-radius.-10"), None);
        assert_eq!(parse_radius_node("nearmanager.near-radius.NaN"), None);
        assert_eq!(parse_radius_node("nearmanager.near-radius.inf"), None);
        assert_eq!(parse_radius_node("nearmanager.near"), None);
    }
}
