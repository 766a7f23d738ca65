//! Effective search radius for a viewer.
//!
//! Precedence, first match wins:
//! 1. an explicit radius argument, when custom radius selection is enabled and
//!    the viewer may use it (validated against the configured limits)
//! 2. the viewer's cached permission override
//! 3. the viewer's primary group in the group mapping
//! 4. the configured default

use std::sync::Arc;

use tracing::debug;

use crate::error::{NearError, NearResult, PolicyRejection};
use crate::host::Permissions;
use crate::permissions::CUSTOM_RADIUS;
use crate::radius_cache::RadiusCache;
use crate::settings::NearSettings;
use crate::types::PlayerId;

pub struct RadiusPolicy {
    cache: Arc<RadiusCache>,
    permissions: Arc<dyn Permissions>,
}

impl RadiusPolicy {
    pub fn new(cache: Arc<RadiusCache>, permissions: Arc<dyn Permissions>) -> Self {
        Self { cache, permissions }
    }

    /// Resolves the radius for `viewer`. `argument` is the raw radius the
    /// viewer typed, if any.
    pub fn resolve(
        &self,
        viewer: PlayerId,
        settings: &NearSettings,
        argument: Option<&str>,
    ) -> NearResult<f64> {
        let custom = &settings.custom_radius;
        let admitted = self.permissions.has_permission(viewer, CUSTOM_RADIUS)
            || self.permissions.is_operator(viewer);
        let Some(raw) = argument.filter(|_| custom.enabled && admitted) else {
            return Ok(self.default_radius(viewer, settings));
        };

        let requested: f64 = raw
            .trim()
            .parse()
            .ok()
            .filter(|r: &f64| r.is_finite())
            .ok_or_else(|| NearError::InvalidInput(raw.to_string()))?;

        if requested < custom.min_radius {
            return Err(PolicyRejection::BelowMinimum {
                min: custom.min_radius,
            }
            .into());
        }

        // Admitted viewers are all capped by the absolute limit.
        let max = custom.max_radius;
        if requested > max {
            return Err(PolicyRejection::AboveMaximum { max }.into());
        }

        debug!("Viewer {} requested custom radius {}", viewer, requested);
        Ok(requested)
    }

    /// Radius without any argument: override → group → default.
    pub fn default_radius(&self, viewer: PlayerId, settings: &NearSettings) -> f64 {
        if let Some(radius) = self.cache.get(viewer) {
            return radius;
        }

        if settings.radius_groups.enabled {
            let group_radius = self
                .permissions
                .primary_group(viewer)
                .and_then(|group| settings.radius_groups.groups.get(&group).cloned())
                .and_then(|value| value.as_radius());
            if let Some(radius) = group_radius {
                return radius;
            }
        }

        settings.default_radius
    }
}
