//! Score validator: aggregate weight against the per-grid budget.

use crate::WidgetId;
use crate::config::GridConfig;
use crate::size::WidgetSize;
use crate::widget::Widget;

/// Sum of weights of all widgets not in `exclude`.
#[must_use]
pub fn total_weight<P>(widgets: &[Widget<P>], config: &GridConfig, exclude: &[WidgetId]) -> u32 {
    widgets
        .iter()
        .filter(|w| !exclude.contains(&w.id))
        .map(|w| w.weight(config))
        .fold(0u32, u32::saturating_add)
}

/// Whether the widget set fits the configured budget.
#[must_use]
pub fn validate<P>(widgets: &[Widget<P>], config: &GridConfig) -> bool {
    total_weight(widgets, config, &[]) <= config.score_budget
}

/// Whether adding one widget of `size` keeps the non-excluded set within budget.
#[must_use]
pub fn admits<P>(
    widgets: &[Widget<P>],
    config: &GridConfig,
    size: WidgetSize,
    exclude: &[WidgetId],
) -> bool {
    total_weight(widgets, config, exclude).saturating_add(config.sizes.weight(size))
        <= config.score_budget
}

/// Budget left after the current widgets.
#[must_use]
pub fn remaining<P>(widgets: &[Widget<P>], config: &GridConfig) -> u32 {
    config
        .score_budget
        .saturating_sub(total_weight(widgets, config, &[]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widgets(sizes: &[WidgetSize]) -> Vec<Widget<()>> {
        sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| Widget::new(WidgetId::new(i as u64 + 1).unwrap(), size, ()))
            .collect()
    }

    #[test]
    fn total_is_plain_sum() {
        let config = GridConfig::single_plane();
        let list = widgets(&[WidgetSize::Big, WidgetSize::Small, WidgetSize::VerySmall]);
        assert_eq!(total_weight(&list, &config, &[]), 110);
        assert_eq!(remaining(&list, &config), 90);
        assert!(validate(&list, &config));
    }

    #[test]
    fn exclusion_removes_weight() {
        let config = GridConfig::single_plane();
        let list = widgets(&[WidgetSize::Big, WidgetSize::Medium]);
        let exclude = [WidgetId::new(1).unwrap()];
        assert_eq!(total_weight(&list, &config, &exclude), 40);
    }

    #[test]
    fn multi_plane_budget_is_tight() {
        let config = GridConfig::multi_plane();
        let list = widgets(&[WidgetSize::Medium, WidgetSize::Small]);
        assert!(admits(&list, &config, WidgetSize::Small, &[]));
        assert!(!admits(&list, &config, WidgetSize::Medium, &[]));
        let over = widgets(&[WidgetSize::Big, WidgetSize::VerySmall]);
        assert!(!validate(&over, &config));
    }
}
