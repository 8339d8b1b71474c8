//! Panel registration and navigation.

use super::derive::SlugPolicy;
use super::{ResourceDescriptor, ResourceKind};

/// Count shown next to a navigation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeSource {
    /// Orders in the `processing` status.
    ProcessingOrders,
}

/// Navigation placement of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationItem {
    pub label: &'static str,
    /// Heroicon name.
    pub icon: &'static str,
    pub group: Option<&'static str>,
    /// Position within the group; unsorted items come last.
    pub sort: Option<i32>,
    pub badge: Option<BadgeSource>,
}

/// Badge color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeColor {
    Primary,
    Warning,
}

impl BadgeColor {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Warning => "warning",
        }
    }
}

/// Rendered badge value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub count: i64,
    pub color: BadgeColor,
}

impl Badge {
    /// Badge for the processing-orders count.
    #[must_use]
    pub const fn processing_orders(count: i64) -> Self {
        let color = if count > 10 {
            BadgeColor::Warning
        } else {
            BadgeColor::Primary
        };
        Self { count, color }
    }
}

/// Dashboard widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    StatsOverview,
    ProductsChart,
}

/// A widget placed on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetPlacement {
    pub kind: WidgetKind,
    pub sort: i32,
}

/// Navigation entry resolved for rendering.
#[derive(Debug, Clone)]
pub struct NavEntry<'a> {
    pub slug: &'static str,
    pub item: &'a NavigationItem,
}

/// Navigation group resolved for rendering.
#[derive(Debug, Clone)]
pub struct NavGroup<'a> {
    pub label: Option<&'static str>,
    pub entries: Vec<NavEntry<'a>>,
}

/// The registered resources and widgets.
#[derive(Debug, Clone)]
pub struct Panel {
    pub slug_policy: SlugPolicy,
    resources: Vec<ResourceDescriptor>,
    widgets: Vec<WidgetPlacement>,
}

impl Panel {
    #[must_use]
    pub const fn new(slug_policy: SlugPolicy) -> Self {
        Self {
            slug_policy,
            resources: Vec::new(),
            widgets: Vec::new(),
        }
    }

    /// Register a resource. A later registration of the same kind replaces
    /// the earlier one.
    #[must_use]
    pub fn register(mut self, resource: ResourceDescriptor) -> Self {
        self.resources.retain(|r| r.kind != resource.kind);
        self.resources.push(resource);
        self
    }

    #[must_use]
    pub fn widget(mut self, kind: WidgetKind, sort: i32) -> Self {
        self.widgets.push(WidgetPlacement { kind, sort });
        self
    }

    pub fn resources(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.resources.iter()
    }

    /// Look up a resource by URL slug.
    #[must_use]
    pub fn resource(&self, slug: &str) -> Option<&ResourceDescriptor> {
        self.resources.iter().find(|r| r.kind.slug() == slug)
    }

    #[must_use]
    pub fn get(&self, kind: ResourceKind) -> Option<&ResourceDescriptor> {
        self.resources.iter().find(|r| r.kind == kind)
    }

    /// Widgets in dashboard order.
    #[must_use]
    pub fn widgets(&self) -> Vec<WidgetPlacement> {
        let mut widgets = self.widgets.clone();
        widgets.sort_by_key(|w| w.sort);
        widgets
    }

    /// Navigation grouped in order of first appearance, each group sorted
    /// by `sort` (unsorted last) and then label.
    #[must_use]
    pub fn navigation(&self) -> Vec<NavGroup<'_>> {
        let mut groups: Vec<NavGroup<'_>> = Vec::new();
        for resource in &self.resources {
            let item = &resource.navigation;
            let entry = NavEntry {
                slug: resource.kind.slug(),
                item,
            };
            match groups.iter_mut().find(|g| g.label == item.group) {
                Some(group) => group.entries.push(entry),
                None => groups.push(NavGroup {
                    label: item.group,
                    entries: vec![entry],
                }),
            }
        }
        for group in &mut groups {
            group.entries.sort_by(|a, b| {
                let key = |e: &NavEntry<'_>| (e.item.sort.is_none(), e.item.sort, e.item.label);
                key(a).cmp(&key(b))
            });
        }
        groups
    }
}
