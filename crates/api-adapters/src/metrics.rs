//! Prometheus counters for user-visible actions.

use std::fmt;

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

/// Content type of the text exposition format.
pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PostCreate,
    PostEdit,
    PostDelete,
    React,
    NoticesClear,
    Broadcast,
    UserDelete,
    CategoryCreate,
    CategoryRename,
    CategoryDelete,
    Register,
    Login,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::PostCreate => "post_create",
            Action::PostEdit => "post_edit",
            Action::PostDelete => "post_delete",
            Action::React => "react",
            Action::NoticesClear => "notices_clear",
            Action::Broadcast => "broadcast",
            Action::UserDelete => "user_delete",
            Action::CategoryCreate => "category_create",
            Action::CategoryRename => "category_rename",
            Action::CategoryDelete => "category_delete",
            Action::Register => "register",
            Action::Login => "login",
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct ActionLabels {
    action: String,
}

pub struct Metrics {
    registry: Registry,
    actions: Family<ActionLabels, Counter>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let actions = Family::<ActionLabels, Counter>::default();
        registry.register(
            "inkwell_actions",
            "Completed user and admin actions",
            actions.clone(),
        );
        Self { registry, actions }
    }

    pub fn record(&self, action: Action) {
        self.actions
            .get_or_create(&ActionLabels {
                action: action.as_str().to_string(),
            })
            .inc();
    }

    pub fn count(&self, action: Action) -> u64 {
        self.actions
            .get_or_create(&ActionLabels {
                action: action.as_str().to_string(),
            })
            .get()
    }

    /// Renders the registry in the text exposition format.
    pub fn encode(&self) -> Result<String, fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_the_export() {
        let metrics = Metrics::new();
        metrics.record(Action::React);
        metrics.record(Action::React);
        metrics.record(Action::PostCreate);

        assert_eq!(metrics.count(Action::React), 2);
        let text = metrics.encode().unwrap();
        assert!(text.contains("inkwell_actions_total{action=\"react\"} 2"));
        assert!(text.contains("inkwell_actions_total{action=\"post_create\"} 1"));
    }
}
