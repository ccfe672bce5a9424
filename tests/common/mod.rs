//! Shared test utilities and fixtures
//!
//! Builds simulated hosts from JSON inventories and engines over them.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tabsort_engine::{HostCall, Inventory, ReconciliationEngine, SimulatedHost};
use tabsort_types::{Configuration, Rule, TabId, WindowId};

pub const W1: WindowId = WindowId::new(1);
pub const W2: WindowId = WindowId::new(2);

/// Host whose live state is the given inventory JSON.
pub fn host(inventory: serde_json::Value) -> Arc<SimulatedHost> {
    let inventory: Inventory = serde_json::from_value(inventory).expect("inventory fixture parses");
    Arc::new(SimulatedHost::from_inventory(&inventory).expect("inventory fixture is consistent"))
}

/// One window of ungrouped tabs with ids 10, 11, ... in the given order.
pub fn single_window(urls: &[&str]) -> Arc<SimulatedHost> {
    let tabs: Vec<serde_json::Value> = urls
        .iter()
        .enumerate()
        .map(|(i, url)| serde_json::json!({ "id": 10 + i, "url": url }))
        .collect();
    host(serde_json::json!({ "windows": [ { "id": 1, "tabs": tabs } ] }))
}

pub fn tab(n: i64) -> TabId {
    TabId::new(n)
}

pub fn engine(
    host: &Arc<SimulatedHost>,
    configuration: Configuration,
) -> ReconciliationEngine<SimulatedHost> {
    ReconciliationEngine::new(Arc::clone(host), configuration)
}

pub fn rules(rules: Vec<Rule>) -> Configuration {
    Configuration {
        rules,
        ..Configuration::default()
    }
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_string()).collect()
}

/// Title of the group owning `tab` in `window`, if any.
pub fn owner(engine: &ReconciliationEngine<SimulatedHost>, window: WindowId, tab: TabId) -> Option<String> {
    engine
        .store()
        .owner_of(window, tab)
        .map(|group| group.title.clone())
}

pub fn creates(calls: &[HostCall]) -> usize {
    calls
        .iter()
        .filter(|call| matches!(call, HostCall::CreateOrExtendGroup { .. }))
        .count()
}

pub fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("config.toml");
    fs::write(&path, content).expect("write config fixture");
    path
}
