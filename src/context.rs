use log::debug;
use serde::Serialize;

use crate::{
    nets::{infer_nets, Net},
    schematic::{Component, Schematic},
};

/// Components whose reference starts with this are power flags and are left
/// out of the component list. They still take part in net inference.
pub const POWER_REF_PREFIX: &str = "#PWR";

/// Document metadata, supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub title: String,
    pub author: String,
    pub revision: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    pub name: String,
    pub components: Vec<String>,
}

/// Sheet hierarchy. Always empty for now.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Hierarchy {
    pub modules: Vec<Module>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub component_count: usize,
    pub net_count: usize,
}

/// The circuit context handed to serializers
#[derive(Debug, Clone, Serialize)]
pub struct Context {
    pub metadata: Metadata,
    pub components: Vec<Component>,
    pub nets: Vec<Net>,
    pub hierarchy: Hierarchy,
    pub summary: Summary,
}

impl Context {
    pub fn build(schematic: Schematic, metadata: Metadata) -> Self {
        let nets = infer_nets(&schematic);
        let components: Vec<Component> = schematic
            .components
            .into_iter()
            .filter(|comp| !comp.id.starts_with(POWER_REF_PREFIX))
            .collect();
        let summary = Summary {
            component_count: components.len(),
            net_count: nets.len(),
        };
        debug!(
            "Built context for {:?}: {} components, {} nets",
            metadata.title, summary.component_count, summary.net_count
        );
        Context {
            metadata,
            components,
            nets,
            hierarchy: Hierarchy::default(),
            summary,
        }
    }
}
