use crate::types::{ColumnTable, L3Error, L3Result};
use std::collections::HashMap;

/// A named leaf of the container tree holding one column table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub id: String,
    pub columns: ColumnTable,
}

impl Dataset {
    pub fn new(id: &str) -> Self {
        Dataset {
            id: id.to_string(),
            columns: ColumnTable::new(),
        }
    }
}

/// A named group owning zero or more datasets and free-form attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub id: String,
    pub attributes: HashMap<String, String>,
    datasets: Vec<Dataset>,
}

impl Group {
    pub fn new(id: &str) -> Self {
        Group {
            id: id.to_string(),
            attributes: HashMap::new(),
            datasets: Vec::new(),
        }
    }

    pub fn has_dataset(&self, name: &str) -> bool {
        self.datasets.iter().any(|ds| ds.id == name)
    }

    pub fn get_dataset(&self, name: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|ds| ds.id == name)
    }

    pub fn get_dataset_mut(&mut self, name: &str) -> Option<&mut Dataset> {
        self.datasets.iter_mut().find(|ds| ds.id == name)
    }

    /// Lookup that promotes absence to a diagnostic error naming the group
    pub fn require_dataset(&self, name: &str) -> L3Result<&Dataset> {
        self.get_dataset(name)
            .ok_or_else(|| L3Error::MissingDataset(format!("{}/{}", self.id, name)))
    }

    /// Add a new empty dataset owned by this group and return it
    pub fn add_dataset(&mut self, name: &str) -> &mut Dataset {
        self.datasets.push(Dataset::new(name));
        self.datasets.last_mut().expect("dataset just pushed")
    }

    pub fn datasets(&self) -> impl Iterator<Item = &Dataset> {
        self.datasets.iter()
    }
}

/// Root of the container tree: an ordered set of groups plus attributes
/// (processing level, units, geographic and temporal extent)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Root {
    pub attributes: HashMap<String, String>,
    groups: Vec<Group>,
}

impl Root {
    pub fn new() -> Self {
        Root::default()
    }

    pub fn get_group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|gp| gp.id == name)
    }

    pub fn get_group_mut(&mut self, name: &str) -> Option<&mut Group> {
        self.groups.iter_mut().find(|gp| gp.id == name)
    }

    pub fn require_group(&self, name: &str) -> L3Result<&Group> {
        self.get_group(name)
            .ok_or_else(|| L3Error::MissingGroup(name.to_string()))
    }

    pub fn add_group(&mut self, name: &str) -> &mut Group {
        self.groups.push(Group::new(name));
        self.groups.last_mut().expect("group just pushed")
    }

    /// Attach an already-built group to the tree
    pub fn push_group(&mut self, group: Group) {
        self.groups.push(group);
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    pub fn groups_mut(&mut self) -> impl Iterator<Item = &mut Group> {
        self.groups.iter_mut()
    }

    pub fn copy_attributes(&mut self, other: &Root) {
        for (k, v) in &other.attributes {
            self.attributes.insert(k.clone(), v.clone());
        }
    }
}
