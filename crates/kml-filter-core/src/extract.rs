//! Placemark traversal and record projection

use crate::document::{Container, Feature, KmlDocument, Placemark};
use crate::record::{Field, Record};
use std::collections::HashMap;

/// Depth-first, pre-order iterator over every placemark below a container
#[derive(Debug)]
pub struct Placemarks<'a> {
    stack: Vec<std::slice::Iter<'a, Feature>>,
}

impl<'a> Placemarks<'a> {
    /// Walk `container` and all nested containers
    #[must_use]
    pub fn new(container: &'a Container) -> Self {
        Self {
            stack: vec![container.features.iter()],
        }
    }
}

impl<'a> Iterator for Placemarks<'a> {
    type Item = &'a Placemark;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let level = self.stack.last_mut()?;
            match level.next() {
                Some(Feature::Placemark(placemark)) => return Some(placemark),
                Some(Feature::Document(inner) | Feature::Folder(inner)) => {
                    self.stack.push(inner.features.iter());
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Project every placemark of a document into a [`Record`]
///
/// A document whose root feature is not a container yields no records.
#[must_use]
pub fn extract(doc: &KmlDocument) -> Vec<Record> {
    let Some(root) = doc.root_container() else {
        log::debug!("Root feature is not a container, no placemarks extracted");
        return Vec::new();
    };

    let records: Vec<Record> = Placemarks::new(root).map(project).collect();
    log::debug!("Extracted {} placemark records", records.len());
    records
}

/// Project a single placemark
///
/// Duplicate `Data` names resolve to the last entry.
#[must_use]
pub fn project(placemark: &Placemark) -> Record {
    let mut record = Record::default();
    let Some(extended) = &placemark.extended_data else {
        return record;
    };

    let values: HashMap<&str, Option<&str>> = extended
        .data
        .iter()
        .map(|d| (d.name.as_str(), d.value.as_deref()))
        .collect();

    for field in Field::ALL {
        if let Some(value) = values.get(field.key()).copied().flatten() {
            record.set(field, Some(value.to_string()));
        }
    }
    record
}
