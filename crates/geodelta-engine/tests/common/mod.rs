//! Shared fixtures for geodelta-engine integration tests

use geodelta_core::atlas::{MemoryAtlas, MemoryAtlasBuilder};
use geodelta_core::model::{Location, PolyLine, Tags};
use std::path::{Path, PathBuf};

#[allow(dead_code)]
pub fn tags(pairs: &[(&str, &str)]) -> Tags {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Nodes 1 (lon 0) and 2 (lon 10) joined by edge 100 through `middle`
#[allow(dead_code)]
pub fn way_snapshot(name: &str, middle: i64, highway: &str) -> MemoryAtlas {
    let mut builder = MemoryAtlasBuilder::new(name);
    builder
        .add_node(1, Location::new(0, 0), Tags::new())
        .unwrap();
    builder
        .add_node(2, Location::new(0, 10), Tags::new())
        .unwrap();
    builder
        .add_edge(
            100,
            PolyLine::new(vec![
                Location::new(0, 0),
                Location::new(0, middle),
                Location::new(0, 10),
            ]),
            tags(&[("highway", highway)]),
        )
        .unwrap();
    builder.build().unwrap()
}

/// Write `atlas` as a snapshot document and return its path
#[allow(dead_code)]
pub fn write_snapshot(dir: &Path, file: &str, atlas: &MemoryAtlas) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(file);
    std::fs::write(&path, atlas.to_document().to_json_pretty().unwrap()).unwrap();
    path
}

#[allow(dead_code)]
pub fn write_text(dir: &Path, file: &str, text: &str) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(file);
    std::fs::write(&path, text).unwrap();
    path
}
