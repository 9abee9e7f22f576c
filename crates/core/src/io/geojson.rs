//! GeoJSON export for traced paths and drainage networks
//!
//! A `Path` becomes a single LineString feature; a `StreamNetwork`
//! becomes a FeatureCollection of two-point LineStrings, one per edge,
//! carrying the endpoint values as `from_value` / `to_value` properties.

use crate::error::{Error, Result};
use crate::vector::{Path, StreamNetwork};
use serde_json::{json, Value};
use std::fs::File;
use std::io::{BufWriter, Write};

/// Build the GeoJSON document for a path
pub fn path_to_geojson(path: &Path) -> Value {
    let coords: Vec<Value> = path.iter().map(|p| json!([p.x, p.y])).collect();

    json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "geometry": {
                "type": "LineString",
                "coordinates": coords,
            },
            "properties": {
                "points": path.len(),
            },
        }],
    })
}

/// Build the GeoJSON document for a drainage network
pub fn network_to_geojson(network: &StreamNetwork) -> Value {
    let nodes = network.nodes();
    let features: Vec<Value> = network
        .edges()
        .iter()
        .map(|edge| {
            let from = nodes[edge.from];
            let to = nodes[edge.to];
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[from.x, from.y], [to.x, to.y]],
                },
                "properties": {
                    "from_value": from.value,
                    "to_value": to.value,
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

/// Write a path as a GeoJSON file
pub fn write_path_geojson<P: AsRef<std::path::Path>>(path: &Path, file: P) -> Result<()> {
    write_value(&path_to_geojson(path), file)
}

/// Write a drainage network as a GeoJSON file
pub fn write_network_geojson<P: AsRef<std::path::Path>>(
    network: &StreamNetwork,
    file: P,
) -> Result<()> {
    write_value(&network_to_geojson(network), file)
}

fn write_value<P: AsRef<std::path::Path>>(value: &Value, file: P) -> Result<()> {
    let out = File::create(file.as_ref())?;
    let mut w = BufWriter::new(out);
    serde_json::to_writer_pretty(&mut w, value)
        .map_err(|e| Error::Other(format!("GeoJSON serialization failed: {e}")))?;
    w.flush()?;
    Ok(())
}
