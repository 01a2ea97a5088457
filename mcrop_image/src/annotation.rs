/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

#![allow(unused)]

use std::path::{Path,PathBuf};
use geo::{Geometry,GeometryCollection,Polygon};
use geojson::{GeoJson,quick_collection};
use lazy_static::lazy_static;
use regex::Regex;
use mcrop_common::fs::{matching_files_in_dir,filepath_contents_as_string};
use crate::errors::{Result,McropImageError};

lazy_static! {
    static ref ANNOTATION_RE: Regex = Regex::new( r".*\.geojson$").unwrap();
}

/// recursively look for the boundary annotation of a dataset directory.
/// No annotation file is a valid configuration (no cropping requested), more
/// than one is not - we have no way to tell which boundary was meant
pub fn find_annotation (dir: impl AsRef<Path>)->Result<Option<PathBuf>> {
    let mut files = matching_files_in_dir( &dir.as_ref(), &ANNOTATION_RE, true)?;

    if files.len() > 1 {
        Err( McropImageError::AmbiguousAnnotations( format!("found {} GeoJSON files in {:?}", files.len(), dir.as_ref())))
    } else {
        Ok( files.pop() )
    }
}

/// parse a GeoJSON annotation into a uniform polygon collection. A lone geometry,
/// a Feature or a FeatureCollection all canonicalize to the collection form.
/// Coordinates are interpreted as raw pixel coordinates
pub fn load_boundary (path: impl AsRef<Path>)->Result<Vec<Polygon<f64>>> {
    let contents = filepath_contents_as_string( &path.as_ref())?;
    let geojson: GeoJson = contents.parse()?;
    let collection: GeometryCollection<f64> = quick_collection( &geojson)?;

    let mut polys: Vec<Polygon<f64>> = Vec::new();
    collect_polygons( &Geometry::GeometryCollection(collection), &mut polys)?;

    if polys.is_empty() {
        Err( McropImageError::IllegalArgument( format!("no polygon boundary in {:?}", path.as_ref())))
    } else {
        Ok(polys)
    }
}

fn collect_polygons (geom: &Geometry<f64>, polys: &mut Vec<Polygon<f64>>)->Result<()> {
    match geom {
        Geometry::Polygon(poly) => polys.push( poly.clone()),
        Geometry::MultiPolygon(mp) => polys.extend( mp.0.iter().cloned()),
        Geometry::GeometryCollection(gc) => {
            for g in gc {
                collect_polygons( g, polys)?;
            }
        }
        other => {
            return Err( McropImageError::IllegalArgument( format!("boundary annotation is not areal: {:?}", other)))
        }
    }
    Ok(())
}

/// rebuild every polygon from its outer boundary only. Interior holes are
/// intentionally dropped - the mask has to select/exclude the full outer area
pub fn close_boundary (polys: &[Polygon<f64>])->Vec<Polygon<f64>> {
    polys.iter()
        .map( |poly| Polygon::new( poly.exterior().clone(), Vec::new()))
        .collect()
}
