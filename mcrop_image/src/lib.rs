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

//! crop multi-dimensional microscopy images (OME-TIFF) to GeoJSON boundary annotations.
//!
//! The crop pipeline rasterizes the annotation polygons into a pixel [`Mask`] in the
//! image coordinate frame, requires the mask to form a single connected region, crops
//! the spatial (Y,X) axes of all image planes to the padded region bounding box and
//! zeroes every pixel outside the mask. Non-spatial axes (T,C,Z) are never touched

pub mod errors;
pub mod mask;
pub mod annotation;
pub mod ometiff;
pub mod debug;

use std::ops::Range;
use std::path::{Path,PathBuf};
use mcrop_common::BoundingBox;
use mcrop_common::fs::filename_of_path;
use geo::Polygon;

pub use errors::{Result,McropImageError};
pub use mask::Mask;
pub use annotation::{find_annotation,load_boundary,close_boundary};
pub use ometiff::{OmeImage,OmeMeta,PixelType,PlaneStack};
use debug::DebugDump;

/// default number of pixels to keep around the mask bounding box on each side
pub const PADDING_DEFAULT: usize = 128;

/// half-open (Y,X) pixel ranges to slice the spatial image axes with
#[derive(Debug,Clone,PartialEq,Eq)]
pub struct CropWindow {
    pub y: Range<usize>,
    pub x: Range<usize>
}

/// per-stage data of a completed crop, so that callers can report progress
#[derive(Debug)]
pub struct CropReport {
    pub size_y: usize,
    pub size_x: usize,
    pub n_planes: usize,
    pub mask_proportion: f64,
    pub window: CropWindow,
    pub out_path: PathBuf
}

#[derive(Debug)]
pub enum CropOutcome {
    Cropped(CropReport),
    PassedThrough(PathBuf)
}

impl CropOutcome {
    pub fn out_path (&self)->&Path {
        match self {
            CropOutcome::Cropped(report) => &report.out_path,
            CropOutcome::PassedThrough(path) => path
        }
    }
}

/// expand the (inclusive) region bbox by `padding` pixels on each side, clamped to
/// the image extents, and turn it into half-open slice ranges
pub fn crop_window (bbox: &BoundingBox<usize>, padding: usize, size_y: usize, size_x: usize)->CropWindow {
    let y0 = bbox.north.saturating_sub( padding);
    let y1 = (bbox.south + 1 + padding).min( size_y);
    let x0 = bbox.west.saturating_sub( padding);
    let x1 = (bbox.east + 1 + padding).min( size_x);

    CropWindow { y: y0..y1, x: x0..x1 }
}

/// rasterize closed boundary polygons into a full-raster pixel mask. With
/// `exclude_mask_content` the mask polarity is flipped so that the polygon
/// *interior* gets cropped away and zeroed
pub fn boundary_mask (polys: &[Polygon<f64>], width: usize, height: usize, exclude_mask_content: bool)->Mask {
    let mask = Mask::from_polygons( polys, width, height);
    if exclude_mask_content { mask.complement() } else { mask }
}

/// crop a single OME-TIFF to a single GeoJSON annotation file. The output keeps the
/// input file name and is written into `out_dir`
pub fn crop_annotated (image_path: &Path, annotation_path: &Path, padding: usize,
                       exclude_mask_content: bool, debug: bool, out_dir: &Path)->Result<CropReport> {
    let image = OmeImage::open( image_path)?;
    let dump = if debug { Some( DebugDump::create( out_dir)?) } else { None };

    let boundary = load_boundary( annotation_path)?;
    if let Some(dump) = &dump { dump.dump_boundary( &image, &boundary)?; }

    let boundary = close_boundary( &boundary);
    if let Some(dump) = &dump { dump.dump_closed_boundary( &image, &boundary)?; }

    let mask = boundary_mask( &boundary, image.size_x(), image.size_y(), exclude_mask_content);
    if let Some(dump) = &dump { dump.dump_mask( &mask)?; }

    let bbox = mask.single_region_bbox()?;
    let win = crop_window( &bbox, padding, image.size_y(), image.size_x());

    let mut cropped = image.cropped( &win)?;
    if let Some(dump) = &dump { dump.dump_cropped_image( &cropped)?; }

    let cropped_mask = mask.cropped( win.y.clone(), win.x.clone());
    if let Some(dump) = &dump { dump.dump_cropped_mask( &cropped_mask)?; }

    cropped.zero_outside( &cropped_mask)?;
    if let Some(dump) = &dump { dump.dump_masked_image( &cropped)?; }

    let out_path = out_dir.join( filename_of_path( image_path)?);
    cropped.save( &out_path)?;

    Ok( CropReport {
        size_y: image.size_y(),
        size_x: image.size_x(),
        n_planes: image.meta.n_planes(),
        mask_proportion: mask.proportion(),
        window: win,
        out_path
    })
}

/// batch entry point: locate the (at most one) GeoJSON annotation file under
/// `<base_dir>/<dataset_dir>` and crop `image_path` to it. Without an annotation
/// the image is copied through unmodified
pub fn crop_image (image_path: &Path, dataset_dir: &Path, base_dir: &Path, padding: usize,
                   exclude_mask_content: bool, debug: bool, out_dir: &Path)->Result<CropOutcome> {
    let annotation_dir = base_dir.join( dataset_dir);

    match find_annotation( &annotation_dir)? {
        Some(annotation_path) => {
            let report = crop_annotated( image_path, &annotation_path, padding, exclude_mask_content, debug, out_dir)?;
            Ok( CropOutcome::Cropped(report) )
        }
        None => { // nothing to crop to - pass the input through unmodified
            let out_path = out_dir.join( filename_of_path( image_path)?);
            std::fs::copy( image_path, &out_path)?;
            Ok( CropOutcome::PassedThrough(out_path) )
        }
    }
}
