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

//! optional visual dumps of the crop pipeline stages, for inspecting why a given
//! boundary produced a given crop. Purely observational - nothing here feeds back
//! into the pipeline

#![allow(unused)]

use std::path::{Path,PathBuf};
use geo::Polygon;
use image::{GrayImage,Luma,Rgb,RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use ndarray::Array2;
use mcrop_common::fs::ensure_writable_dir;
use crate::errors::Result;
use crate::mask::Mask;
use crate::ometiff::OmeImage;

const OUTLINE: Rgb<u8> = Rgb([255,0,0]);

/// writes numbered stage rasters into a `crop-debug/` directory under `out_dir`
pub struct DebugDump {
    dir: PathBuf
}

impl DebugDump {
    pub fn create (out_dir: &Path)->Result<Self> {
        let dir = out_dir.join("crop-debug");
        ensure_writable_dir( &dir)?;
        Ok( DebugDump{dir} )
    }

    pub fn dump_boundary (&self, image: &OmeImage, polygons: &[Polygon<f64>])->Result<()> {
        let mut fig = render_intensity( &image.channel_sum());
        outline_polygons( &mut fig, polygons);
        fig.save( self.dir.join("1-original.png"))?;
        Ok(())
    }

    pub fn dump_closed_boundary (&self, image: &OmeImage, polygons: &[Polygon<f64>])->Result<()> {
        let mut fig = render_intensity( &image.channel_sum());
        outline_polygons( &mut fig, polygons);
        fig.save( self.dir.join("2-closed-boundary.png"))?;
        Ok(())
    }

    pub fn dump_mask (&self, mask: &Mask)->Result<()> {
        let fig = mask.to_luma8();
        fig.save( self.dir.join("3-mask.png"))?;
        Ok(())
    }

    pub fn dump_cropped_image (&self, image: &OmeImage)->Result<()> {
        let fig = render_intensity( &image.channel_sum());
        fig.save( self.dir.join("4-image-cropped.png"))?;
        Ok(())
    }

    pub fn dump_cropped_mask (&self, mask: &Mask)->Result<()> {
        let fig = mask.to_luma8();
        fig.save( self.dir.join("5-mask-cropped.png"))?;
        Ok(())
    }

    pub fn dump_masked_image (&self, image: &OmeImage)->Result<()> {
        let fig = render_intensity( &image.channel_sum());
        fig.save( self.dir.join("6-masked.png"))?;
        Ok(())
    }
}

/// log-scaled channel sum normalized to the 8 bit range, rendered as RGB so
/// that boundary outlines can be drawn on top
fn render_intensity (sum: &Array2<f64>)->RgbImage {
    let (h,w) = sum.dim();
    let scaled = sum.mapv( |v| v.ln_1p());
    let max = scaled.iter().cloned().fold( 0.0f64, f64::max);

    let mut img = RgbImage::new( w as u32, h as u32);
    if max > 0.0 {
        for ((y,x),v) in scaled.indexed_iter() {
            let g = (v / max * 255.0) as u8;
            img.put_pixel( x as u32, y as u32, Rgb([g,g,g]));
        }
    }
    img
}

fn outline_polygons (img: &mut RgbImage, polygons: &[Polygon<f64>]) {
    for poly in polygons {
        for line in poly.exterior().lines() {
            draw_line_segment_mut( img,
                (line.start.x as f32, line.start.y as f32),
                (line.end.x as f32, line.end.y as f32),
                OUTLINE);
        }
    }
}
