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

use std::{collections::VecDeque, fs::File, io::Write, path::{Path,PathBuf}};
use bit_set::BitSet;
use geo::{Polygon,Coord};
use image::{GrayImage,Luma};
use serde::{Serialize,Deserialize};
use serde_json;
use mcrop_common::{BoundingBox, fs::filepath_contents_as_string};
use crate::errors::{Result,McropImageError};

/// 2D boolean pixel raster. A set bit means the pixel is selected for retention
#[derive(Serialize,Deserialize)]
pub struct Mask {
    width: usize,
    height: usize,
    data: BitSet
}

impl Mask {
    pub fn new (width: usize, height: usize)->Self {
        let data = BitSet::with_capacity(width*height);
        Mask{width,height,data}
    }

    /// rasterize polygon exteriors into a mask of the given shape, set inside.
    /// Geometry coordinates are pixel coordinates (identity transform). A pixel is
    /// inside if its center (x+0.5, y+0.5) is inside the polygon (even-odd rule);
    /// overlapping polygons are unioned
    pub fn from_polygons (polys: &[Polygon<f64>], width: usize, height: usize)->Self {
        let mut mask = Mask::new( width, height);

        for poly in polys {
            let mut crossings: Vec<f64> = Vec::new();

            for y in 0..height {
                let yc = y as f64 + 0.5;
                crossings.clear();

                for line in poly.exterior().lines() {
                    let (p,q) = (line.start, line.end);
                    if (p.y <= yc && q.y > yc) || (q.y <= yc && p.y > yc) {
                        let t = (yc - p.y) / (q.y - p.y);
                        crossings.push( p.x + t * (q.x - p.x));
                    }
                }
                crossings.sort_by( |a,b| a.total_cmp(b));

                for span in crossings.chunks(2) {
                    if span.len() == 2 {
                        // first/last pixel whose center falls into the span
                        let x0 = (span[0] - 0.5).ceil().max(0.0) as usize;
                        let x1 = ((span[1] - 0.5).ceil().max(0.0) as usize).min( width);
                        for x in x0..x1 {
                            mask.set( x, y);
                        }
                    }
                }
            }
        }

        mask
    }

    pub fn open<P> (path: P)->Result<Self> where P: AsRef<Path> {
        let file_contents = filepath_contents_as_string(&path)?;
        Ok( serde_json::from_str( &file_contents.as_str())? )
    }

    pub fn save<P> (&self, path: P)->Result<()> where P: AsRef<Path> {
        let mut file = File::create(path)?;
        let json = serde_json::to_string( self)?;
        Ok( file.write_all( json.as_bytes())? )
    }

    pub fn dimensions (&self)->(usize,usize) {
        (self.width,self.height)
    }

    pub fn get (&self, x: usize, y: usize)->bool {
        self.data.contains( y*self.width + x)
    }

    pub fn set (&mut self, x: usize, y: usize) {
        self.data.insert( y*self.width + x);
    }

    pub fn unset (&mut self, x: usize, y: usize)->bool {
        self.data.remove( y*self.width + x)
    }

    pub fn clear (&mut self) {
        self.data.clear();
    }

    /// number of selected pixels
    pub fn count (&self)->usize {
        self.data.len()
    }

    /// fraction of the raster that is selected
    pub fn proportion (&self)->f64 {
        self.count() as f64 / (self.width * self.height) as f64
    }

    /// flip selection of every pixel in the raster
    pub fn complement (&self)->Self {
        let mut mask = Mask::new( self.width, self.height);
        for i in 0..self.width * self.height {
            if !self.data.contains(i) {
                mask.data.insert(i);
            }
        }
        mask
    }

    /// slice the mask to an inclusive-exclusive (y,x) window
    pub fn cropped (&self, y_range: std::ops::Range<usize>, x_range: std::ops::Range<usize>)->Self {
        let mut mask = Mask::new( x_range.len(), y_range.len());
        for (j,y) in y_range.clone().enumerate() {
            for (i,x) in x_range.clone().enumerate() {
                if self.get( x, y) {
                    mask.set( i, j);
                }
            }
        }
        mask
    }

    /// tight pixel bounding boxes of all 4-connected regions of set pixels
    pub fn regions (&self)->Vec<BoundingBox<usize>> {
        let mut boxes: Vec<BoundingBox<usize>> = Vec::new();
        let mut visited = BitSet::with_capacity( self.width * self.height);
        let mut queue: VecDeque<usize> = VecDeque::new();

        for i0 in 0..self.width * self.height {
            if self.data.contains(i0) && !visited.contains(i0) {
                let mut bbox = BoundingBox::new( self.width-1, 0, 0, self.height-1); // west,south,east,north

                visited.insert(i0);
                queue.push_back(i0);

                while let Some(i) = queue.pop_front() {
                    let x = i % self.width;
                    let y = i / self.width;

                    if x < bbox.west  { bbox.west = x }
                    if x > bbox.east  { bbox.east = x }
                    if y < bbox.north { bbox.north = y }
                    if y > bbox.south { bbox.south = y }

                    let mut try_neighbor = |xn: usize, yn: usize, visited: &mut BitSet, queue: &mut VecDeque<usize>| {
                        let j = yn * self.width + xn;
                        if self.data.contains(j) && !visited.contains(j) {
                            visited.insert(j);
                            queue.push_back(j);
                        }
                    };

                    if x > 0             { try_neighbor( x-1, y, &mut visited, &mut queue) }
                    if x < self.width-1  { try_neighbor( x+1, y, &mut visited, &mut queue) }
                    if y > 0             { try_neighbor( x, y-1, &mut visited, &mut queue) }
                    if y < self.height-1 { try_neighbor( x, y+1, &mut visited, &mut queue) }
                }

                boxes.push( bbox);
            }
        }

        boxes
    }

    /// the bounding box of the one connected region this mask is required to have.
    /// Zero or multiple disjoint regions violate the pipeline precondition and fail
    pub fn single_region_bbox (&self)->Result<BoundingBox<usize>> {
        let regions = self.regions();
        if regions.len() != 1 {
            return Err( McropImageError::InvalidRegion( format!("expected exactly one mask region, found {}", regions.len())))
        }
        Ok( regions[0] )
    }

    pub fn to_luma8 (&self)->GrayImage {
        let mut img = GrayImage::new( self.width as u32, self.height as u32);
        for y in 0..self.height {
            for x in 0..self.width {
                if self.get( x, y) {
                    img.put_pixel(x as u32, y as u32, Luma([255u8]));
                }
            }
        }
        img
    }

    pub fn save_as_luma8_image<P> (&self, path: P)->Result<()> where P: AsRef<Path> {
        Ok( self.to_luma8().save( path)? )
    }
}
