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

use serde::{Serialize,Deserialize};
use num::{Num,ToPrimitive};

pub mod macros;
pub mod fs;

/// a generic bounding box without semantics for the coordinate type.
/// For pixel rasters we use the raster axis order, i.e. `north` is the minimum row
/// and `south` the maximum row (bounds are inclusive on all four sides)
#[repr(C)]
#[derive(Debug,Copy,Clone,Serialize,Deserialize,PartialEq)]
pub struct BoundingBox <T: Num> {
    pub west: T,
    pub south: T,
    pub east: T,
    pub north: T
}

impl <T: Num + Copy + ToPrimitive> BoundingBox<T> {
    pub fn new (west: T, south: T, east: T, north: T)->Self {
        BoundingBox{ west, south, east, north}
    }

    pub fn to_minmax_array (&self) -> [T;4] {
        [self.west,self.south,self.east,self.north]
    }

    pub fn center (&self) -> (f64,f64) {
        ( (self.west + self.east).to_f64().unwrap() / 2.0, (self.south + self.north).to_f64().unwrap() / 2.0 )
    }
}

impl BoundingBox<usize> {
    /// number of columns covered by this (inclusive) pixel box
    pub fn width (&self)->usize { self.east - self.west + 1 }

    /// number of rows covered by this (inclusive) pixel box
    pub fn height (&self)->usize { self.south - self.north + 1 }
}
