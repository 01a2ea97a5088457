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

// run with "cargo test test_mask -- --nocapture"

use geo::{LineString,Polygon};
use mcrop_common::BoundingBox;
use mcrop_image::mask::Mask;
use mcrop_image::boundary_mask;

fn rect_polygon (x0: f64, y0: f64, x1: f64, y1: f64)->Polygon<f64> {
    Polygon::new( LineString::from( vec![ (x0,y0), (x1,y0), (x1,y1), (x0,y1), (x0,y0) ]), Vec::new())
}

#[test]
fn test_rasterize_rect() {
    // 8x8 rect with corners on pixel boundaries inside a 16x16 raster
    let poly = rect_polygon( 4.0, 4.0, 12.0, 12.0);
    let mask = Mask::from_polygons( &[poly], 16, 16);

    assert_eq!( mask.count(), 64);
    assert!( mask.get( 4, 4));
    assert!( mask.get( 11, 11));
    assert!( !mask.get( 3, 4));
    assert!( !mask.get( 12, 4));
    assert!( !mask.get( 4, 3));
    assert!( !mask.get( 4, 12));
}

#[test]
fn test_complement_is_exact() {
    let poly = rect_polygon( 2.0, 3.0, 9.0, 7.0);
    let mask = Mask::from_polygons( &[poly], 16, 16);
    let comp = mask.complement();

    assert_eq!( mask.count() + comp.count(), 16*16);
    for y in 0..16 {
        for x in 0..16 {
            assert_eq!( mask.get( x, y), !comp.get( x, y));
        }
    }
}

#[test]
fn test_single_region() {
    let poly = rect_polygon( 4.0, 4.0, 12.0, 12.0);
    let mask = Mask::from_polygons( &[poly], 16, 16);

    let regions = mask.regions();
    assert_eq!( regions.len(), 1);
    assert_eq!( regions[0], BoundingBox::new( 4, 11, 11, 4));

    let bbox = mask.single_region_bbox().unwrap();
    assert_eq!( bbox, regions[0]);
}

#[test]
fn test_disjoint_regions_rejected() {
    // two rects separated by an empty column - no 4-connected path between them
    let a = rect_polygon( 1.0, 1.0, 4.0, 4.0);
    let b = rect_polygon( 8.0, 8.0, 12.0, 12.0);
    let mask = Mask::from_polygons( &[a,b], 16, 16);

    assert_eq!( mask.regions().len(), 2);
    assert!( mask.single_region_bbox().is_err());
}

#[test]
fn test_empty_mask_rejected() {
    let mask = Mask::new( 16, 16);
    assert!( mask.regions().is_empty());
    assert!( mask.single_region_bbox().is_err());
}

#[test]
fn test_diagonal_touch_is_disjoint() {
    // corner-touching pixels share no edge and must not merge
    let mut mask = Mask::new( 4, 4);
    mask.set( 0, 0);
    mask.set( 1, 1);
    assert_eq!( mask.regions().len(), 2);
}

#[test]
fn test_cropped_mask() {
    let poly = rect_polygon( 4.0, 4.0, 12.0, 12.0);
    let mask = Mask::from_polygons( &[poly], 16, 16);

    let sub = mask.cropped( 4..12, 4..12);
    assert_eq!( sub.dimensions(), (8,8));
    assert_eq!( sub.count(), 64);

    let sub = mask.cropped( 0..8, 0..8);
    assert_eq!( sub.count(), 16); // the (4..8)x(4..8) quadrant
    assert!( !sub.get( 3, 3));
    assert!( sub.get( 4, 4));
}

#[test]
fn test_boundary_mask_polarity() {
    let poly = rect_polygon( 4.0, 4.0, 12.0, 12.0);

    let keep = boundary_mask( &[poly.clone()], 16, 16, false);
    assert!( keep.get( 8, 8));
    assert!( !keep.get( 0, 0));

    let excl = boundary_mask( &[poly], 16, 16, true);
    assert!( !excl.get( 8, 8));
    assert!( excl.get( 0, 0));
    assert_eq!( keep.count() + excl.count(), 16*16);
}

#[test]
fn test_save_open_roundtrip() {
    let poly = rect_polygon( 2.0, 2.0, 6.0, 6.0);
    let mask = Mask::from_polygons( &[poly], 8, 8);

    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("mask.json");
    mask.save( &path).unwrap();

    let loaded = Mask::open( &path).unwrap();
    assert_eq!( loaded.dimensions(), mask.dimensions());
    assert_eq!( loaded.count(), mask.count());
    for y in 0..8 {
        for x in 0..8 {
            assert_eq!( loaded.get( x, y), mask.get( x, y));
        }
    }
}
