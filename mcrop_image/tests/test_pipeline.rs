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

// run with "cargo test test_pipeline -- --nocapture"

use std::fs;
use std::path::{Path,PathBuf};
use ndarray::Array2;
use tempfile::TempDir;
use mcrop_image::{boundary_mask,close_boundary,crop_image,crop_window,load_boundary,
                  CropOutcome,CropWindow,OmeImage,OmeMeta,PixelType,PlaneStack};

const SQUARE_GEOJSON: &str = r#"{
  "type": "Feature", "properties": {},
  "geometry": { "type": "Polygon",
    "coordinates": [[[16,16],[48,16],[48,48],[16,48],[16,16]]] }
}"#;

const TWO_REGION_GEOJSON: &str = r#"{
  "type": "MultiPolygon",
  "coordinates": [
    [[[4,4],[12,4],[12,12],[4,12],[4,4]]],
    [[[40,40],[56,40],[56,56],[40,56],[40,40]]]
  ]
}"#;

/// 64x64 uint16 image with two channels of distinct constant intensity
fn test_image ()->OmeImage {
    let meta = OmeMeta {
        name: "specimen".to_string(),
        size_t: 1, size_c: 2, size_z: 1, size_y: 64, size_x: 64,
        pixel_type: PixelType::Uint16,
        channel_names: vec!["DAPI".to_string(), "CD45".to_string()],
        physical_size_x: Some(0.65),
        physical_size_y: Some(0.65),
        physical_size_z: None
    };
    let planes = vec![
        Array2::from_elem( (64,64), 7u16),
        Array2::from_elem( (64,64), 9u16)
    ];
    OmeImage::new( meta, PlaneStack::U16(planes)).unwrap()
}

struct Fixture {
    _tmp: TempDir,
    image_path: PathBuf,
    base_dir: PathBuf,
    out_dir: PathBuf
}

fn setup (annotations: &[&str])->Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let base_dir = tmp.path().join("data");
    let dataset = base_dir.join("d1");
    fs::create_dir_all( &dataset).unwrap();

    for (i,gj) in annotations.iter().enumerate() {
        fs::write( dataset.join( format!("roi{i}.geojson")), gj).unwrap();
    }

    let image_path = tmp.path().join("specimen.ome.tiff");
    test_image().save( &image_path).unwrap();

    let out_dir = tmp.path().join("out");
    fs::create_dir( &out_dir).unwrap();

    Fixture { _tmp: tmp, image_path, base_dir, out_dir }
}

fn u16_planes (img: &OmeImage)->&Vec<Array2<u16>> {
    match &img.data {
        PlaneStack::U16(planes) => planes,
        _ => panic!("not a uint16 image")
    }
}

#[test]
fn test_ometiff_roundtrip() {
    let fix = setup( &[]);
    let img = OmeImage::open( &fix.image_path).unwrap();

    assert_eq!( img.meta.size_c, 2);
    assert_eq!( img.meta.size_y, 64);
    assert_eq!( img.meta.size_x, 64);
    assert_eq!( img.meta.pixel_type, PixelType::Uint16);
    assert_eq!( img.meta.channel_names, vec!["DAPI".to_string(), "CD45".to_string()]);
    assert_eq!( img.meta.physical_size_x, Some(0.65));

    let planes = u16_planes( &img);
    assert_eq!( planes[0][[10,10]], 7);
    assert_eq!( planes[1][[10,10]], 9);
}

#[test]
fn test_u8_roundtrip() {
    let meta = OmeMeta {
        name: "stack8".to_string(),
        size_t: 1, size_c: 1, size_z: 2, size_y: 8, size_x: 8,
        pixel_type: PixelType::Uint8,
        channel_names: vec!["Channel 0".to_string()],
        physical_size_x: None, physical_size_y: None, physical_size_z: None
    };
    let planes = vec![ Array2::from_elem( (8,8), 3u8), Array2::from_elem( (8,8), 200u8) ];
    let img = OmeImage::new( meta, PlaneStack::U8(planes)).unwrap();

    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("stack8.ome.tiff");
    img.save( &path).unwrap();

    let loaded = OmeImage::open( &path).unwrap();
    assert_eq!( loaded.meta.pixel_type, PixelType::Uint8);
    assert_eq!( loaded.meta.size_z, 2);
    match &loaded.data {
        PlaneStack::U8(planes) => {
            assert_eq!( planes[0][[4,4]], 3);
            assert_eq!( planes[1][[4,4]], 200);
        }
        _ => panic!("not a uint8 image")
    }
}

#[test]
fn test_f32_roundtrip() {
    let meta = OmeMeta {
        name: "stack32f".to_string(),
        size_t: 1, size_c: 1, size_z: 1, size_y: 8, size_x: 8,
        pixel_type: PixelType::Float32,
        channel_names: vec!["Channel 0".to_string()],
        physical_size_x: None, physical_size_y: None, physical_size_z: None
    };
    let planes = vec![ Array2::from_elem( (8,8), 0.5f32) ];
    let img = OmeImage::new( meta, PlaneStack::F32(planes)).unwrap();

    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("stack32f.ome.tiff");
    img.save( &path).unwrap();

    let loaded = OmeImage::open( &path).unwrap();
    assert_eq!( loaded.meta.pixel_type, PixelType::Float32);
    match &loaded.data {
        PlaneStack::F32(planes) => assert_eq!( planes[0][[4,4]], 0.5),
        _ => panic!("not a float32 image")
    }
}

#[test]
fn test_crop_to_boundary() {
    let fix = setup( &[SQUARE_GEOJSON]);

    let outcome = crop_image( &fix.image_path, Path::new("d1"), &fix.base_dir,
                              4, false, false, &fix.out_dir).unwrap();
    let report = match outcome {
        CropOutcome::Cropped(report) => report,
        other => panic!("expected a cropped outcome, got {other:?}")
    };
    assert_eq!( report.out_path.file_name().unwrap(), "specimen.ome.tiff");

    // stage data surfaced for progress reporting
    assert_eq!( report.size_y, 64);
    assert_eq!( report.size_x, 64);
    assert_eq!( report.n_planes, 2);
    assert_eq!( report.mask_proportion, 1024.0 / 4096.0); // the 32x32 square in the 64x64 raster
    assert_eq!( report.window, CropWindow { y: 12..52, x: 12..52 });

    let img = OmeImage::open( &report.out_path).unwrap();

    // square covers pixels 16..=47, padded by 4 and clamped: rows/cols 12..52
    assert_eq!( img.meta.size_y, 40);
    assert_eq!( img.meta.size_x, 40);
    assert_eq!( img.meta.size_c, 2); // non-spatial axes untouched
    assert_eq!( img.meta.channel_names[0], "DAPI");

    let planes = u16_planes( &img);
    assert_eq!( planes.len(), 2);
    assert_eq!( planes[0][[8,8]], 7);   // original (20,20), inside the boundary
    assert_eq!( planes[1][[8,8]], 9);
    assert_eq!( planes[0][[1,1]], 0);   // original (13,13), padding outside the mask
    assert_eq!( planes[1][[39,39]], 0); // original (51,51)

    // exhaustive: pixels are zero exactly where the cropped mask is unset
    let boundary = close_boundary( &load_boundary( fix.base_dir.join("d1/roi0.geojson")).unwrap());
    let mask = boundary_mask( &boundary, 64, 64, false);
    let bbox = mask.single_region_bbox().unwrap();
    let win = crop_window( &bbox, 4, 64, 64);
    let cropped_mask = mask.cropped( win.y.clone(), win.x.clone());

    for plane in planes {
        for y in 0..40 {
            for x in 0..40 {
                assert_eq!( plane[[y,x]] == 0, !cropped_mask.get( x, y), "mismatch at ({x},{y})");
            }
        }
    }
}

#[test]
fn test_passthrough_idempotent() {
    let fix = setup( &[SQUARE_GEOJSON]);

    let cropped_path = crop_image( &fix.image_path, Path::new("d1"), &fix.base_dir,
                                   4, false, false, &fix.out_dir).unwrap().out_path().to_path_buf();

    // re-running the cropped output against an annotation-free dataset must copy it through unchanged
    let empty_base = fix.out_dir.join("empty");
    fs::create_dir_all( empty_base.join("d1")).unwrap();
    let out2_dir = fix.out_dir.join("pass2");
    fs::create_dir( &out2_dir).unwrap();

    let out2 = crop_image( &cropped_path, Path::new("d1"), &empty_base,
                           4, false, false, &out2_dir).unwrap();
    assert_eq!( fs::read( &cropped_path).unwrap(), fs::read( out2.out_path()).unwrap());
}

#[test]
fn test_inverted_mask() {
    let fix = setup( &[SQUARE_GEOJSON]);

    let outcome = crop_image( &fix.image_path, Path::new("d1"), &fix.base_dir,
                              4, true, false, &fix.out_dir).unwrap();
    let img = OmeImage::open( outcome.out_path()).unwrap();

    // the complement of the square is one region spanning the full raster
    assert_eq!( img.meta.size_y, 64);
    assert_eq!( img.meta.size_x, 64);

    let planes = u16_planes( &img);
    assert_eq!( planes[0][[20,20]], 0); // inside the polygon, now zeroed
    assert_eq!( planes[0][[2,2]], 7);   // outside the polygon, now kept
}

#[test]
fn test_passthrough_without_annotation() {
    let fix = setup( &[]);

    let outcome = crop_image( &fix.image_path, Path::new("d1"), &fix.base_dir,
                              4, false, false, &fix.out_dir).unwrap();
    assert!( matches!( outcome, CropOutcome::PassedThrough(_)));

    assert_eq!( fs::read( &fix.image_path).unwrap(), fs::read( outcome.out_path()).unwrap());
}

#[test]
fn test_ambiguous_annotations_fail() {
    let fix = setup( &[SQUARE_GEOJSON, SQUARE_GEOJSON]);

    let res = crop_image( &fix.image_path, Path::new("d1"), &fix.base_dir,
                          4, false, false, &fix.out_dir);
    assert!( res.is_err());
    assert!( !fix.out_dir.join("specimen.ome.tiff").exists());
}

#[test]
fn test_disjoint_boundary_fails() {
    let fix = setup( &[TWO_REGION_GEOJSON]);

    let res = crop_image( &fix.image_path, Path::new("d1"), &fix.base_dir,
                          4, false, false, &fix.out_dir);
    assert!( res.is_err());
    assert!( !fix.out_dir.join("specimen.ome.tiff").exists());
}

#[test]
fn test_debug_dump() {
    let fix = setup( &[SQUARE_GEOJSON]);

    crop_image( &fix.image_path, Path::new("d1"), &fix.base_dir,
                4, false, true, &fix.out_dir).unwrap();

    let debug_dir = fix.out_dir.join("crop-debug");
    for name in ["1-original.png", "2-closed-boundary.png", "3-mask.png",
                 "4-image-cropped.png", "5-mask-cropped.png", "6-masked.png"] {
        assert!( debug_dir.join(name).exists(), "missing {name}");
    }
}
