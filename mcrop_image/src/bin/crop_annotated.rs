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

use std::path::Path;
use anyhow::Result;
use mcrop_common::{check_cli,define_cli};
use mcrop_image::{crop_image,CropOutcome,PADDING_DEFAULT};

define_cli! { ARGS [about="crop OME-TIFF image to GeoJSON boundary annotation"] =
   invert_geojson_mask: bool [help="crop away the polygon interior instead of the exterior", long],
   debug: bool [help="dump per-stage rasters into ./crop-debug/", long],
   padding: usize [help="pixels to keep around the boundary bounding box", long, default_value_t=PADDING_DEFAULT],
   image_path: String [help="pathname of input OME-TIFF"],
   dataset_dir: String [help="dataset directory (relative to ometiff_directory) to search for annotations"],
   ometiff_directory: String [help="root directory of the dataset"]
}

fn main ()->Result<()> {
    check_cli!(ARGS);

    println!("cropping {} ..", ARGS.image_path);
    let outcome = crop_image(
        Path::new( &ARGS.image_path),
        Path::new( &ARGS.dataset_dir),
        Path::new( &ARGS.ometiff_directory),
        ARGS.padding,
        ARGS.invert_geojson_mask,
        ARGS.debug,
        Path::new(".")
    )?;

    match outcome {
        CropOutcome::Cropped(report) => {
            println!("image: {} planes of {} x {} pixels", report.n_planes, report.size_y, report.size_x);
            println!("mask covers {:.1}% of the raster", report.mask_proportion * 100.0);
            println!("crop window: rows {}..{}, cols {}..{}",
                     report.window.y.start, report.window.y.end, report.window.x.start, report.window.x.end);
            println!("wrote {}", report.out_path.display());
        }
        CropOutcome::PassedThrough(out_path) => {
            println!("no annotation found, copied to {}", out_path.display());
        }
    }

    Ok(())
}
