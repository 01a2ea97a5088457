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

use std::fs::{self,DirEntry,File};
use std::io::{self,Read,Write,Error as IOError,ErrorKind};
use std::path::{Path,PathBuf};
use regex::Regex;

use crate::macros::io_error;

type Result<T> = std::result::Result<T,std::io::Error>;

pub fn filename<'a,T: AsRef<Path>> (path: &'a T)->Option<&'a str> {
    path.as_ref().file_name().and_then(|ostr| ostr.to_str())
}

pub fn extension<'a,T: AsRef<Path>> (path: &'a T)->Option<&'a str> {
    path.as_ref().extension().and_then(|ostr| ostr.to_str())
}

pub fn filestem <'a,T: AsRef<Path>> (path: &'a T)->Option<&'a str> {
    path.as_ref().file_stem().and_then(|ostr| ostr.to_str())
}

pub fn filename_of_path (path: impl AsRef<Path>)->Result<String> {
    let path = path.as_ref();

    Ok( path.file_name()
        .ok_or(IOError::new(ErrorKind::InvalidInput, format!(" not a valid filename {path:?}")) )?
        .to_str().ok_or(IOError::new(ErrorKind::InvalidInput, format!("invalid char in filename {path:?}")) )?
        .to_string())
}

pub fn ensure_dir (path: impl AsRef<Path>)->io::Result<()> {
    let path = path.as_ref();
    if !path.is_dir() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// check if dir pathname exists and is writable, try to create dir otherwise
pub fn ensure_writable_dir (path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    if path.is_dir() {
        let md = fs::metadata(&path)?;
        if md.permissions().readonly() {
            Err(io_error!(ErrorKind::PermissionDenied, "output_dir {:?} not writable", &path))
        } else {
            Ok(())
        }

    } else {
        fs::create_dir_all(path)
    }
}

pub fn file_contents_as_string (file: &mut fs::File) -> Result<String> {
    let len = file.metadata()?.len();
    let mut contents = String::with_capacity(len as usize);
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

pub fn filepath_contents_as_string <P: AsRef<Path>> (path: &P) -> Result<String> {
    let mut file = File::open(path)?;
    file_contents_as_string( &mut file)
}

pub fn filepath_contents <P: AsRef<Path>> (path: &P) -> Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    let mut contents: Vec<u8> = Vec::with_capacity(len as usize);
    file.read_to_end(&mut contents)?;
    Ok(contents)
}

pub fn visit_dirs (dir: &Path, recursive: bool, cb: &mut dyn FnMut(&DirEntry)) -> io::Result<()> {
    if dir.is_dir() {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() && recursive {
                visit_dirs(&path, recursive, cb)?;
            } else {
                cb(&entry);
            }
        }
    }
    Ok(())
}

/// collect regular files under `dir` whose filenames match `fname_regex`, optionally descending
/// into sub-directories. Non-existing `dir` yields an empty list, not an error
pub fn matching_files_in_dir<P: AsRef<Path>> (dir: &P, fname_regex: &Regex, recursive: bool) -> Result<Vec<PathBuf>> {
    let dir: &Path = dir.as_ref();
    let mut list: Vec<PathBuf> = Vec::new();

    visit_dirs( dir, recursive, &mut |entry| {
        if entry.path().is_file() {
            if let Some(fname) = entry.file_name().to_str() {
                if fname_regex.is_match( fname) {
                    list.push(entry.path())
                }
            }
        }
    })?;

    Ok(list)
}
