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

//! minimal OME-TIFF container support: multi-page grayscale TIFFs with an OME-XML
//! document in the first page ImageDescription. This only covers what our batch
//! tools need (T/C/Z plane stacks, channel names, physical pixel sizes) and is not
//! a general OME metadata model

#![allow(unused)]

use std::{fs::File, io::{BufReader,BufWriter,Seek,Write}, path::Path};
use ndarray::{s,Array2};
use quick_xml::{events::Event,Reader};
use tiff::{
    decoder::{Decoder,DecodingResult},
    encoder::{colortype,Compression as TiffCompression,DeflateLevel,TiffEncoder,TiffValue},
    tags::Tag,
    ColorType
};
use mcrop_common::fs::filestem;
use crate::errors::{Result,McropImageError};
use crate::mask::Mask;
use crate::CropWindow;

#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub enum PixelType {
    Uint8,
    Uint16,
    Float32
}

impl PixelType {
    pub fn ome_name (&self)->&'static str {
        match self {
            PixelType::Uint8 => "uint8",
            PixelType::Uint16 => "uint16",
            PixelType::Float32 => "float"
        }
    }

    pub fn from_ome_name (name: &str)->Result<Self> {
        match name {
            "uint8" => Ok(PixelType::Uint8),
            "uint16" => Ok(PixelType::Uint16),
            "float" => Ok(PixelType::Float32),
            other => Err( McropImageError::InvalidImageFormat( format!("unsupported OME pixel type {other}")))
        }
    }
}

/// the slice of OME metadata we read, preserve and write back
#[derive(Debug,Clone)]
pub struct OmeMeta {
    pub name: String,

    pub size_t: usize,
    pub size_c: usize,
    pub size_z: usize,
    pub size_y: usize,
    pub size_x: usize,

    pub pixel_type: PixelType,
    pub channel_names: Vec<String>,

    pub physical_size_x: Option<f64>, // µm per pixel
    pub physical_size_y: Option<f64>,
    pub physical_size_z: Option<f64>
}

impl OmeMeta {
    pub fn n_planes (&self)->usize {
        self.size_t * self.size_c * self.size_z
    }

    /// plane ordering follows OME DimensionOrder XYZCT: Z varies fastest, then C, then T
    pub fn plane_index (&self, t: usize, c: usize, z: usize)->usize {
        (t * self.size_c + c) * self.size_z + z
    }
}

/// the pixel planes of an image, one 2D (Y,X) array per (t,c,z) index
pub enum PlaneStack {
    U8(Vec<Array2<u8>>),
    U16(Vec<Array2<u16>>),
    F32(Vec<Array2<f32>>)
}

impl PlaneStack {
    pub fn len (&self)->usize {
        match self {
            PlaneStack::U8(planes) => planes.len(),
            PlaneStack::U16(planes) => planes.len(),
            PlaneStack::F32(planes) => planes.len()
        }
    }

    pub fn pixel_type (&self)->PixelType {
        match self {
            PlaneStack::U8(_) => PixelType::Uint8,
            PlaneStack::U16(_) => PixelType::Uint16,
            PlaneStack::F32(_) => PixelType::Float32
        }
    }
}

pub struct OmeImage {
    pub meta: OmeMeta,
    pub data: PlaneStack
}

impl OmeImage {
    pub fn new (meta: OmeMeta, data: PlaneStack)->Result<Self> {
        if meta.n_planes() != data.len() {
            return Err( McropImageError::InvalidDimensions(
                format!("metadata says {} planes but image has {}", meta.n_planes(), data.len())))
        }
        if meta.pixel_type != data.pixel_type() {
            return Err( McropImageError::InvalidImageFormat("metadata pixel type does not match plane data".into()))
        }
        Ok( OmeImage{meta,data} )
    }

    pub fn open (path: impl AsRef<Path>)->Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut decoder = Decoder::new( BufReader::new(file))?;

        let description = decoder.get_tag_ascii_string( Tag::ImageDescription).ok();

        let mut data = read_planes( &mut decoder)?;
        let n_planes = data.len();
        let (size_y,size_x) = plane_dims( &data)?;

        let name = filestem( &path).unwrap_or("image").to_string();

        let meta = match description.as_deref().filter( |d| d.contains("<OME")) {
            Some(xml) => {
                let mut meta = parse_ome_xml( xml, name)?;
                if meta.n_planes() != n_planes {
                    return Err( McropImageError::InvalidDimensions(
                        format!("OME-XML declares {} planes but file has {}", meta.n_planes(), n_planes)))
                }
                if meta.size_y != size_y || meta.size_x != size_x {
                    return Err( McropImageError::InvalidDimensions(
                        format!("OME-XML extents ({},{}) do not match page size ({},{})", meta.size_y, meta.size_x, size_y, size_x)))
                }
                meta.pixel_type = data.pixel_type();
                meta
            }
            None => { // plain TIFF - treat pages as channels of a single T/Z
                OmeMeta {
                    name,
                    size_t: 1,
                    size_c: n_planes,
                    size_z: 1,
                    size_y, size_x,
                    pixel_type: data.pixel_type(),
                    channel_names: (0..n_planes).map( |i| format!("Channel {i}")).collect(),
                    physical_size_x: None,
                    physical_size_y: None,
                    physical_size_z: None
                }
            }
        };

        OmeImage::new( meta, data)
    }

    pub fn save (&self, path: impl AsRef<Path>)->Result<()> {
        let file = File::create( path.as_ref())?;
        let mut writer = BufWriter::new( file);
        let mut tiff = TiffEncoder::new( &mut writer)?.with_compression( TiffCompression::Deflate( DeflateLevel::Best));
        let xml = ome_xml( &self.meta);

        match &self.data {
            PlaneStack::U8(planes)  => write_planes::<_,colortype::Gray8>( &mut tiff, planes, &xml),
            PlaneStack::U16(planes) => write_planes::<_,colortype::Gray16>( &mut tiff, planes, &xml),
            PlaneStack::F32(planes) => write_planes::<_,colortype::Gray32Float>( &mut tiff, planes, &xml)
        }
    }

    pub fn size_y (&self)->usize { self.meta.size_y }
    pub fn size_x (&self)->usize { self.meta.size_x }

    /// new image sliced to the (Y,X) crop window over every plane. All non-spatial
    /// axes are untouched, metadata is carried over with updated extents
    pub fn cropped (&self, win: &CropWindow)->Result<OmeImage> {
        if win.y.end > self.meta.size_y || win.x.end > self.meta.size_x {
            return Err( McropImageError::InvalidDimensions(
                format!("crop window {:?} outside image extents ({},{})", win, self.meta.size_y, self.meta.size_x)))
        }

        let data = match &self.data {
            PlaneStack::U8(planes)  => PlaneStack::U8( crop_planes( planes, win)),
            PlaneStack::U16(planes) => PlaneStack::U16( crop_planes( planes, win)),
            PlaneStack::F32(planes) => PlaneStack::F32( crop_planes( planes, win))
        };

        let mut meta = self.meta.clone();
        meta.size_y = win.y.len();
        meta.size_x = win.x.len();

        OmeImage::new( meta, data)
    }

    /// zero every pixel whose mask value is not set, in all planes
    pub fn zero_outside (&mut self, mask: &Mask)->Result<()> {
        if mask.dimensions() != (self.meta.size_x, self.meta.size_y) {
            return Err( McropImageError::InvalidDimensions("mask does not match image extents".into()))
        }

        match &mut self.data {
            PlaneStack::U8(planes)  => zero_planes( planes, mask, 0u8),
            PlaneStack::U16(planes) => zero_planes( planes, mask, 0u16),
            PlaneStack::F32(planes) => zero_planes( planes, mask, 0.0f32)
        }
        Ok(())
    }

    /// sum of all planes as f64 - this is what the debug overlays render (after log1p)
    pub fn channel_sum (&self)->Array2<f64> {
        let mut sum = Array2::<f64>::zeros( (self.meta.size_y, self.meta.size_x));
        match &self.data {
            PlaneStack::U8(planes)  => for p in planes { sum.zip_mut_with( p, |s,&v| *s += v as f64) },
            PlaneStack::U16(planes) => for p in planes { sum.zip_mut_with( p, |s,&v| *s += v as f64) },
            PlaneStack::F32(planes) => for p in planes { sum.zip_mut_with( p, |s,&v| *s += v as f64) }
        }
        sum
    }
}

fn crop_planes<T: Clone> (planes: &[Array2<T>], win: &CropWindow)->Vec<Array2<T>> {
    planes.iter().map( |p| p.slice( s![win.y.clone(), win.x.clone()]).to_owned()).collect()
}

fn zero_planes<T: Copy> (planes: &mut [Array2<T>], mask: &Mask, zero: T) {
    let (w,h) = mask.dimensions();
    for plane in planes {
        for y in 0..h {
            for x in 0..w {
                if !mask.get( x, y) {
                    plane[[y,x]] = zero;
                }
            }
        }
    }
}

fn plane_dims (data: &PlaneStack)->Result<(usize,usize)> {
    fn dims_of<T> (planes: &[Array2<T>])->Result<(usize,usize)> {
        let first = planes.first()
            .ok_or( McropImageError::InvalidImageFormat("image has no pages".into()))?;
        let dim = first.dim();
        for p in planes {
            if p.dim() != dim {
                return Err( McropImageError::InvalidDimensions("pages have non-uniform dimensions".into()))
            }
        }
        Ok(dim)
    }

    match data {
        PlaneStack::U8(planes)  => dims_of( planes),
        PlaneStack::U16(planes) => dims_of( planes),
        PlaneStack::F32(planes) => dims_of( planes)
    }
}

fn read_planes<R: std::io::Read + Seek> (decoder: &mut Decoder<R>)->Result<PlaneStack> {
    let mut u8_planes: Vec<Array2<u8>> = Vec::new();
    let mut u16_planes: Vec<Array2<u16>> = Vec::new();
    let mut f32_planes: Vec<Array2<f32>> = Vec::new();

    loop {
        match decoder.colortype()? {
            ColorType::Gray(_) => {}
            other => return Err( McropImageError::InvalidImageFormat( format!("not a grayscale TIFF page: {other:?}")))
        }

        let (width,height) = decoder.dimensions()?;
        let shape = (height as usize, width as usize);

        match decoder.read_image()? {
            DecodingResult::U8(v) => u8_planes.push( to_plane( v, shape)?),
            DecodingResult::U16(v) => u16_planes.push( to_plane( v, shape)?),
            DecodingResult::F32(v) => f32_planes.push( to_plane( v, shape)?),
            _ => return Err( McropImageError::InvalidImageFormat("unsupported TIFF sample format".into()))
        }

        if !decoder.more_images() { break }
        decoder.next_image()?;
    }

    match (u8_planes.is_empty(), u16_planes.is_empty(), f32_planes.is_empty()) {
        (false,true,true) => Ok( PlaneStack::U8(u8_planes) ),
        (true,false,true) => Ok( PlaneStack::U16(u16_planes) ),
        (true,true,false) => Ok( PlaneStack::F32(f32_planes) ),
        (true,true,true) => Err( McropImageError::InvalidImageFormat("image has no pages".into())),
        _ => Err( McropImageError::InvalidImageFormat("pages have mixed sample formats".into()))
    }
}

fn to_plane<T> (v: Vec<T>, shape: (usize,usize))->Result<Array2<T>> {
    Array2::from_shape_vec( shape, v)
        .map_err( |e| McropImageError::InvalidDimensions( e.to_string()))
}

fn write_planes<W,C> (tiff: &mut TiffEncoder<W>, planes: &[Array2<C::Inner>], xml: &str)->Result<()>
    where W: Write + Seek, C: colortype::ColorType, [C::Inner]: TiffValue
{
    for (i,plane) in planes.iter().enumerate() {
        let (h,w) = plane.dim();
        let data = plane.as_slice()
            .ok_or( McropImageError::OpFailed("non-contiguous plane data".into()))?;

        let mut img = tiff.new_image::<C>( w as u32, h as u32)?;
        if i == 0 {
            img.encoder().write_tag( Tag::ImageDescription, xml)?;
        }
        img.write_data( data)?;
    }
    Ok(())
}

/* #region OME-XML *********************************************************************************/

fn parse_ome_xml (xml: &str, name: String)->Result<OmeMeta> {
    let mut reader = Reader::from_str( xml);

    let mut size_t = 1;
    let mut size_c = 0;
    let mut size_z = 1;
    let mut size_y = 0;
    let mut size_x = 0;
    let mut pixel_type = PixelType::Uint16;
    let mut channel_names: Vec<String> = Vec::new();
    let mut physical_size_x: Option<f64> = None;
    let mut physical_size_y: Option<f64> = None;
    let mut physical_size_z: Option<f64> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                match e.local_name().as_ref() {
                    b"Pixels" => {
                        for a in e.attributes().flatten() {
                            let value = String::from_utf8_lossy( &a.value).to_string();
                            match a.key.local_name().as_ref() {
                                b"SizeT" => size_t = parse_extent( &value, "SizeT")?,
                                b"SizeC" => size_c = parse_extent( &value, "SizeC")?,
                                b"SizeZ" => size_z = parse_extent( &value, "SizeZ")?,
                                b"SizeY" => size_y = parse_extent( &value, "SizeY")?,
                                b"SizeX" => size_x = parse_extent( &value, "SizeX")?,
                                b"Type" => pixel_type = PixelType::from_ome_name( &value)?,
                                b"PhysicalSizeX" => physical_size_x = value.parse().ok(),
                                b"PhysicalSizeY" => physical_size_y = value.parse().ok(),
                                b"PhysicalSizeZ" => physical_size_z = value.parse().ok(),
                                _ => {}
                            }
                        }
                    }
                    b"Channel" => {
                        let mut channel_name: Option<String> = None;
                        for a in e.attributes().flatten() {
                            if a.key.local_name().as_ref() == b"Name" {
                                channel_name = a.unescape_value().ok().map( |v| v.to_string());
                            }
                        }
                        channel_names.push( channel_name.unwrap_or_else( || format!("Channel {}", channel_names.len())));
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
    }

    if size_c == 0 || size_y == 0 || size_x == 0 {
        return Err( McropImageError::InvalidImageFormat("OME-XML without Pixels extents".into()))
    }
    while channel_names.len() < size_c {
        channel_names.push( format!("Channel {}", channel_names.len()));
    }

    Ok( OmeMeta {
        name,
        size_t, size_c, size_z, size_y, size_x,
        pixel_type,
        channel_names,
        physical_size_x, physical_size_y, physical_size_z
    })
}

fn parse_extent (value: &str, attr: &str)->Result<usize> {
    value.parse().map_err( |_| McropImageError::InvalidImageFormat( format!("invalid OME-XML {attr}: {value}")))
}

fn ome_xml (meta: &OmeMeta)->String {
    let mut s = String::with_capacity(1024);

    s.push_str( "<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
    s.push_str( "<OME xmlns=\"http://www.openmicroscopy.org/Schemas/OME/2016-06\">");
    s.push_str( &format!("<Image ID=\"Image:0\" Name=\"{}\">", xml_escape(&meta.name)));

    s.push_str( &format!(
        "<Pixels ID=\"Pixels:0\" DimensionOrder=\"XYZCT\" Type=\"{}\" SizeT=\"{}\" SizeC=\"{}\" SizeZ=\"{}\" SizeY=\"{}\" SizeX=\"{}\"",
        meta.pixel_type.ome_name(), meta.size_t, meta.size_c, meta.size_z, meta.size_y, meta.size_x));
    if let Some(v) = meta.physical_size_x { s.push_str( &format!(" PhysicalSizeX=\"{v}\"")); }
    if let Some(v) = meta.physical_size_y { s.push_str( &format!(" PhysicalSizeY=\"{v}\"")); }
    if let Some(v) = meta.physical_size_z { s.push_str( &format!(" PhysicalSizeZ=\"{v}\"")); }
    s.push('>');

    for (i,name) in meta.channel_names.iter().enumerate() {
        s.push_str( &format!("<Channel ID=\"Channel:0:{i}\" Name=\"{}\" SamplesPerPixel=\"1\"/>", xml_escape(name)));
    }
    s.push_str( "<TiffData/>");

    s.push_str( "</Pixels></Image></OME>");
    s
}

fn xml_escape (s: &str)->String {
    let mut out = String::with_capacity( s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c)
        }
    }
    out
}

/* #endregion OME-XML */
