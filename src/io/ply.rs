use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ndarray::{Array1, Array2, Axis};
use ply_rs::ply::{
    Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
    ScalarType,
};
use ply_rs::writer::Writer;
use ply_rs::{parser, ply};

use crate::error::Error;
use crate::pointcloud::{ColorPointCloud, PointCloud};

const FRAME_COMMENT: &str = "frame_id ";

/// Lidar return as stored in a PLY vertex.
#[derive(Debug)]
struct LidarVertex {
    point: [f32; 3],
    intensity: f32,
}

impl ply::PropertyAccess for LidarVertex {
    fn new() -> Self {
        LidarVertex {
            point: [0f32; 3],
            intensity: 0.0,
        }
    }

    fn set_property(&mut self, key: String, property: ply::Property) {
        let value = match property {
            ply::Property::Char(v) => v as f32,
            ply::Property::UChar(v) => v as f32,
            ply::Property::Short(v) => v as f32,
            ply::Property::UShort(v) => v as f32,
            ply::Property::Int(v) => v as f32,
            ply::Property::UInt(v) => v as f32,
            ply::Property::Float(v) => v,
            ply::Property::Double(v) => v as f32,
            // Lists are rejected from the header before any vertex is parsed.
            _ => return,
        };
        match key.as_ref() {
            "x" => self.point[0] = value,
            "y" => self.point[1] = value,
            "z" => self.point[2] = value,
            "intensity" => self.intensity = value,
            _ => (),
        }
    }
}

/// Reads the vertices of a PLY file as a lidar cloud. Vertices need `x`, `y` and `z`;
/// an `intensity` property is kept when present. Other elements are ignored.
pub fn read_lidar_ply<P>(filepath: P) -> Result<PointCloud, Error>
where
    P: AsRef<Path>,
{
    let mut f = BufReader::new(File::open(filepath)?);

    let vertex_parser = parser::Parser::<LidarVertex>::new();
    let header = vertex_parser.read_header(&mut f)?;

    let element = header
        .elements
        .get("vertex")
        .ok_or_else(|| Error::Parser("PLY file has no vertex element".to_string()))?;
    if !["x", "y", "z"]
        .iter()
        .all(|k| element.properties.contains_key(*k))
    {
        return Err(Error::Parser(
            "PLY vertices need x, y and z properties".to_string(),
        ));
    }
    for key in ["x", "y", "z", "intensity"] {
        if let Some(PropertyDef {
            data_type: PropertyType::List(..),
            ..
        }) = element.properties.get(key)
        {
            return Err(Error::Parser(format!("PLY vertex property {key} must be a scalar")));
        }
    }

    let mut vertices = Vec::new();
    for (_key, element) in &header.elements {
        let payload = vertex_parser.read_payload_for_element(&mut f, element, &header)?;
        if element.name == "vertex" {
            vertices = payload;
            break;
        }
    }

    let mut cloud = PointCloud::from_points(Array2::from_shape_fn(
        (vertices.len(), 3),
        |(i, c)| vertices[i].point[c],
    ));
    if element.properties.contains_key("intensity") {
        cloud.intensities = Some(vertices.iter().map(|v| v.intensity).collect::<Array1<f32>>());
    }

    Ok(cloud)
}

/// Writes the colorized cloud as an ASCII PLY with `x y z red green blue` vertices.
/// The frame id goes into a header comment.
pub fn write_color_ply<P>(filepath: P, cloud: &ColorPointCloud) -> Result<(), Error>
where
    P: AsRef<Path>,
{
    let mut ply = Ply::<DefaultElement>::new();
    let mut vertex_element = ElementDef::new("vertex".to_string());
    ["x", "y", "z"].iter().for_each(|key| {
        vertex_element.properties.add(PropertyDef::new(
            key.to_string(),
            PropertyType::Scalar(ScalarType::Float),
        ));
    });
    ["red", "green", "blue"].iter().for_each(|key| {
        vertex_element.properties.add(PropertyDef::new(
            key.to_string(),
            PropertyType::Scalar(ScalarType::UChar),
        ));
    });

    let vertex_array: Vec<DefaultElement> = cloud
        .points
        .axis_iter(Axis(0))
        .zip(cloud.colors.axis_iter(Axis(0)))
        .map(|(point, color)| {
            let mut elem = DefaultElement::new();
            elem.insert("x".to_string(), Property::Float(point[0]));
            elem.insert("y".to_string(), Property::Float(point[1]));
            elem.insert("z".to_string(), Property::Float(point[2]));
            elem.insert("red".to_string(), Property::UChar(color[0]));
            elem.insert("green".to_string(), Property::UChar(color[1]));
            elem.insert("blue".to_string(), Property::UChar(color[2]));
            elem
        })
        .collect();

    ply.header
        .comments
        .push(format!("{FRAME_COMMENT}{}", cloud.frame_id));
    ply.header.elements.add(vertex_element);
    ply.payload.insert("vertex".to_string(), vertex_array);
    ply.make_consistent()
        .map_err(|err| Error::Parser(format!("{err:?}")))?;
    ply.header.encoding = Encoding::Ascii;

    let mut buf = BufWriter::new(File::create(filepath)?);
    Writer::new().write_ply(&mut buf, &mut ply)?;

    Ok(())
}
