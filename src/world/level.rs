//! Level loading and saving
//!
//! Level files are XML:
//!
//! ```xml
//! <map mapDims="64,64" endZone="50,50">
//!     <shape>
//!         <rigidbody restitution="0" friction="0.2" mass="1" angularDrag="0" drag="0.5"
//!                    angularVelocity="0.5" xRestricted="false" yRestricted="false"
//!                    rotRestricted="false" type="static"/>
//!         <collider radius="1" extents="1,1" locCenter="0,0" locRight="1,0"/>
//!         <trans pos="0,0" scale="1,1" rot="0" alignment="neutral"/>
//!     </shape>
//! </map>
//! ```
//!
//! Every attribute is optional. Missing attributes take the documented
//! defaults. In lenient mode a malformed attribute is logged and defaulted
//! too; strict mode reports it as `LevelError::Attribute`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

use crate::math::Vec2;
use crate::physics::SimulationType;
use super::shape::Alignment;

/// Validation limits to keep a hostile file from allocating the world
pub mod limits {
    /// Maximum number of shapes in a level
    pub const MAX_SHAPES: usize = 4096;
    /// Maximum map dimension on either axis
    pub const MAX_MAP_DIM: f32 = 4096.0;
}

/// Error type for level loading and saving
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML error: {0}")]
    Xml(String),
    #[error("bad attribute {name}=\"{value}\" on <{element}>")]
    Attribute {
        element: &'static str,
        name: &'static str,
        value: String,
    },
}

fn xml_err(e: impl std::fmt::Display) -> LevelError {
    LevelError::Xml(e.to_string())
}

// =============================================================================
// Records
// =============================================================================

/// `<rigidbody>` attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidbodyRecord {
    pub restitution: f32,
    pub friction: f32,
    pub mass: f32,
    pub angular_drag: f32,
    pub drag: f32,
    pub angular_velocity: f32,
    pub x_restricted: bool,
    pub y_restricted: bool,
    pub rot_restricted: bool,
    pub sim_type: SimulationType,
}

impl Default for RigidbodyRecord {
    fn default() -> Self {
        Self {
            restitution: 0.0,
            friction: 0.2,
            mass: 1.0,
            angular_drag: 0.0,
            drag: 0.5,
            angular_velocity: 0.5,
            x_restricted: false,
            y_restricted: false,
            rot_restricted: false,
            sim_type: SimulationType::Static,
        }
    }
}

/// `<collider>` attributes. `extents` are half-extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderRecord {
    pub radius: f32,
    pub extents: Vec2,
    pub local_center: Vec2,
    pub local_right: Vec2,
}

impl Default for ColliderRecord {
    fn default() -> Self {
        Self {
            radius: 1.0,
            extents: Vec2::ONE,
            local_center: Vec2::ZERO,
            local_right: Vec2::X,
        }
    }
}

/// `<trans>` attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformRecord {
    pub position: Vec2,
    pub scale: Vec2,
    pub rotation: f32,
    pub alignment: Alignment,
}

impl Default for TransformRecord {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
            alignment: Alignment::Neutral,
        }
    }
}

/// One `<shape>` element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShapeRecord {
    pub rigidbody: RigidbodyRecord,
    pub collider: ColliderRecord,
    pub transform: TransformRecord,
}

/// A whole level file.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelData {
    pub map_dims: Vec2,
    pub end_zone: Vec2,
    pub shapes: Vec<ShapeRecord>,
}

impl Default for LevelData {
    fn default() -> Self {
        Self {
            map_dims: Vec2::new(64.0, 64.0),
            end_zone: Vec2::ZERO,
            shapes: Vec::new(),
        }
    }
}

// =============================================================================
// Attribute parsing
// =============================================================================

/// Attributes of one element, read with a strictness policy.
struct Attrs {
    element: &'static str,
    values: HashMap<String, String>,
    strict: bool,
}

impl Attrs {
    fn read(element: &'static str, start: &BytesStart, strict: bool) -> Result<Self, LevelError> {
        let mut values = HashMap::new();
        for attr in start.attributes() {
            let attr = attr.map_err(xml_err)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(xml_err)?.into_owned();
            values.insert(key, value);
        }
        Ok(Self { element, values, strict })
    }

    /// Look up and parse one attribute. Missing → default; malformed →
    /// error (strict) or default with a warning (lenient).
    fn get<T>(&self, name: &'static str, default: T, parse: impl Fn(&str) -> Option<T>) -> Result<T, LevelError> {
        let Some(raw) = self.values.get(name) else {
            return Ok(default);
        };
        match parse(raw) {
            Some(v) => Ok(v),
            None if self.strict => Err(LevelError::Attribute {
                element: self.element,
                name,
                value: raw.clone(),
            }),
            None => {
                log::warn!("Level: ignoring bad {}=\"{}\" on <{}>", name, raw, self.element);
                Ok(default)
            }
        }
    }

    fn f32(&self, name: &'static str, default: f32) -> Result<f32, LevelError> {
        self.get(name, default, parse_f32)
    }

    fn vec2(&self, name: &'static str, default: Vec2) -> Result<Vec2, LevelError> {
        self.get(name, default, parse_vec2)
    }

    fn bool(&self, name: &'static str, default: bool) -> Result<bool, LevelError> {
        self.get(name, default, parse_bool)
    }
}

fn parse_f32(s: &str) -> Option<f32> {
    s.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}

/// "x,y"
pub fn parse_vec2(s: &str) -> Option<Vec2> {
    let (x, y) = s.split_once(',')?;
    Some(Vec2::new(parse_f32(x)?, parse_f32(y)?))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

pub fn format_vec2(v: Vec2) -> String {
    format!("{},{}", v.x, v.y)
}

// =============================================================================
// Reading
// =============================================================================

/// Parse a level, failing on the first XML or attribute error.
pub fn parse_level(text: &str) -> Result<LevelData, LevelError> {
    let mut level = LevelData::default();
    parse_into(text, true, &mut level)?;
    Ok(level)
}

/// Parse a level, keeping whatever was read before an XML error and
/// defaulting malformed attributes.
pub fn parse_level_lenient(text: &str) -> LevelData {
    let mut level = LevelData::default();
    if let Err(e) = parse_into(text, false, &mut level) {
        log::warn!("Level: parse stopped early ({}), keeping {} shapes", e, level.shapes.len());
    }
    level
}

fn parse_into(text: &str, strict: bool, level: &mut LevelData) -> Result<(), LevelError> {
    let mut reader = Reader::from_str(text);
    let mut current: Option<ShapeRecord> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| LevelError::Xml(format!("at byte {}: {}", reader.buffer_position(), e)))?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let empty = matches!(event, Event::Empty(_));
                match e.name().as_ref() {
                    b"map" => read_map(e, strict, level)?,
                    b"shape" => {
                        if empty {
                            push_shape(level, ShapeRecord::default())?;
                        } else {
                            current = Some(ShapeRecord::default());
                        }
                    }
                    b"rigidbody" => {
                        if let Some(shape) = current.as_mut() {
                            shape.rigidbody = read_rigidbody(e, strict)?;
                        }
                    }
                    b"collider" => {
                        if let Some(shape) = current.as_mut() {
                            shape.collider = read_collider(e, strict)?;
                        }
                    }
                    b"trans" => {
                        if let Some(shape) = current.as_mut() {
                            shape.transform = read_transform(e, strict)?;
                        }
                    }
                    _ => {}
                }
            }
            Event::End(ref e) => {
                if e.name().as_ref() == b"shape" {
                    if let Some(shape) = current.take() {
                        push_shape(level, shape)?;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(())
}

fn push_shape(level: &mut LevelData, shape: ShapeRecord) -> Result<(), LevelError> {
    if level.shapes.len() >= limits::MAX_SHAPES {
        return Err(LevelError::Xml(format!("more than {} shapes", limits::MAX_SHAPES)));
    }
    level.shapes.push(shape);
    Ok(())
}

fn read_map(e: &BytesStart, strict: bool, level: &mut LevelData) -> Result<(), LevelError> {
    let a = Attrs::read("map", e, strict)?;
    let dims = a.vec2("mapDims", level.map_dims)?;
    level.map_dims = dims.clamp(Vec2::ONE, Vec2::splat(limits::MAX_MAP_DIM));
    level.end_zone = a.vec2("endZone", level.end_zone)?;
    Ok(())
}

fn read_rigidbody(e: &BytesStart, strict: bool) -> Result<RigidbodyRecord, LevelError> {
    let a = Attrs::read("rigidbody", e, strict)?;
    let d = RigidbodyRecord::default();
    Ok(RigidbodyRecord {
        restitution: a.f32("restitution", d.restitution)?,
        friction: a.f32("friction", d.friction)?,
        mass: a.f32("mass", d.mass)?,
        angular_drag: a.f32("angularDrag", d.angular_drag)?,
        drag: a.f32("drag", d.drag)?,
        angular_velocity: a.f32("angularVelocity", d.angular_velocity)?,
        x_restricted: a.bool("xRestricted", d.x_restricted)?,
        y_restricted: a.bool("yRestricted", d.y_restricted)?,
        rot_restricted: a.bool("rotRestricted", d.rot_restricted)?,
        sim_type: a.get("type", d.sim_type, SimulationType::parse)?,
    })
}

fn read_collider(e: &BytesStart, strict: bool) -> Result<ColliderRecord, LevelError> {
    let a = Attrs::read("collider", e, strict)?;
    let d = ColliderRecord::default();
    Ok(ColliderRecord {
        radius: a.f32("radius", d.radius)?,
        extents: a.vec2("extents", d.extents)?,
        local_center: a.vec2("locCenter", d.local_center)?,
        local_right: a.vec2("locRight", d.local_right)?,
    })
}

fn read_transform(e: &BytesStart, strict: bool) -> Result<TransformRecord, LevelError> {
    let a = Attrs::read("trans", e, strict)?;
    let d = TransformRecord::default();
    Ok(TransformRecord {
        position: a.vec2("pos", d.position)?,
        scale: a.vec2("scale", d.scale)?,
        rotation: a.f32("rot", d.rotation)?,
        alignment: a.get("alignment", d.alignment, Alignment::parse)?,
    })
}

/// Read and strictly parse a level file.
pub fn load_level<P: AsRef<Path>>(path: P) -> Result<LevelData, LevelError> {
    let text = fs::read_to_string(path)?;
    parse_level(&text)
}

// =============================================================================
// Writing
// =============================================================================

/// Serialize a level to XML text.
pub fn write_level(level: &LevelData) -> Result<String, LevelError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b'\t', 1);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;

    let mut root = BytesStart::new("map");
    root.push_attribute(("mapDims", format_vec2(level.map_dims).as_str()));
    root.push_attribute(("endZone", format_vec2(level.end_zone).as_str()));
    writer.write_event(Event::Start(root)).map_err(xml_err)?;

    for shape in &level.shapes {
        writer.write_event(Event::Start(BytesStart::new("shape"))).map_err(xml_err)?;
        writer.write_event(Event::Empty(rigidbody_element(&shape.rigidbody))).map_err(xml_err)?;
        writer.write_event(Event::Empty(collider_element(&shape.collider))).map_err(xml_err)?;
        writer.write_event(Event::Empty(transform_element(&shape.transform))).map_err(xml_err)?;
        writer.write_event(Event::End(BytesEnd::new("shape"))).map_err(xml_err)?;
    }

    writer.write_event(Event::End(BytesEnd::new("map"))).map_err(xml_err)?;
    String::from_utf8(writer.into_inner()).map_err(xml_err)
}

fn rigidbody_element(r: &RigidbodyRecord) -> BytesStart<'static> {
    let mut e = BytesStart::new("rigidbody");
    for (name, value) in [
        ("restitution", r.restitution),
        ("friction", r.friction),
        ("mass", r.mass),
        ("angularDrag", r.angular_drag),
        ("drag", r.drag),
        ("angularVelocity", r.angular_velocity),
    ] {
        e.push_attribute((name, value.to_string().as_str()));
    }
    for (name, value) in [
        ("xRestricted", r.x_restricted),
        ("yRestricted", r.y_restricted),
        ("rotRestricted", r.rot_restricted),
    ] {
        e.push_attribute((name, if value { "true" } else { "false" }));
    }
    e.push_attribute(("type", r.sim_type.as_str()));
    e
}

fn collider_element(c: &ColliderRecord) -> BytesStart<'static> {
    let mut e = BytesStart::new("collider");
    e.push_attribute(("radius", c.radius.to_string().as_str()));
    e.push_attribute(("extents", format_vec2(c.extents).as_str()));
    e.push_attribute(("locCenter", format_vec2(c.local_center).as_str()));
    e.push_attribute(("locRight", format_vec2(c.local_right).as_str()));
    e
}

fn transform_element(t: &TransformRecord) -> BytesStart<'static> {
    let mut e = BytesStart::new("trans");
    e.push_attribute(("pos", format_vec2(t.position).as_str()));
    e.push_attribute(("scale", format_vec2(t.scale).as_str()));
    e.push_attribute(("rot", t.rotation.to_string().as_str()));
    e.push_attribute(("alignment", t.alignment.as_str()));
    e
}

/// Write a level file, creating parent directories as needed.
pub fn save_level<P: AsRef<Path>>(level: &LevelData, path: P) -> Result<(), LevelError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, write_level(level)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_PLAYER: &str = r#"<map mapDims="32,16" endZone="30,8">
        <shape>
            <rigidbody type="dynamic" mass="2.0"/>
            <collider radius="0.5" extents="1,1"/>
            <trans pos="3,4" alignment="player"/>
        </shape>
    </map>"#;

    #[test]
    fn test_parse_applies_defaults() {
        let level = parse_level(ONE_PLAYER).unwrap();
        assert_eq!(level.map_dims, Vec2::new(32.0, 16.0));
        assert_eq!(level.end_zone, Vec2::new(30.0, 8.0));
        assert_eq!(level.shapes.len(), 1);

        let s = &level.shapes[0];
        assert_eq!(s.rigidbody.sim_type, SimulationType::Dynamic);
        assert_eq!(s.rigidbody.mass, 2.0);
        assert_eq!(s.rigidbody.friction, 0.2);
        assert_eq!(s.rigidbody.drag, 0.5);
        assert_eq!(s.rigidbody.angular_velocity, 0.5);
        assert!(!s.rigidbody.x_restricted);
        assert_eq!(s.collider.radius, 0.5);
        assert_eq!(s.collider.local_right, Vec2::X);
        assert_eq!(s.transform.position, Vec2::new(3.0, 4.0));
        assert_eq!(s.transform.scale, Vec2::ONE);
        assert_eq!(s.transform.alignment, Alignment::Player);
    }

    #[test]
    fn test_empty_shape_is_all_defaults() {
        let level = parse_level("<map><shape/><shape></shape></map>").unwrap();
        assert_eq!(level.shapes, vec![ShapeRecord::default(); 2]);
        assert_eq!(level.map_dims, Vec2::new(64.0, 64.0));
        assert_eq!(level.shapes[0].collider.radius, 1.0);
        assert_eq!(level.shapes[0].transform.alignment, Alignment::Neutral);
    }

    #[test]
    fn test_strict_rejects_bad_attribute() {
        let text = r#"<map><shape><rigidbody mass="heavy"/></shape></map>"#;
        match parse_level(text) {
            Err(LevelError::Attribute { element, name, value }) => {
                assert_eq!(element, "rigidbody");
                assert_eq!(name, "mass");
                assert_eq!(value, "heavy");
            }
            other => panic!("expected attribute error, got {:?}", other),
        }
        let level = parse_level_lenient(text);
        assert_eq!(level.shapes[0].rigidbody.mass, 1.0);
    }

    #[test]
    fn test_lenient_keeps_shapes_before_syntax_error() {
        let text = r#"<map><shape><trans pos="1,1"/></shape><shape><trans pos="2,2"/></oops></map>"#;
        assert!(parse_level(text).is_err());
        let level = parse_level_lenient(text);
        assert_eq!(level.shapes.len(), 1);
        assert_eq!(level.shapes[0].transform.position, Vec2::ONE);
    }

    #[test]
    fn test_garbage_text_gives_empty_level() {
        let level = parse_level_lenient("this is not xml <<<");
        assert!(level.shapes.is_empty());
    }

    #[test]
    fn test_write_then_parse() {
        let mut level = LevelData::default();
        level.end_zone = Vec2::new(10.5, -2.25);
        level.shapes.push(ShapeRecord {
            rigidbody: RigidbodyRecord {
                restitution: 0.75,
                friction: 1.5,
                mass: 3.25,
                angular_drag: 0.1,
                drag: 0.0,
                angular_velocity: -12.0,
                x_restricted: true,
                y_restricted: false,
                rot_restricted: true,
                sim_type: SimulationType::Dynamic,
            },
            collider: ColliderRecord {
                radius: 0.3,
                extents: Vec2::new(2.0, 0.0),
                local_center: Vec2::new(0.1, -0.2),
                local_right: Vec2::new(0.0, 1.0),
            },
            transform: TransformRecord {
                position: Vec2::new(-4.0, 7.125),
                scale: Vec2::new(1.0, 2.0),
                rotation: 33.3,
                alignment: Alignment::Enemy,
            },
        });

        let text = write_level(&level).unwrap();
        assert!(text.contains("alignment=\"enemy\""));
        assert!(text.contains("type=\"dynamic\""));
        assert_eq!(parse_level(&text).unwrap(), level);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = load_level("/definitely/not/here.xml");
        assert!(matches!(result, Err(LevelError::Io(_))));
    }

    #[test]
    fn test_parse_vec2() {
        assert_eq!(parse_vec2(" 1.5 , -2 "), Some(Vec2::new(1.5, -2.0)));
        assert_eq!(parse_vec2("1"), None);
        assert_eq!(parse_vec2("a,b"), None);
        assert_eq!(parse_vec2("NaN,1"), None);
    }

    #[test]
    fn test_shipped_levels_parse() {
        for path in ["assets/levels/level0.xml", "assets/levels/level1.xml"] {
            let level = load_level(path).unwrap();
            let players = level.shapes.iter().filter(|s| s.transform.alignment == Alignment::Player).count();
            assert_eq!(players, 1, "{}", path);
        }
    }
}
