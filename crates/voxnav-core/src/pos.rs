use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Vec3;

/// Integer voxel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VoxelPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl VoxelPos {
    pub const ORIGIN: Self = Self::new(0, 0, 0);

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Euclidean distance between voxel corners.
    pub fn distance(self, other: Self) -> f64 {
        Vec3::from(self).distance(Vec3::from(other))
    }

    /// Round every axis down to a multiple of `radius`.
    ///
    /// Negative coordinates round toward negative infinity, so `-1` buckets
    /// to `-radius`, not `0`. Buckets below `i32::MIN` clamp to `i32::MIN`.
    pub fn bucket(self, radius: i32) -> Self {
        let radius = radius.max(1);
        let snap = |v: i32| v.div_euclid(radius).saturating_mul(radius);
        Self::new(snap(self.x), snap(self.y), snap(self.z))
    }

    /// Center of the voxel in world space.
    pub fn center(self) -> Vec3 {
        Vec3::new(
            self.x as f64 + 0.5,
            self.y as f64 + 0.5,
            self.z as f64 + 0.5,
        )
    }
}

impl fmt::Display for VoxelPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Why a navigation target could not be turned into a voxel position.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositionError {
    #[error("coordinate {axis} is not finite ({value})")]
    NonFinite { axis: char, value: f64 },
    #[error("coordinate {axis} is out of range ({value})")]
    OutOfRange { axis: char, value: f64 },
    #[error("missing numeric coordinate {axis}")]
    MissingAxis { axis: char },
    #[error("expected an object with x/y/z or a 3-element array, got {0}")]
    Shape(String),
}

/// Boundary parser for navigation targets.
///
/// Every accepted shape either yields a voxel or an error; there is no
/// fallback to the origin.
pub trait IntoVoxelPos {
    fn into_voxel_pos(self) -> Result<VoxelPos, PositionError>;
}

impl IntoVoxelPos for VoxelPos {
    fn into_voxel_pos(self) -> Result<VoxelPos, PositionError> {
        Ok(self)
    }
}

impl IntoVoxelPos for &VoxelPos {
    fn into_voxel_pos(self) -> Result<VoxelPos, PositionError> {
        Ok(*self)
    }
}

impl IntoVoxelPos for [i32; 3] {
    fn into_voxel_pos(self) -> Result<VoxelPos, PositionError> {
        Ok(VoxelPos::new(self[0], self[1], self[2]))
    }
}

impl IntoVoxelPos for (i32, i32, i32) {
    fn into_voxel_pos(self) -> Result<VoxelPos, PositionError> {
        Ok(VoxelPos::new(self.0, self.1, self.2))
    }
}

impl IntoVoxelPos for [f64; 3] {
    fn into_voxel_pos(self) -> Result<VoxelPos, PositionError> {
        Ok(VoxelPos::new(
            floor_axis('x', self[0])?,
            floor_axis('y', self[1])?,
            floor_axis('z', self[2])?,
        ))
    }
}

impl IntoVoxelPos for Vec3 {
    fn into_voxel_pos(self) -> Result<VoxelPos, PositionError> {
        [self.x, self.y, self.z].into_voxel_pos()
    }
}

#[cfg(feature = "serde")]
impl IntoVoxelPos for &serde_json::Value {
    fn into_voxel_pos(self) -> Result<VoxelPos, PositionError> {
        use serde_json::Value;

        match self {
            Value::Object(map) => {
                let axis = |name: char| -> Result<f64, PositionError> {
                    map.get(name.to_string().as_str())
                        .and_then(Value::as_f64)
                        .ok_or(PositionError::MissingAxis { axis: name })
                };
                [axis('x')?, axis('y')?, axis('z')?].into_voxel_pos()
            }
            Value::Array(items) if items.len() == 3 => {
                let mut coords = [0.0; 3];
                for (slot, (item, name)) in coords.iter_mut().zip(items.iter().zip(['x', 'y', 'z'])) {
                    *slot = item
                        .as_f64()
                        .ok_or(PositionError::MissingAxis { axis: name })?;
                }
                coords.into_voxel_pos()
            }
            other => Err(PositionError::Shape(describe(other))),
        }
    }
}

#[cfg(feature = "serde")]
fn describe(value: &serde_json::Value) -> String {
    use serde_json::Value;

    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "a boolean".to_string(),
        Value::Number(_) => "a number".to_string(),
        Value::String(_) => "a string".to_string(),
        Value::Array(items) => format!("an array of {} elements", items.len()),
        Value::Object(_) => "an object".to_string(),
    }
}

fn floor_axis(axis: char, value: f64) -> Result<i32, PositionError> {
    if !value.is_finite() {
        return Err(PositionError::NonFinite { axis, value });
    }
    let floored = value.floor();
    if floored < i32::MIN as f64 || floored > i32::MAX as f64 {
        return Err(PositionError::OutOfRange { axis, value });
    }
    Ok(floored as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_rounds_toward_negative_infinity() {
        assert_eq!(VoxelPos::new(4, 5, 9).bucket(5), VoxelPos::new(0, 5, 5));
        assert_eq!(VoxelPos::new(-1, -5, -6).bucket(5), VoxelPos::new(-5, -5, -10));
    }

    #[test]
    fn bucket_with_non_positive_radius_is_identity() {
        let p = VoxelPos::new(3, -7, 11);
        assert_eq!(p.bucket(0), p);
    }

    #[test]
    fn bucket_at_the_edges_of_the_range_does_not_overflow() {
        let low = VoxelPos::new(i32::MIN, i32::MIN + 1, -7);
        assert_eq!(low.bucket(5), VoxelPos::new(i32::MIN, i32::MIN, -10));

        let high = VoxelPos::new(i32::MAX, 0, 0);
        assert_eq!(high.bucket(5).x, i32::MAX - i32::MAX.rem_euclid(5));
    }

    #[test]
    fn floats_are_floored_not_rounded() {
        let p = [1.9, -0.1, 40.5].into_voxel_pos().expect("finite");
        assert_eq!(p, VoxelPos::new(1, -1, 40));
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let err = Vec3::new(0.0, f64::NAN, 0.0).into_voxel_pos().unwrap_err();
        assert!(matches!(err, PositionError::NonFinite { axis: 'y', .. }));
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let err = [1e12, 0.0, 0.0].into_voxel_pos().unwrap_err();
        assert!(matches!(err, PositionError::OutOfRange { axis: 'x', .. }));
    }
}
