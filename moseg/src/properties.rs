//! Runtime-tunable properties.

use std::ops::{Deref, DerefMut};

/// Object with tunable parameters.
///
/// Selectors, trackers, estimators and the session config expose their numeric knobs
/// through this trait so hosts can tweak them without knowing the concrete type.
pub trait Properties {
    /// Get available properties.
    fn props_mut(&mut self) -> Vec<(&str, PropertyMut)> {
        vec![]
    }

    fn props(&mut self) -> Vec<(&str, Property)> {
        self.props_mut()
            .into_iter()
            .map(|(n, p)| (n, p.into()))
            .collect()
    }
}

/// Property value with a lower and upper bound.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct BoundedProp<T> {
    pub val: T,
    pub min: T,
    pub max: T,
}

impl<T> Deref for BoundedProp<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.val
    }
}

impl<T> DerefMut for BoundedProp<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.val
    }
}

/// Snapshot of a property.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub enum Property {
    Float(BoundedProp<f32>),
    Usize(BoundedProp<usize>),
}

impl<'a> From<PropertyMut<'a>> for Property {
    fn from(prop: PropertyMut<'a>) -> Self {
        match prop {
            PropertyMut::Float(p) => Self::Float(p.into()),
            PropertyMut::Usize(p) => Self::Usize(p.into()),
        }
    }
}

/// Mutable view of a bounded property.
pub struct BoundedPropMut<'a, T> {
    pub val: &'a mut T,
    pub min: T,
    pub max: T,
}

impl<'a, T> Deref for BoundedPropMut<'a, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.val
    }
}

impl<'a, T> DerefMut for BoundedPropMut<'a, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.val
    }
}

impl<'a, T: Copy> From<BoundedPropMut<'a, T>> for BoundedProp<T> {
    fn from(BoundedPropMut { val, min, max }: BoundedPropMut<'a, T>) -> Self {
        Self {
            val: *val,
            min,
            max,
        }
    }
}

/// Mutable view of a property.
pub enum PropertyMut<'a> {
    Float(BoundedPropMut<'a, f32>),
    Usize(BoundedPropMut<'a, usize>),
}

impl<'a> PropertyMut<'a> {
    /// Create a floating point property.
    ///
    /// # Arguments
    ///
    /// * `val` - reference to the underlying float to be mutated.
    /// * `min` - lowest value for the property.
    /// * `max` - highest value for the property.
    pub fn float(val: &'a mut f32, min: f32, max: f32) -> Self {
        Self::Float(BoundedPropMut { val, min, max })
    }

    /// Create an integer property.
    ///
    /// # Arguments
    ///
    /// * `val` - reference to the underlying usize to be mutated.
    /// * `min` - lowest value for the property.
    /// * `max` - highest value for the property.
    pub fn usize(val: &'a mut usize, min: usize, max: usize) -> Self {
        Self::Usize(BoundedPropMut { val, min, max })
    }

    /// Overwrite the underlying value from a snapshot of matching type.
    pub fn set(&mut self, other: &Property) {
        match (self, other) {
            (Self::Float(val), Property::Float(oval)) => *val.val = oval.val,
            (Self::Usize(val), Property::Usize(oval)) => *val.val = oval.val,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Knobs {
        threshold: f32,
        iters: usize,
    }

    impl Properties for Knobs {
        fn props_mut(&mut self) -> Vec<(&str, PropertyMut)> {
            vec![
                ("Threshold", PropertyMut::float(&mut self.threshold, 0.0, 10.0)),
                ("Iterations", PropertyMut::usize(&mut self.iters, 1, 100)),
            ]
        }
    }

    #[test]
    fn set_mutates_underlying_value() {
        let mut knobs = Knobs {
            threshold: 5.0,
            iters: 10,
        };

        for (name, mut prop) in knobs.props_mut() {
            if name == "Threshold" {
                prop.set(&Property::Float(BoundedProp {
                    val: 2.5,
                    min: 0.0,
                    max: 10.0,
                }));
            }
        }

        assert_eq!(knobs.threshold, 2.5);
        assert_eq!(knobs.iters, 10);
    }
}
