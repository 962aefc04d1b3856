//! Opaque key/value store attached to level bodies (pickup `type`, `healthPoints`, ...).

use bevy::platform::collections::HashMap;
use bevy::prelude::*;

#[derive(Clone, Debug, PartialEq)]
pub enum DataValue {
    Text(String),
    Int(i32),
}

impl From<&str> for DataValue {
    fn from(v: &str) -> Self {
        DataValue::Text(v.to_owned())
    }
}

impl From<i32> for DataValue {
    fn from(v: i32) -> Self {
        DataValue::Int(v)
    }
}

#[derive(Component, Clone, Debug, Default)]
pub struct BodyData(HashMap<String, DataValue>);

impl BodyData {
    pub fn with(mut self, key: &str, value: impl Into<DataValue>) -> Self {
        self.0.insert(key.to_owned(), value.into());
        self
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.0.get(key)? {
            DataValue::Text(s) => Some(s),
            DataValue::Int(_) => None,
        }
    }

    pub fn int(&self, key: &str) -> Option<i32> {
        match self.0.get(key)? {
            DataValue::Int(v) => Some(*v),
            DataValue::Text(_) => None,
        }
    }
}
