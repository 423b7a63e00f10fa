//! City-object attributes and the snapshot used to re-attach them after
//! conversion.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::GranularityError;
use crate::hierarchy::{SceneHierarchy, SceneId};

/// Attribute value of a city object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Map(IndexMap<String, AttributeValue>),
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<f64> for AttributeValue {
    fn from(n: f64) -> Self {
        AttributeValue::Number(n)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

/// A city object as carried by scene objects: its GML id, type and
/// attributes, plus the objects it is made of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityObject {
    pub gml_id: String,
    pub city_object_type: String,
    #[serde(default)]
    pub attributes: IndexMap<String, AttributeValue>,
    #[serde(default)]
    pub children: Vec<CityObject>,
}

impl CityObject {
    pub fn new(gml_id: &str, city_object_type: &str) -> Self {
        CityObject {
            gml_id: gml_id.to_string(),
            city_object_type: city_object_type.to_string(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn with_child(mut self, child: CityObject) -> Self {
        self.children.push(child);
        self
    }
}

/// City objects of a selection keyed by GML id, in discovery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GmlIdToSerializedCityObj {
    objects: IndexMap<String, CityObject>,
}

impl GmlIdToSerializedCityObj {
    /// Collects the city objects of `sources` and all their descendants.
    /// When one GML id is carried by several objects the first one wins.
    pub fn compose_from(hierarchy: &SceneHierarchy, sources: &[SceneId]) -> Result<Self, GranularityError> {
        let mut dict = GmlIdToSerializedCityObj::default();
        for &source in sources {
            hierarchy.object(source)?;
            for id in hierarchy.descendants(source) {
                for city_object in &hierarchy.object(id)?.city_objects {
                    dict.insert(city_object);
                }
            }
        }
        tracing::debug!("remembered attributes of {} city objects", dict.len());
        Ok(dict)
    }

    fn insert(&mut self, city_object: &CityObject) {
        if !self.objects.contains_key(&city_object.gml_id) {
            self.objects
                .insert(city_object.gml_id.clone(), city_object.clone());
        }
        for child in &city_object.children {
            self.insert(child);
        }
    }

    pub fn try_get(&self, gml_id: &str) -> Option<&CityObject> {
        self.objects.get(gml_id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn gml_ids(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }
}

/// Looks up city objects by GML id while placing converted objects.
pub trait SerializedCityObjectGetter {
    fn get_by_id(&self, gml_id: &str) -> Option<CityObject>;
}

/// [`SerializedCityObjectGetter`] over a [`GmlIdToSerializedCityObj`].
pub struct SerializedCityObjectGetterFromDict<'a> {
    data: &'a GmlIdToSerializedCityObj,
}

impl<'a> SerializedCityObjectGetterFromDict<'a> {
    pub fn new(data: &'a GmlIdToSerializedCityObj) -> Self {
        SerializedCityObjectGetterFromDict { data }
    }
}

impl SerializedCityObjectGetter for SerializedCityObjectGetterFromDict<'_> {
    fn get_by_id(&self, gml_id: &str) -> Option<CityObject> {
        match self.data.try_get(gml_id) {
            Some(found) => Some(found.clone()),
            None => {
                tracing::warn!("gml id not found: {}", gml_id);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::SceneObject;

    fn building(id: &str, height: f64) -> CityObject {
        CityObject::new(id, "Building")
            .with_attribute("bldg:measuredHeight", height)
            .with_child(CityObject::new(&format!("{}_roof", id), "RoofSurface"))
    }

    #[test]
    fn test_compose_walks_descendants() {
        let mut h = SceneHierarchy::new();
        let area = h.add_root(SceneObject::new("area"));
        h.add_child(area, SceneObject::new("b1").with_city_object(building("b1", 12.5)))
            .unwrap();
        let other = h.add_root(SceneObject::new("other").with_city_object(building("b2", 3.0)));

        let dict = GmlIdToSerializedCityObj::compose_from(&h, &[area]).unwrap();
        assert_eq!(dict.gml_ids().collect::<Vec<_>>(), vec!["b1", "b1_roof"]);
        assert!(dict.try_get("b2").is_none());

        let both = GmlIdToSerializedCityObj::compose_from(&h, &[area, other]).unwrap();
        assert_eq!(both.len(), 4);
        assert_eq!(
            both.try_get("b1").unwrap().attributes["bldg:measuredHeight"],
            AttributeValue::Number(12.5)
        );
    }

    #[test]
    fn test_first_occurrence_wins() {
        let mut h = SceneHierarchy::new();
        let a = h.add_root(SceneObject::new("a").with_city_object(building("dup", 1.0)));
        let b = h.add_root(SceneObject::new("b").with_city_object(building("dup", 2.0)));
        let dict = GmlIdToSerializedCityObj::compose_from(&h, &[a, b]).unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(
            dict.try_get("dup").unwrap().attributes["bldg:measuredHeight"],
            AttributeValue::Number(1.0)
        );
    }

    #[test]
    fn test_getter_misses_return_none() {
        let mut h = SceneHierarchy::new();
        let a = h.add_root(SceneObject::new("a").with_city_object(building("b1", 1.0)));
        let dict = GmlIdToSerializedCityObj::compose_from(&h, &[a]).unwrap();
        let getter = SerializedCityObjectGetterFromDict::new(&dict);
        assert_eq!(getter.get_by_id("b1_roof").map(|c| c.city_object_type), Some("RoofSurface".into()));
        assert!(getter.get_by_id("missing").is_none());
    }

    #[test]
    fn test_unknown_source_is_an_error() {
        let h = SceneHierarchy::new();
        assert!(GmlIdToSerializedCityObj::compose_from(&h, &[SceneId(0)]).is_err());
    }

    #[test]
    fn test_attribute_json_shape() {
        let obj = CityObject::new("b1", "Building")
            .with_attribute("name", "town hall")
            .with_attribute("public", true);
        let json = serde_json::to_string(&obj.attributes).unwrap();
        assert_eq!(json, r#"{"name":"town hall","public":true}"#);
        let back: IndexMap<String, AttributeValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, obj.attributes);
    }
}
