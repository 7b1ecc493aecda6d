mod array;
pub mod locks;
use std::collections::HashMap;

pub use array::{Array, ArrayMetadata, ArrayMetadataBuilder, ArrayOptions};
pub use locks::ChunkLocks;
use serde::{de::DeserializeOwned, Serialize};

pub type JsonObject = HashMap<String, serde_json::Value>;

pub trait ReadableMetadata {
    fn get_zarr_format(&self) -> usize;

    fn get_attributes(&self) -> &JsonObject;

    fn has_attribute(&self, key: &str) -> bool {
        self.get_attributes().contains_key(key)
    }

    fn get_attribute_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.get_attributes().get(key)
    }

    /// None if the attribute is absent.
    fn get_attribute<D: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Option<Result<D, serde_json::Error>> {
        self.get_attribute_value(key)
            .map(|v| serde_json::from_value(v.clone()))
    }
}

/// Attribute changes are in-memory until the node's metadata is written.
pub trait WriteableMetadata {
    fn mutate_attributes<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut JsonObject) -> R;

    /// Returns the replaced attribute, if any (without deserialising).
    fn set_attribute<S: Serialize>(
        &mut self,
        key: &str,
        value: S,
    ) -> Result<Option<serde_json::Value>, serde_json::Error> {
        let v = serde_json::to_value(value)?;
        let k = key.to_string();
        Ok(self.mutate_attributes(|a| a.insert(k, v)))
    }

    /// Returns the number of removed attributes
    fn clear_attributes(&mut self) -> usize {
        self.mutate_attributes(|a| {
            let len = a.len();
            a.clear();
            len
        })
    }

    /// Returns the previous attribute value, if it existed
    fn remove_attribute(&mut self, key: &str) -> Option<serde_json::Value> {
        self.mutate_attributes(|a| a.remove(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE_ARRAY_META: &str = r#"
        {
            "zarr_format": 3,
            "node_type": "array",
            "shape": [10000, 1000],
            "dimension_names": ["rows", "columns"],
            "data_type": "float64",
            "chunk_grid": {
                "name": "regular",
                "configuration": {
                    "chunk_shape": [1000, 100]
                }
            },
            "chunk_key_encoding": {
                "name": "default",
                "configuration": {
                    "separator": "/"
                }
            },
            "codecs": [
                {"name": "bytes", "configuration": {"endian": "little"}},
                {"name": "gzip", "configuration": {"level": 1}}
            ],
            "fill_value": "NaN",
            "attributes": {
                "foo": 42,
                "bar": "apples",
                "baz": [1, 2, 3, 4]
            }
        }
    "#;

    #[test]
    fn array_meta_roundtrip() {
        let meta: ArrayMetadata =
            serde_json::from_str(EXAMPLE_ARRAY_META).expect("Could not deserialise array metadata");
        meta.validate().unwrap();
        let s2 = serde_json::to_string(&meta).expect("Couldn't serialize array metadata");
        let meta2: ArrayMetadata = serde_json::from_str(&s2).unwrap();
        assert_eq!(meta, meta2);
    }

    #[test]
    fn attributes() {
        let mut meta: ArrayMetadata = serde_json::from_str(EXAMPLE_ARRAY_META).unwrap();
        assert_eq!(meta.get_zarr_format(), 3);
        assert!(meta.has_attribute("foo"));
        assert_eq!(meta.get_attribute::<u8>("foo").unwrap().unwrap(), 42);
        assert!(meta.get_attribute::<u8>("bar").unwrap().is_err());
        assert!(meta.get_attribute::<u8>("nope").is_none());

        let old = meta.set_attribute("foo", "new").unwrap();
        assert_eq!(old, Some(serde_json::json!(42)));
        assert_eq!(meta.remove_attribute("bar"), Some(serde_json::json!("apples")));
        assert_eq!(meta.clear_attributes(), 2);
        assert!(meta.get_attributes().is_empty());
    }
}
