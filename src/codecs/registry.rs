use std::{collections::HashMap, fmt::Debug, sync::Arc};

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{
    aa::TransposeCodec, ab::bytes_codec::BytesCodec, bb::crc32c_codec::Crc32cCodec,
    BBCodecType, CodecChain, CodecConfigError, CodecMetadata, CodecType,
};

pub type CodecFactory =
    Arc<dyn Fn(Option<&Value>) -> Result<CodecType, CodecConfigError> + Send + Sync>;

/// Maps codec names found in metadata to constructors.
///
/// Comes pre-populated with every codec compiled into the crate;
/// callers can add their own before opening arrays which use them.
#[derive(Clone)]
pub struct CodecRegistry {
    factories: HashMap<String, CodecFactory>,
}

impl Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("CodecRegistry")
            .field("codecs", &names)
            .finish()
    }
}

fn parse_config<T: DeserializeOwned>(
    name: &str,
    configuration: Option<&Value>,
) -> Result<T, CodecConfigError> {
    let value = configuration
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()));
    serde_json::from_value(value).map_err(|source| CodecConfigError::Configuration {
        name: name.to_owned(),
        source,
    })
}

impl Default for CodecRegistry {
    fn default() -> Self {
        let mut reg = Self::empty();
        reg.register("transpose", |cfg| {
            let c: TransposeCodec = parse_config("transpose", cfg)?;
            c.validate()?;
            Ok(CodecType::AA(c.into()))
        });
        reg.register("bytes", |cfg| {
            let c: BytesCodec = parse_config("bytes", cfg)?;
            Ok(CodecType::AB(c.into()))
        });
        reg.register("crc32c", |cfg| {
            let c: Crc32cCodec = parse_config("crc32c", cfg)?;
            Ok(CodecType::BB(c.into()))
        });
        #[cfg(feature = "gzip")]
        reg.register("gzip", |cfg| {
            let c: super::bb::gzip_codec::GzipCodec = parse_config("gzip", cfg)?;
            Ok(CodecType::BB(c.into()))
        });
        #[cfg(feature = "blosc")]
        reg.register("blosc", |cfg| {
            let c: super::bb::blosc_codec::BloscCodec = parse_config("blosc", cfg)?;
            Ok(CodecType::BB(c.into()))
        });
        reg
    }
}

impl CodecRegistry {
    /// A registry which knows no codecs.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::default(),
        }
    }

    /// Register a constructor under `name`, replacing any existing one.
    pub fn register<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(Option<&Value>) -> Result<CodecType, CodecConfigError> + Send + Sync + 'static,
    {
        if self
            .factories
            .insert(name.to_owned(), Arc::new(factory))
            .is_some()
        {
            log::debug!("Replaced codec factory for `{name}`");
        }
        self
    }

    /// Register a bytes->bytes codec type which is deserialised from its configuration.
    pub fn register_bb<C>(&mut self, name: &str) -> &mut Self
    where
        C: super::bb::BBCodec + DeserializeOwned + 'static,
    {
        let owned = name.to_owned();
        self.register(name, move |cfg| {
            let c: C = parse_config(&owned, cfg)?;
            Ok(CodecType::BB(BBCodecType::custom(c)))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn resolve(&self, meta: &CodecMetadata) -> Result<CodecType, CodecConfigError> {
        let factory = self
            .factories
            .get(&meta.name)
            .ok_or_else(|| CodecConfigError::UnknownCodec(meta.name.clone()))?;
        factory(meta.configuration.as_ref())
    }

    /// Resolve each codec in order and assemble a checked chain.
    pub fn resolve_chain(&self, metas: &[CodecMetadata]) -> Result<CodecChain, CodecConfigError> {
        let codecs = metas
            .iter()
            .map(|m| self.resolve(m))
            .collect::<Result<Vec<_>, _>>()?;
        CodecChain::from_codecs(codecs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::{bb::BBCodec, CodecOptions, DecodeError, EncodeError};
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn builtin_chain() {
        let reg = CodecRegistry::default();
        let metas: Vec<CodecMetadata> = serde_json::from_value(json!([
            {"name": "transpose", "configuration": {"order": [1, 0]}},
            {"name": "bytes", "configuration": {"endian": "little"}},
            {"name": "crc32c"}
        ]))
        .unwrap();
        let chain = reg.resolve_chain(&metas).unwrap();
        assert_eq!(chain.to_metadata(), metas);
    }

    #[test]
    fn unknown_codec() {
        let reg = CodecRegistry::default();
        let res = reg.resolve(&CodecMetadata::new("zfp", None));
        assert!(matches!(res, Err(CodecConfigError::UnknownCodec(n)) if n == "zfp"));
    }

    #[test]
    fn bad_configuration() {
        let reg = CodecRegistry::default();
        let res = reg.resolve(&CodecMetadata::new("transpose", Some(json!({"order": [0, 0]}))));
        assert!(matches!(res, Err(CodecConfigError::InvalidPermutation(_))));
        let res = reg.resolve(&CodecMetadata::new("bytes", Some(json!({"endian": "middle"}))));
        assert!(matches!(res, Err(CodecConfigError::Configuration { .. })));
    }

    #[derive(Debug, Deserialize, serde::Serialize)]
    struct Reverse {}

    impl BBCodec for Reverse {
        fn name(&self) -> &str {
            "reverse"
        }

        fn configuration(&self) -> Option<Value> {
            None
        }

        fn encode(&self, decoded: &[u8]) -> Result<Vec<u8>, EncodeError> {
            Ok(decoded.iter().rev().cloned().collect())
        }

        fn decode(&self, encoded: &[u8], _options: &CodecOptions) -> Result<Vec<u8>, DecodeError> {
            Ok(encoded.iter().rev().cloned().collect())
        }
    }

    #[test]
    fn register_custom() {
        let mut reg = CodecRegistry::default();
        assert!(!reg.contains("reverse"));
        reg.register_bb::<Reverse>("reverse");
        let c = reg.resolve(&CodecMetadata::new("reverse", None)).unwrap();
        assert!(matches!(c, CodecType::BB(BBCodecType::Custom(_))));
        assert_eq!(c.to_metadata().name, "reverse");
    }
}
