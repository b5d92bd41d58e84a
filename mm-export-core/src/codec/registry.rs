//! Factory-function table resolving a codec id string to a fresh
//! [`super::VideoCodec`] instance.

use super::VideoCodec;
use crate::error::ExportError;

pub struct CodecEntry {
    pub id: &'static str,
    pub factory: fn() -> Box<dyn VideoCodec>,
}

pub struct CodecRegistry {
    entries: Vec<CodecEntry>,
}

impl CodecRegistry {
    /// Registers every codec compiled into this build, in preference order
    /// for `"auto"`: zmbv (when the `zmbv` feature is enabled) is preferred
    /// over mrle because it produces smaller recordings; mpng is never
    /// auto-selected since it forces every frame to be a keyframe.
    pub fn with_defaults() -> Self {
        let mut entries = Vec::new();

        #[cfg(feature = "zmbv")]
        entries.push(CodecEntry {
            id: "zmbv",
            factory: || Box::new(super::zmbv_stub::ZmbvStubCodec::new()),
        });

        entries.push(CodecEntry {
            id: "mrle",
            factory: || Box::new(super::mrle::RleCodec::new()),
        });

        #[cfg(feature = "mpng")]
        entries.push(CodecEntry {
            id: "mpng",
            factory: || Box::new(super::mpng::MotionPngCodec::new()),
        });

        Self { entries }
    }

    pub fn list_ids(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.id).collect()
    }

    pub fn resolve(&self, requested: &str) -> Result<Box<dyn VideoCodec>, ExportError> {
        if requested.eq_ignore_ascii_case("auto") {
            return self
                .entries
                .first()
                .map(|e| {
                    log::debug!("codec \"auto\" resolved to \"{}\"", e.id);
                    (e.factory)()
                })
                .ok_or_else(|| {
                    ExportError::InvalidArgument("no video codecs compiled in".to_string())
                });
        }

        self.entries
            .iter()
            .find(|e| e.id.eq_ignore_ascii_case(requested))
            .map(|e| (e.factory)())
            .ok_or_else(|| {
                ExportError::InvalidArgument(format!("unknown video codec: {requested}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_unknown_codec_errors() {
        let registry = CodecRegistry::with_defaults();
        let err = registry.resolve("nonexistent").unwrap_err();
        assert!(matches!(err, ExportError::InvalidArgument(_)));
    }

    #[test]
    fn auto_prefers_zmbv_over_mrle_when_compiled_in() {
        let registry = CodecRegistry::with_defaults();
        let codec = registry.resolve("auto").unwrap();
        let id = codec.info().id;
        if cfg!(feature = "zmbv") {
            assert_eq!(id, "zmbv");
        } else {
            assert_eq!(id, "mrle");
        }
    }

    #[test]
    fn mrle_is_always_resolvable() {
        let registry = CodecRegistry::with_defaults();
        assert!(registry.resolve("mrle").is_ok());
        assert!(registry.resolve("MRLE").is_ok());
    }
}
