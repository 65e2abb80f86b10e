//! Opaque texture references. Image decoding and upload belong to the
//! rendering backend; models only carry a name it can resolve.

/// Handle naming an externally loaded image (usually its asset path).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(String);

impl TextureHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TextureHandle {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_keeps_its_name() {
        let handle = TextureHandle::new("skins/pumpkin.png");
        assert_eq!(handle.name(), "skins/pumpkin.png");
    }
}
