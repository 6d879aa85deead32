pub type ExplainerResult<T> = Result<T, ExplainerError>;

#[derive(thiserror::Error, Debug)]
pub enum ExplainerError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("animation error: {0}")]
    Animation(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExplainerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            ExplainerError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            ExplainerError::animation("x")
                .to_string()
                .contains("animation error:")
        );
        assert!(
            ExplainerError::render("x")
                .to_string()
                .contains("render error:")
        );
        assert!(
            ExplainerError::encode("x")
                .to_string()
                .contains("encode error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = ExplainerError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
