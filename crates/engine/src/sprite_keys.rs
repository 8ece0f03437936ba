use thiserror::Error;

/// Rejections for sprite keys, which name PNGs under `assets/base/sprites/`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteKeyError {
    #[error("sprite key must not be empty")]
    Empty,
    #[error("sprite key must be relative, found leading or trailing '/'")]
    DanglingSlash,
    #[error("sprite key has an empty path segment")]
    EmptySegment,
    #[error("sprite key must not contain '..'")]
    ParentTraversal,
    #[error("sprite key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Keys look like `player/walk_side`: lowercase segments joined by `/`.
pub fn validate_sprite_key(key: &str) -> Result<(), SpriteKeyError> {
    if key.is_empty() {
        return Err(SpriteKeyError::Empty);
    }
    if key.starts_with('/') || key.ends_with('/') {
        return Err(SpriteKeyError::DanglingSlash);
    }
    if key.contains("..") {
        return Err(SpriteKeyError::ParentTraversal);
    }
    if let Some(character) = key
        .chars()
        .find(|ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-')))
    {
        return Err(SpriteKeyError::InvalidCharacter { character });
    }
    if key.split('/').any(str::is_empty) {
        return Err(SpriteKeyError::EmptySegment);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_animation_keys_are_valid() {
        for key in ["player/idle_down", "player/walk_side", "props/tv-2"] {
            assert_eq!(validate_sprite_key(key), Ok(()), "key={key}");
        }
    }

    #[test]
    fn path_like_keys_are_rejected() {
        assert_eq!(validate_sprite_key(""), Err(SpriteKeyError::Empty));
        assert_eq!(
            validate_sprite_key("/player"),
            Err(SpriteKeyError::DanglingSlash)
        );
        assert_eq!(
            validate_sprite_key("player/"),
            Err(SpriteKeyError::DanglingSlash)
        );
        assert_eq!(
            validate_sprite_key("player//idle"),
            Err(SpriteKeyError::EmptySegment)
        );
        assert_eq!(
            validate_sprite_key("player/../secret"),
            Err(SpriteKeyError::ParentTraversal)
        );
        assert_eq!(
            validate_sprite_key(r"player\idle"),
            Err(SpriteKeyError::InvalidCharacter { character: '\\' })
        );
        assert_eq!(
            validate_sprite_key("Player.png"),
            Err(SpriteKeyError::InvalidCharacter { character: 'P' })
        );
    }
}
