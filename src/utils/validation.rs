use crate::error::{AppError, Result};
use validator::ValidationError;

/// 拒绝只包含空白字符的输入
pub fn validate_not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("This field is required.".into());
        return Err(error);
    }
    Ok(())
}

/// 校验评论正文长度（字符数）
pub fn validate_comment_length(text: &str, max_length: usize) -> Result<()> {
    let length = text.chars().count();
    if length > max_length {
        return Err(AppError::Validation(format!(
            "Comment is too long ({} characters, at most {} allowed)",
            length, max_length
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("hello").is_ok());
        assert!(validate_not_blank("  padded  ").is_ok());

        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("\t\n").is_err());
    }

    #[test]
    fn test_validate_comment_length() {
        assert!(validate_comment_length("hi", 2).is_ok());
        assert!(validate_comment_length("čćž", 3).is_ok());
        assert!(validate_comment_length("hey", 2).is_err());
    }
}
