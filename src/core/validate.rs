use super::editor::EntryEditor;
use crate::error::{Result, SyncError};
use crate::models::ConfigEntry;

pub const MAX_KEY_LEN: usize = 256;

/// key 去掉首尾空白后非空，以字母或下划线开头，只含 ASCII 字母、数字和下划线
pub fn validate_key(key: &str) -> Result<()> {
    let key = key.trim();
    if key.is_empty() {
        return Err(SyncError::Validation("name must not be empty".to_string()));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(SyncError::Validation(format!(
            "name must be at most {} characters",
            MAX_KEY_LEN
        )));
    }
    let mut chars = key.chars();
    let first_ok = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if !first_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(SyncError::Validation(format!(
            "invalid name {:?}: use letters, digits and underscores, not starting with a digit",
            key
        )));
    }
    Ok(())
}

/// value 允许为空，但不能包含 NUL
pub fn validate_value(value: &str) -> Result<()> {
    if value.contains('\0') {
        return Err(SyncError::Validation("value must not contain NUL".to_string()));
    }
    Ok(())
}

/// 提交前的检查。除 key/value 本身外，还拒绝写到已由另一行持有的 key 上。
pub fn check_submission(editor: &EntryEditor, existing: &[ConfigEntry]) -> Result<()> {
    validate_key(editor.draft_key())?;
    validate_value(editor.draft_value())?;

    let key = editor.draft_key().trim();
    if key != editor.original_key() && existing.iter().any(|e| e.key == key) {
        return Err(SyncError::Validation(format!("{} already exists", key)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_keys() {
        for key in ["A", "DATABASE_URL", "_PRIVATE", "port8080", "  PADDED  "] {
            validate_key(key).unwrap();
        }
    }

    #[test]
    fn test_invalid_keys() {
        for key in ["", "   ", "1ABC", "WITH SPACE", "DASH-ED", "A=B", "ÜBER"] {
            let err = validate_key(key).unwrap_err();
            assert!(matches!(err, SyncError::Validation(_)), "key {:?}", key);
        }
    }

    #[test]
    fn test_key_too_long() {
        let key = "K".repeat(MAX_KEY_LEN + 1);
        assert!(validate_key(&key).is_err());
        validate_key(&"K".repeat(MAX_KEY_LEN)).unwrap();
    }

    #[test]
    fn test_values() {
        validate_value("").unwrap();
        validate_value("postgres://u:p@host/db?x=1 2").unwrap();
        assert!(validate_value("a\0b").is_err());
    }

    #[test]
    fn test_new_entry_cannot_shadow_existing_key() {
        let existing = vec![ConfigEntry::new("A", "1")];
        let mut editor = EntryEditor::new_entry("app-1");
        editor.set_key(" A ");
        let err = check_submission(&editor, &existing).unwrap_err();
        assert_eq!(err.to_string(), "invalid entry: A already exists");

        editor.set_key("B");
        check_submission(&editor, &existing).unwrap();
    }

    #[test]
    fn test_existing_row_may_keep_its_key() {
        let existing = vec![ConfigEntry::new("A", "1"), ConfigEntry::new("B", "2")];
        let mut editor = EntryEditor::for_entry("app-1", &existing[0]);
        editor.set_value("changed");
        check_submission(&editor, &existing).unwrap();

        editor.set_key("B");
        assert!(check_submission(&editor, &existing).is_err());

        editor.set_key("C");
        check_submission(&editor, &existing).unwrap();
    }
}
