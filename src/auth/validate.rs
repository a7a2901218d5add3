/// Validate an email: must contain '@' and '.', max 254 chars.
pub fn validate_email(email: &str) -> Option<String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Some("Email é obrigatório".to_string());
    }
    if trimmed.len() > 254 {
        return Some("Email deve ter no máximo 254 caracteres".to_string());
    }
    if !trimmed.contains('@') || !trimmed.contains('.') {
        return Some("Email inválido".to_string());
    }
    None
}

/// Validate a password: min 8 chars.
pub fn validate_password(password: &str) -> Option<String> {
    if password.is_empty() {
        return Some("Senha é obrigatória".to_string());
    }
    if password.chars().count() < 8 {
        return Some("Senha deve ter pelo menos 8 caracteres".to_string());
    }
    None
}

/// Validate a required text field with a max length (in characters).
pub fn validate_required(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(format!("{field_name} é obrigatório"));
    }
    if trimmed.chars().count() > max_len {
        return Some(format!("{field_name} deve ter no máximo {max_len} caracteres"));
    }
    None
}

/// Validate an optional text field with a max length (empty is OK).
pub fn validate_optional(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if !trimmed.is_empty() && trimmed.chars().count() > max_len {
        return Some(format!("{field_name} deve ter no máximo {max_len} caracteres"));
    }
    None
}
