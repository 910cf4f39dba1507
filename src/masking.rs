//! Display redaction for decrypted values.
//!
//! All lengths count characters, not bytes, so multi-byte input is never
//! split mid-character.

/// Replacement character for hidden positions.
pub const MASK_CHAR: char = '*';

/// Suffix left visible by [`mask_bank_account`] and [`mask_national_id`].
pub const DEFAULT_VISIBLE_SUFFIX: usize = 4;

/// Mask all but the last `visible_suffix_len` characters.
///
/// Text no longer than the visible suffix is returned unchanged.
pub fn mask_text(text: &str, visible_suffix_len: usize) -> String {
    let len = text.chars().count();
    if len <= visible_suffix_len {
        return text.to_string();
    }

    let hidden = len - visible_suffix_len;
    text.chars()
        .enumerate()
        .map(|(i, c)| if i < hidden { MASK_CHAR } else { c })
        .collect()
}

/// `******7890`
pub fn mask_bank_account(account: &str) -> String {
    mask_text(account, DEFAULT_VISIBLE_SUFFIX)
}

pub fn mask_national_id(national_id: &str) -> String {
    mask_text(national_id, DEFAULT_VISIBLE_SUFFIX)
}

/// Keep the first 3 and last 2 characters: `010******78`.
///
/// Numbers of 5 characters or fewer are returned unchanged.
pub fn mask_phone(phone: &str) -> String {
    let len = phone.chars().count();
    if len <= 5 {
        return phone.to_string();
    }

    phone
        .chars()
        .enumerate()
        .map(|(i, c)| if i < 3 || i >= len - 2 { c } else { MASK_CHAR })
        .collect()
}

/// Keep the first and last character of the local part and the whole
/// domain: `j******e@example.com`.
///
/// Local parts of 2 characters or fewer stay as they are. Input without an
/// `@` is returned unchanged.
pub fn mask_email(email: &str) -> String {
    let Some((local, domain)) = email.split_once('@') else {
        return email.to_string();
    };

    let len = local.chars().count();
    let masked_local: String = if len > 2 {
        local
            .chars()
            .enumerate()
            .map(|(i, c)| if i == 0 || i == len - 1 { c } else { MASK_CHAR })
            .collect()
    } else {
        local.to_string()
    };

    format!("{}@{}", masked_local, domain)
}
