//! Name casing used for artifact directories and resource identifiers.
//!
//! Both transforms insert a separator before *every* upper-case character
//! except the first, so runs of capitals are split letter by letter:
//! `HTTPHandler` becomes `h-t-t-p-handler`. Generated directory names are
//! part of the deployed URLs, so this behaviour is kept stable.

/// `CreateAccount` -> `create-account`.
pub fn to_kebab_case(name: &str) -> String {
    split_on_upper(name, '-')
}

/// `CreateAccount` -> `create_account`. Existing `-` become `_` so the result
/// is a valid Terraform identifier.
pub fn to_snake_case(name: &str) -> String {
    split_on_upper(name, '_').replace('-', "_")
}

fn split_on_upper(name: &str, sep: char) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if i > 0 && ch.is_ascii_uppercase() {
            out.push(sep);
        }
        out.push(ch);
    }
    out.to_lowercase()
}
